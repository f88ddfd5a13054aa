//! Fill-fraction arithmetic for container volume labels.

/// Parse a fraction string of the form `"n/d"` into its numeric value.
/// Returns `None` for anything else (including zero denominators).
pub fn parse_fraction(fraction: &str) -> Option<f64> {
    let (numerator, denominator) = fraction.split_once('/')?;
    let n: f64 = numerator.trim().parse().ok()?;
    let d: f64 = denominator.trim().parse().ok()?;
    if d == 0.0 { None } else { Some(n / d) }
}

/// Convert a fill fraction of one container slot into a liter amount string.
///
/// The amount is `(container_index + fraction) * capacity` rounded to two
/// decimal places, with trailing-zero decimals normalized: "5.00" → "5",
/// "6.70" → "6.7", "6.67" stays. These strings are what the grid stores, so
/// the normalization must round-trip exactly.
pub fn fraction_to_value(fraction: &str, container_index: u32, capacity: f64) -> Option<String> {
    let fraction_number = parse_fraction(fraction)?;
    let amount = (container_index as f64 + fraction_number) * capacity;
    let fixed = format!("{amount:.2}");

    let value = match fixed.split_once('.') {
        Some((whole, "00")) => whole.to_string(),
        Some((_, decimals)) if decimals.ends_with('0') => fixed[..fixed.len() - 1].to_string(),
        _ => fixed,
    };

    Some(value)
}
