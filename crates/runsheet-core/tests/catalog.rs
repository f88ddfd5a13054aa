mod common;

use common::{SUBURBS, TOWN, VARIABLES, engine, engine_with_bad_capacity};
use runsheet_common::CellValue;
use runsheet_core::{ConfigError, EngineError, SNAPSHOT_CACHE_KEY};
use runsheet_store::RangeRef;

#[test]
fn builds_both_groups_from_named_ranges() {
    let fx = engine();
    let groups = fx.engine.run_groups().unwrap();
    assert_eq!(groups.len(), 2);

    let suburbs = &groups[0];
    assert_eq!(suburbs.sheet_name, SUBURBS);
    assert_eq!(suburbs.column_header_row_index, 2);
    assert_eq!(suburbs.column_index("customer"), Some(1));
    assert_eq!(suburbs.column_index("notes"), Some(6));
    // header keys are lower-cased on the way in
    assert_eq!(suburbs.column_index("Quantity"), Some(3));
    assert_eq!(
        suburbs.ordered_run_names,
        vec!["MT VIC RUN".to_string(), "MT COOK RUN".to_string()]
    );
    assert_eq!(suburbs.pre_run_extras_name, "SWITCHED ON PICK-UP (SUBURBS)");
    assert_eq!(suburbs.post_run_extras_name, "SWITCHED ON DROP-OFF (SUBURBS)");
    assert_eq!(suburbs.footer_text, "SUBURBS LAST COLLECTION");
    assert_eq!(suburbs.id(), "suburbs-run-sheet");

    let town = &groups[1];
    assert_eq!(town.sheet_name, TOWN);
    assert_eq!(
        town.ordered_run_names,
        vec!["NORTH A RUN".to_string(), "NORTH B RUN".to_string()]
    );
}

#[test]
fn date_span_skips_hidden_columns_and_trims_trailing_blanks() {
    let fx = engine();
    let groups = fx.engine.run_groups().unwrap();
    let suburbs = &groups[0];

    // column 7 is hidden (old season); 8..10 carry headers; 11 is blank
    assert_eq!(suburbs.date_header_span.start_col, 8);
    assert_eq!(suburbs.date_header_span.col_count, 3);
    assert_eq!(
        suburbs.date_headers_formatted,
        vec!["Aug 3".to_string(), "Aug 10".to_string(), "Aug 17".to_string()]
    );
    assert_eq!(suburbs.date_headers.len(), 3);
    assert_eq!(suburbs.date_column("Aug 10"), Some(9));
    assert_eq!(suburbs.date_column("Aug 99"), None);

    let town = &groups[1];
    assert_eq!(town.date_header_span.start_col, 7);
    assert_eq!(town.date_headers_formatted, vec!["Aug 4", "Aug 11"]);
}

#[test]
fn snapshot_survives_sheet_edits_until_explicitly_cleared() {
    let fx = engine();
    let before = fx.engine.run_groups().unwrap();
    assert_eq!(before[0].footer_text, "SUBURBS LAST COLLECTION");

    // edit the footer cell: cached metadata keeps serving the old layout
    fx.sheet
        .set_cell(SUBURBS, 61, 1, CellValue::from("SEASON CLOSED"));
    let cached = fx.engine.run_groups().unwrap();
    assert_eq!(cached[0].footer_text, "SUBURBS LAST COLLECTION");

    // the snapshot is one cache entry under a well-known key
    let dump = fx.engine.cache_dump();
    assert!(dump["_cache"].contains_key(SNAPSHOT_CACHE_KEY));

    // explicit clear is the only invalidation
    fx.engine.clear_cache();
    let rebuilt = fx.engine.run_groups().unwrap();
    assert_eq!(rebuilt[0].footer_text, "SEASON CLOSED");
}

#[test]
fn missing_named_range_is_fatal() {
    // a configured range the document does not define must refuse, not guess
    let sheet = std::sync::Arc::new(common::document());
    sheet.remove_named_range("NonVolumes");
    let properties = std::sync::Arc::new(runsheet_store::MemoryPropertyStore::default());
    let engine = runsheet_core::Engine::new(sheet, properties, common::config()).unwrap();

    match engine.run_groups() {
        Err(EngineError::Config(ConfigError::MissingNamedRange(name))) => {
            assert_eq!(name, "NonVolumes");
        }
        other => panic!("expected MissingNamedRange, got {other:?}"),
    }
}

#[test]
fn invalid_named_range_values_are_reported_together() {
    let fx = engine_with_bad_capacity().unwrap();
    match fx.engine.run_groups() {
        Err(EngineError::Config(ConfigError::InvalidNamedRangeValues(messages))) => {
            assert_eq!(messages.len(), 1);
            assert!(messages[0].contains("not a valid value"));
            assert!(messages[0].contains("NUMBER_GREATER_THAN 0"));
            assert!(messages[0].contains(&format!("{VARIABLES}!B3")));
        }
        other => panic!("expected InvalidNamedRangeValues, got {other:?}"),
    }
}

#[test]
fn cached_config_survives_into_a_new_session() {
    let fx = engine();
    fx.engine.run_groups().unwrap();

    // a second engine over the same stores starts from the cached config
    let revived = runsheet_core::Engine::with_cached_config(
        std::sync::Arc::clone(&fx.sheet) as std::sync::Arc<dyn runsheet_store::RangeStore>,
        std::sync::Arc::clone(&fx.properties) as std::sync::Arc<dyn runsheet_store::KeyValueStore>,
    )
    .unwrap();
    assert_eq!(revived.config().app_name, "Runsheet");
    assert_eq!(revived.run_groups().unwrap().len(), 2);

    // but not after a full cache wipe
    fx.engine.clear_cache_all();
    let orphaned = runsheet_core::Engine::with_cached_config(
        std::sync::Arc::clone(&fx.sheet) as std::sync::Arc<dyn runsheet_store::RangeStore>,
        std::sync::Arc::clone(&fx.properties) as std::sync::Arc<dyn runsheet_store::KeyValueStore>,
    );
    assert!(matches!(
        orphaned,
        Err(EngineError::Config(ConfigError::Invalid(_)))
    ));
}

#[test]
fn group_membership_covers_extras() {
    let fx = engine();
    let group = fx.engine.group_for_run("SWITCHED ON PICK-UP (SUBURBS)").unwrap();
    assert_eq!(group.sheet_name, SUBURBS);
    let group = fx.engine.group_for_run("NORTH B RUN").unwrap();
    assert_eq!(group.sheet_name, TOWN);

    match fx.engine.group_for_run("NO SUCH RUN") {
        Err(EngineError::Config(ConfigError::UnknownRunName(name))) => {
            assert_eq!(name, "NO SUCH RUN");
        }
        other => panic!("expected UnknownRunName, got {other:?}"),
    }
}

#[test]
fn validation_rules_are_installed_on_configured_ranges() {
    let fx = engine();
    fx.engine.run_groups().unwrap();

    // catalog build attached the configured number rule to the capacities
    // range; the health check replays it
    let range = RangeRef::new(VARIABLES, 2, 2, 3, 1);
    let report = fx.engine.validate_range(&range, None).unwrap();
    assert!(report.is_clean());
    assert_eq!(report.valid.len(), 3);

    // a hypothetical edit to zero would be flagged
    let replacement = vec![
        vec![CellValue::Int(20)],
        vec![CellValue::Int(0)],
        vec![CellValue::Int(240)],
    ];
    let report = fx.engine.validate_range(&range, Some(&replacement)).unwrap();
    assert_eq!(report.invalid.len(), 1);
    assert!(report.invalid[0].contains("B3"));
}
