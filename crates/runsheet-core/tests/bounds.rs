mod common;

use common::engine;
use runsheet_core::{ConfigError, EngineError, Run};

/// Bounds against the reference layout. Row counts deliberately include
/// trailing blank and repurposed rows: filtering is derivation's job.
#[test]
fn bounds_match_reference_layout() {
    let fx = engine();
    let expectations = [
        ("SWITCHED ON PICK-UP (SUBURBS)", 13, 1),
        ("SWITCHED ON DROP-OFF (SUBURBS)", 17, 4),
        ("MT VIC RUN", 24, 17),
        ("MT COOK RUN", 44, 15),
        ("SWITCHED ON PICK-UP (TOWN)", 12, 4),
        ("SWITCHED ON DROP-OFF (TOWN)", 19, 2),
        ("NORTH A RUN", 24, 26),
        ("NORTH B RUN", 53, 13),
    ];

    for (name, start_row_index, row_count) in expectations {
        let run = fx.engine.run(name).unwrap();
        assert_eq!(
            run.bounds.start_row_index, start_row_index,
            "start row of {name}"
        );
        assert_eq!(run.bounds.row_count, row_count, "row count of {name}");
    }
}

#[test]
fn next_run_name_feeds_the_lower_bound() {
    let fx = engine();
    let run = fx.engine.run("MT VIC RUN").unwrap();
    assert_eq!(run.next_run_name.as_deref(), Some("MT COOK RUN"));

    // last run: footer is the lower bound
    let run = fx.engine.run("MT COOK RUN").unwrap();
    assert_eq!(run.next_run_name, None);
}

#[test]
fn runs_are_cached_by_slug() {
    let fx = engine();
    fx.engine.run("MT VIC RUN").unwrap();
    let dump = fx.engine.cache_dump();
    assert!(dump["_cache"].contains_key(&Run::cache_key("MT VIC RUN")));
    assert!(dump["_cache"].contains_key("run-mt-vic-run"));
}

#[test]
fn unknown_run_name_is_fatal() {
    let fx = engine();
    match fx.engine.run("BERHAMPORE/NEWTOWN RUN") {
        Err(EngineError::Config(ConfigError::UnknownRunName(_))) => {}
        other => panic!("expected UnknownRunName, got {other:?}"),
    }
}
