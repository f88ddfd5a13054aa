//! Shared fixture: an in-memory document laid out like a real run
//! spreadsheet, plus the matching configuration.
#![allow(dead_code)] // each test binary uses its own slice of the fixture
//!
//! The suburbs sheet reproduces the layout constants the bounds algorithm
//! was tuned against: pre-extras header at row 12, post-extras at 16, two
//! runs at 23 and 43, footer at 61, two blank rows after every run. The run
//! starting at row 24 therefore spans 17 rows and the last run 15.

use runsheet_common::CellValue;
use runsheet_core::{AppConfig, Engine, EngineError};
use runsheet_store::{
    KeyValueStore, MemoryPropertyStore, MemorySheetStore, RangeRef, RangeStore, SheetFixture,
};
use std::sync::Arc;

pub const SUBURBS: &str = "Suburbs Run Sheet";
pub const TOWN: &str = "Town Run Sheet";
pub const VARIABLES: &str = "Variables";

pub fn config() -> AppConfig {
    AppConfig::from_json_str(
        r#"{
            "app_name": "Runsheet",
            "abbreviations": [
                { "short": "b", "long": "Business" },
                { "short": "np", "long": "Non-profit" },
                { "short": "r", "long": "Residential" },
                { "short": "x", "long": "Checklist Task" }
            ],
            "container_volume_fractions": ["1/4", "1/2", "3/4", "4/4", "5/4"],
            "date_format": "%b %-d",
            "named_range_items": [
                {
                    "name": "ContainerCapacities",
                    "description": "Container Capacities",
                    "validation": { "kind": "number_greater_than", "value": 0.0 }
                },
                { "name": "ContainerTypes", "description": "Container Types" },
                { "name": "DateFlags", "description": "Date Flags" },
                { "name": "NonVolumes", "description": "Non-volumes" }
            ],
            "computed_named_range_names": ["RunGroups"],
            "run_blank_rows_after": 2,
            "run_group_count": 2,
            "run_group_run_count": 2
        }"#,
    )
    .expect("fixture config parses")
}

fn text(s: &str) -> CellValue {
    CellValue::from(s)
}

pub fn document() -> MemorySheetStore {
    let headers = [
        text("Customer"),
        text("Type"),
        text("Quantity"),
        text("Container"),
        text("Address"),
        text("Notes"),
    ];

    SheetFixture::new()
        // ---- variables sheet: configuration ranges ----
        .cell(VARIABLES, 2, 1, "Bucket")
        .cell(VARIABLES, 3, 1, "Crate")
        .cell(VARIABLES, 4, 1, "Wheelie Bin")
        .cell(VARIABLES, 2, 2, CellValue::Int(20))
        .cell(VARIABLES, 3, 2, CellValue::Int(60))
        .cell(VARIABLES, 4, 2, CellValue::Int(240))
        .cell(VARIABLES, 2, 3, "Skip")
        .cell(VARIABLES, 3, 3, "Cancelled")
        .cell(VARIABLES, 4, 3, "Pending")
        .cell(VARIABLES, 5, 3, "Drop")
        .cell(VARIABLES, 2, 4, "Not found")
        .cell(VARIABLES, 3, 4, "No access")
        .cell(VARIABLES, 4, 4, "Dropped (first)")
        .cell(VARIABLES, 5, 4, "Collected (final)")
        .cell(VARIABLES, 6, 4, "See group chat")
        .named_range("ContainerTypes", RangeRef::new(VARIABLES, 2, 1, 3, 1))
        .named_range("ContainerCapacities", RangeRef::new(VARIABLES, 2, 2, 3, 1))
        .named_range("DateFlags", RangeRef::new(VARIABLES, 2, 3, 4, 1))
        .named_range("NonVolumes", RangeRef::new(VARIABLES, 2, 4, 5, 1))
        // ---- suburbs sheet: group 1 ----
        .row(SUBURBS, 2, 1, &headers)
        // date headers: col 7 is a hidden old season, 8..10 are live,
        // col 11 has no header (trailing blank, trimmed from the span)
        .cell(SUBURBS, 2, 7, "2025-12-01")
        .hidden_column(SUBURBS, 7)
        .cell(SUBURBS, 2, 8, "2026-08-03")
        .cell(SUBURBS, 2, 9, "2026-08-10")
        .cell(SUBURBS, 2, 10, "2026-08-17")
        .cell(SUBURBS, 12, 1, "SWITCHED ON PICK-UP (SUBURBS)")
        .cell(SUBURBS, 13, 1, "Depot crates")
        .cell(SUBURBS, 13, 5, "11 Hutt Rd")
        .cell(SUBURBS, 16, 1, "SWITCHED ON DROP-OFF (SUBURBS)")
        .cell(SUBURBS, 17, 1, "Community garden")
        .cell(SUBURBS, 17, 5, "2 Ohiro Rd")
        .cell(SUBURBS, 23, 1, "MT VIC RUN")
        .row(
            SUBURBS,
            24,
            1,
            &[
                text("GSL Promotus"),
                text("B"),
                CellValue::Int(1),
                text("Bucket"),
                text("58/60 Oriental Pde"),
                text("Knock for access"),
            ],
        )
        .cell(SUBURBS, 24, 9, CellValue::Int(15))
        .row(
            SUBURBS,
            25,
            1,
            &[
                text("Harbour Cafe"),
                text("B"),
                CellValue::Int(2),
                text("Bucket"),
                text("14 Courtenay Pl"),
                text("Side door"),
            ],
        )
        .cell(SUBURBS, 25, 9, "Skip")
        // repurposed row: one populated cell only
        .cell(SUBURBS, 26, 1, "— WINTER BREAK —")
        .row(
            SUBURBS,
            27,
            1,
            &[
                text("Flat 3"),
                text("R"),
                CellValue::Int(1),
                text("Crate"),
                text("9 Pirie St"),
                CellValue::Empty,
            ],
        )
        .cell(SUBURBS, 27, 9, "Cancelled")
        // checklist stop: no container, no quantity
        .row(
            SUBURBS,
            28,
            1,
            &[
                text("St Mark's School"),
                text("X"),
                CellValue::Empty,
                CellValue::Empty,
                text("1 Dufferin St"),
                CellValue::Empty,
            ],
        )
        .cell(SUBURBS, 28, 9, CellValue::Bool(true))
        // row 29 is blank: terminal for MT VIC RUN
        .cell(SUBURBS, 43, 1, "MT COOK RUN")
        .row(
            SUBURBS,
            44,
            1,
            &[
                text("Tasting Room"),
                text("B"),
                CellValue::Int(1),
                text("Wheelie Bin"),
                text("2 Kent Tce"),
                CellValue::Empty,
            ],
        )
        .cell(SUBURBS, 61, 1, "SUBURBS LAST COLLECTION")
        .named_range(
            "RunGroup1ColumnHeaders",
            RangeRef::new(SUBURBS, 2, 1, 1, 6),
        )
        .named_range("RunGroup1PreRunHeader", RangeRef::cell(SUBURBS, 12, 1))
        .named_range("RunGroup1PostRunHeader", RangeRef::cell(SUBURBS, 16, 1))
        .named_range("RunGroup1RunHeader1", RangeRef::cell(SUBURBS, 23, 1))
        .named_range("RunGroup1RunHeader2", RangeRef::cell(SUBURBS, 43, 1))
        .named_range("RunGroup1Footer", RangeRef::cell(SUBURBS, 61, 1))
        // ---- town sheet: group 2 ----
        .row(TOWN, 2, 1, &headers)
        .cell(TOWN, 2, 7, "2026-08-04")
        .cell(TOWN, 2, 8, "2026-08-11")
        .cell(TOWN, 11, 1, "SWITCHED ON PICK-UP (TOWN)")
        .cell(TOWN, 18, 1, "SWITCHED ON DROP-OFF (TOWN)")
        .cell(TOWN, 23, 1, "NORTH A RUN")
        // a checklist row that still has a container: its date cells become
        // checkboxes when validation is refreshed
        .row(
            TOWN,
            24,
            1,
            &[
                text("Depot checklist"),
                text("X"),
                CellValue::Int(1),
                text("Bucket"),
                text("11 Hutt Rd"),
                CellValue::Empty,
            ],
        )
        .cell(TOWN, 52, 1, "NORTH B RUN")
        .row(
            TOWN,
            53,
            1,
            &[
                text("Aro Cafe"),
                text("B"),
                CellValue::Int(1),
                text("Bucket"),
                text("90 Aro St"),
                CellValue::Empty,
            ],
        )
        .cell(TOWN, 68, 1, "TOWN LAST COLLECTION")
        .named_range("RunGroup2ColumnHeaders", RangeRef::new(TOWN, 2, 1, 1, 6))
        .named_range("RunGroup2PreRunHeader", RangeRef::cell(TOWN, 11, 1))
        .named_range("RunGroup2PostRunHeader", RangeRef::cell(TOWN, 18, 1))
        .named_range("RunGroup2RunHeader1", RangeRef::cell(TOWN, 23, 1))
        .named_range("RunGroup2RunHeader2", RangeRef::cell(TOWN, 52, 1))
        .named_range("RunGroup2Footer", RangeRef::cell(TOWN, 68, 1))
        .build()
}

pub struct Fixture {
    pub sheet: Arc<MemorySheetStore>,
    pub properties: Arc<MemoryPropertyStore>,
    pub engine: Engine,
}

pub fn engine() -> Fixture {
    engine_on(Arc::new(document())).expect("engine builds")
}

/// A document whose capacities include an invalid entry, for failure tests.
#[allow(dead_code)]
pub fn engine_with_bad_capacity() -> Result<Fixture, EngineError> {
    let sheet = Arc::new(document());
    sheet.set_cell(VARIABLES, 3, 2, CellValue::Int(0));
    engine_on(sheet)
}

fn engine_on(sheet: Arc<MemorySheetStore>) -> Result<Fixture, EngineError> {
    let properties = Arc::new(MemoryPropertyStore::default());
    let engine = Engine::new(
        Arc::clone(&sheet) as Arc<dyn RangeStore>,
        Arc::clone(&properties) as Arc<dyn KeyValueStore>,
        config(),
    )?;
    Ok(Fixture {
        sheet,
        properties,
        engine,
    })
}
