//! Common test utilities

use chrono::NaiveDate;
use serde_json::{json, Value};

use impfwatch::models::{Agenda, CatalogData, Place, VisitMotive};

pub const REGION: &str = "ciz-berlin-berlin";

pub const ARENA: u64 = 158431;
pub const TEGEL: u64 = 191612;

pub const BIONTECH: u64 = 2495;
pub const MODERNA: u64 = 2537;
pub const ASTRAZENECA: u64 = 2597;

/// Catalog with two centers:
/// - Arena: BioNTech enabled, Moderna disabled (temporary)
/// - Tegel: AstraZeneca enabled
pub fn sample_catalog_json() -> Value {
    json!({
        "data": {
            "places": [
                {"name": "Arena Berlin", "practice_ids": [ARENA]},
                {"name": "Flughafen Tegel", "practice_ids": [TEGEL, 191613]},
                {"name": "Closed site", "practice_ids": []}
            ],
            "agendas": [
                {
                    "id": 397800,
                    "practice_id": ARENA,
                    "visit_motive_ids": [BIONTECH],
                    "booking_disabled": false,
                    "booking_temporary_disabled": false
                },
                {
                    "id": 397776,
                    "practice_id": ARENA,
                    "visit_motive_ids": [MODERNA],
                    "booking_disabled": false,
                    "booking_temporary_disabled": true
                },
                {
                    "id": 404654,
                    "practice_id": TEGEL,
                    "visit_motive_ids": [ASTRAZENECA],
                    "booking_disabled": false,
                    "booking_temporary_disabled": false
                }
            ],
            "visit_motives": [
                {"id": BIONTECH, "name": "Erstimpfung BioNTech"},
                {"id": MODERNA, "name": "Erstimpfung Moderna"},
                {"id": ASTRAZENECA, "name": "Erstimpfung AstraZeneca"}
            ]
        }
    })
}

/// Same catalog as [`sample_catalog_json`], decoded
#[allow(dead_code)]
pub fn sample_catalog() -> CatalogData {
    serde_json::from_value::<impfwatch::models::CatalogResponse>(sample_catalog_json())
        .unwrap()
        .data
}

/// Build a catalog by hand
#[allow(dead_code)]
pub fn catalog(places: &[(&str, &[u64])], agendas: &[Agenda], motives: &[(u64, &str)]) -> CatalogData {
    CatalogData {
        places: places
            .iter()
            .map(|(name, ids)| Place {
                name: name.to_string(),
                practice_ids: ids.to_vec(),
            })
            .collect(),
        agendas: agendas.to_vec(),
        visit_motives: motives
            .iter()
            .map(|(id, name)| VisitMotive {
                id: *id,
                name: name.to_string(),
            })
            .collect(),
    }
}

/// Availability body whose first slot is on `date`
#[allow(dead_code)]
pub fn availability_json(date: &str) -> Value {
    json!({
        "total": 1,
        "availabilities": [
            {"date": "2000-01-01", "slots": []},
            {"date": date, "slots": [{
                "start_date": format!("{date}T08:00:00.000+01:00"),
                "end_date": format!("{date}T08:05:00.000+01:00"),
                "agenda_id": 397800,
                "steps": []
            }]}
        ]
    })
}

/// Availability body with no slots and no hint
#[allow(dead_code)]
pub fn no_availability_json() -> Value {
    json!({
        "total": 0,
        "reason": "no_availabilities",
        "message": "Derzeit sind keine Termine verfügbar",
        "availabilities": [
            {"date": "2024-01-10", "slots": []},
            {"date": "2024-01-11", "slots": []}
        ]
    })
}

#[allow(dead_code)]
pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}
