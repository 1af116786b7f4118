// Core data structures for the booking API and the exporter

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashMap;

/// Decode an explicit `null` the same way as a missing field
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Option::unwrap_or_default)
}

// ============================================================================
// Catalog wire records
// ============================================================================

/// Catalog document returned by `/booking/{region}.json`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogResponse {
    pub data: CatalogData,
}

/// Payload of the catalog document
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogData {
    #[serde(default, deserialize_with = "null_as_default")]
    pub places: Vec<Place>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub agendas: Vec<Agenda>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub visit_motives: Vec<VisitMotive>,
}

/// A physical location listed in the catalog
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Place {
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub practice_ids: Vec<u64>,
}

/// A scheduling unit belonging to one practice
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Agenda {
    #[serde(default, deserialize_with = "null_as_default")]
    pub id: u64,
    #[serde(default)]
    pub practice_id: Option<u64>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub visit_motive_ids: Vec<u64>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub booking_disabled: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    pub booking_temporary_disabled: bool,
}

impl Agenda {
    /// Either disable flag marks every motive of this agenda as not bookable
    pub fn is_disabled(&self) -> bool {
        self.booking_disabled || self.booking_temporary_disabled
    }
}

/// A bookable vaccination type
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VisitMotive {
    #[serde(default, deserialize_with = "null_as_default")]
    pub id: u64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
}

// ============================================================================
// Availability wire records
// ============================================================================

/// Document returned by `/availabilities.json`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AvailabilityResponse {
    #[serde(default, deserialize_with = "null_as_default")]
    pub total: i64,
    #[serde(default)]
    pub reason: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub number_future_vaccinations: Option<i64>,
    #[serde(default)]
    pub next_slot: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub availabilities: Vec<Availability>,
}

impl AvailabilityResponse {
    /// Upstream answered with a refusal instead of slots
    pub fn is_refusal(&self) -> bool {
        self.reason.as_deref().is_some_and(|r| !r.is_empty())
            || self.message.as_deref().is_some_and(|m| !m.is_empty())
    }
}

/// Bookable slots of a single calendar date
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Availability {
    #[serde(default, deserialize_with = "null_as_default")]
    pub date: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub slots: Vec<Slot>,
}

/// A bookable slot, either a bare start timestamp or a detailed record
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Slot {
    Start(String),
    Detailed(SlotDetail),
}

/// Detailed slot record (multi-step appointments list their steps)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SlotDetail {
    #[serde(default)]
    pub start_date: Option<String>,
    #[serde(default)]
    pub end_date: Option<String>,
    #[serde(default)]
    pub agenda_id: Option<u64>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub steps: Vec<Step>,
}

/// One step of a multi-step appointment
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Step {
    #[serde(default)]
    pub start_date: Option<String>,
    #[serde(default)]
    pub end_date: Option<String>,
    #[serde(default)]
    pub visit_motive_id: Option<u64>,
    #[serde(default)]
    pub agenda_id: Option<u64>,
}

// ============================================================================
// Domain entities
// ============================================================================

/// A vaccination center, keyed by the first practice id of its catalog place
///
/// A vaccination type id lives in at most one of `enabled` and `disabled`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Center {
    pub id: u64,
    pub name: String,
    enabled: HashMap<u64, String>,
    disabled: HashMap<u64, String>,
    pub agenda_ids: Vec<u64>,
}

impl Center {
    /// Create a center with no vaccination types and no agendas
    pub fn new(id: u64, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            ..Default::default()
        }
    }

    /// Record the classification of a vaccination type; the latest call wins
    pub fn classify(&mut self, motive_id: u64, motive_name: impl Into<String>, disabled: bool) {
        let name = motive_name.into();
        if disabled {
            self.enabled.remove(&motive_id);
            self.disabled.insert(motive_id, name);
        } else {
            self.disabled.remove(&motive_id);
            self.enabled.insert(motive_id, name);
        }
    }

    /// Bookable vaccination types (id -> name)
    pub fn enabled(&self) -> &HashMap<u64, String> {
        &self.enabled
    }

    /// Vaccination types whose agendas are disabled (id -> name)
    pub fn disabled(&self) -> &HashMap<u64, String> {
        &self.disabled
    }

    /// Number of (center, type) pairs that will be queried for availability
    pub fn enabled_count(&self) -> usize {
        self.enabled.len()
    }
}
