//! Availability endpoint and next-date resolution
//!
//! The upstream returns up to [`RESULT_LIMIT`] per-date windows starting at
//! the requested date, plus an optional `next_slot` hint pointing further
//! ahead when none of those windows has slots. The next available date is
//! the first window with at least one slot, falling back to the hint.

use async_trait::async_trait;
use chrono::NaiveDate;

use super::DoctolibClient;
use crate::models::AvailabilityResponse;
use crate::utils::error::{FetchError, ParseError};
use crate::utils::{format_date, join_ids, parse_date};

/// Only publicly insured patients are considered
pub const INSURANCE_SECTOR: &str = "public";

/// Number of per-date windows requested
pub const RESULT_LIMIT: u32 = 4;

/// Availability request for one (center, vaccination type) pair
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AvailabilityQuery {
    /// First date to search from
    pub start_date: NaiveDate,

    /// Center (practice) id
    pub practice_id: u64,

    /// Vaccination type id
    pub motive_id: u64,

    /// All agendas of the center
    pub agenda_ids: Vec<u64>,
}

impl AvailabilityQuery {
    /// Query parameters in request order
    pub fn params(&self) -> Vec<(&'static str, String)> {
        vec![
            ("start_date", format_date(self.start_date)),
            ("visit_motive_ids", self.motive_id.to_string()),
            ("agenda_ids", join_ids(&self.agenda_ids, "-")),
            ("insurance_sector", INSURANCE_SECTOR.to_string()),
            ("practice_ids", self.practice_id.to_string()),
            ("destroy_temporary", "true".to_string()),
            ("limit", RESULT_LIMIT.to_string()),
        ]
    }
}

/// Source of appointment availability
#[async_trait]
pub trait AvailabilityClient: Send + Sync {
    /// Fetch availability windows for one pair
    async fn fetch_availability(
        &self,
        query: &AvailabilityQuery,
    ) -> Result<AvailabilityResponse, FetchError>;
}

#[async_trait]
impl AvailabilityClient for DoctolibClient {
    async fn fetch_availability(
        &self,
        query: &AvailabilityQuery,
    ) -> Result<AvailabilityResponse, FetchError> {
        let mut url = self.endpoint("availabilities.json")?;
        url.query_pairs_mut().extend_pairs(query.params());

        let response: AvailabilityResponse = self.get_json(url).await?;

        if response.is_refusal() {
            tracing::debug!(
                practice_id = query.practice_id,
                motive_id = query.motive_id,
                reason = response.reason.as_deref().unwrap_or_default(),
                message = response.message.as_deref().unwrap_or_default(),
                "Upstream refused availability query"
            );
        }

        Ok(response)
    }
}

/// Raw next-date value: first window with slots, else the `next_slot` hint
///
/// Returns `None` when neither is present, which simply means no availability.
pub fn resolve_next_date(response: &AvailabilityResponse) -> Option<&str> {
    response
        .availabilities
        .iter()
        .find(|window| !window.slots.is_empty())
        .map(|window| window.date.as_str())
        .or_else(|| response.next_slot.as_deref().filter(|hint| !hint.is_empty()))
}

/// Resolve and parse the next available date
///
/// # Errors
///
/// Returns `ParseError::InvalidDate` if the resolved value is not `YYYY-MM-DD`
pub fn next_available_date(response: &AvailabilityResponse) -> Result<Option<NaiveDate>, ParseError> {
    resolve_next_date(response).map(parse_date).transpose()
}
