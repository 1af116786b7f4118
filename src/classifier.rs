//! Turns raw catalog records into [`Center`] entities
//!
//! Every place with at least one practice id becomes a center keyed by its
//! first practice id. Agendas then attach themselves to their center and
//! classify each referenced vaccination type as enabled or disabled. When
//! several agendas of one center reference the same type, the last agenda
//! processed decides its classification.

use std::collections::HashMap;

use crate::models::{CatalogData, Center};

/// Build the center set for one collection cycle
///
/// Agendas whose practice id matches no place are skipped with a warning.
/// The order of the returned centers is not meaningful.
pub fn classify(catalog: &CatalogData) -> Vec<Center> {
    let motive_names: HashMap<u64, &str> = catalog
        .visit_motives
        .iter()
        .map(|m| (m.id, m.name.as_str()))
        .collect();

    let mut centers: HashMap<u64, Center> = HashMap::new();
    for place in &catalog.places {
        let Some(&practice_id) = place.practice_ids.first() else {
            tracing::debug!(place = %place.name, "Skipping place without practice ids");
            continue;
        };
        centers.insert(practice_id, Center::new(practice_id, place.name.clone()));
    }

    for agenda in &catalog.agendas {
        let Some(center) = agenda.practice_id.and_then(|id| centers.get_mut(&id)) else {
            tracing::warn!(
                agenda_id = agenda.id,
                practice_id = ?agenda.practice_id,
                "Agenda references unknown practice, skipping"
            );
            continue;
        };

        center.agenda_ids.push(agenda.id);

        let disabled = agenda.is_disabled();
        for &motive_id in &agenda.visit_motive_ids {
            let name = motive_names.get(&motive_id).copied().unwrap_or_else(|| {
                tracing::debug!(
                    motive_id,
                    agenda_id = agenda.id,
                    "Vaccination type missing from catalog motives"
                );
                ""
            });
            center.classify(motive_id, name, disabled);
        }
    }

    centers.into_values().collect()
}
