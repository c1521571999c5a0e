//! Duplicate collapsing across sources
//!
//! Leads are grouped by identity key. Within a group fields merge under a
//! union policy: presence accumulates, conflicting values take the more
//! trusted source's side, ties go to the record encountered first.

use std::collections::HashMap;

use tracing::debug;

use crate::{IdentityKey, Lead};

/// Trust ordering over source tags, most trusted first.
///
/// Tags not in the ranking sort behind every ranked tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrustRanking {
    order: Vec<String>,
}

impl Default for TrustRanking {
    fn default() -> Self {
        Self::new(["google_places", "serpapi"].map(String::from))
    }
}

impl TrustRanking {
    pub fn new<I>(order: I) -> Self
    where
        I: IntoIterator<Item = String>,
    {
        Self { order: order.into_iter().collect() }
    }

    /// Best (lowest) rank among a lead's source tags
    fn rank(&self, lead: &Lead) -> usize {
        lead.source_tags
            .iter()
            .map(|tag| self.order.iter().position(|o| o == tag).unwrap_or(self.order.len()))
            .min()
            .unwrap_or(self.order.len())
    }
}

/// Merge `other` into `into` under the union policy.
///
/// `into` is the earlier-encountered record, so it wins trust ties. Any
/// previously assigned score is cleared; a merged record must be rescored.
pub fn merge_into(into: &mut Lead, other: Lead, ranking: &TrustRanking) {
    let keep = ranking.rank(into) <= ranking.rank(&other);

    if !keep && !other.name.trim().is_empty() {
        into.name = other.name;
        into.niche = other.niche;
        into.city = other.city;
    }

    pick(&mut into.address, other.address, keep);
    pick(&mut into.phone, other.phone, keep);
    pick(&mut into.email, other.email, keep);
    pick(&mut into.website, other.website, keep);
    pick(&mut into.domain, other.domain, keep);
    pick(&mut into.instagram, other.instagram, keep);
    pick(&mut into.facebook, other.facebook, keep);
    pick(&mut into.followers, other.followers, keep);
    pick(&mut into.listing_id, other.listing_id, keep);
    pick(&mut into.listing_seen, other.listing_seen, keep);
    pick(&mut into.rating, other.rating, keep);
    pick(&mut into.review_count, other.review_count, keep);
    pick(&mut into.latitude, other.latitude, keep);
    pick(&mut into.longitude, other.longitude, keep);

    if other.collected_at < into.collected_at {
        into.collected_at = other.collected_at;
    }
    into.source_tags.extend(other.source_tags);
    into.score = None;
}

/// Union policy for one field: gaps always fill, conflicts go to the
/// trusted side (`keep` means the existing value wins).
fn pick<T>(into: &mut Option<T>, other: Option<T>, keep: bool) {
    if let Some(value) = other {
        if into.is_none() || !keep {
            *into = Some(value);
        }
    }
}

/// Collapse leads sharing an identity key into one record each.
///
/// Output order follows first encounter of each key and is otherwise not
/// guaranteed stable; callers needing a fixed order sort downstream.
pub fn dedupe(leads: Vec<Lead>, ranking: &TrustRanking) -> Vec<Lead> {
    let total = leads.len();
    let mut order: Vec<IdentityKey> = Vec::new();
    let mut by_key: HashMap<IdentityKey, Lead> = HashMap::new();

    for lead in leads {
        let key = lead.identity_key();
        match by_key.get_mut(&key) {
            Some(existing) => merge_into(existing, lead, ranking),
            None => {
                order.push(key.clone());
                by_key.insert(key, lead);
            }
        }
    }

    debug!("collapsed {} leads into {} distinct entities", total, order.len());
    order.into_iter().filter_map(|key| by_key.remove(&key)).collect()
}
