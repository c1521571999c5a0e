//! Canonical lead record and identity keys
//!
//! Every source adapter normalizes into `Lead`. Identity keys let the
//! pipeline recognize the same business across sources: the normalized
//! website domain when one is known, else the normalized phone, else a
//! digest of name and city.

use std::collections::BTreeSet;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// A prospective business entity, accumulated across sources
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lead {
    /// Business name as reported by the most trusted source
    pub name: String,
    /// Niche the originating search targeted
    pub niche: String,
    /// City the originating search targeted
    pub city: String,
    /// Street address
    pub address: Option<String>,
    /// Normalized phone (digits only, country prefix stripped)
    pub phone: Option<String>,
    pub email: Option<String>,
    /// Website URL as reported
    pub website: Option<String>,
    /// Normalized website host: no scheme, no `www.`, no path
    pub domain: Option<String>,
    /// Instagram profile URL or handle
    pub instagram: Option<String>,
    /// Facebook profile URL or handle
    pub facebook: Option<String>,
    /// Social follower count, when a source exposes one
    pub followers: Option<u32>,
    /// Directory listing id (e.g. a Places `place_id`)
    pub listing_id: Option<String>,
    /// When the directory listing was last seen upstream
    pub listing_seen: Option<DateTime<Utc>>,
    /// Review rating (0.0 - 5.0)
    pub rating: Option<f64>,
    /// Number of reviews behind the rating
    pub review_count: Option<u32>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    /// Sources that contributed to this record
    pub source_tags: BTreeSet<String>,
    /// Digital-presence score, absent until the scorer runs
    pub score: Option<f64>,
    /// When this record was first collected
    pub collected_at: DateTime<Utc>,
}

impl Lead {
    /// Create an empty lead for one query context and contributing source
    pub fn new(name: impl Into<String>, niche: impl Into<String>, city: impl Into<String>, source: &str) -> Self {
        let mut source_tags = BTreeSet::new();
        source_tags.insert(source.to_string());

        Self {
            name: name.into(),
            niche: niche.into(),
            city: city.into(),
            address: None,
            phone: None,
            email: None,
            website: None,
            domain: None,
            instagram: None,
            facebook: None,
            followers: None,
            listing_id: None,
            listing_seen: None,
            rating: None,
            review_count: None,
            latitude: None,
            longitude: None,
            source_tags,
            score: None,
            collected_at: Utc::now(),
        }
    }

    /// Deterministic key identifying the real-world entity behind this lead.
    ///
    /// Preference order: domain, phone, then name+city. Recomputing after a
    /// merge yields the key of the group the lead was merged under, because
    /// grouping already guarantees every member shares the winning basis.
    pub fn identity_key(&self) -> IdentityKey {
        if let Some(domain) = non_empty(self.domain.as_deref()) {
            return IdentityKey::Domain(domain.to_string());
        }
        if let Some(phone) = non_empty(self.phone.as_deref()) {
            return IdentityKey::Phone(phone.to_string());
        }
        IdentityKey::Name(name_city_digest(&self.name, &self.city))
    }

    /// Channel presence flags derived from populated fields
    pub fn presence(&self) -> Presence {
        Presence {
            website: non_empty(self.domain.as_deref()).is_some(),
            social: non_empty(self.instagram.as_deref()).is_some()
                || non_empty(self.facebook.as_deref()).is_some(),
            directory: non_empty(self.listing_id.as_deref()).is_some(),
            reviews: self.rating.is_some() || self.review_count.is_some_and(|c| c > 0),
            phone: non_empty(self.phone.as_deref()).is_some(),
            email: non_empty(self.email.as_deref()).is_some(),
        }
    }
}

/// Which channels a lead has been discovered on
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Presence {
    pub website: bool,
    pub social: bool,
    pub directory: bool,
    pub reviews: bool,
    pub phone: bool,
    pub email: bool,
}

/// Deterministic cross-source identity of a lead
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "basis", content = "value", rename_all = "snake_case")]
pub enum IdentityKey {
    /// Keyed by normalized website domain
    Domain(String),
    /// Keyed by normalized phone digits
    Phone(String),
    /// Keyed by a digest of folded name and city
    Name(String),
}

impl fmt::Display for IdentityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IdentityKey::Domain(d) => write!(f, "domain:{d}"),
            IdentityKey::Phone(p) => write!(f, "phone:{p}"),
            IdentityKey::Name(n) => write!(f, "name:{n}"),
        }
    }
}

/// Casefold and collapse internal whitespace
pub fn fold(value: &str) -> String {
    value.split_whitespace().collect::<Vec<_>>().join(" ").to_lowercase()
}

fn name_city_digest(name: &str, city: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(fold(name).as_bytes());
    hasher.update(b"|");
    hasher.update(fold(city).as_bytes());
    format!("{:x}", hasher.finalize())[..16].to_string()
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}
