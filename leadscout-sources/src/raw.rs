//! Pre-normalization lead records
//!
//! `RawLead` is the untrusted shape an adapter yields before
//! normalization: values carried exactly as the source reported them,
//! every field optional. It lives only until the normalizer runs.

/// One record as yielded by a source adapter
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawLead {
    /// Tag of the adapter that produced this record
    pub source: &'static str,
    /// Niche of the originating query
    pub niche: String,
    /// City of the originating query
    pub city: String,
    pub name: Option<String>,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub website: Option<String>,
    pub instagram: Option<String>,
    pub facebook: Option<String>,
    pub followers: Option<u32>,
    pub listing_id: Option<String>,
    pub rating: Option<f64>,
    pub review_count: Option<u32>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

impl RawLead {
    /// Empty record for one source and query context
    pub fn new(source: &'static str, niche: impl Into<String>, city: impl Into<String>) -> Self {
        Self {
            source,
            niche: niche.into(),
            city: city.into(),
            ..Self::default()
        }
    }
}
