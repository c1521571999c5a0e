//! SerpAPI source
//!
//! One `google_maps` engine search per query; `local_results` map
//! straight onto raw leads.

use async_trait::async_trait;
use serde::Deserialize;
use tracing::info;

use crate::raw::RawLead;
use crate::traits::{LeadSource, SearchQuery, SourceError, SourceHttp};

/// Source tag for SerpAPI
pub const SERPAPI_TAG: &str = "serpapi";

const SEARCH_URL: &str = "https://serpapi.com/search.json";

pub struct SerpApiSource {
    api_key: String,
    http: SourceHttp,
}

impl SerpApiSource {
    pub fn new(api_key: String, http: SourceHttp) -> Self {
        Self { api_key, http }
    }
}

#[async_trait]
impl LeadSource for SerpApiSource {
    fn name(&self) -> &'static str {
        SERPAPI_TAG
    }

    async fn fetch(&self, query: &SearchQuery, out: &mut Vec<RawLead>) -> Result<(), SourceError> {
        let text = query.text();
        let params = [
            ("engine", "google_maps"),
            ("q", text.as_str()),
            ("api_key", self.api_key.as_str()),
        ];
        let response: SerpResponse = self.http.get_json(SEARCH_URL, &params).await?;

        if let Some(error) = response.error {
            return Err(SourceError::Parse(error));
        }

        info!("serpapi returned {} results for '{}'", response.local_results.len(), text);
        for item in response.local_results {
            out.push(raw_from(query, item));
        }
        Ok(())
    }
}

fn raw_from(query: &SearchQuery, item: LocalResult) -> RawLead {
    let mut raw = RawLead::new(SERPAPI_TAG, query.niche.clone(), query.city.clone());
    raw.name = item.title;
    raw.address = item.address;
    raw.phone = item.phone;
    raw.website = item.website;
    raw.rating = item.rating;
    raw.review_count = item.reviews;
    raw.listing_id = item.place_id;
    if let Some(gps) = item.gps_coordinates {
        raw.latitude = Some(gps.latitude);
        raw.longitude = Some(gps.longitude);
    }
    raw
}

#[derive(Debug, Deserialize)]
struct SerpResponse {
    #[serde(default)]
    local_results: Vec<LocalResult>,
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct LocalResult {
    title: Option<String>,
    address: Option<String>,
    phone: Option<String>,
    website: Option<String>,
    rating: Option<f64>,
    reviews: Option<u32>,
    place_id: Option<String>,
    gps_coordinates: Option<GpsCoordinates>,
}

#[derive(Debug, Deserialize)]
struct GpsCoordinates {
    latitude: f64,
    longitude: f64,
}
