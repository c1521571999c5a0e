//! Google Places source
//!
//! One text search per query, following pagination tokens, then one
//! details request per result for the fields the search response does
//! not carry (phone, website, review totals). Only operational
//! businesses are kept.

use async_trait::async_trait;
use serde::Deserialize;
use tokio::time::Duration;
use tracing::{debug, info};

use crate::raw::RawLead;
use crate::traits::{LeadSource, SearchQuery, SourceError, SourceHttp};

/// Source tag for Google Places
pub const PLACES_TAG: &str = "google_places";

const TEXT_SEARCH_URL: &str = "https://maps.googleapis.com/maps/api/place/textsearch/json";
const DETAILS_URL: &str = "https://maps.googleapis.com/maps/api/place/details/json";
const DETAIL_FIELDS: &str = "name,formatted_phone_number,website,formatted_address,geometry,rating,user_ratings_total,business_status";
const OPERATIONAL: &str = "OPERATIONAL";

/// Pagination tokens take a moment to become valid upstream
const PAGE_TOKEN_DELAY: Duration = Duration::from_secs(2);

/// Cap on raw leads fetched per query
const MAX_LEADS_PER_QUERY: usize = 60;

pub struct PlacesSource {
    api_key: String,
    http: SourceHttp,
}

impl PlacesSource {
    pub fn new(api_key: String, http: SourceHttp) -> Self {
        Self { api_key, http }
    }

    async fn text_search(
        &self,
        query: &SearchQuery,
        page_token: Option<&str>,
    ) -> Result<SearchResponse, SourceError> {
        let text = query.text();
        let mut params = vec![("query", text.as_str()), ("key", self.api_key.as_str())];
        if let Some(token) = page_token {
            params.push(("pagetoken", token));
        }
        let response: SearchResponse = self.http.get_json(TEXT_SEARCH_URL, &params).await?;
        check_status(&response.status)?;
        Ok(response)
    }

    async fn details(&self, place_id: &str) -> Result<Option<PlaceDetails>, SourceError> {
        let params = [
            ("place_id", place_id),
            ("fields", DETAIL_FIELDS),
            ("key", self.api_key.as_str()),
        ];
        let response: DetailsResponse = self.http.get_json(DETAILS_URL, &params).await?;
        check_status(&response.status)?;
        Ok(response.result)
    }
}

#[async_trait]
impl LeadSource for PlacesSource {
    fn name(&self) -> &'static str {
        PLACES_TAG
    }

    async fn fetch(&self, query: &SearchQuery, out: &mut Vec<RawLead>) -> Result<(), SourceError> {
        let start = out.len();
        let mut page_token: Option<String> = None;

        loop {
            if page_token.is_some() {
                tokio::time::sleep(PAGE_TOKEN_DELAY).await;
            }
            let page = self.text_search(query, page_token.as_deref()).await?;
            debug!("places returned {} results for '{}'", page.results.len(), query.text());

            for summary in page.results {
                if summary.business_status.as_deref() != Some(OPERATIONAL) {
                    continue;
                }
                let Some(place_id) = summary.place_id.clone() else {
                    continue;
                };

                let details = self.details(&place_id).await?;
                let Some(details) = details else { continue };
                if details.business_status.as_deref() != Some(OPERATIONAL) {
                    continue;
                }

                out.push(raw_from(query, summary, details, place_id));
                if out.len() - start >= MAX_LEADS_PER_QUERY {
                    info!("places hit the per-query cap for '{}'", query.text());
                    return Ok(());
                }
            }

            match page.next_page_token {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }

        info!("places yielded {} leads for '{}'", out.len() - start, query.text());
        Ok(())
    }
}

/// Places replies 200 with an application status; only some mean data
fn check_status(status: &str) -> Result<(), SourceError> {
    match status {
        "OK" | "ZERO_RESULTS" => Ok(()),
        "REQUEST_DENIED" => Err(SourceError::Auth("request denied".to_string())),
        other => Err(SourceError::Parse(format!("places status {other}"))),
    }
}

/// Combine the search summary and the details reply into one raw record
fn raw_from(
    query: &SearchQuery,
    summary: PlaceSummary,
    details: PlaceDetails,
    place_id: String,
) -> RawLead {
    let mut raw = RawLead::new(PLACES_TAG, query.niche.clone(), query.city.clone());
    raw.name = details.name.or(summary.name);
    raw.address = details.formatted_address.or(summary.formatted_address);
    raw.phone = details.formatted_phone_number;
    raw.website = details.website;
    raw.rating = details.rating;
    raw.review_count = details.user_ratings_total;
    raw.listing_id = Some(place_id);
    if let Some(location) = summary.geometry.and_then(|g| g.location) {
        raw.latitude = Some(location.lat);
        raw.longitude = Some(location.lng);
    }
    raw
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    status: String,
    #[serde(default)]
    results: Vec<PlaceSummary>,
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PlaceSummary {
    place_id: Option<String>,
    name: Option<String>,
    formatted_address: Option<String>,
    business_status: Option<String>,
    geometry: Option<Geometry>,
}

#[derive(Debug, Deserialize)]
struct Geometry {
    location: Option<Location>,
}

#[derive(Debug, Deserialize)]
struct Location {
    lat: f64,
    lng: f64,
}

#[derive(Debug, Deserialize)]
struct DetailsResponse {
    status: String,
    result: Option<PlaceDetails>,
}

#[derive(Debug, Deserialize)]
struct PlaceDetails {
    name: Option<String>,
    formatted_phone_number: Option<String>,
    website: Option<String>,
    formatted_address: Option<String>,
    rating: Option<f64>,
    user_ratings_total: Option<u32>,
    business_status: Option<String>,
}
