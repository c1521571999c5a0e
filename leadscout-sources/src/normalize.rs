//! RawLead -> Lead normalization
//!
//! A pure mapping. Missing optional fields leave their channels absent;
//! a record is only dropped when no identity-bearing field (domain,
//! phone, name) survives normalization. Website URLs that point at a
//! social network are reclassified as social profiles - they name a
//! channel, not the entity's own domain.

use std::collections::BTreeSet;
use std::sync::LazyLock;

use chrono::Utc;
use regex::Regex;

use leadscout_core::{Lead, MIN_PHONE_DIGITS};

use crate::raw::RawLead;

/// Host part of a URL-ish string, scheme and leading `www.` stripped
static HOST_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:[a-zA-Z][a-zA-Z0-9+.-]*://)?(?:www\.)?([^/:?#]+)").unwrap()
});

/// Normalization options shared by all sources
#[derive(Debug, Clone, Default)]
pub struct NormalizeOptions {
    /// Country calling code stripped from the front of phone numbers
    pub strip_country_prefix: Option<String>,
}

/// Why a raw lead was dropped; counted per run, never a pipeline error
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizeSkip {
    pub source: &'static str,
    pub reason: &'static str,
}

/// Map one raw record into the canonical shape.
pub fn normalize(raw: RawLead, opts: &NormalizeOptions) -> Result<Lead, NormalizeSkip> {
    let name = raw
        .name
        .as_deref()
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .map(str::to_string);
    let phone = raw.phone.as_deref().and_then(|p| normalize_phone(p, opts));
    let site = raw.website.as_deref().and_then(classify_site);

    let has_domain = matches!(site, Some(Site::Web { .. }));
    if !has_domain && phone.is_none() && name.is_none() {
        return Err(NormalizeSkip { source: raw.source, reason: "no identity-bearing field" });
    }

    let mut source_tags = BTreeSet::new();
    source_tags.insert(raw.source.to_string());

    let mut lead = Lead {
        name: name.unwrap_or_default(),
        niche: raw.niche,
        city: raw.city,
        address: raw.address,
        phone,
        email: raw.email,
        website: None,
        domain: None,
        instagram: raw.instagram,
        facebook: raw.facebook,
        followers: raw.followers,
        listing_id: raw.listing_id,
        listing_seen: None,
        rating: raw.rating,
        review_count: raw.review_count,
        latitude: raw.latitude,
        longitude: raw.longitude,
        source_tags,
        score: None,
        collected_at: Utc::now(),
    };

    match site {
        Some(Site::Web { url, domain }) => {
            lead.website = Some(url);
            lead.domain = Some(domain);
        }
        Some(Site::Instagram(url)) => {
            lead.instagram.get_or_insert(url);
        }
        Some(Site::Facebook(url)) => {
            lead.facebook.get_or_insert(url);
        }
        None => {}
    }
    if lead.listing_id.is_some() {
        lead.listing_seen = Some(lead.collected_at);
    }

    Ok(lead)
}

enum Site {
    Web { url: String, domain: String },
    Instagram(String),
    Facebook(String),
}

/// Classify a reported website URL, extracting the normalized host
fn classify_site(url: &str) -> Option<Site> {
    let domain = normalize_domain(url)?;
    let url = url.trim().to_string();
    if domain == "instagram.com" || domain.ends_with(".instagram.com") {
        return Some(Site::Instagram(url));
    }
    if domain == "facebook.com" || domain.ends_with(".facebook.com") {
        return Some(Site::Facebook(url));
    }
    Some(Site::Web { url, domain })
}

/// Lowercased host of a URL: no scheme, no `www.`, no path or port
pub fn normalize_domain(url: &str) -> Option<String> {
    let host = HOST_REGEX.captures(url.trim())?.get(1)?.as_str().to_lowercase();
    host.contains('.').then_some(host)
}

/// Digits-only phone, country prefix stripped, short numbers rejected
pub fn normalize_phone(phone: &str, opts: &NormalizeOptions) -> Option<String> {
    let mut digits: String = phone.chars().filter(char::is_ascii_digit).collect();
    if let Some(prefix) = opts.strip_country_prefix.as_deref() {
        if digits.starts_with(prefix) && digits.len() > prefix.len() {
            digits = digits[prefix.len()..].to_string();
        }
    }
    (digits.len() >= MIN_PHONE_DIGITS).then_some(digits)
}

#[cfg(test)]
mod tests {
    use super::*;
    use leadscout_core::IdentityKey;

    fn opts() -> NormalizeOptions {
        NormalizeOptions { strip_country_prefix: Some("55".to_string()) }
    }

    #[test]
    fn phone_strips_formatting_and_prefix() {
        assert_eq!(
            normalize_phone("+55 (11) 98765-4321", &opts()),
            Some("11987654321".to_string())
        );
        assert_eq!(normalize_phone("(11) 98765-4321", &opts()), Some("11987654321".to_string()));
        assert_eq!(normalize_phone("555-1234", &opts()), None);
        assert_eq!(normalize_phone("no digits here", &NormalizeOptions::default()), None);
    }

    #[test]
    fn domain_drops_scheme_www_and_path() {
        assert_eq!(normalize_domain("https://www.Acme.com/about?x=1"), Some("acme.com".to_string()));
        assert_eq!(normalize_domain("acme.com.br"), Some("acme.com.br".to_string()));
        assert_eq!(normalize_domain("http://acme.com:8080/shop"), Some("acme.com".to_string()));
        assert_eq!(normalize_domain("localhost"), None);
    }

    #[test]
    fn social_urls_become_profiles_not_websites() {
        let mut raw = RawLead::new("serpapi", "dentist", "Springfield");
        raw.name = Some("Acme Dental".to_string());
        raw.website = Some("https://www.instagram.com/acmedental".to_string());

        let lead = normalize(raw, &opts()).unwrap();
        assert_eq!(lead.domain, None);
        assert_eq!(lead.instagram.as_deref(), Some("https://www.instagram.com/acmedental"));
        assert!(lead.presence().social);
        assert!(!lead.presence().website);
    }

    #[test]
    fn missing_optional_fields_are_tolerated() {
        let mut raw = RawLead::new("google_places", "dentist", "Springfield");
        raw.name = Some("Acme Dental".to_string());

        let lead = normalize(raw, &opts()).unwrap();
        assert_eq!(lead.name, "Acme Dental");
        assert!(matches!(lead.identity_key(), IdentityKey::Name(_)));
        assert_eq!(lead.presence(), Default::default());
    }

    #[test]
    fn identity_free_records_are_skipped() {
        let mut raw = RawLead::new("serpapi", "dentist", "Springfield");
        raw.name = Some("   ".to_string());
        raw.phone = Some("123".to_string());
        raw.rating = Some(4.8);

        let skip = normalize(raw, &opts()).unwrap_err();
        assert_eq!(skip.source, "serpapi");
    }

    #[test]
    fn listing_id_marks_directory_presence() {
        let mut raw = RawLead::new("google_places", "dentist", "Springfield");
        raw.name = Some("Acme Dental".to_string());
        raw.listing_id = Some("place-123".to_string());

        let lead = normalize(raw, &opts()).unwrap();
        assert!(lead.presence().directory);
        assert!(lead.listing_seen.is_some());
    }

    #[test]
    fn full_record_keeps_everything() {
        let mut raw = RawLead::new("google_places", "dentist", "Springfield");
        raw.name = Some(" Acme Dental ".to_string());
        raw.address = Some("1 Main St".to_string());
        raw.phone = Some("+55 11 98765-4321".to_string());
        raw.website = Some("https://www.acme.com".to_string());
        raw.rating = Some(4.5);
        raw.review_count = Some(80);

        let lead = normalize(raw, &opts()).unwrap();
        assert_eq!(lead.name, "Acme Dental");
        assert_eq!(lead.domain.as_deref(), Some("acme.com"));
        assert_eq!(lead.identity_key(), IdentityKey::Domain("acme.com".to_string()));
        assert_eq!(lead.phone.as_deref(), Some("11987654321"));
        let presence = lead.presence();
        assert!(presence.website && presence.phone && presence.reviews);
    }
}
