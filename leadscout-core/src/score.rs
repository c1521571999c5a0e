//! Digital-presence scoring
//!
//! A weighted sum over discovered channels, normalized to 0-100. Boolean
//! channels earn their full weight when present; count-carrying channels
//! (social followers, reviews) earn half their weight on bare presence and
//! saturate toward the full weight as counts grow. Adding a presence
//! signal never lowers the score.

use serde::{Deserialize, Serialize};

use crate::{Lead, MAX_SCORE};

/// Per-channel weights and count saturation points.
///
/// Weights are relative; the score is normalized by their sum, so scaling
/// every weight together changes nothing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreWeights {
    pub website: f64,
    pub social: f64,
    pub directory: f64,
    pub reviews: f64,
    pub phone: f64,
    pub email: f64,
    /// Follower count at which the social channel reaches 75% of its weight
    pub follower_midpoint: u32,
    /// Review count at which the reviews channel reaches 75% of its weight
    pub review_midpoint: u32,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            website: 30.0,
            social: 25.0,
            directory: 10.0,
            reviews: 15.0,
            phone: 10.0,
            email: 10.0,
            follower_midpoint: 500,
            review_midpoint: 50,
        }
    }
}

impl ScoreWeights {
    /// Score a lead's digital presence in `[0, 100]`.
    ///
    /// Pure over the lead's presence fields: same lead, same score.
    pub fn score(&self, lead: &Lead) -> f64 {
        let total = self.website + self.social + self.directory + self.reviews + self.phone + self.email;
        if total <= 0.0 {
            return 0.0;
        }

        let presence = lead.presence();
        let mut earned = 0.0;
        if presence.website {
            earned += self.website;
        }
        if presence.social {
            earned += counted(self.social, lead.followers, self.follower_midpoint);
        }
        if presence.directory {
            earned += self.directory;
        }
        if presence.reviews {
            earned += counted(self.reviews, lead.review_count, self.review_midpoint);
        }
        if presence.phone {
            earned += self.phone;
        }
        if presence.email {
            earned += self.email;
        }

        MAX_SCORE * earned / total
    }
}

/// Half the weight for bare presence, the rest saturating with the count
fn counted(weight: f64, count: Option<u32>, midpoint: u32) -> f64 {
    let n = count.unwrap_or(0) as f64;
    let m = midpoint.max(1) as f64;
    weight * (0.5 + 0.5 * n / (n + m))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_lead() -> Lead {
        Lead::new("Acme Dental", "dentist", "Springfield", "google_places")
    }

    #[test]
    fn empty_lead_scores_zero() {
        let weights = ScoreWeights::default();
        assert_eq!(weights.score(&base_lead()), 0.0);
    }

    #[test]
    fn every_flag_raises_the_score() {
        let weights = ScoreWeights::default();
        let mut lead = base_lead();
        let mut last = weights.score(&lead);

        lead.domain = Some("acme.com".to_string());
        let s = weights.score(&lead);
        assert!(s > last);
        last = s;

        lead.instagram = Some("@acme".to_string());
        let s = weights.score(&lead);
        assert!(s > last);
        last = s;

        lead.listing_id = Some("place-1".to_string());
        let s = weights.score(&lead);
        assert!(s > last);
        last = s;

        lead.rating = Some(4.2);
        let s = weights.score(&lead);
        assert!(s > last);
        last = s;

        lead.phone = Some("5551230000".to_string());
        let s = weights.score(&lead);
        assert!(s > last);
        last = s;

        lead.email = Some("hi@acme.com".to_string());
        let s = weights.score(&lead);
        assert!(s > last);
        assert!(s <= MAX_SCORE);
    }

    #[test]
    fn growing_counts_never_lower_the_score() {
        let weights = ScoreWeights::default();
        let mut lead = base_lead();
        lead.instagram = Some("@acme".to_string());
        lead.rating = Some(4.0);

        let mut last = weights.score(&lead);
        for (followers, reviews) in [(0, 0), (10, 2), (500, 50), (50_000, 4_000)] {
            lead.followers = Some(followers);
            lead.review_count = Some(reviews);
            let s = weights.score(&lead);
            assert!(s >= last, "followers={followers} reviews={reviews}");
            last = s;
        }
    }

    #[test]
    fn scoring_is_deterministic() {
        let weights = ScoreWeights::default();
        let mut lead = base_lead();
        lead.domain = Some("acme.com".to_string());
        lead.followers = Some(123);
        lead.instagram = Some("@acme".to_string());

        assert_eq!(weights.score(&lead), weights.score(&lead));
    }

    #[test]
    fn score_stays_in_range_when_everything_is_present() {
        let weights = ScoreWeights::default();
        let mut lead = base_lead();
        lead.domain = Some("acme.com".to_string());
        lead.instagram = Some("@acme".to_string());
        lead.facebook = Some("acme".to_string());
        lead.followers = Some(u32::MAX);
        lead.listing_id = Some("place-1".to_string());
        lead.rating = Some(5.0);
        lead.review_count = Some(u32::MAX);
        lead.phone = Some("5551230000".to_string());
        lead.email = Some("hi@acme.com".to_string());

        let s = weights.score(&lead);
        assert!(s > 90.0 && s <= MAX_SCORE);
    }

    #[test]
    fn website_plus_social_beats_website_alone() {
        let weights = ScoreWeights::default();
        let mut plain = base_lead();
        plain.domain = Some("acme.com".to_string());

        let mut social = plain.clone();
        social.instagram = Some("@acme".to_string());
        social.followers = Some(500);

        assert!(weights.score(&social) > weights.score(&plain));
    }

    #[test]
    fn zeroed_weights_score_zero() {
        let weights = ScoreWeights {
            website: 0.0,
            social: 0.0,
            directory: 0.0,
            reviews: 0.0,
            phone: 0.0,
            email: 0.0,
            ..ScoreWeights::default()
        };
        let mut lead = base_lead();
        lead.domain = Some("acme.com".to_string());
        assert_eq!(weights.score(&lead), 0.0);
    }
}
