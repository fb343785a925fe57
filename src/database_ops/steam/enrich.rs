use serde::Serialize;
use tracing::{error, info, warn};

use super::provider::{AppDetails, SteamAdapter, SteamCandidate};
use crate::database_ops::source::SourceError;
use crate::util::http::JsonFetcher;

/// Category the store labels full controller support.
pub const CATEGORY_FULL_CONTROLLER: i64 = 59;
/// Category the store labels partial controller support.
pub const CATEGORY_PARTIAL_CONTROLLER: i64 = 18;

/// Best-effort Steam Deck playability guess.
///
/// The public appdetails payload carries no Deck verification status, so this
/// treats controller support (category 59 or 18) or a native Linux build as a
/// proxy. It is an approximation: it will flag titles Valve rates unsupported
/// and miss verified titles lacking both signals. Keep it as-is until the
/// upstream API exposes a real verification field.
pub fn deck_compatible(category_ids: impl IntoIterator<Item = i64>, linux: bool) -> bool {
    linux
        || category_ids
            .into_iter()
            .any(|id| id == CATEGORY_FULL_CONTROLLER || id == CATEGORY_PARTIAL_CONTROLLER)
}

pub fn passes_discount(candidate: &SteamCandidate, min_discount: i64) -> bool {
    candidate.discount_percent >= min_discount
}

/// Keep candidates discounted by at least `min_discount` percent.
pub fn filter_by_discount(candidates: Vec<SteamCandidate>, min_discount: i64) -> Vec<SteamCandidate> {
    candidates
        .into_iter()
        .filter(|c| passes_discount(c, min_discount))
        .collect()
}

/// A candidate after its single appdetails attempt.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnrichedGame {
    pub candidate: SteamCandidate,
    pub steam_deck_compatible: bool,
    pub metacritic_score: Option<i64>,
    /// True when details were unavailable and defaults were applied.
    pub degraded: bool,
}

impl EnrichedGame {
    /// Fallback when details cannot be obtained: candidate untouched,
    /// `compatible=false`, no score.
    pub fn degraded(candidate: SteamCandidate) -> Self {
        Self {
            candidate,
            steam_deck_compatible: false,
            metacritic_score: None,
            degraded: true,
        }
    }

    pub fn from_details(mut candidate: SteamCandidate, details: &AppDetails) -> Self {
        if let Some(image) = details.header_image.as_deref().filter(|s| !s.trim().is_empty()) {
            candidate.header_image = image.to_string();
        }
        Self {
            steam_deck_compatible: deck_compatible(details.category_ids(), details.linux()),
            metacritic_score: details.metacritic_score(),
            candidate,
            degraded: false,
        }
    }
}

impl<'a, F: JsonFetcher> SteamAdapter<'a, F> {
    /// One enrichment attempt. Never fails: any fetch or parse problem yields
    /// [`EnrichedGame::degraded`].
    pub async fn enrich(&self, candidate: SteamCandidate) -> EnrichedGame {
        let app_id = candidate.app_id.clone();
        match self.fetch_app_details(&app_id).await {
            Ok(details) => {
                let enriched = EnrichedGame::from_details(candidate, &details);
                info!(
                    app_id = %app_id,
                    name = %enriched.candidate.name,
                    deck = enriched.steam_deck_compatible,
                    metacritic = ?enriched.metacritic_score,
                    "steam: enriched"
                );
                enriched
            }
            Err(SourceError::Parse(err)) => {
                warn!(app_id = %app_id, error = %err, "steam: no usable details; using defaults");
                EnrichedGame::degraded(candidate)
            }
            Err(SourceError::Fetch(err)) => {
                error!(app_id = %app_id, error = %err, "steam: failed to fetch details; using defaults");
                EnrichedGame::degraded(candidate)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SteamSettings;
    use crate::testing::{steam_settings, Reply, ScriptedFetcher};
    use serde_json::json;

    fn candidate(app_id: &str, discount: i64) -> SteamCandidate {
        SteamCandidate {
            app_id: app_id.into(),
            name: format!("Game {app_id}"),
            final_price: 4.99,
            original_price: 19.99,
            discount_percent: discount,
            header_image: "https://cdn/capsule.jpg".into(),
        }
    }

    #[test]
    fn compatibility_heuristic() {
        assert!(deck_compatible([59], false));
        assert!(deck_compatible([18], false));
        assert!(!deck_compatible([1, 2, 3], false));
        assert!(deck_compatible([], true));
        assert!(!deck_compatible([], false));
    }

    #[test]
    fn discount_threshold_is_inclusive() {
        for d in [0, 10, 49] {
            assert!(!passes_discount(&candidate("1", d), 50), "{d}");
        }
        for d in [50, 51, 100] {
            assert!(passes_discount(&candidate("1", d), 50), "{d}");
        }
        let kept = filter_by_discount(
            vec![candidate("a", 80), candidate("b", 40), candidate("c", 60)],
            50,
        );
        let ids: Vec<_> = kept.iter().map(|c| c.app_id.as_str()).collect();
        assert_eq!(ids, ["a", "c"]);
    }

    #[test]
    fn details_override_image_only_when_present() {
        let with_image = AppDetails {
            header_image: Some("https://cdn/header.jpg".into()),
            ..Default::default()
        };
        let blank_image = AppDetails {
            header_image: Some("  ".into()),
            ..Default::default()
        };
        assert_eq!(
            EnrichedGame::from_details(candidate("1", 60), &with_image).candidate.header_image,
            "https://cdn/header.jpg"
        );
        assert_eq!(
            EnrichedGame::from_details(candidate("1", 60), &blank_image).candidate.header_image,
            "https://cdn/capsule.jpg"
        );
    }

    async fn enrich_with(reply: Reply) -> EnrichedGame {
        let settings: SteamSettings = steam_settings();
        let fetcher = ScriptedFetcher::new(move |_, _| reply.clone());
        SteamAdapter::new(&fetcher, &settings)
            .enrich(candidate("42", 75))
            .await
    }

    #[tokio::test]
    async fn unsuccessful_details_degrade_and_preserve_candidate() {
        let enriched = enrich_with(Reply::Json(json!({ "42": { "success": false } }))).await;
        assert_eq!(enriched, EnrichedGame::degraded(candidate("42", 75)));
        assert!(!enriched.steam_deck_compatible);
        assert_eq!(enriched.metacritic_score, None);
    }

    #[tokio::test]
    async fn missing_key_and_http_failure_degrade() {
        let missing = enrich_with(Reply::Json(json!({ "43": { "success": true } }))).await;
        assert!(missing.degraded);
        let failed = enrich_with(Reply::Status(503)).await;
        assert!(failed.degraded);
        assert_eq!(failed.candidate, candidate("42", 75));
    }

    #[tokio::test]
    async fn successful_details_fill_derived_fields() {
        let enriched = enrich_with(Reply::Json(json!({ "42": { "success": true, "data": {
            "categories": [{ "id": 2 }, { "id": 59 }],
            "platforms": { "windows": true, "mac": false, "linux": false },
            "metacritic": { "score": 81 },
            "header_image": "https://cdn/header.jpg"
        }}})))
        .await;
        assert!(!enriched.degraded);
        assert!(enriched.steam_deck_compatible);
        assert_eq!(enriched.metacritic_score, Some(81));
        assert_eq!(enriched.candidate.header_image, "https://cdn/header.jpg");
        assert_eq!(enriched.candidate.final_price, 4.99);
    }

    #[tokio::test]
    async fn float_score_keeps_enrichment() {
        let enriched = enrich_with(Reply::Json(json!({ "42": { "success": true, "data": {
            "categories": [{ "id": 59 }],
            "metacritic": { "score": 86.0 }
        }}})))
        .await;
        assert!(!enriched.degraded);
        assert!(enriched.steam_deck_compatible);
        assert_eq!(enriched.metacritic_score, Some(86));
    }

    #[tokio::test]
    async fn null_linux_flag_keeps_controller_signal() {
        let enriched = enrich_with(Reply::Json(json!({ "42": { "success": true, "data": {
            "categories": [{ "id": 18 }],
            "platforms": { "windows": true, "linux": null }
        }}})))
        .await;
        assert!(!enriched.degraded);
        assert!(enriched.steam_deck_compatible);
        assert_eq!(enriched.metacritic_score, None);
    }
}
