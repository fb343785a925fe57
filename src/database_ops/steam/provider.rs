use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{info, warn};

use crate::config::SteamSettings;
use crate::database_ops::source::{ParseError, SourceError};
use crate::database_ops::stage::{SkipReason, Skipped, StageOutcome};
use crate::normalization::{de_external_id, de_whole_number};
use crate::normalization::price::cents_to_decimal;
use crate::util::http::JsonFetcher;

#[derive(Debug, Deserialize)]
struct FeaturedCategories {
    #[serde(default)]
    specials: Option<Specials>,
}

#[derive(Debug, Deserialize)]
struct Specials {
    #[serde(default)]
    items: Vec<Value>,
}

#[derive(Debug, Deserialize)]
struct FeaturedItem {
    #[serde(deserialize_with = "de_external_id")]
    id: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default, deserialize_with = "de_whole_number")]
    final_price: Option<i64>,
    #[serde(default, deserialize_with = "de_whole_number")]
    original_price: Option<i64>,
    #[serde(default, deserialize_with = "de_whole_number")]
    discount_percent: Option<i64>,
    #[serde(default)]
    large_capsule_image: Option<String>,
}

/// One discounted title from the featured specials listing, prices in decimal currency.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SteamCandidate {
    pub app_id: String,
    pub name: String,
    pub final_price: f64,
    pub original_price: f64,
    pub discount_percent: i64,
    pub header_image: String,
}

impl SteamCandidate {
    fn from_item(raw: Value) -> Result<Self, Skipped> {
        let hint = raw.get("id").map(|v| match v {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        });
        let item: FeaturedItem = serde_json::from_value(raw)
            .map_err(|e| Skipped::new(hint, SkipReason::Schema(e.to_string())))?;
        Ok(Self {
            app_id: item.id,
            name: item.name.unwrap_or_default(),
            final_price: cents_to_decimal(item.final_price.unwrap_or(0)),
            original_price: cents_to_decimal(item.original_price.unwrap_or(0)),
            discount_percent: item.discount_percent.unwrap_or(0),
            header_image: item.large_capsule_image.unwrap_or_default(),
        })
    }
}

#[derive(Debug, Deserialize)]
struct AppDetailsEnvelope {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    data: Option<Value>,
}

/// Subset of the appdetails `data` object used for enrichment. Sections are
/// decoded independently; a malformed one reads as absent.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AppDetails {
    pub categories: Option<Vec<Category>>,
    pub platforms: Option<Platforms>,
    pub metacritic: Option<Metacritic>,
    pub header_image: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Category {
    #[serde(default, deserialize_with = "de_whole_number")]
    pub id: Option<i64>,
    #[serde(default)]
    pub description: Option<String>,
}

/// Platform flags; `null` and absent both read as unsupported.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct Platforms {
    #[serde(default)]
    pub windows: Option<bool>,
    #[serde(default)]
    pub mac: Option<bool>,
    #[serde(default)]
    pub linux: Option<bool>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct Metacritic {
    #[serde(default, deserialize_with = "de_whole_number")]
    pub score: Option<i64>,
}

impl AppDetails {
    pub fn category_ids(&self) -> impl Iterator<Item = i64> + '_ {
        self.categories.iter().flatten().filter_map(|c| c.id)
    }

    pub fn linux(&self) -> bool {
        self.platforms.and_then(|p| p.linux).unwrap_or(false)
    }

    pub fn metacritic_score(&self) -> Option<i64> {
        self.metacritic.and_then(|m| m.score)
    }

    fn from_sections(app_id: &str, mut data: Map<String, Value>) -> Self {
        let categories = section::<Vec<Value>>(app_id, &mut data, "categories").map(|items| {
            items
                .into_iter()
                .filter_map(|c| serde_json::from_value::<Category>(c).ok())
                .collect()
        });
        Self {
            categories,
            platforms: section(app_id, &mut data, "platforms"),
            metacritic: section(app_id, &mut data, "metacritic"),
            header_image: section(app_id, &mut data, "header_image"),
        }
    }
}

fn section<T: DeserializeOwned>(app_id: &str, data: &mut Map<String, Value>, key: &str) -> Option<T> {
    let raw = data.remove(key).filter(|v| !v.is_null())?;
    match serde_json::from_value(raw) {
        Ok(value) => Some(value),
        Err(err) => {
            warn!(app_id, section = key, error = %err, "steam: ignoring malformed appdetails section");
            None
        }
    }
}

/// Parse an appdetails body. The payload is keyed by the requested id; a
/// missing key or `success: false` is a [`ParseError`], as is a `data` value
/// that is not an object.
pub fn parse_app_details(app_id: &str, body: Value) -> Result<AppDetails, ParseError> {
    let Value::Object(mut by_id) = body else {
        return Err(ParseError::MissingKey(app_id.to_string()));
    };
    let entry = by_id
        .remove(app_id)
        .ok_or_else(|| ParseError::MissingKey(app_id.to_string()))?;
    let envelope: AppDetailsEnvelope = serde_json::from_value(entry)?;
    if !envelope.success {
        return Err(ParseError::Unsuccessful(app_id.to_string()));
    }
    match envelope.data {
        None | Some(Value::Null) => Ok(AppDetails::default()),
        Some(data) => {
            let data: Map<String, Value> = serde_json::from_value(data)?;
            Ok(AppDetails::from_sections(app_id, data))
        }
    }
}

/// Parse the featured-categories body into candidates, isolating bad items.
pub fn parse_specials(body: Value) -> Result<StageOutcome<SteamCandidate>, ParseError> {
    let featured: FeaturedCategories = serde_json::from_value(body)?;
    let items = featured.specials.map(|s| s.items).unwrap_or_default();
    Ok(items.into_iter().map(SteamCandidate::from_item).collect())
}

/// Steam store adapter. Holds the injected fetcher by reference; owns nothing.
pub struct SteamAdapter<'a, F> {
    fetcher: &'a F,
    settings: &'a SteamSettings,
}

impl<'a, F: JsonFetcher> SteamAdapter<'a, F> {
    pub fn new(fetcher: &'a F, settings: &'a SteamSettings) -> Self {
        Self { fetcher, settings }
    }

    /// Fetch the featured specials listing.
    pub async fn fetch_specials(&self) -> Result<StageOutcome<SteamCandidate>, SourceError> {
        info!("steam: fetching discount list");
        let query = [
            ("l", self.settings.language.clone()),
            ("cc", self.settings.country.clone()),
        ];
        let body = self
            .fetcher
            .fetch(&self.settings.featured_url, &query, self.settings.timeout)
            .await?;
        let outcome = parse_specials(body)?;
        info!(
            count = outcome.kept.len(),
            skipped = outcome.skipped.len(),
            "steam: found games in specials"
        );
        Ok(outcome)
    }

    /// Fetch and parse appdetails for one app id.
    pub async fn fetch_app_details(&self, app_id: &str) -> Result<AppDetails, SourceError> {
        let query = [("appids", app_id.to_string())];
        let body = self
            .fetcher
            .fetch(&self.settings.appdetails_url, &query, self.settings.timeout)
            .await?;
        Ok(parse_app_details(app_id, body)?)
    }
}
