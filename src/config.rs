//! Run configuration resolved from the process environment (and `.env`).
//!
//! Everything is validated up front: a missing credential or an unparsable
//! knob is a [`ConfigError`] raised before any pipeline stage runs.
use std::time::Duration;

use crate::util::env::{env_opt, parse_flag, prefer_session_mode};

pub const STEAM_FEATURED_URL: &str = "https://store.steampowered.com/api/featuredcategories/";
pub const STEAM_APPDETAILS_URL: &str = "https://store.steampowered.com/api/appdetails";
pub const TMDB_BASE_URL: &str = "https://api.themoviedb.org/3";

const DB_URL_KEYS: [&str; 3] = ["SUPABASE_DB_URL", "DATABASE_URL", "DB_URL"];

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("missing required env: {0:?}")]
    Missing(Vec<&'static str>),
    #[error("invalid value for {key}: {value:?} ({reason})")]
    Invalid {
        key: &'static str,
        value: String,
        reason: &'static str,
    },
}

/// Settings for the Steam specials pipeline.
#[derive(Debug, Clone, PartialEq)]
pub struct SteamSettings {
    pub featured_url: String,
    pub appdetails_url: String,
    pub country: String,
    pub language: String,
    pub min_discount: i64,
    pub detail_delay: Duration,
    pub timeout: Duration,
    pub table: String,
}

/// Settings for the TMDB movie pipeline.
#[derive(Debug, Clone, PartialEq)]
pub struct MovieSettings {
    pub base_url: String,
    pub api_key: String,
    pub language: String,
    pub popular_pages: Vec<u32>,
    pub delay: Duration,
    pub timeout: Duration,
    pub table: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EtlConfig {
    pub database_url: String,
    pub db_max_conns: u32,
    pub steam: SteamSettings,
    /// Present only when the movie pipeline was requested.
    pub movies: Option<MovieSettings>,
}

impl EtlConfig {
    /// Resolve from the process environment.
    pub fn from_env(require_movies: bool) -> Result<Self, ConfigError> {
        Self::from_lookup(env_opt, require_movies)
    }

    pub fn from_lookup<L>(lookup: L, require_movies: bool) -> Result<Self, ConfigError>
    where
        L: Fn(&str) -> Option<String>,
    {
        let mut missing = Vec::new();

        let database_url = DB_URL_KEYS.iter().find_map(|k| lookup(k));
        if database_url.is_none() {
            missing.push("SUPABASE_DB_URL");
        }
        let api_key = lookup("TMDB_API_KEY");
        if require_movies && api_key.is_none() {
            missing.push("TMDB_API_KEY");
        }
        if !missing.is_empty() {
            return Err(ConfigError::Missing(missing));
        }

        let database_url = database_url.unwrap_or_default();
        let database_url = if lookup("DISABLE_SESSION_SWAP").is_some_and(|v| parse_flag(&v)) {
            database_url
        } else {
            prefer_session_mode(&database_url)
        };

        let steam = SteamSettings::from_lookup(&lookup)?;
        let movies = match (require_movies, api_key) {
            (true, Some(key)) => Some(MovieSettings::from_lookup(&lookup, key)?),
            _ => None,
        };

        Ok(Self {
            database_url,
            db_max_conns: parse_or(&lookup, "DB_MAX_CONNS", 2u32)?,
            steam,
            movies,
        })
    }
}

impl SteamSettings {
    pub fn from_lookup<L>(lookup: &L) -> Result<Self, ConfigError>
    where
        L: Fn(&str) -> Option<String>,
    {
        let min_discount: i64 = parse_or(lookup, "MIN_DISCOUNT", 50)?;
        if !(0..=100).contains(&min_discount) {
            return Err(ConfigError::Invalid {
                key: "MIN_DISCOUNT",
                value: min_discount.to_string(),
                reason: "expected a percentage between 0 and 100",
            });
        }
        Ok(Self {
            featured_url: endpoint(lookup, "STEAM_FEATURED_URL", STEAM_FEATURED_URL)?,
            appdetails_url: endpoint(lookup, "STEAM_APPDETAILS_URL", STEAM_APPDETAILS_URL)?,
            country: lookup("STEAM_CC").unwrap_or_else(|| "us".into()),
            language: lookup("STEAM_LANGUAGE").unwrap_or_else(|| "english".into()),
            min_discount,
            detail_delay: Duration::from_millis(parse_or(lookup, "STEAM_DETAIL_DELAY_MS", 1500)?),
            timeout: http_timeout(lookup)?,
            table: table_name(lookup, "STEAM_TABLE", "steam_deals")?,
        })
    }
}

impl MovieSettings {
    fn from_lookup<L>(lookup: &L, api_key: String) -> Result<Self, ConfigError>
    where
        L: Fn(&str) -> Option<String>,
    {
        let popular_pages = match lookup("TMDB_POPULAR_PAGES") {
            Some(raw) => parse_pages(&raw).ok_or(ConfigError::Invalid {
                key: "TMDB_POPULAR_PAGES",
                value: raw,
                reason: "expected a comma list of page numbers >= 1",
            })?,
            None => vec![1, 2],
        };
        Ok(Self {
            base_url: endpoint(lookup, "TMDB_BASE_URL", TMDB_BASE_URL)?
                .trim_end_matches('/')
                .to_string(),
            api_key,
            language: lookup("TMDB_LANGUAGE").unwrap_or_else(|| "en-US".into()),
            popular_pages,
            delay: Duration::from_millis(parse_or(lookup, "TMDB_DELAY_MS", 300)?),
            timeout: http_timeout(lookup)?,
            table: table_name(lookup, "MOVIES_TABLE", "movies")?,
        })
    }
}

fn parse_or<L, T>(lookup: &L, key: &'static str, default: T) -> Result<T, ConfigError>
where
    L: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match lookup(key) {
        Some(raw) => raw.trim().parse::<T>().map_err(|_| ConfigError::Invalid {
            key,
            value: raw,
            reason: "not a number",
        }),
        None => Ok(default),
    }
}

fn http_timeout<L>(lookup: &L) -> Result<Duration, ConfigError>
where
    L: Fn(&str) -> Option<String>,
{
    let secs: u64 = parse_or(lookup, "HTTP_TIMEOUT_SECS", 30)?;
    if secs == 0 {
        return Err(ConfigError::Invalid {
            key: "HTTP_TIMEOUT_SECS",
            value: secs.to_string(),
            reason: "timeout must be at least one second",
        });
    }
    Ok(Duration::from_secs(secs))
}

fn endpoint<L>(lookup: &L, key: &'static str, default: &str) -> Result<String, ConfigError>
where
    L: Fn(&str) -> Option<String>,
{
    let raw = lookup(key).unwrap_or_else(|| default.to_string());
    match url::Url::parse(raw.trim()) {
        Ok(u) if matches!(u.scheme(), "http" | "https") => Ok(raw.trim().to_string()),
        _ => Err(ConfigError::Invalid {
            key,
            value: raw,
            reason: "expected an absolute http(s) URL",
        }),
    }
}

/// Table names are spliced into SQL, so only plain identifiers are accepted.
fn table_name<L>(lookup: &L, key: &'static str, default: &str) -> Result<String, ConfigError>
where
    L: Fn(&str) -> Option<String>,
{
    let raw = lookup(key).unwrap_or_else(|| default.to_string());
    let name = raw.trim();
    let valid = name
        .chars()
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
    if valid {
        Ok(name.to_string())
    } else {
        Err(ConfigError::Invalid {
            key,
            value: raw,
            reason: "expected a plain SQL identifier",
        })
    }
}

fn parse_pages(raw: &str) -> Option<Vec<u32>> {
    let pages = raw
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| s.parse::<u32>().ok().filter(|p| *p >= 1))
        .collect::<Option<Vec<u32>>>()?;
    (!pages.is_empty()).then_some(pages)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |k: &str| map.get(k).cloned()
    }

    #[test]
    fn defaults_match_upstream_rate_limits() {
        let cfg = EtlConfig::from_lookup(
            lookup_from(&[("DATABASE_URL", "postgres://localhost/catalog"), ("TMDB_API_KEY", "k")]),
            true,
        )
        .unwrap();
        assert_eq!(cfg.steam.min_discount, 50);
        assert_eq!(cfg.steam.detail_delay, Duration::from_millis(1500));
        assert_eq!(cfg.steam.timeout, Duration::from_secs(30));
        assert_eq!(cfg.steam.table, "steam_deals");
        let movies = cfg.movies.unwrap();
        assert_eq!(movies.delay, Duration::from_millis(300));
        assert_eq!(movies.popular_pages, vec![1, 2]);
        assert_eq!(movies.table, "movies");
        assert_eq!(movies.base_url, TMDB_BASE_URL);
    }

    #[test]
    fn missing_credentials_are_reported_together() {
        let err = EtlConfig::from_lookup(lookup_from(&[]), true).unwrap_err();
        assert_eq!(
            err,
            ConfigError::Missing(vec!["SUPABASE_DB_URL", "TMDB_API_KEY"])
        );
    }

    #[test]
    fn tmdb_key_only_required_for_movies() {
        let cfg =
            EtlConfig::from_lookup(lookup_from(&[("DB_URL", "postgres://h/db")]), false).unwrap();
        assert!(cfg.movies.is_none());
    }

    #[test]
    fn first_database_url_wins_and_pooler_is_swapped() {
        let cfg = EtlConfig::from_lookup(
            lookup_from(&[
                ("SUPABASE_DB_URL", "postgres://u:p@x.pooler.supabase.com:6543/postgres"),
                ("DATABASE_URL", "postgres://other/db"),
            ]),
            false,
        )
        .unwrap();
        assert_eq!(
            cfg.database_url,
            "postgres://u:p@x.pooler.supabase.com:5432/postgres"
        );
    }

    #[test]
    fn rejects_bad_knobs() {
        let base = [("DATABASE_URL", "postgres://h/db")];
        let with = |k: &'static str, v: &'static str| {
            let mut pairs = base.to_vec();
            pairs.push((k, v));
            EtlConfig::from_lookup(lookup_from(&pairs), false).unwrap_err()
        };
        assert!(matches!(with("MIN_DISCOUNT", "abc"), ConfigError::Invalid { key: "MIN_DISCOUNT", .. }));
        assert!(matches!(with("MIN_DISCOUNT", "150"), ConfigError::Invalid { key: "MIN_DISCOUNT", .. }));
        assert!(matches!(with("HTTP_TIMEOUT_SECS", "0"), ConfigError::Invalid { key: "HTTP_TIMEOUT_SECS", .. }));
        assert!(matches!(with("STEAM_TABLE", "deals; drop table x"), ConfigError::Invalid { key: "STEAM_TABLE", .. }));
        assert!(matches!(with("STEAM_FEATURED_URL", "not a url"), ConfigError::Invalid { key: "STEAM_FEATURED_URL", .. }));
    }

    #[test]
    fn popular_pages_parse() {
        assert_eq!(parse_pages("1, 2,3"), Some(vec![1, 2, 3]));
        assert_eq!(parse_pages("0"), None);
        assert_eq!(parse_pages(""), None);
        assert_eq!(parse_pages("1,x"), None);
    }
}
