//! In-process doubles for the fetcher and store seams.
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use crate::config::{MovieSettings, SteamSettings};
use crate::database_ops::load::{CatalogRow, CatalogStore, LoadError};
use crate::util::http::{FetchError, JsonFetcher};

#[derive(Debug, Clone)]
pub enum Reply {
    Json(Value),
    Status(u16),
}

#[derive(Debug, Clone)]
pub struct Call {
    pub url: String,
    pub query: Vec<(String, String)>,
}

impl Call {
    pub fn param(&self, key: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

type Script = Box<dyn Fn(&str, &[(&str, String)]) -> Reply + Send + Sync>;

/// Answers every GET from a closure and records what was asked.
pub struct ScriptedFetcher {
    script: Script,
    calls: Mutex<Vec<Call>>,
}

impl ScriptedFetcher {
    pub fn new<S>(script: S) -> Self
    where
        S: Fn(&str, &[(&str, String)]) -> Reply + Send + Sync + 'static,
    {
        Self {
            script: Box::new(script),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn calls_to(&self, url: &str) -> usize {
        self.calls().iter().filter(|c| c.url == url).count()
    }
}

#[async_trait]
impl JsonFetcher for ScriptedFetcher {
    async fn fetch(
        &self,
        url: &str,
        query: &[(&str, String)],
        _timeout: Duration,
    ) -> Result<Value, FetchError> {
        self.calls.lock().unwrap().push(Call {
            url: url.to_string(),
            query: query
                .iter()
                .map(|(k, v)| (k.to_string(), v.clone()))
                .collect(),
        });
        match (self.script)(url, query) {
            Reply::Json(body) => Ok(body),
            Reply::Status(status) => Err(FetchError::Status {
                url: url.to_string(),
                status,
            }),
        }
    }
}

/// Upsert store keyed by (collection, external id), rows kept as JSON.
#[derive(Default)]
pub struct MemoryStore {
    rows: Mutex<HashMap<(String, String), Value>>,
    calls: AtomicUsize,
    fail: bool,
}

impl MemoryStore {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Default::default()
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn row_count(&self, collection: &str) -> usize {
        self.rows
            .lock()
            .unwrap()
            .keys()
            .filter(|(c, _)| c == collection)
            .count()
    }

    pub fn row(&self, collection: &str, key: &str) -> Option<Value> {
        self.rows
            .lock()
            .unwrap()
            .get(&(collection.to_string(), key.to_string()))
            .cloned()
    }
}

#[async_trait]
impl CatalogStore for MemoryStore {
    async fn upsert<R: CatalogRow>(&self, collection: &str, rows: &[R]) -> Result<u64, LoadError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(LoadError::Unavailable("connection refused".into()));
        }
        let mut stored = self.rows.lock().unwrap();
        for row in rows {
            let value = serde_json::to_value(row)
                .map_err(|e| LoadError::Unavailable(e.to_string()))?;
            stored.insert((collection.to_string(), row.key().to_string()), value);
        }
        Ok(rows.len() as u64)
    }
}

pub const FEATURED_URL: &str = "http://steam.test/api/featuredcategories/";
pub const APPDETAILS_URL: &str = "http://steam.test/api/appdetails";

pub fn steam_settings() -> SteamSettings {
    SteamSettings {
        featured_url: FEATURED_URL.into(),
        appdetails_url: APPDETAILS_URL.into(),
        country: "us".into(),
        language: "english".into(),
        min_discount: 50,
        detail_delay: Duration::ZERO,
        timeout: Duration::from_secs(30),
        table: "steam_deals".into(),
    }
}

pub fn movie_settings() -> MovieSettings {
    MovieSettings {
        base_url: "http://tmdb.test/3".into(),
        api_key: "test-key".into(),
        language: "en-US".into(),
        popular_pages: vec![1, 2],
        delay: Duration::ZERO,
        timeout: Duration::from_secs(30),
        table: "movies".into(),
    }
}
