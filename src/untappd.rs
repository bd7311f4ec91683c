//! Untappd API client - beer names and recent check-ins.
//!
//! The cellar itself never talks to the network. This client is what the
//! command layer uses to show names next to bottle ids and to find out what
//! has been drunk since the last sync.
//!
//! Name lookups go through a [`NameCache`] that the client owns. The caller
//! loads the cache before building the client and saves it afterwards:
//!
//! ```no_run
//! use beercellar::{Credentials, NameCache, UntappdClient};
//! use std::path::Path;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let folder = Path::new("prod_cache");
//!     let cache = NameCache::load(folder)?;
//!     let mut client = UntappdClient::new(Credentials::new("key", "secret"), cache)?;
//!
//!     println!("{}", client.beer_name(7936).await);
//!
//!     client.cache().save(folder)?;
//!     Ok(())
//! }
//! ```
//!
//! Name lookups never fail: when the API cannot be reached or answers with
//! something unexpected, a placeholder string comes back instead.

use crate::beer_cellar::Credentials;
use crate::error::{CellarError, Result};
use crate::names::NameCache;
use chrono::{DateTime, NaiveDate};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::time::Duration;

pub const UNTAPPD_API_BASE: &str = "https://api.untappd.com/v4";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
/// Largest page the check-in feed serves
const CHECKIN_PAGE_LIMIT: &str = "50";
const MAX_CHECKIN_PAGES: usize = 100;

#[derive(Debug, Deserialize)]
struct Envelope {
    meta: Meta,
    #[serde(default)]
    response: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct Meta {
    code: u16,
    #[serde(default)]
    error_detail: Option<String>,
}

#[derive(Debug, Deserialize)]
struct BeerInfoResponse {
    beer: BeerInfo,
}

#[derive(Debug, Deserialize)]
struct BeerInfo {
    beer_name: String,
    brewery: Brewery,
}

#[derive(Debug, Deserialize)]
struct Brewery {
    brewery_name: String,
}

#[derive(Debug, Deserialize)]
struct CheckinsResponse {
    checkins: Checkins,
    #[serde(default)]
    pagination: Option<Pagination>,
}

#[derive(Debug, Deserialize)]
struct Pagination {
    #[serde(default)]
    max_id: serde_json::Value,
}

impl Pagination {
    /// Cursor for the next, older page. The last page sends an empty string.
    fn next_max_id(&self) -> Option<u64> {
        match &self.max_id {
            serde_json::Value::Number(n) => n.as_u64(),
            serde_json::Value::String(s) => s.parse().ok(),
            _ => None,
        }
    }
}

#[derive(Debug, Deserialize)]
struct Checkins {
    #[serde(default)]
    items: Vec<Checkin>,
}

#[derive(Debug, Deserialize)]
struct Checkin {
    #[serde(default)]
    created_at: Option<String>,
    beer: CheckinBeer,
}

#[derive(Debug, Deserialize)]
struct CheckinBeer {
    bid: u32,
}

/// Decode the response body, turning a non-200 meta code into an error.
///
/// Error replies carry an empty array as `response`, so the body is only
/// decoded once the code has been checked.
fn open_envelope<T: DeserializeOwned>(body: &str) -> Result<T> {
    let Envelope { meta, response } = serde_json::from_str(body)?;
    if meta.code != 200 {
        return Err(CellarError::Untappd {
            code: meta.code,
            detail: meta
                .error_detail
                .unwrap_or_else(|| format!("Untappd returned {}", meta.code)),
        });
    }

    Ok(serde_json::from_value(response)?)
}

/// Display name ("Brewery - Beer") from a beer info page
pub fn parse_beer_name(body: &str) -> Result<String> {
    let info: BeerInfoResponse = open_envelope(body)?;
    Ok(format!("{} - {}", info.beer.brewery.brewery_name, info.beer.beer_name))
}

/// Check-in feed read page by page, newest first, down to a cutoff date.
///
/// Feed each response body to [`push`](Self::push) until it returns `None`.
/// Check-ins without a readable `created_at` are skipped.
#[derive(Debug, Clone)]
pub struct CheckinFeed {
    since: NaiveDate,
    drunk: Vec<u32>,
    pages: usize,
}

impl CheckinFeed {
    pub fn new(since: NaiveDate) -> Self {
        Self {
            since,
            drunk: Vec::new(),
            pages: 0,
        }
    }

    /// Take one page. Returns the `max_id` to request next, or `None` once a
    /// check-in older than the cutoff was seen or the feed ran out.
    pub fn push(&mut self, body: &str) -> Result<Option<u64>> {
        let response: CheckinsResponse = open_envelope(body)?;
        self.pages += 1;

        let items = response.checkins.items;
        let mut reached_cutoff = false;
        for checkin in &items {
            let created = checkin
                .created_at
                .as_deref()
                .and_then(|c| DateTime::parse_from_rfc2822(c).ok());
            match created {
                Some(created) if created.date_naive() >= self.since => {
                    self.drunk.push(checkin.beer.bid)
                }
                Some(_) => reached_cutoff = true,
                None => {
                    tracing::warn!("Skipping check-in of {} with no usable date", checkin.beer.bid)
                }
            }
        }

        if reached_cutoff || items.is_empty() {
            return Ok(None);
        }

        let next = response.pagination.as_ref().and_then(Pagination::next_max_id);
        if next.is_some() && self.pages >= MAX_CHECKIN_PAGES {
            tracing::warn!(
                "Stopped after {} check-in pages; older drinks since {} were not read",
                self.pages,
                self.since
            );
            return Ok(None);
        }

        Ok(next)
    }

    /// Beer ids drunk on or after the cutoff, newest first
    pub fn drunk(&self) -> &[u32] {
        &self.drunk
    }

    pub fn into_drunk(self) -> Vec<u32> {
        self.drunk
    }
}

/// Untappd client with a persistent name cache
#[derive(Debug)]
pub struct UntappdClient {
    client: reqwest::Client,
    base_url: String,
    credentials: Credentials,
    user: Option<String>,
    access_token: Option<String>,
    cache: NameCache,
}

impl UntappdClient {
    pub fn new(credentials: Credentials, cache: NameCache) -> Result<Self> {
        Self::with_base_url(credentials, cache, UNTAPPD_API_BASE)
    }

    /// Client against a different API root (a proxy or a local stub)
    pub fn with_base_url(
        credentials: Credentials,
        cache: NameCache,
        base_url: impl Into<String>,
    ) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(format!("beercellar/{}", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            credentials,
            user: None,
            access_token: None,
            cache,
        })
    }

    /// Read check-ins of this Untappd user
    pub fn with_user(mut self, user: Option<String>) -> Self {
        self.user = user.filter(|u| !u.is_empty());
        self
    }

    /// Authenticate as a user instead of with the app key and secret
    pub fn with_access_token(mut self, token: Option<String>) -> Self {
        self.access_token = token.filter(|t| !t.is_empty());
        self
    }

    pub fn cache(&self) -> &NameCache {
        &self.cache
    }

    fn auth_query(&self) -> Vec<(&str, &str)> {
        match &self.access_token {
            Some(token) => vec![("access_token", token.as_str())],
            None => vec![
                ("client_id", self.credentials.key.as_str()),
                ("client_secret", self.credentials.secret.as_str()),
            ],
        }
    }

    async fn get(&self, path: &str, extra: &[(&str, &str)]) -> Result<String> {
        let url = format!("{}/{}", self.base_url, path);
        tracing::debug!("Fetching {}", url);

        let body = self
            .client
            .get(&url)
            .query(&self.auth_query())
            .query(extra)
            .send()
            .await?
            .text()
            .await?;
        Ok(body)
    }

    /// Look up a beer name, cache first.
    ///
    /// Successful lookups are added to the cache. Failures are reported as a
    /// readable string and are not cached.
    pub async fn beer_name(&mut self, id: u32) -> String {
        if let Some(name) = self.cache.get(id) {
            return name.to_string();
        }

        let fetched = self
            .get(&format!("beer/info/{}", id), &[("compact", "true")])
            .await
            .and_then(|body| parse_beer_name(&body));

        match fetched {
            Ok(name) => {
                self.cache.insert(id, name.clone());
                name
            }
            Err(CellarError::Untappd { detail, .. }) => detail,
            Err(CellarError::JsonError(e)) => {
                tracing::warn!("Bad beer page for {}: {}", id, e);
                "Failed to unmarshal".to_string()
            }
            Err(e) => {
                tracing::warn!("Failed on beer page for {}: {}", id, e);
                format!("Failed to retrieve {}", id)
            }
        }
    }

    /// Beer ids the user has checked in on or after `since`, newest first.
    ///
    /// Walks the feed with `max_id` until it passes `since`. Without a user
    /// name the feed of the access token's owner is read.
    pub async fn recent_drinks(&self, since: NaiveDate) -> Result<Vec<u32>> {
        let path = match (&self.user, &self.access_token) {
            (Some(user), _) => format!("user/checkins/{}", user),
            (None, Some(_)) => "user/checkins".to_string(),
            (None, None) => return Err(CellarError::MissingUntappdUser),
        };

        let mut feed = CheckinFeed::new(since);
        let mut max_id: Option<String> = None;
        loop {
            let mut query = vec![("limit", CHECKIN_PAGE_LIMIT)];
            if let Some(id) = &max_id {
                query.push(("max_id", id.as_str()));
            }

            let body = self.get(&path, &query).await?;
            match feed.push(&body)? {
                Some(next) => max_id = Some(next.to_string()),
                None => break,
            }
        }

        Ok(feed.into_drunk())
    }
}
