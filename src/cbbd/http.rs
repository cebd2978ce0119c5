//! Client for the CollegeBasketballData REST API.

use std::time::Duration;

use reqwest::{header::HeaderMap, Client};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::{
    cbbd::types::{Conference, Ranking, TeamInfo, TeamRoster, Venue},
    cli::types::Season,
    core::{bearer_header_map, ApiCredentials},
    Result,
};


const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
/// `/rankings` returns every poll for every season in one response.
const RANKINGS_TIMEOUT: Duration = Duration::from_secs(60);

/// Thin typed wrapper over the season-scoped endpoints.
#[derive(Debug, Clone)]
pub struct CbbdClient {
    client: Client,
    base_url: String,
    headers: HeaderMap,
}

impl CbbdClient {
    pub fn new(credentials: &ApiCredentials) -> Result<Self> {
        Self::with_base_url(&credentials.base_url, &credentials.api_key)
    }

    pub fn with_base_url(base_url: &str, api_key: &str) -> Result<Self> {
        Ok(Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            headers: bearer_header_map(api_key)?,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
        timeout: Duration,
    ) -> Result<T> {
        let url = format!("{}{}", self.base_url, path);
        debug!(%url, ?query, "GET");

        let res = self
            .client
            .get(&url)
            .headers(self.headers.clone())
            .query(query)
            .timeout(timeout)
            .send()
            .await?
            .error_for_status()?
            .json::<T>()
            .await?;

        Ok(res)
    }

    pub async fn fetch_conferences(&self) -> Result<Vec<Conference>> {
        self.get_json("/conferences", &[], DEFAULT_TIMEOUT).await
    }

    /// All team rows the API reports for one season.
    pub async fn fetch_teams_for_season(&self, season: Season) -> Result<Vec<TeamInfo>> {
        self.get_json("/teams", &[("season", season.to_string())], DEFAULT_TIMEOUT)
            .await
    }

    /// Every team's roster for one season, in a single call.
    pub async fn fetch_rosters(&self, season: Season) -> Result<Vec<TeamRoster>> {
        self.get_json(
            "/teams/roster",
            &[("season", season.to_string())],
            DEFAULT_TIMEOUT,
        )
        .await
    }

    pub async fn fetch_rankings(&self) -> Result<Vec<Ranking>> {
        self.get_json("/rankings", &[], RANKINGS_TIMEOUT).await
    }

    pub async fn fetch_venues(&self) -> Result<Vec<Venue>> {
        self.get_json("/venues", &[], DEFAULT_TIMEOUT).await
    }
}
