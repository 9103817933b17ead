// Fantasy provider HTTP client: wire types, request plumbing, and the
// `StatSource` seam the poller fetches through.

use std::future::Future;

use async_trait::async_trait;
use chrono::Utc;
use fplive_scoring::model::{Squad, StatSnapshot};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, info};

use crate::config::ApiConfig;
use crate::convert::{build_snapshot, build_squad};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("HTTP {status} from {url}")]
    HttpStatus { status: u16, url: String },

    #[error("not found: {url}")]
    NotFound { url: String },

    #[error("no picks found for gameweeks {oldest}..={requested}")]
    NoPicks { requested: u32, oldest: u32 },

    #[error("reference data lists no current gameweek")]
    NoCurrentGameweek,
}

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

/// `bootstrap-static/`: season reference data.
#[derive(Debug, Clone, Deserialize)]
pub struct BootstrapStatic {
    pub elements: Vec<WireElement>,
    #[serde(default)]
    pub events: Vec<WireEvent>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WireElement {
    pub id: u32,
    pub web_name: String,
    pub element_type: u8,
    pub team: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WireEvent {
    pub id: u32,
    #[serde(default)]
    pub is_current: bool,
}

impl BootstrapStatic {
    pub fn current_gameweek(&self) -> Option<u32> {
        self.events.iter().find(|e| e.is_current).map(|e| e.id)
    }
}

/// `event/{gw}/live/`: per-player live stats.
#[derive(Debug, Clone, Deserialize)]
pub struct EventLive {
    pub elements: Vec<WireLiveElement>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WireLiveElement {
    pub id: u32,
    pub stats: WireLiveStats,
    #[serde(default)]
    pub explain: Vec<WireExplain>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct WireLiveStats {
    pub minutes: u32,
    pub goals_scored: u32,
    pub assists: u32,
    pub clean_sheets: u32,
    pub goals_conceded: u32,
    pub own_goals: u32,
    pub penalties_saved: u32,
    pub penalties_missed: u32,
    pub yellow_cards: u32,
    pub red_cards: u32,
    pub saves: u32,
    pub saves_inside_box: Option<u32>,
    pub saves_outside_box: Option<u32>,
    pub tackles: u32,
    pub clearances_blocks_interceptions: u32,
    pub recoveries: u32,
    #[serde(alias = "clearances_off_line")]
    pub goalline_clearances: u32,
    pub bonus: u32,
    pub bps: i32,
    pub total_points: i32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WireExplain {
    pub fixture: u32,
    #[serde(default)]
    pub stats: Vec<WireExplainStat>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WireExplainStat {
    pub identifier: String,
    #[serde(default)]
    pub points: i32,
    #[serde(default)]
    pub value: u32,
}

/// One entry of `fixtures/?event={gw}`.
#[derive(Debug, Clone, Deserialize)]
pub struct WireFixture {
    pub id: u32,
    pub event: Option<u32>,
    pub team_h: u32,
    pub team_a: u32,
    pub team_h_score: Option<u32>,
    pub team_a_score: Option<u32>,
    /// Null before the provider has processed the fixture.
    pub started: Option<bool>,
    #[serde(default)]
    pub finished: bool,
    #[serde(default)]
    pub minutes: u32,
}

/// `entry/{id}/event/{gw}/picks/`.
#[derive(Debug, Clone, Deserialize)]
pub struct WirePicks {
    pub active_chip: Option<String>,
    pub entry_history: WireEntryHistory,
    pub picks: Vec<WirePick>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WireEntryHistory {
    #[serde(default)]
    pub event_transfers_cost: i32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WirePick {
    pub element: u32,
    pub position: u8,
    pub multiplier: u8,
    pub is_captain: bool,
    pub is_vice_captain: bool,
}

// ---------------------------------------------------------------------------
// StatSource
// ---------------------------------------------------------------------------

/// What to fetch on each poll.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    pub entry_id: u64,
    /// `None` follows the provider's current gameweek.
    pub gameweek: Option<u32>,
    /// Prior gameweeks to try when the requested one has no picks.
    pub fallback_depth: u32,
}

/// Produces a fresh snapshot and squad for one poll.
#[async_trait]
pub trait StatSource: Send + Sync {
    async fn fetch(&self, request: &FetchRequest) -> Result<(StatSnapshot, Squad), ApiError>;
}

/// Walk back from `requested` through at most `depth` earlier gameweeks,
/// never below 1, returning the first gameweek whose fetch succeeds.
///
/// Only `NotFound` moves the search on; any other error aborts it.
pub async fn search_gameweeks<T, F, Fut>(
    requested: u32,
    depth: u32,
    mut fetch: F,
) -> Result<(u32, T), ApiError>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, ApiError>>,
{
    let oldest = requested.saturating_sub(depth).max(1);
    for gameweek in (oldest..=requested).rev() {
        match fetch(gameweek).await {
            Ok(found) => return Ok((gameweek, found)),
            Err(ApiError::NotFound { url }) => {
                debug!(gameweek, %url, "no picks, trying earlier gameweek");
            }
            Err(e) => return Err(e),
        }
    }
    Err(ApiError::NoPicks { requested, oldest })
}

// ---------------------------------------------------------------------------
// HTTP client
// ---------------------------------------------------------------------------

pub struct FplClient {
    http: reqwest::Client,
    base_url: String,
}

impl FplClient {
    pub fn from_config(config: &ApiConfig) -> Result<Self, ApiError> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let http = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .user_agent(config.user_agent.clone())
            .default_headers(headers)
            .build()?;

        Ok(FplClient {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let url = self.url(path);
        debug!(%url, "GET");
        let response = self.http.get(&url).send().await?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(ApiError::NotFound { url });
        }
        if !status.is_success() {
            return Err(ApiError::HttpStatus {
                status: status.as_u16(),
                url,
            });
        }

        Ok(response.json::<T>().await?)
    }

    pub async fn bootstrap(&self) -> Result<BootstrapStatic, ApiError> {
        self.get_json("bootstrap-static/").await
    }

    pub async fn live(&self, gameweek: u32) -> Result<EventLive, ApiError> {
        self.get_json(&format!("event/{gameweek}/live/")).await
    }

    pub async fn fixtures(&self, gameweek: u32) -> Result<Vec<WireFixture>, ApiError> {
        self.get_json(&format!("fixtures/?event={gameweek}")).await
    }

    pub async fn picks(&self, entry_id: u64, gameweek: u32) -> Result<WirePicks, ApiError> {
        self.get_json(&format!("entry/{entry_id}/event/{gameweek}/picks/"))
            .await
    }
}

#[async_trait]
impl StatSource for FplClient {
    async fn fetch(&self, request: &FetchRequest) -> Result<(StatSnapshot, Squad), ApiError> {
        let bootstrap = self.bootstrap().await?;
        let requested = match request.gameweek {
            Some(gw) => gw,
            None => bootstrap
                .current_gameweek()
                .ok_or(ApiError::NoCurrentGameweek)?,
        };

        let (gameweek, picks) =
            search_gameweeks(requested, request.fallback_depth, |gw| {
                self.picks(request.entry_id, gw)
            })
            .await?;
        if gameweek != requested {
            info!(requested, gameweek, "using picks from an earlier gameweek");
        }

        let live = self.live(gameweek).await?;
        let fixtures = self.fixtures(gameweek).await?;

        let snapshot = build_snapshot(gameweek, &bootstrap, live, fixtures, Utc::now());
        let squad = build_squad(request.entry_id, gameweek, picks);
        Ok((snapshot, squad))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    fn not_found(gw: u32) -> ApiError {
        ApiError::NotFound {
            url: format!("entry/1/event/{gw}/picks/"),
        }
    }

    #[tokio::test]
    async fn search_returns_requested_gameweek_when_present() {
        let (gw, value) = search_gameweeks(7, 2, |gw| async move { Ok::<_, ApiError>(gw * 10) })
            .await
            .unwrap();
        assert_eq!((gw, value), (7, 70));
    }

    #[tokio::test]
    async fn search_walks_back_on_not_found() {
        let tried = Mutex::new(Vec::new());
        let (gw, _) = search_gameweeks(7, 2, |gw| {
            tried.lock().unwrap().push(gw);
            async move {
                if gw == 5 {
                    Ok(())
                } else {
                    Err(not_found(gw))
                }
            }
        })
        .await
        .unwrap();

        assert_eq!(gw, 5);
        assert_eq!(*tried.lock().unwrap(), vec![7, 6, 5]);
    }

    #[tokio::test]
    async fn search_gives_up_after_depth() {
        let err = search_gameweeks(7, 2, |gw| async move { Err::<(), _>(not_found(gw)) })
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::NoPicks { requested: 7, oldest: 5 }));
    }

    #[tokio::test]
    async fn search_never_goes_below_gameweek_one() {
        let tried = Mutex::new(Vec::new());
        let err = search_gameweeks(2, 5, |gw| {
            tried.lock().unwrap().push(gw);
            async move { Err::<(), _>(not_found(gw)) }
        })
        .await
        .unwrap_err();

        assert!(matches!(err, ApiError::NoPicks { requested: 2, oldest: 1 }));
        assert_eq!(*tried.lock().unwrap(), vec![2, 1]);
    }

    #[tokio::test]
    async fn search_stops_on_other_errors() {
        let err = search_gameweeks(7, 2, |_| async {
            Err::<(), _>(ApiError::HttpStatus {
                status: 503,
                url: "x".into(),
            })
        })
        .await
        .unwrap_err();
        assert!(matches!(err, ApiError::HttpStatus { status: 503, .. }));
    }

    #[test]
    fn current_gameweek_comes_from_events() {
        let bootstrap: BootstrapStatic = serde_json::from_str(
            r#"{
                "elements": [],
                "events": [
                    {"id": 6, "is_current": false, "finished": true},
                    {"id": 7, "is_current": true, "finished": false},
                    {"id": 8, "is_current": false, "finished": false}
                ]
            }"#,
        )
        .unwrap();
        assert_eq!(bootstrap.current_gameweek(), Some(7));
    }

    #[test]
    fn live_stats_tolerate_missing_and_extra_fields() {
        let live: EventLive = serde_json::from_str(
            r#"{"elements": [{
                "id": 3,
                "stats": {"minutes": 90, "saves": 4, "influence": "12.4", "in_dreamteam": false},
                "explain": [{"fixture": 61, "stats": [
                    {"identifier": "minutes", "points": 2, "value": 90}
                ]}]
            }]}"#,
        )
        .unwrap();

        let element = &live.elements[0];
        assert_eq!(element.stats.minutes, 90);
        assert_eq!(element.stats.saves, 4);
        assert_eq!(element.stats.saves_inside_box, None);
        assert_eq!(element.explain[0].fixture, 61);
    }

    #[test]
    fn client_trims_trailing_slash() {
        let config = ApiConfig {
            base_url: "https://example.com/api/".into(),
            request_timeout_secs: 5,
            user_agent: "test".into(),
        };
        let client = FplClient::from_config(&config).unwrap();
        assert_eq!(client.url("bootstrap-static/"), "https://example.com/api/bootstrap-static/");
    }
}
