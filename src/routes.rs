use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{Html, IntoResponse},
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{error, warn};

use crate::cache::FeedCache;
use crate::calendar::{Clock, ConferenceCalendar};
use crate::db::ManualStore;
use crate::merge::merge;
use crate::model::{NewsItem, TopicTag};

pub struct AppState {
    pub cache: Arc<FeedCache>,
    pub store: Arc<dyn ManualStore>,
    pub calendar: Arc<ConferenceCalendar>,
    pub clock: Arc<dyn Clock>,
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/news", get(news))
        .route("/api/summit", get(summit))
        .route("/refresh", post(refresh))
        .route("/refresh/status", get(refresh_status))
        .route("/health", get(health))
        .with_state(state)
}

#[derive(Debug, Default, Deserialize)]
pub struct NewsQuery {
    #[serde(default)]
    pub day: Option<u32>,
    #[serde(default)]
    pub topic: Option<TopicTag>,
}

impl NewsQuery {
    fn matches(&self, item: &NewsItem) -> bool {
        self.day.map_or(true, |day| item.day == day)
            && self.topic.map_or(true, |topic| item.topic_tag == topic)
    }
}

#[derive(Debug, Serialize)]
pub struct NewsResponse {
    pub items: Vec<NewsItem>,
    pub total: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl NewsResponse {
    fn ok(items: Vec<NewsItem>) -> Self {
        Self {
            total: items.len(),
            items,
            error: None,
        }
    }

    fn failed() -> Self {
        Self {
            items: Vec::new(),
            total: 0,
            error: Some("Failed to fetch news".to_string()),
        }
    }
}

async fn manual_items(state: &AppState) -> Vec<NewsItem> {
    let now = state.clock.now();
    match state.store.list_manual_stories().await {
        Ok(stories) => stories.into_iter().map(|s| s.into_item(now)).collect(),
        Err(e) => {
            warn!("Manual story store unavailable: {}", e);
            Vec::new()
        }
    }
}

// Route handlers
pub async fn news(
    State(state): State<Arc<AppState>>,
    Query(query): Query<NewsQuery>,
) -> (StatusCode, Json<NewsResponse>) {
    let (aggregated, manual) = tokio::join!(state.cache.items(), manual_items(&state));

    match aggregated {
        Ok(aggregated) => {
            let items: Vec<_> = merge(manual, aggregated.iter().cloned())
                .into_iter()
                .filter(|item| query.matches(item))
                .collect();
            (StatusCode::OK, Json(NewsResponse::ok(items)))
        }
        Err(e) => {
            error!("News pipeline failed: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, Json(NewsResponse::failed()))
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SummitStatus {
    pub day: u32,
    pub live: bool,
}

pub async fn summit(State(state): State<Arc<AppState>>) -> Json<SummitStatus> {
    Json(SummitStatus {
        day: state.calendar.current_day(state.clock.as_ref()),
        live: state.calendar.is_live_now(state.clock.as_ref()),
    })
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshStatus {
    pub refreshing: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refreshed_at: Option<DateTime<Utc>>,
    pub items: usize,
}

pub async fn refresh(State(state): State<Arc<AppState>>) -> Json<RefreshStatus> {
    let cache = state.cache.clone();
    tokio::spawn(async move {
        if let Err(e) = cache.refresh().await {
            error!("Manual refresh failed: {}", e);
        }
    });

    let snapshot = state.cache.snapshot().await;
    Json(RefreshStatus {
        refreshing: true,
        refreshed_at: snapshot.as_ref().map(|s| s.refreshed_at),
        items: snapshot.map_or(0, |s| s.items.len()),
    })
}

pub async fn refresh_status(State(state): State<Arc<AppState>>) -> Json<RefreshStatus> {
    let snapshot = state.cache.snapshot().await;
    Json(RefreshStatus {
        refreshing: state.cache.is_refreshing().await,
        refreshed_at: snapshot.as_ref().map(|s| s.refreshed_at),
        items: snapshot.map_or(0, |s| s.items.len()),
    })
}

pub async fn health() -> impl IntoResponse {
    Html("OK")
}
