// Garden Server - HTTP routes
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! HTTP query surface.
//!
//! | Route | Response |
//! |-------|----------|
//! | `GET /api/sensor-data` | `[{timestamp, value}]` |
//! | `GET /api/sensor-data/processed` | `{points, stats, thresholds}` |
//! | `GET /api/latest-data` | latest snapshot |
//! | `GET /metrics` | Prometheus text format |
//! | `GET /health`, `GET /ready`, `GET /status` | probes |

use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Instant;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::get,
    Json, Router,
};
use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use garden::{Channel, Granularity, IngestCounts, ProcessingConfig, SensorHub, Timestamp};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::metrics::{encode_metrics, observe_query_points, record_query, QueryOutcome};
use crate::replay::ReplayState;

/// Application state shared across handlers.
pub struct AppState {
    pub hub: Arc<SensorHub>,
    pub replay_state: Option<Arc<ReplayState>>,
    pub start_time: Instant,
}

impl AppState {
    pub fn new(hub: Arc<SensorHub>) -> Self {
        Self {
            hub,
            replay_state: None,
            start_time: Instant::now(),
        }
    }

    pub fn with_replay(mut self, state: Arc<ReplayState>) -> Self {
        self.replay_state = Some(state);
        self
    }
}

/// Build the router.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(root_handler))
        .route("/api/sensor-data", get(sensor_data_handler))
        .route("/api/sensor-data/processed", get(processed_handler))
        .route("/api/latest-data", get(latest_handler))
        .route("/metrics", get(metrics_handler))
        .route("/health", get(health_handler))
        .route("/ready", get(ready_handler))
        .route("/status", get(status_handler))
        .with_state(state)
}

/// Query string of the series endpoints.
///
/// Everything arrives as text so that a bad value becomes a JSON error
/// rather than an extractor rejection.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeriesParams {
    sensor_type: Option<String>,
    start_date: Option<String>,
    end_date: Option<String>,
    interval: Option<String>,
    alpha: Option<String>,
    trend: Option<String>,
    min: Option<String>,
    max: Option<String>,
}

struct SeriesRequest {
    channel: Channel,
    start: Timestamp,
    end: Timestamp,
    granularity: Granularity,
}

impl SeriesParams {
    fn resolve(&self) -> Result<SeriesRequest, ApiError> {
        let (Some(sensor_type), Some(start), Some(end)) =
            (&self.sensor_type, &self.start_date, &self.end_date)
        else {
            return Err(ApiError::MissingParameters);
        };

        let channel: Channel = sensor_type.parse()?;
        Ok(SeriesRequest {
            channel,
            start: parse_date("startDate", start)?,
            end: parse_date("endDate", end)?,
            granularity: Granularity::from_interval_param(self.interval.as_deref()),
        })
    }

    fn processing(&self) -> Result<ProcessingConfig, ApiError> {
        let mut config = ProcessingConfig::new();

        if let Some(ref raw) = self.alpha {
            let alpha: u32 = raw.trim().parse().map_err(|_| ApiError::InvalidParameter {
                name: "alpha",
                value: raw.clone(),
            })?;
            config = config.with_alpha(alpha.min(100) as u8);
        }

        if let Some(ref raw) = self.trend {
            let show = match raw.trim() {
                "true" | "1" => true,
                "false" | "0" => false,
                _ => {
                    return Err(ApiError::InvalidParameter {
                        name: "trend",
                        value: raw.clone(),
                    })
                }
            };
            config = config.with_trend(show);
        }

        let min = parse_threshold("min", self.min.as_deref())?;
        let max = parse_threshold("max", self.max.as_deref())?;
        Ok(config.with_thresholds(min, max))
    }
}

/// Accepts RFC 3339, a naive date-time (taken as UTC) or a bare date.
fn parse_date(name: &'static str, value: &str) -> Result<Timestamp, ApiError> {
    let value = value.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Ok(dt.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f") {
        return Ok(Utc.from_utc_datetime(&naive));
    }
    if let Some(naive) = NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
    {
        return Ok(Utc.from_utc_datetime(&naive));
    }
    Err(ApiError::InvalidDate {
        name,
        value: value.to_string(),
    })
}

fn parse_threshold(name: &'static str, raw: Option<&str>) -> Result<Option<f64>, ApiError> {
    let Some(raw) = raw else {
        return Ok(None);
    };
    match raw.trim().parse::<f64>() {
        Ok(v) if v.is_finite() => Ok(Some(v)),
        _ => Err(ApiError::InvalidParameter {
            name,
            value: raw.to_string(),
        }),
    }
}

/// Render a handler result and count it.
fn respond<T: Serialize>(endpoint: &str, result: Result<T, ApiError>) -> Response {
    match result {
        Ok(body) => {
            record_query(endpoint, QueryOutcome::Ok);
            Json(body).into_response()
        }
        Err(e) => {
            record_query(endpoint, e.outcome());
            e.into_response()
        }
    }
}

/// Series for one channel, range and interval.
async fn sensor_data_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SeriesParams>,
) -> Response {
    let result = params.resolve().and_then(|req| {
        let series = state.hub.engine().query_channel(
            req.channel,
            req.start,
            req.end,
            req.granularity,
        )?;
        observe_query_points(series.len());
        Ok(series)
    });
    respond("sensor_data", result)
}

/// Series with smoothing, trend, stats and thresholds applied.
async fn processed_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SeriesParams>,
) -> Response {
    let result = params.resolve().and_then(|req| {
        let config = params.processing()?;
        let series = state.hub.engine().query_channel(
            req.channel,
            req.start,
            req.end,
            req.granularity,
        )?;
        observe_query_points(series.len());
        Ok(SensorHub::process_series(&series, &config))
    });
    respond("processed", result)
}

/// Latest reading, or zeros when nothing is stored.
async fn latest_handler(State(state): State<Arc<AppState>>) -> Response {
    let result = state.hub.get_latest().map_err(ApiError::from);
    respond("latest", result)
}

/// Metrics handler - returns Prometheus text format.
async fn metrics_handler() -> impl IntoResponse {
    (
        StatusCode::OK,
        [("Content-Type", "text/plain; charset=utf-8")],
        encode_metrics(),
    )
}

/// Health check handler.
async fn health_handler() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}

/// Readiness check handler: the store must answer.
async fn ready_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    match state.hub.store().len() {
        Ok(_) => (StatusCode::OK, "Ready"),
        Err(_) => (StatusCode::SERVICE_UNAVAILABLE, "Store unavailable"),
    }
}

/// Status information response.
#[derive(Serialize)]
struct StatusResponse {
    version: String,
    uptime_secs: u64,
    ingest: IngestCounts,
    #[serde(skip_serializing_if = "Option::is_none")]
    stored_readings: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    replay: Option<ReplayStatus>,
}

/// Replay status information.
#[derive(Serialize)]
struct ReplayStatus {
    running: bool,
    position: usize,
    total_payloads: usize,
}

/// Status handler - returns JSON status information.
async fn status_handler(State(state): State<Arc<AppState>>) -> Json<StatusResponse> {
    let replay = state.replay_state.as_ref().map(|r| ReplayStatus {
        running: r.running.load(Ordering::SeqCst),
        position: r.position.load(Ordering::SeqCst),
        total_payloads: r.total_payloads.load(Ordering::SeqCst),
    });

    Json(StatusResponse {
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_secs: state.start_time.elapsed().as_secs(),
        ingest: state.hub.ingest_stats().snapshot(),
        stored_readings: state.hub.store().len().ok(),
        replay,
    })
}

/// Root handler - shows a simple HTML page.
async fn root_handler() -> Html<&'static str> {
    Html(
        r#"<!DOCTYPE html>
<html>
<head>
    <title>Garden Server</title>
    <style>
        body { font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif; max-width: 800px; margin: 50px auto; padding: 20px; }
        h1 { color: #2e7d32; }
        a { color: #3498db; text-decoration: none; }
        .endpoints { background: #f8f9fa; padding: 20px; border-radius: 8px; margin: 20px 0; }
        .endpoint { margin: 10px 0; }
        code { background: #e9ecef; padding: 2px 6px; border-radius: 4px; }
    </style>
</head>
<body>
    <h1>Garden Server</h1>
    <p>Field sensor readings: ingestion, series queries and snapshots.</p>

    <div class="endpoints">
        <h2>Endpoints</h2>
        <div class="endpoint"><code>/api/sensor-data?sensorType=&amp;startDate=&amp;endDate=&amp;interval=</code> - Series (raw, 5m, hourly, daily)</div>
        <div class="endpoint"><code>/api/sensor-data/processed?...&amp;alpha=&amp;trend=&amp;min=&amp;max=</code> - Smoothed series with stats</div>
        <div class="endpoint"><a href="/api/latest-data">/api/latest-data</a> - Latest reading</div>
        <div class="endpoint"><a href="/metrics">/metrics</a> - Prometheus metrics</div>
        <div class="endpoint"><a href="/health">/health</a> - Health check</div>
        <div class="endpoint"><a href="/ready">/ready</a> - Readiness check</div>
        <div class="endpoint"><a href="/status">/status</a> - Status information (JSON)</div>
    </div>

    <h2>Sensor types</h2>
    <ul>
        <li><code>temperature</code>, <code>humidity</code>, <code>light</code>, <code>soil_moisture</code>, <code>rainfall</code></li>
    </ul>
</body>
</html>"#,
    )
}
