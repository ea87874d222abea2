//! Visitor statistics endpoints.
//!
//! Heartbeats keep a visitor counted as online; visits bump the lifetime and
//! daily counters.

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::response::IntoResponse;
use axum::Json;
use serde::{Deserialize, Serialize};

use sitepulse_core::{CountersId, IdError, VisitorSessionId};
use sitepulse_presence::{ClientInfo, PresenceTracker, VisitorStats};

use crate::error::ApiError;
use crate::state::GatewayState;

/// The only update type still accepted by the visit endpoints.
const INCREMENT_ALL: &str = "increment_all";

// =============================================================================
// Request/Response Types
// =============================================================================

/// Heartbeat request body.
#[derive(Debug, Deserialize)]
pub struct HeartbeatBody {
    /// Opaque client session token.
    #[serde(default, alias = "sessionId")]
    pub session_id: Option<String>,
}

/// Heartbeat response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HeartbeatResponse {
    /// Always true on success.
    pub ok: bool,
    /// The session token that was refreshed.
    pub session_id: String,
    /// True if this heartbeat started a new session.
    pub new_session: bool,
}

/// Record-visit request body.
#[derive(Debug, Deserialize)]
pub struct RecordVisitBody {
    /// Counters row to increment.
    #[serde(default, alias = "countersId", alias = "visitorStatsId")]
    pub counters_id: Option<String>,
    /// Update type; only `increment_all` is supported.
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
}

/// Visitor statistics response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VisitorStatsResponse {
    /// Counters row ID, to be passed back to `record-visit`.
    pub id: String,
    /// Lifetime visits.
    pub total_visitors: u64,
    /// Visits today.
    pub today_visitors: u64,
    /// Visitors currently online.
    pub online_users: u64,
}

impl From<VisitorStats> for VisitorStatsResponse {
    fn from(stats: VisitorStats) -> Self {
        Self {
            id: stats.counters_id.to_string(),
            total_visitors: stats.total_visitors,
            today_visitors: stats.today_visitors,
            online_users: stats.online_users,
        }
    }
}

// =============================================================================
// Handlers
// =============================================================================

/// Record a heartbeat for a visitor session.
///
/// # Errors
///
/// Returns 400 if `session_id` is missing or invalid.
pub async fn heartbeat<P>(
    State(state): State<Arc<GatewayState<P>>>,
    headers: HeaderMap,
    body: Result<Json<HeartbeatBody>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError>
where
    P: PresenceTracker + 'static,
{
    let Json(body) = body?;
    let raw = body
        .session_id
        .ok_or_else(|| ApiError::BadRequest("session_id is required".to_string()))?;
    let session_id = parse_session_id(&raw)?;

    let ack = state
        .presence
        .heartbeat(&session_id, client_info(&headers))
        .await?;

    Ok(Json(HeartbeatResponse {
        ok: true,
        session_id: ack.session_id.to_string(),
        new_session: ack.new_session,
    }))
}

/// Get the current visitor statistics.
///
/// # Errors
///
/// Returns 500 on storage failure.
pub async fn get_stats<P>(
    State(state): State<Arc<GatewayState<P>>>,
) -> Result<impl IntoResponse, ApiError>
where
    P: PresenceTracker + 'static,
{
    let stats = state.presence.get_stats().await?;
    Ok(Json(VisitorStatsResponse::from(stats)))
}

/// Count a new visit.
///
/// # Errors
///
/// Returns 400 if the counters ID is missing or malformed or the update type
/// is unsupported, 404 if the counters row doesn't exist.
pub async fn record_visit<P>(
    State(state): State<Arc<GatewayState<P>>>,
    body: Result<Json<RecordVisitBody>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError>
where
    P: PresenceTracker + 'static,
{
    let Json(body) = body?;

    if let Some(kind) = body.kind.as_deref() {
        if kind != INCREMENT_ALL {
            return Err(ApiError::BadRequest(format!(
                "unsupported update type: {kind}"
            )));
        }
    }

    let raw = body
        .counters_id
        .ok_or_else(|| ApiError::BadRequest("counters_id is required".to_string()))?;
    let counters_id = parse_counters_id(&raw)?;

    let stats = state.presence.record_visit(&counters_id).await?;
    tracing::debug!(
        counters_id = %counters_id,
        total = stats.total_visitors,
        today = stats.today_visitors,
        "Visit recorded"
    );

    Ok(Json(VisitorStatsResponse::from(stats)))
}

// =============================================================================
// Helpers
// =============================================================================

fn parse_session_id(raw: &str) -> Result<VisitorSessionId, ApiError> {
    VisitorSessionId::parse(raw).map_err(|e| invalid("session_id", &e))
}

fn parse_counters_id(raw: &str) -> Result<CountersId, ApiError> {
    raw.parse().map_err(|e| invalid("counters_id", &e))
}

fn invalid(field: &str, err: &IdError) -> ApiError {
    ApiError::BadRequest(format!("invalid {field}: {err}"))
}

/// Extract diagnostic client details from request headers.
///
/// The address is the first `X-Forwarded-For` entry, else `X-Real-IP`.
pub(crate) fn client_info(headers: &HeaderMap) -> ClientInfo {
    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
    };

    let ip_address = header("x-forwarded-for")
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .or_else(|| header("x-real-ip"))
        .map(ToString::to_string);
    let user_agent = header("user-agent").map(ToString::to_string);

    ClientInfo::new(ip_address, user_agent)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn client_info_prefers_forwarded_for() {
        let mut headers = HeaderMap::new();
        headers.insert(
            "x-forwarded-for",
            HeaderValue::from_static("203.0.113.7, 10.0.0.1"),
        );
        headers.insert("x-real-ip", HeaderValue::from_static("10.0.0.2"));
        headers.insert("user-agent", HeaderValue::from_static("Mozilla/5.0"));

        let info = client_info(&headers);
        assert_eq!(info.ip_address.as_deref(), Some("203.0.113.7"));
        assert_eq!(info.user_agent.as_deref(), Some("Mozilla/5.0"));
    }

    #[test]
    fn client_info_falls_back_to_real_ip() {
        let mut headers = HeaderMap::new();
        headers.insert("x-real-ip", HeaderValue::from_static("10.0.0.2"));

        let info = client_info(&headers);
        assert_eq!(info.ip_address.as_deref(), Some("10.0.0.2"));
        assert!(info.user_agent.is_none());
    }

    #[test]
    fn client_info_empty_headers() {
        assert_eq!(client_info(&HeaderMap::new()), ClientInfo::default());
    }

    #[test]
    fn body_aliases() {
        let body: HeartbeatBody = serde_json::from_str(r#"{"sessionId":"abc"}"#).unwrap();
        assert_eq!(body.session_id.as_deref(), Some("abc"));

        let body: RecordVisitBody =
            serde_json::from_str(r#"{"visitorStatsId":"x","type":"increment_all"}"#).unwrap();
        assert_eq!(body.counters_id.as_deref(), Some("x"));
        assert_eq!(body.kind.as_deref(), Some(INCREMENT_ALL));
    }

    #[test]
    fn parse_helpers_reject_bad_ids() {
        assert!(matches!(
            parse_session_id("   "),
            Err(ApiError::BadRequest(_))
        ));
        assert!(matches!(
            parse_counters_id("not-a-uuid"),
            Err(ApiError::BadRequest(_))
        ));
    }

    #[test]
    fn stats_response_uses_camel_case() {
        let response = VisitorStatsResponse {
            id: "row".to_string(),
            total_visitors: 3,
            today_visitors: 2,
            online_users: 1,
        };
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["totalVisitors"], 3);
        assert_eq!(json["todayVisitors"], 2);
        assert_eq!(json["onlineUsers"], 1);
    }
}
