use axum::{
    extract::{ConnectInfo, State},
    http::{header, HeaderMap},
    Json,
};
use chrono::Utc;
use serde_json::Value;
use std::net::SocketAddr;
use tracing::{debug, info};

use crate::error::{ApiError, ApiResult};
use crate::models::{
    DuplicateLoginRequest, DuplicateLoginResponse, LoginAction, LoginSessionInfo, SecurityFlag,
    TrackSessionRequest, TrackSessionResponse, TrackedSummary, TrackingRecord,
};
use crate::services::client_ip::{all_ips, hash_ip, primary_ip};
use crate::services::login_tracker::{login_key, LoginEntry, LoginOutcome};
use crate::session::records::record_tracking;
use crate::state::AppState;
use crate::store::rules::Actor;

const MULTIPLE_IPS_THRESHOLD: usize = 2;
const DEVICE_LABEL_LEN: usize = 50;

fn header_str<'a>(headers: &'a HeaderMap, name: header::HeaderName) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

fn device_label(headers: &HeaderMap) -> String {
    header_str(headers, header::USER_AGENT)
        .map(|ua| ua.chars().take(DEVICE_LABEL_LEN).collect())
        .unwrap_or_else(|| "Unknown".to_string())
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

/// Record a candidate session event with hashed client addresses
pub async fn track_session(
    State(state): State<AppState>,
    connect_info: Option<ConnectInfo<SocketAddr>>,
    headers: HeaderMap,
    Json(body): Json<TrackSessionRequest>,
) -> ApiResult<Json<TrackSessionResponse>> {
    let (Some(session_code), Some(user_id), Some(event_type)) =
        (non_empty(body.session_code), non_empty(body.user_id), non_empty(body.event_type))
    else {
        return Err(ApiError::Validation("Missing required fields".to_string()));
    };
    if body.metadata.get("userType").and_then(Value::as_str) == Some("interviewer") {
        return Ok(Json(TrackSessionResponse {
            success: true,
            skipped: true,
            message: Some("Tracking skipped for interviewer".to_string()),
            tracked: None,
        }));
    }

    let remote = connect_info.map(|ConnectInfo(addr)| addr);
    let ips = all_ips(&headers, remote);
    let ip = hash_ip(&primary_ip(&headers, remote), &state.ip_salt);
    let mut security_flags = Vec::new();
    if ips.len() > MULTIPLE_IPS_THRESHOLD {
        security_flags.push(SecurityFlag {
            kind: "multiple_ips".to_string(),
            severity: "medium".to_string(),
            detail: format!("{} different IPs detected", ips.len()),
        });
    }
    let language = header_str(&headers, header::ACCEPT_LANGUAGE)
        .and_then(|l| l.split(',').next())
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .unwrap_or("en")
        .to_string();
    let now = Utc::now();

    let record = TrackingRecord {
        session_code,
        user_id,
        user_name: non_empty(body.user_name).unwrap_or_else(|| "Unknown".to_string()),
        event_type,
        ip,
        ip_count: ips.len(),
        all_ips: ips.iter().map(|i| hash_ip(i, &state.ip_salt)).collect(),
        user_agent: header_str(&headers, header::USER_AGENT).unwrap_or_default().to_string(),
        language,
        timestamp: now.timestamp_millis(),
        timestamp_iso: now.to_rfc3339(),
        metadata: body.metadata,
        security_flags,
    };
    let key = record_tracking(&state.store, &Actor::standard(), &record)?;
    debug!("Tracked '{}' for session '{}' as {}", record.event_type, record.session_code, key);

    Ok(Json(TrackSessionResponse {
        success: true,
        skipped: false,
        message: None,
        tracked: Some(TrackedSummary {
            device: device_label(&headers),
            security_flags: record.security_flags.len(),
            session_code: record.session_code,
            user_id: record.user_id,
            event_type: record.event_type,
            ip: record.ip,
            timestamp: record.timestamp,
        }),
    }))
}

/// Track candidate logins and warn about the same candidate on two addresses
pub async fn check_duplicate_login(
    State(state): State<AppState>,
    connect_info: Option<ConnectInfo<SocketAddr>>,
    headers: HeaderMap,
    Json(body): Json<DuplicateLoginRequest>,
) -> ApiResult<Json<DuplicateLoginResponse>> {
    let (Some(user_id), Some(session_code)) = (non_empty(body.user_id), non_empty(body.session_code)) else {
        return Err(ApiError::Validation("Missing required fields".to_string()));
    };
    if body.user_type.as_deref() == Some("interviewer") {
        return Ok(Json(DuplicateLoginResponse {
            success: true,
            skipped: true,
            message: Some("No duplicate login checks for interviewers".to_string()),
            ..Default::default()
        }));
    }
    let Some(action) = body.action.as_deref().and_then(LoginAction::parse) else {
        return Err(ApiError::Validation("Invalid action".to_string()));
    };

    let remote = connect_info.map(|ConnectInfo(addr)| addr);
    let key = login_key(&session_code, &user_id);
    let now = Utc::now().timestamp_millis();
    let tracker = &state.login_tracker;

    let response = match action {
        LoginAction::Login => {
            let entry = LoginEntry {
                user_name: body.user_name.unwrap_or_default(),
                user_id,
                session_code,
                ip_hash: hash_ip(&primary_ip(&headers, remote), &state.ip_salt),
                device: device_label(&headers),
                login_time: now,
                last_activity: now,
            };
            match tracker.login(entry, now) {
                LoginOutcome::Tracked => DuplicateLoginResponse {
                    success: true,
                    message: Some("Login tracked successfully".to_string()),
                    ..Default::default()
                },
                LoginOutcome::DifferentLocation(existing) => DuplicateLoginResponse {
                    success: true,
                    warning: Some("multiple_login_detected".to_string()),
                    message: Some("Note: You appear to be logging in from a different location".to_string()),
                    session: Some(session_info(&existing)),
                    ..Default::default()
                },
            }
        }
        LoginAction::Heartbeat => {
            tracker.heartbeat(&key, now);
            DuplicateLoginResponse { success: true, ..Default::default() }
        }
        LoginAction::Logout => {
            tracker.logout(&key);
            info!("Login '{}' closed", key);
            DuplicateLoginResponse {
                success: true,
                message: Some("Logout successful".to_string()),
                ..Default::default()
            }
        }
        LoginAction::Check => {
            let existing = tracker.check(&key);
            DuplicateLoginResponse {
                success: true,
                exists: Some(existing.is_some()),
                session: existing.as_ref().map(session_info),
                ..Default::default()
            }
        }
    };
    Ok(Json(response))
}

fn session_info(entry: &LoginEntry) -> LoginSessionInfo {
    LoginSessionInfo {
        login_time: entry.login_time,
        last_activity: entry.last_activity,
        device: entry.device.clone(),
    }
}
