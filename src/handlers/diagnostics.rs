use axum::{extract::{Extension, State}, http::StatusCode, Json};
use std::sync::{Mutex, OnceLock};
use sysinfo::System;
use tracing::info;

use crate::auth::auth::ensure_interviewer;
use crate::error::ApiResult;
use crate::models::DiagnosticsResponse;
use crate::services::auth_service::Claims;
use crate::state::AppState;

static SYSTEM_MONITOR: OnceLock<Mutex<System>> = OnceLock::new();

/// Store, tracker and host statistics
pub async fn diagnostics(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> ApiResult<(StatusCode, Json<DiagnosticsResponse>)> {
    ensure_interviewer(&claims)?;

    let stats = state.store.stats();
    let n_tracked_logins = state.login_tracker.len() as u32;

    // System stats
    let (cpu_usage, memory_alloc, memory_free, memory_total) = {
        let sys_lock = SYSTEM_MONITOR.get_or_init(|| Mutex::new(System::new_all()));
        match sys_lock.lock() {
            Ok(mut sys) => {
                sys.refresh_cpu();
                sys.refresh_memory();
                (
                    sys.global_cpu_info().cpu_usage(),
                    sys.used_memory(),
                    sys.free_memory(),
                    sys.total_memory(),
                )
            }
            Err(_) => (0.0, 0, 0, 0),
        }
    };

    info!(
        "Diagnostics: CPU: {:.2}%, Mem: {}/{} MB (Free: {} MB), Sessions: {}, Conn: {}",
        cpu_usage,
        memory_alloc / 1024 / 1024,
        memory_total / 1024 / 1024,
        memory_free / 1024 / 1024,
        stats.sessions,
        stats.connections
    );

    Ok((
        StatusCode::OK,
        Json(DiagnosticsResponse {
            n_sessions: stats.sessions as u32,
            n_conn: stats.connections as u32,
            n_subscriptions: stats.subscriptions as u32,
            n_tracked_logins,
            cpu_usage,
            memory_alloc,
            memory_total,
            memory_free,
        }),
    ))
}
