use axum::{handler::HandlerWithoutStateExt, http::StatusCode, Router};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const PORT: u16 = 8080;

async fn file_not_found() -> (StatusCode, &'static str) {
    (StatusCode::NOT_FOUND, "File not found")
}

/// Serve the working directory for local front-end development.
#[tokio::main(flavor = "current_thread")]
async fn main() {
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "tower_http=debug,info".into()))
        .init();

    // `/` resolves to index.html
    let files = ServeDir::new(".")
        .append_index_html_on_directories(true)
        .not_found_service(file_not_found.into_service());
    let app = Router::new().fallback_service(files).layer(TraceLayer::new_for_http());

    let addr = format!("0.0.0.0:{}", PORT);
    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(e) => {
            error!("Failed to bind {}: {}", addr, e);
            std::process::exit(1);
        }
    };
    info!("🚀 OpenCollab development server running at http://localhost:{}", PORT);
    info!("   Landing page: http://localhost:{}/", PORT);
    info!("   Application:  http://localhost:{}/app.html", PORT);
    if let Err(e) = axum::serve(listener, app).await {
        error!("Server error: {}", e);
    }
}
