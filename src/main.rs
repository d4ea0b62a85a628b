use std::process::ExitCode;

use chatprofile::{app, state::AppState};

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();

    let env_filter = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| "chatprofile=debug,axum=info,tower_http=info".to_string());
    let json_logs = std::env::var("LOG_FORMAT")
        .map(|v| v == "json")
        .unwrap_or(false);

    if json_logs {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(env_filter).init();
    }

    // Startup failures are fatal: never serve without a live database.
    let app_state = match AppState::init().await {
        Ok(s) => s,
        Err(e) => {
            tracing::error!(error = %format!("{e:#}"), "startup failed");
            return ExitCode::from(1);
        }
    };

    if let Err(e) = sqlx::migrate!("./migrations").run(&app_state.db).await {
        tracing::error!(error = %e, "migrations failed");
        return ExitCode::from(1);
    }

    let server = app_state.config.server.clone();
    match app::serve(app::build_app(app_state), &server).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %format!("{e:#}"), "server stopped");
            ExitCode::from(1)
        }
    }
}
