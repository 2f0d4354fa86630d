mod config;
mod feed;
mod frame;
mod routes;
mod services;
mod state;

use std::process::ExitCode;

use tracing::{error, info};

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt::init();

    let config = match config::Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!(error = %e, "invalid configuration");
            return ExitCode::FAILURE;
        }
    };
    let pools = match config.load_pools() {
        Ok(pools) => pools,
        Err(e) => {
            error!(error = %e, "failed to load message pools");
            return ExitCode::FAILURE;
        }
    };
    info!(
        pools = %config.pools_file.as_ref().map_or_else(|| "builtin".to_owned(), |p| p.display().to_string()),
        buffer_cap = config.buffer_cap,
        visible = config.visible,
        "message pools loaded"
    );

    let state = state::AppState::new(&config, pools);
    services::feed::start(&state).await;

    let app = routes::app(state.clone(), &config.overlay_dir);
    let port = config.port;
    let listener = match tokio::net::TcpListener::bind(format!("0.0.0.0:{port}")).await {
        Ok(listener) => listener,
        Err(e) => {
            error!(error = %e, %port, "failed to bind");
            return ExitCode::FAILURE;
        }
    };

    info!(%port, overlay = %config.overlay_dir.display(), "livechat listening");
    let served = axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await;

    services::feed::shutdown(&state).await;
    match served {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "server failed");
            ExitCode::FAILURE
        }
    }
}
