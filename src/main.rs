use anyhow::Result;
use flextool_lp::{api, config::Config, telemetry};
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    telemetry::init_tracing();

    let cfg = Config::load()?;

    if cfg.server.request_timeout_secs <= cfg.solver.time_limit_seconds {
        warn!(
            request_timeout_secs = cfg.server.request_timeout_secs,
            solver_time_limit_seconds = cfg.solver.time_limit_seconds,
            "request timeout does not exceed the solver budget; long solves will be cut off"
        );
    }

    let state = api::AppState::new(&cfg);
    let app = api::router(state, &cfg);

    let addr = cfg.server.socket_addr()?;
    info!(%addr, solver_time_limit_seconds = cfg.solver.time_limit_seconds, "starting flextool-lp");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(telemetry::shutdown_signal())
        .await?;

    warn!("shutdown complete");
    Ok(())
}
