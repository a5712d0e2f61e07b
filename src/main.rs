use std::net::SocketAddr;

use testsheet_backend::{
    config::{get_config, init_config},
    database::pool::{create_pool, run_migrations},
    routes::{router, RouterSettings},
    AppState,
};
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let json = std::env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    if json {
        tracing_subscriber::fmt().with_env_filter(filter).json().init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    init_config()?;
    let config = get_config()?;

    let pool = create_pool(&config.database_url, config.database_max_connections).await?;
    run_migrations(&pool).await?;

    let app_state = AppState::new(pool, config.utc_offset_hours);
    let app = router(app_state, RouterSettings::from_config(config));

    let addr: SocketAddr = config.server_address.parse()?;
    info!("Server listening on {}", addr);
    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
