use mimalloc::MiMalloc;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use plaza_proxy::config::Config;
use plaza_proxy::db::PlazaStorage;
use plaza_proxy::router::{PlazaState, plaza_router};
use plaza_proxy::vault::CredentialVault;

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    let cfg = Config::from_env()?;

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(cfg.loglevel.clone()));
    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_level(true)
                .with_target(false),
        )
        .init();

    info!(
        database_url = %cfg.database_url,
        bind_addr = %cfg.bind_addr,
        allowed_origins = %cfg.allowed_origins,
        loglevel = %cfg.loglevel,
    );

    // Fails fast on a short encryption key.
    let vault = CredentialVault::new(&cfg.encryption_key)?;

    let storage = PlazaStorage::connect(&cfg.database_url).await?;

    let state = PlazaState::new(storage, vault, &cfg)?;
    let app = plaza_router(state);

    let listener = TcpListener::bind(&cfg.bind_addr).await?;
    info!("HTTP server listening on {}", cfg.bind_addr);
    axum::serve(listener, app).await?;
    Ok(())
}
