use actix::Actor;
use actix_web::{web, App, HttpServer};
use tracing_actix_web::TracingLogger;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use fishhappy_lifecycle::actors::DeliveryDispatcher;
use fishhappy_lifecycle::api;
use fishhappy_lifecycle::config::AppConfig;
use fishhappy_lifecycle::state::AppState;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    // Default to INFO with debug for this crate; override with RUST_LOG
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true).with_thread_ids(true))
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,fishhappy_lifecycle=debug")),
        )
        .init();

    tracing::info!("🐟 Starting Fish Happy lifecycle service");

    let config = AppConfig::from_env()?;
    let state = AppState::from_config(&config).await?;

    // Opens deliveries for orders shipped with shipment details
    let _dispatcher = DeliveryDispatcher::new(state.deliveries.clone(), &state.bus).start();

    let (host, port) = config.bind_addr();
    tracing::info!("🚀 Listening on http://{}:{}", host, port);

    let data = web::Data::new(state);
    HttpServer::new(move || {
        App::new()
            .wrap(TracingLogger::default())
            .app_data(data.clone())
            .configure(api::configure)
    })
    .bind((host, port))?
    .run()
    .await?;

    tracing::info!("🛑 Server stopped");
    Ok(())
}
