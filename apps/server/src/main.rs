#![warn(clippy::all, clippy::pedantic)]

use std::net::SocketAddr;

use actix_web::{App, HttpServer, web};
use tracing::info;

mod error;
mod routes;
mod state;

use error::AppError;
use sitewatch_service::{Service, config::Config, shutdown};
use state::AppState;

#[actix_web::main]
async fn main() -> Result<(), AppError> {
    dotenvy::dotenv().ok();

    let config_path = std::env::var_os("SITEWATCH_CONFIG").map(std::path::PathBuf::from);
    let config = Config::from_config(config_path.as_ref())?;
    logger::init_tracing_from_config(&config.logging.level);

    let addr: SocketAddr = format!("{}:{}", config.server.bind, config.server.port).parse()?;
    run_server(addr, &config).await
}

async fn run_server(addr: SocketAddr, config: &Config) -> Result<(), AppError> {
    let (stop, signal) = shutdown::channel();
    let service = Service::build(config, signal).await?;
    let state = web::Data::new(AppState::new(service.registry, config.scheduler.tick_interval_seconds));

    let scheduler = tokio::spawn(service.scheduler.run());

    info!("Management API listening on {addr}");
    HttpServer::new(move || App::new().app_data(state.clone()).configure(routes::routes))
        .bind(addr)?
        .run()
        .await?;

    info!("HTTP server stopped, waiting for the scheduler");
    stop.trigger();
    scheduler.await?;

    Ok(())
}
