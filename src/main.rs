//! VCF Bot - premium-gated contact card generator for Telegram
//!
//! Architecture:
//! - SeaORM for users and license keys (SQLite)
//! - Teloxide for the chat transport with inline keyboards
//! - Tokio for async runtime and the periodic expiry sweep

mod bot;
mod broadcast;
mod card;
mod entity;
mod error;
mod plugins;
mod prelude;
mod session;
mod state;
mod sv;
#[cfg(test)]
mod testing;
mod transport;
mod utils;

use tracing_subscriber::{
  EnvFilter, layer::SubscriberExt, util::SubscriberInitExt,
};

use crate::{
  plugins::{App, cron, telegram},
  prelude::*,
  state::{AppState, Config},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  dotenvy::dotenv().ok();

  tracing_subscriber::registry()
    .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
      "vcfbot=debug,sea_orm=warn,teloxide=info".into()
    }))
    .with(tracing_subscriber::fmt::layer())
    .init();

  let config = Config::from_env()?;

  info!("Starting VCF Bot v{}", env!("CARGO_PKG_VERSION"));

  let app = Arc::new(AppState::connect(config).await?);

  let running = App::new()
    .register(telegram::Plugin)
    .register(cron::ExpirySweep)
    .run(app);

  tokio::signal::ctrl_c().await.context("Failed to listen for shutdown")?;
  info!("Shutting down");
  running.shutdown().await;

  Ok(())
}
