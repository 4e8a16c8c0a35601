use std::env;

use migration::Migrator;
use sea_orm::ConnectOptions;

use crate::{prelude::*, session::Sessions, sv};

#[derive(Debug, Clone)]
pub struct Config {
  pub token: String,
  /// The single administrator
  pub owner: i64,
  pub bot_username: String,
  pub database_url: String,
  pub sweep_interval: Duration,
  pub store_timeout: Duration,
  pub event_timeout: Duration,
  pub support_contact: String,
}

impl Default for Config {
  fn default() -> Self {
    Self {
      token: String::new(),
      owner: 0,
      bot_username: String::new(),
      database_url: String::from("sqlite:vcfbot.db?mode=rwc"),

      sweep_interval: Duration::from_secs(60),
      store_timeout: Duration::from_secs(10),
      event_timeout: Duration::from_secs(120),
      support_contact: String::from("@support"),
    }
  }
}

fn duration_var(name: &str, default: Duration) -> anyhow::Result<Duration> {
  match env::var(name) {
    Ok(raw) => humantime::parse_duration(raw.trim())
      .with_context(|| format!("Invalid duration in {name}: {raw}")),
    Err(_) => Ok(default),
  }
}

impl Config {
  pub fn from_env() -> anyhow::Result<Self> {
    let defaults = Self::default();

    let token = env::var("TELOXIDE_TOKEN").context("TELOXIDE_TOKEN not set")?;
    let owner = env::var("OWNER_ID")
      .context("OWNER_ID not set")?
      .trim()
      .parse::<i64>()
      .context("Invalid OWNER_ID format")?;

    Ok(Self {
      token,
      owner,
      bot_username: env::var("BOT_USERNAME").unwrap_or_default(),
      database_url: env::var("DATABASE_URL").unwrap_or(defaults.database_url),
      sweep_interval: duration_var("SWEEP_INTERVAL", defaults.sweep_interval)?,
      store_timeout: duration_var("STORE_TIMEOUT", defaults.store_timeout)?,
      event_timeout: duration_var("EVENT_TIMEOUT", defaults.event_timeout)?,
      support_contact: env::var("SUPPORT_CONTACT")
        .unwrap_or(defaults.support_contact),
    })
  }
}

pub struct Services<'a> {
  pub user: sv::User<'a>,
  pub access: sv::Access<'a>,
  pub key: sv::Key<'a>,
}

pub struct AppState {
  pub db: DatabaseConnection,
  pub config: Config,
  pub sessions: Sessions,
}

impl AppState {
  pub async fn connect(config: Config) -> anyhow::Result<Self> {
    info!("Connecting to database...");
    let mut options = ConnectOptions::new(&config.database_url);
    options
      .connect_timeout(config.store_timeout)
      .acquire_timeout(config.store_timeout)
      .sqlx_logging(false);

    let db = Database::connect(options)
      .await
      .context("Failed to connect to database")?;

    info!("Running migrations...");
    Migrator::up(&db, None).await.context("Failed to run migrations")?;

    Ok(Self::with_db(db, config))
  }

  pub fn with_db(db: DatabaseConnection, config: Config) -> Self {
    Self { db, config, sessions: Sessions::new() }
  }

  pub fn sv(&self) -> Services<'_> {
    Services {
      user: sv::User::new(&self.db),
      access: sv::Access::new(&self.db),
      key: sv::Key::new(&self.db),
    }
  }

  pub fn is_owner(&self, user_id: i64) -> bool {
    user_id == self.config.owner
  }
}
