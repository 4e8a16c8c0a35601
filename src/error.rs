use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("Database error: {0}")]
  Database(#[from] sea_orm::DbErr),

  #[error("Key not found, already used or expired")]
  InvalidKey,

  #[error("Merge queue is empty")]
  EmptyMergeQueue,

  #[error("User not found")]
  UserNotFound,

  #[error("Invalid arguments: {0}")]
  InvalidArgs(String),

  #[error("Telegram request failed: {0}")]
  Request(#[from] teloxide::RequestError),

  #[error("File download failed: {0}")]
  Download(#[from] teloxide::DownloadError),

  #[error("Delivery failed: {0}")]
  Transport(String),

  #[error("Event handling timed out")]
  Timeout,
}

impl Error {
  /// Text shown to the user when a handler fails with this error.
  pub fn user_message(&self) -> String {
    match self {
      Error::InvalidKey => "❌ Invalid / Expired Key".into(),
      Error::EmptyMergeQueue => "❌ No files".into(),
      Error::UserNotFound => "❌ User not found".into(),
      Error::InvalidArgs(usage) => format!("❌ {usage}"),
      Error::Database(_)
      | Error::Request(_)
      | Error::Download(_)
      | Error::Transport(_)
      | Error::Timeout => "⚠️ Something went wrong, try again later".into(),
    }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
