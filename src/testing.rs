//! Shared fixtures for unit tests.

use std::{path::Path, sync::Mutex};

use migration::Migrator;
use sea_orm::ConnectOptions;

use crate::{
  prelude::*,
  state::{AppState, Config},
  transport::{FileRef, Keyboard, Transport},
};

pub const OWNER: i64 = 1;

/// Migrated in-memory store. One connection, so every query sees the
/// same database.
pub async fn setup_test_db() -> DatabaseConnection {
  let mut options = ConnectOptions::new("sqlite::memory:");
  options.max_connections(1).min_connections(1).sqlx_logging(false);

  let db = Database::connect(options).await.unwrap();
  Migrator::up(&db, None).await.unwrap();
  db
}

/// Migrated SQLite file under `dir` with a pool of `connections`, for
/// tests that need transactions to really overlap.
pub async fn setup_file_db(dir: &Path, connections: u32) -> DatabaseConnection {
  let url = format!("sqlite://{}?mode=rwc", dir.join("vcfbot.db").display());
  let mut options = ConnectOptions::new(url);
  options.max_connections(connections).sqlx_logging(false);

  let db = Database::connect(options).await.unwrap();
  Migrator::up(&db, None).await.unwrap();
  db
}

pub async fn setup_app() -> AppState {
  let config = Config { owner: OWNER, ..Default::default() };
  AppState::with_db(setup_test_db().await, config)
}

#[derive(Debug, Clone, PartialEq)]
pub enum Sent {
  Text { chat: i64, text: String },
  Keyboard { chat: i64, text: String, keyboard: Keyboard },
  File { chat: i64, name: String, content: Vec<u8> },
  Photo { chat: i64, photo: String, caption: Option<String> },
}

impl Sent {
  pub fn chat(&self) -> i64 {
    match self {
      Sent::Text { chat, .. }
      | Sent::Keyboard { chat, .. }
      | Sent::File { chat, .. }
      | Sent::Photo { chat, .. } => *chat,
    }
  }
}

/// Records everything sent and serves uploads from memory.
#[derive(Default)]
pub struct MockTransport {
  pub sent: Mutex<Vec<Sent>>,
  pub files: Mutex<HashMap<String, Vec<u8>>>,
  pub unreachable: Mutex<Vec<i64>>,
  pub delay: Mutex<Duration>,
  pub stalled: Mutex<Vec<i64>>,
}

impl MockTransport {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn upload(&self, id: &str, name: &str, content: &[u8]) -> FileRef {
    self.files.lock().unwrap().insert(id.into(), content.to_vec());
    FileRef { id: id.into(), name: Some(name.into()) }
  }

  pub fn fail_for(&self, chat: i64) {
    self.unreachable.lock().unwrap().push(chat);
  }

  /// Every send to any chat takes `delay`.
  pub fn slow(&self, delay: Duration) {
    *self.delay.lock().unwrap() = delay;
  }

  /// Sends to `chat` never complete.
  pub fn stall_for(&self, chat: i64) {
    self.stalled.lock().unwrap().push(chat);
  }

  pub fn take(&self) -> Vec<Sent> {
    std::mem::take(&mut *self.sent.lock().unwrap())
  }

  async fn pause(&self, chat: i64) {
    let delay = if self.stalled.lock().unwrap().contains(&chat) {
      Duration::from_secs(3600)
    } else {
      *self.delay.lock().unwrap()
    };
    if !delay.is_zero() {
      time::sleep(delay).await;
    }
  }

  fn record(&self, sent: Sent) -> Result<()> {
    if self.unreachable.lock().unwrap().contains(&sent.chat()) {
      return Err(Error::Transport(format!("chat {} blocked", sent.chat())));
    }
    self.sent.lock().unwrap().push(sent);
    Ok(())
  }
}

#[async_trait]
impl Transport for MockTransport {
  async fn send_text(&self, chat: i64, text: &str) -> Result<()> {
    self.pause(chat).await;
    self.record(Sent::Text { chat, text: text.into() })
  }

  async fn send_keyboard(
    &self,
    chat: i64,
    text: &str,
    keyboard: Keyboard,
  ) -> Result<()> {
    self.pause(chat).await;
    self.record(Sent::Keyboard { chat, text: text.into(), keyboard })
  }

  async fn send_file(
    &self,
    chat: i64,
    name: &str,
    content: Vec<u8>,
  ) -> Result<()> {
    self.pause(chat).await;
    self.record(Sent::File { chat, name: name.into(), content })
  }

  async fn send_photo(
    &self,
    chat: i64,
    photo: &str,
    caption: Option<&str>,
  ) -> Result<()> {
    self.pause(chat).await;
    self.record(Sent::Photo {
      chat,
      photo: photo.into(),
      caption: caption.map(String::from),
    })
  }

  async fn fetch_file(&self, file: &FileRef) -> Result<Vec<u8>> {
    self
      .files
      .lock()
      .unwrap()
      .get(&file.id)
      .cloned()
      .ok_or_else(|| Error::Transport(format!("no file {}", file.id)))
  }
}
