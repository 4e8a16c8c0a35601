//! What the bot core needs from a chat transport.

use crate::prelude::*;

/// Opaque handle of an uploaded file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRef {
  pub id: String,
  pub name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Button {
  pub label: String,
  pub data: String,
}

impl Button {
  pub fn new(label: impl Into<String>, data: impl Into<String>) -> Self {
    Self { label: label.into(), data: data.into() }
  }
}

/// Rows of choice buttons.
pub type Keyboard = Vec<Vec<Button>>;

#[async_trait]
pub trait Transport: Send + Sync {
  async fn send_text(&self, chat: i64, text: &str) -> Result<()>;

  async fn send_keyboard(
    &self,
    chat: i64,
    text: &str,
    keyboard: Keyboard,
  ) -> Result<()>;

  async fn send_file(
    &self,
    chat: i64,
    name: &str,
    content: Vec<u8>,
  ) -> Result<()>;

  async fn send_photo(
    &self,
    chat: i64,
    photo: &str,
    caption: Option<&str>,
  ) -> Result<()>;

  async fn fetch_file(&self, file: &FileRef) -> Result<Vec<u8>>;
}
