//! Per-user interaction state, held in process memory only.
//!
//! Every map is a `DashMap`, so reads and writes for one user id are
//! serialized by the shard lock of that key.

use std::sync::atomic::{AtomicBool, Ordering};

use crate::{card::Preferences, prelude::*, transport::FileRef};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Session {
  #[default]
  Idle,
  AwaitingKey,
  AwaitingMergeFiles(Vec<FileRef>),
}

#[derive(Debug, Default)]
pub struct Sessions {
  states: DashMap<i64, Session>,
  prefs: DashMap<i64, Preferences>,
  broadcast_text: AtomicBool,
  broadcast_photo: AtomicBool,
}

impl Sessions {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn state(&self, user_id: i64) -> Session {
    self.states.get(&user_id).map(|s| s.clone()).unwrap_or_default()
  }

  pub fn await_key(&self, user_id: i64) {
    self.states.insert(user_id, Session::AwaitingKey);
  }

  /// Consumes a pending key request. True if the user was waiting for one.
  pub fn take_key_request(&self, user_id: i64) -> bool {
    self
      .states
      .remove_if(&user_id, |_, s| matches!(s, Session::AwaitingKey))
      .is_some()
  }

  pub fn start_merge(&self, user_id: i64) {
    self.states.insert(user_id, Session::AwaitingMergeFiles(Vec::new()));
  }

  /// Queues a file if a merge session is open. Returns the queue length.
  pub fn push_merge_file(&self, user_id: i64, file: FileRef) -> Option<usize> {
    let mut state = self.states.get_mut(&user_id)?;
    match state.value_mut() {
      Session::AwaitingMergeFiles(queue) => {
        queue.push(file);
        Some(queue.len())
      }
      _ => None,
    }
  }

  /// Files queued so far. The session stays open until `close_merge`, so a
  /// failed download does not lose the queue. An open session with no files
  /// is closed here.
  pub fn merge_queue(&self, user_id: i64) -> Result<Vec<FileRef>> {
    match self.state(user_id) {
      Session::AwaitingMergeFiles(queue) if !queue.is_empty() => Ok(queue),
      _ => {
        self.close_merge(user_id);
        Err(Error::EmptyMergeQueue)
      }
    }
  }

  pub fn close_merge(&self, user_id: i64) {
    self
      .states
      .remove_if(&user_id, |_, s| matches!(s, Session::AwaitingMergeFiles(_)));
  }

  pub fn prefs(&self, user_id: i64) -> Preferences {
    self.prefs.get(&user_id).map(|p| p.clone()).unwrap_or_default()
  }

  pub fn update_prefs(&self, user_id: i64, f: impl FnOnce(&mut Preferences)) {
    let mut prefs = self.prefs.entry(user_id).or_default();
    f(prefs.value_mut());
  }

  pub fn reset_prefs(&self, user_id: i64) {
    self.prefs.remove(&user_id);
  }

  pub fn await_broadcast_text(&self) {
    self.broadcast_text.store(true, Ordering::SeqCst);
  }

  pub fn await_broadcast_photo(&self) {
    self.broadcast_photo.store(true, Ordering::SeqCst);
  }

  /// Clears the text broadcast flag, returning whether it was set.
  pub fn take_broadcast_text(&self) -> bool {
    self.broadcast_text.swap(false, Ordering::SeqCst)
  }

  pub fn take_broadcast_photo(&self) -> bool {
    self.broadcast_photo.swap(false, Ordering::SeqCst)
  }
}
