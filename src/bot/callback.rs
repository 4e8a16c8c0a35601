use sea_orm::{ActiveEnum, Iterable};

use super::Sender;
use crate::{
  entity::DurationClass,
  prelude::*,
  state::AppState,
  transport::{Button, Keyboard, Transport},
};

/// Callback data enum - provides type-safe callback handling
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Callback {
  Redeem,
  GenerateKey(DurationClass),
  Users,
  BroadcastText,
  BroadcastPhoto,
}

impl Callback {
  pub fn to_data(&self) -> String {
    match self {
      Callback::Redeem => "REDEEM".to_string(),
      Callback::GenerateKey(class) => format!("KEY_{}", class.to_value()),
      Callback::Users => "USERS".to_string(),
      Callback::BroadcastText => "BC_TEXT".to_string(),
      Callback::BroadcastPhoto => "BC_PHOTO".to_string(),
    }
  }

  pub fn from_data(data: &str) -> Option<Self> {
    match data {
      "REDEEM" => Some(Callback::Redeem),
      "USERS" => Some(Callback::Users),
      "BC_TEXT" => Some(Callback::BroadcastText),
      "BC_PHOTO" => Some(Callback::BroadcastPhoto),
      _ => {
        let code = data.strip_prefix("KEY_")?;
        DurationClass::try_from_value(&code.to_string())
          .ok()
          .map(Callback::GenerateKey)
      }
    }
  }

  fn button(self, label: impl Into<String>) -> Button {
    Button::new(label, self.to_data())
  }
}

pub fn admin_menu() -> Keyboard {
  let keys: Vec<Button> = DurationClass::iter()
    .map(|class| {
      Callback::GenerateKey(class).button(format!("🔑 {}", class.label()))
    })
    .collect();

  let mut rows: Keyboard = keys.chunks(2).map(<[Button]>::to_vec).collect();
  rows.push(vec![Callback::Users.button("👥 USERS")]);
  rows.push(vec![
    Callback::BroadcastText.button("📢 TEXT BC"),
    Callback::BroadcastPhoto.button("📷 PHOTO BC"),
  ]);
  rows
}

pub fn redeem_menu() -> Keyboard {
  vec![vec![Callback::Redeem.button("🔑 Redeem Key")]]
}

pub async fn handle(
  app: &AppState,
  transport: &dyn Transport,
  from: &Sender,
  data: &str,
) -> Result<()> {
  let Some(callback) = Callback::from_data(data) else {
    debug!(user = from.id, data, "Unknown callback");
    return Ok(());
  };

  if callback == Callback::Redeem {
    app.sessions.await_key(from.id);
    return transport.send_text(from.chat, "🔑 Send your premium key:").await;
  }

  if !app.is_owner(from.id) {
    return Ok(());
  }

  match callback {
    Callback::GenerateKey(class) => {
      let key = app.sv().key.create(class).await?;
      info!(duration = ?class, "Key generated");
      let expires = key
        .expires_at
        .map(utils::format_date)
        .unwrap_or_else(|| "never".into());
      let text = format!(
        "🔐 KEY ({}):\n{}\nExpires: {}",
        class.label(),
        key.token,
        expires
      );
      transport.send_text(from.chat, &text).await
    }
    Callback::Users => users_list(app, transport, from).await,
    Callback::BroadcastText => {
      app.sessions.await_broadcast_text();
      transport.send_text(from.chat, "Send text").await
    }
    Callback::BroadcastPhoto => {
      app.sessions.await_broadcast_photo();
      transport.send_text(from.chat, "Send photo").await
    }
    Callback::Redeem => Ok(()),
  }
}

async fn users_list(
  app: &AppState,
  transport: &dyn Transport,
  from: &Sender,
) -> Result<()> {
  let users = app.sv().user.all().await?;
  let now = Utc::now().naive_utc();

  let mut text = format!("👥 USERS ({}):\n", users.len());
  for user in &users {
    let status = if user.is_blocked {
      "BLOCKED".to_string()
    } else if user.is_premium_at(now) {
      match user.premium_expires {
        Some(exp) => format!("PREMIUM until {}", utils::format_date(exp)),
        None => "PREMIUM".to_string(),
      }
    } else {
      "FREE".to_string()
    };

    let handle = user
      .username
      .as_deref()
      .map(|name| format!(" @{name}"))
      .unwrap_or_default();

    text.push_str(&format!("{}{} | {}\n", user.tg_user_id, handle, status));
  }

  for chunk in utils::chunk_message(&text, 0) {
    transport.send_text(from.chat, &chunk).await?;
  }
  Ok(())
}
