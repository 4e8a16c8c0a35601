use teloxide::utils::command::BotCommands;

use super::{Sender, callback};
use crate::{
  card::{self, MERGED_FILE_NAME, UploadKind},
  prelude::*,
  state::AppState,
  transport::{FileRef, Transport},
};

#[derive(BotCommands, Clone, Debug, PartialEq, Eq)]
#[command(rename_rule = "lowercase")]
pub enum Command {
  Start,
  SetFileName(String),
  SetContactName(String),
  SetLimit(String),
  SetCountryCode(String),
  MySettings,
  Reset,
  Merge,
  Done,
  // Admin commands below
  Block(String),
  Unblock(String),
}

pub fn parse(text: &str, bot_username: &str) -> Option<Command> {
  Command::parse(text, bot_username).ok()
}

const PREMIUM_HELP: &str = "\
✅ VCF BOT ACTIVE
Send numbers / TXT / VCF

/setfilename <name> - output file name
/setcontactname <name> - contact name prefix
/setlimit <n> - contacts per file
/setcountrycode <code> - dialing code prefix
/mysettings - show settings
/reset - restore default settings
/merge, then /done - merge VCF files";

fn access_denied(support: &str) -> String {
  format!("❌ Access denied\n\n📂💾 VCF Bot Access\nDM {support}")
}

fn premium_until(expires: Option<DateTime>) -> String {
  match expires {
    None => "♾ Premium: permanent".into(),
    Some(exp) => {
      let left = (exp - Utc::now().naive_utc()).max(TimeDelta::zero());
      format!(
        "⏳ Premium until {} ({} left)",
        utils::format_date(exp),
        utils::format_duration(left)
      )
    }
  }
}

/// Entry command, branches by role before any pending state is looked at.
pub async fn start(
  app: &AppState,
  transport: &dyn Transport,
  from: &Sender,
) -> Result<()> {
  if app.is_owner(from.id) {
    return transport
      .send_keyboard(from.chat, "👑 ADMIN PANEL", callback::admin_menu())
      .await;
  }

  let now = Utc::now().naive_utc();
  match app.sv().user.by_id(from.id).await? {
    Some(user) if user.is_premium_at(now) => {
      let text =
        format!("{PREMIUM_HELP}\n\n{}", premium_until(user.premium_expires));
      transport.send_text(from.chat, &text).await
    }
    _ => {
      transport
        .send_keyboard(
          from.chat,
          &access_denied(&app.config.support_contact),
          callback::redeem_menu(),
        )
        .await
    }
  }
}

pub async fn redeem(
  app: &AppState,
  transport: &dyn Transport,
  from: &Sender,
  token: &str,
) -> Result<()> {
  let key = app.sv().key.redeem(token, from.id).await?;
  let text =
    format!("✅ Premium Activated\n{}", premium_until(key.expires_at));
  transport.send_text(from.chat, &text).await
}

fn required(arg: &str, usage: &str) -> Result<String> {
  let arg = arg.trim();
  if arg.is_empty() {
    return Err(Error::InvalidArgs(format!("Usage: {usage}")));
  }
  Ok(arg.to_string())
}

/// Premium feature commands. The caller has already passed the gate.
pub async fn handle(
  app: &AppState,
  transport: &dyn Transport,
  from: &Sender,
  cmd: Command,
) -> Result<()> {
  let sessions = &app.sessions;

  let reply = match cmd {
    Command::SetFileName(name) => {
      let name = required(&name, "/setfilename <name>")?;
      sessions.update_prefs(from.id, |p| p.file_name = name);
      "✅ File name set".to_string()
    }
    Command::SetContactName(name) => {
      let name = required(&name, "/setcontactname <name>")?;
      sessions.update_prefs(from.id, |p| p.contact_name = name);
      "✅ Contact name set".to_string()
    }
    Command::SetLimit(limit) => {
      let limit = limit
        .split_whitespace()
        .next()
        .and_then(|n| n.parse::<usize>().ok())
        .filter(|n| *n > 0)
        .ok_or_else(|| {
          Error::InvalidArgs("Usage: /setlimit <positive number>".into())
        })?;
      sessions.update_prefs(from.id, |p| p.limit = limit);
      "✅ Limit set".to_string()
    }
    Command::SetCountryCode(code) => {
      let code = required(&code, "/setcountrycode <code>")?;
      let code = code.split_whitespace().next().unwrap_or_default().to_string();
      sessions.update_prefs(from.id, |p| p.country_code = code);
      "✅ Country code set".to_string()
    }
    Command::MySettings => {
      let prefs = sessions.prefs(from.id);
      format!(
        "⚙️ Settings\nFile: {}\nContact: {}\nLimit: {}\nCountry code: {}",
        prefs.output_name(),
        prefs.contact_name,
        prefs.limit,
        if prefs.country_code.is_empty() { "-" } else { prefs.country_code.as_str() }
      )
    }
    Command::Reset => {
      sessions.reset_prefs(from.id);
      "✅ Settings reset".to_string()
    }
    Command::Merge => {
      sessions.start_merge(from.id);
      "📂 Send VCF files, then /done".to_string()
    }
    Command::Done => return finish_merge(app, transport, from).await,
    // handled before the gate
    Command::Start | Command::Block(_) | Command::Unblock(_) => {
      return Ok(());
    }
  };

  transport.send_text(from.chat, &reply).await
}

async fn finish_merge(
  app: &AppState,
  transport: &dyn Transport,
  from: &Sender,
) -> Result<()> {
  let queue = app.sessions.merge_queue(from.id)?;

  // the session closes only once the merged file is out
  let mut documents = Vec::with_capacity(queue.len());
  for file in &queue {
    documents.push(transport.fetch_file(file).await?);
  }

  debug!(user = from.id, files = documents.len(), "Merging card files");
  transport
    .send_file(from.chat, MERGED_FILE_NAME, card::merge(&documents))
    .await?;
  app.sessions.close_merge(from.id);
  Ok(())
}

/// Free text: every qualifying digit run becomes a contact.
pub async fn numbers(
  app: &AppState,
  transport: &dyn Transport,
  from: &Sender,
  text: &str,
) -> Result<()> {
  let numbers = card::extract(text);
  if numbers.is_empty() {
    return Ok(());
  }
  send_cards(app, transport, from, &numbers).await
}

pub async fn document(
  app: &AppState,
  transport: &dyn Transport,
  from: &Sender,
  file: FileRef,
) -> Result<()> {
  let kind = UploadKind::of(file.name.as_deref());

  if let Some(queued) = app.sessions.push_merge_file(from.id, file.clone()) {
    debug!(user = from.id, queued, "File queued for merge");
    return transport.send_text(from.chat, "📥 Added").await;
  }

  if kind == UploadKind::Unrecognized {
    return transport.send_text(from.chat, "❌ Unsupported file").await;
  }

  let content = transport.fetch_file(&file).await?;
  let numbers = kind.numbers(&content);
  if numbers.is_empty() {
    return transport.send_text(from.chat, "❌ No numbers found").await;
  }

  send_cards(app, transport, from, &numbers).await
}

async fn send_cards(
  app: &AppState,
  transport: &dyn Transport,
  from: &Sender,
  numbers: &[String],
) -> Result<()> {
  let prefs = app.sessions.prefs(from.id);
  let doc = card::generate(numbers, &prefs);
  transport.send_file(from.chat, &prefs.output_name(), doc.into_bytes()).await
}

/// Administrator-only text commands.
pub async fn admin(
  app: &AppState,
  transport: &dyn Transport,
  from: &Sender,
  cmd: Command,
) -> Result<()> {
  let (arg, blocked) = match cmd {
    Command::Block(arg) => (arg, true),
    Command::Unblock(arg) => (arg, false),
    _ => return Ok(()),
  };

  let target = arg.trim().parse::<i64>().map_err(|_| {
    Error::InvalidArgs(if blocked {
      "Usage: /block <user_id>".into()
    } else {
      "Usage: /unblock <user_id>".into()
    })
  })?;

  if blocked && app.is_owner(target) {
    return Err(Error::InvalidArgs("The administrator cannot be blocked".into()));
  }

  app.sv().user.set_blocked(target, blocked).await?;
  info!(target, blocked, "Block flag changed");

  let reply = if blocked {
    format!("🚫 User {target} blocked")
  } else {
    format!("✅ User {target} unblocked")
  };
  transport.send_text(from.chat, &reply).await
}
