//! Inbound event dispatch: access gate, pending state, then features.

mod callback;
mod command;

pub use callback::Callback;
pub use command::Command;

use crate::{
  broadcast,
  prelude::*,
  state::AppState,
  transport::{FileRef, Transport},
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sender {
  pub id: i64,
  /// Where replies go
  pub chat: i64,
  pub username: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
  Text(String),
  Document(FileRef),
  Photo { file: String, caption: Option<String> },
  Callback(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
  pub from: Sender,
  pub input: Input,
}

/// Guard in front of every handler. `Silent` ends processing with no reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gate {
  Open,
  Silent,
}

impl Gate {
  async fn unblocked(app: &AppState, user_id: i64) -> Result<Self> {
    let blocked = app.sv().access.is_blocked(user_id).await?;
    Ok(if blocked { Gate::Silent } else { Gate::Open })
  }

  async fn premium(app: &AppState, user_id: i64) -> Result<Self> {
    let premium = app.sv().access.is_premium(user_id).await?;
    Ok(if premium { Gate::Open } else { Gate::Silent })
  }
}

/// Administrator content waiting to go out to every user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fanout {
  Text(String),
  Photo { file: String, caption: Option<String> },
}

/// Handles one event end to end. Failures are logged and answered with a
/// short message, they never reach the caller.
pub async fn handle(app: &AppState, transport: &dyn Transport, event: Event) {
  let user = event.from.id;
  let chat = event.from.chat;

  let result =
    match time::timeout(app.config.event_timeout, dispatch(app, transport, event))
      .await
    {
      // a broadcast is bounded per recipient, not by the event budget
      Ok(Ok(Some(fanout))) => run_fanout(app, transport, chat, fanout).await,
      Ok(Ok(None)) => Ok(()),
      Ok(Err(err)) => Err(err),
      Err(_) => Err(Error::Timeout),
    };

  let Err(err) = result else {
    return;
  };

  match err {
    Error::InvalidKey
    | Error::EmptyMergeQueue
    | Error::InvalidArgs(_)
    | Error::UserNotFound => debug!(user, "Request rejected: {err}"),
    _ => error!(user, "Event handling failed: {err}"),
  }

  if let Err(err) = transport.send_text(chat, &err.user_message()).await {
    warn!(user, "Failed to report error: {err}");
  }
}

/// Routes one event. A pending broadcast is handed back to the caller
/// instead of being sent here.
pub async fn dispatch(
  app: &AppState,
  transport: &dyn Transport,
  event: Event,
) -> Result<Option<Fanout>> {
  let Event { from, input } = event;

  app.sv().user.upsert(from.id, from.username.as_deref()).await?;

  if Gate::unblocked(app, from.id).await? == Gate::Silent {
    debug!(user = from.id, "Ignoring blocked user");
    return Ok(None);
  }

  match input {
    Input::Callback(data) => {
      callback::handle(app, transport, &from, &data).await?;
      Ok(None)
    }
    input => message(app, transport, &from, input).await,
  }
}

async fn run_fanout(
  app: &AppState,
  transport: &dyn Transport,
  chat: i64,
  fanout: Fanout,
) -> Result<()> {
  let per_send = app.config.event_timeout;

  let reply = match fanout {
    Fanout::Text(text) => {
      let delivery =
        broadcast::send_text_to_all(&app.db, transport, &text, per_send)
          .await?;
      format!(
        "✅ Broadcast sent ({} delivered, {} failed)",
        delivery.sent, delivery.failed
      )
    }
    Fanout::Photo { file, caption } => {
      let delivery = broadcast::send_photo_to_all(
        &app.db,
        transport,
        &file,
        caption.as_deref(),
        per_send,
      )
      .await?;
      format!(
        "✅ Photo broadcast sent ({} delivered, {} failed)",
        delivery.sent, delivery.failed
      )
    }
  };

  transport.send_text(chat, &reply).await
}

async fn message(
  app: &AppState,
  transport: &dyn Transport,
  from: &Sender,
  input: Input,
) -> Result<Option<Fanout>> {
  let command = match &input {
    Input::Text(text) => command::parse(text, &app.config.bot_username),
    _ => None,
  };

  if command == Some(Command::Start) {
    command::start(app, transport, from).await?;
    return Ok(None);
  }

  if let Input::Text(text) = &input
    && app.sessions.take_key_request(from.id)
  {
    command::redeem(app, transport, from, text.trim()).await?;
    return Ok(None);
  }

  if app.is_owner(from.id) {
    match input {
      Input::Text(text) if app.sessions.take_broadcast_text() => {
        return Ok(Some(Fanout::Text(text)));
      }
      Input::Photo { file, caption }
        if app.sessions.take_broadcast_photo() =>
      {
        return Ok(Some(Fanout::Photo { file, caption }));
      }
      _ => {}
    }

    if let Some(cmd @ (Command::Block(_) | Command::Unblock(_))) = command {
      command::admin(app, transport, from, cmd).await?;
      return Ok(None);
    }
  }

  if Gate::premium(app, from.id).await? == Gate::Silent {
    debug!(user = from.id, "Premium required, staying silent");
    return Ok(None);
  }

  match input {
    Input::Text(text) => match command {
      Some(cmd) => command::handle(app, transport, from, cmd).await?,
      None => command::numbers(app, transport, from, &text).await?,
    },
    Input::Document(file) => command::document(app, transport, from, file).await?,
    Input::Photo { .. } | Input::Callback(_) => {}
  }
  Ok(None)
}
