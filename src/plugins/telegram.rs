use teloxide::{
  Bot,
  dispatching::{Dispatcher, UpdateFilterExt},
  net::Download,
  prelude::*,
  types::{
    CallbackQuery, ChatId, FileId, InlineKeyboardButton, InlineKeyboardMarkup,
    InputFile, Message, Update,
  },
};

use crate::{
  bot::{self, Event, Input, Sender},
  prelude::*,
  state::AppState,
  transport::{FileRef, Keyboard, Transport},
};

pub struct Plugin;

#[async_trait]
impl super::Plugin for Plugin {
  fn name(&self) -> &'static str {
    "telegram"
  }

  async fn start(&self, app: Arc<AppState>) -> anyhow::Result<()> {
    run_bot(app).await;
    Ok(())
  }
}

pub async fn run_bot(app: Arc<AppState>) {
  info!("Starting Telegram bot...");

  let bot = Bot::new(&app.config.token);
  let transport = Arc::new(TelegramTransport { bot: bot.clone() });

  let handler = teloxide::dptree::entry()
    .branch(Update::filter_message().endpoint({
      let app = app.clone();
      let transport = transport.clone();
      move |msg: Message| {
        let app = app.clone();
        let transport = transport.clone();
        async move {
          if let Some(event) = message_event(&msg) {
            bot::handle(&app, transport.as_ref(), event).await;
          }
          respond(())
        }
      }
    }))
    .branch(Update::filter_callback_query().endpoint({
      let app = app.clone();
      let transport = transport.clone();
      move |query: CallbackQuery| {
        let app = app.clone();
        let transport = transport.clone();
        async move {
          // clear the loading state on the pressed button
          if let Err(err) =
            transport.bot.answer_callback_query(query.id.clone()).await
          {
            warn!("Failed to answer callback: {err}");
          }
          if let Some(event) = callback_event(query) {
            bot::handle(&app, transport.as_ref(), event).await;
          }
          respond(())
        }
      }
    }));

  Dispatcher::builder(bot, handler).build().dispatch().await;
}

fn message_event(msg: &Message) -> Option<Event> {
  let user = msg.from.as_ref()?;
  let from = Sender {
    id: user.id.0 as i64,
    chat: msg.chat.id.0,
    username: user.username.clone(),
  };

  let input = if let Some(text) = msg.text() {
    Input::Text(text.to_string())
  } else if let Some(doc) = msg.document() {
    Input::Document(FileRef {
      id: doc.file.id.0.clone(),
      name: doc.file_name.clone(),
    })
  } else if let Some(photo) = msg.photo().and_then(|sizes| sizes.last()) {
    // sizes are ordered smallest first
    Input::Photo {
      file: photo.file.id.0.clone(),
      caption: msg.caption().map(String::from),
    }
  } else {
    return None;
  };

  Some(Event { from, input })
}

fn callback_event(query: CallbackQuery) -> Option<Event> {
  let data = query.data?;
  let id = query.from.id.0 as i64;
  let chat = query.message.as_ref().map_or(id, |msg| msg.chat().id.0);

  Some(Event {
    from: Sender { id, chat, username: query.from.username },
    input: Input::Callback(data),
  })
}

pub struct TelegramTransport {
  bot: Bot,
}

#[async_trait]
impl Transport for TelegramTransport {
  async fn send_text(&self, chat: i64, text: &str) -> Result<()> {
    self.bot.send_message(ChatId(chat), text).await?;
    Ok(())
  }

  async fn send_keyboard(
    &self,
    chat: i64,
    text: &str,
    keyboard: Keyboard,
  ) -> Result<()> {
    let markup = InlineKeyboardMarkup::new(keyboard.into_iter().map(|row| {
      row
        .into_iter()
        .map(|button| InlineKeyboardButton::callback(button.label, button.data))
    }));
    self.bot.send_message(ChatId(chat), text).reply_markup(markup).await?;
    Ok(())
  }

  async fn send_file(
    &self,
    chat: i64,
    name: &str,
    content: Vec<u8>,
  ) -> Result<()> {
    let document = InputFile::memory(content).file_name(name.to_string());
    self.bot.send_document(ChatId(chat), document).await?;
    Ok(())
  }

  async fn send_photo(
    &self,
    chat: i64,
    photo: &str,
    caption: Option<&str>,
  ) -> Result<()> {
    let photo = InputFile::file_id(FileId(photo.to_string()));
    let mut request = self.bot.send_photo(ChatId(chat), photo);
    if let Some(caption) = caption {
      request = request.caption(caption);
    }
    request.await?;
    Ok(())
  }

  async fn fetch_file(&self, file: &FileRef) -> Result<Vec<u8>> {
    let meta = self.bot.get_file(FileId(file.id.clone())).await?;
    let mut buf = Vec::new();
    self.bot.download_file(&meta.path, &mut buf).await?;
    Ok(buf)
  }
}
