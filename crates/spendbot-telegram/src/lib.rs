//! Telegram adapter (teloxide).
//!
//! This crate implements the `spendbot-core` MessagingPort over Telegram Bot API
//! and routes updates into the flow runner.

use std::path::Path;

use async_trait::async_trait;

use teloxide::{
    prelude::*,
    types::{InlineKeyboardButton, InlineKeyboardMarkup, InputFile, ParseMode},
};

pub mod handlers;
pub mod router;

use spendbot_core::{
    domain::{ChatId, MessageId, MessageRef},
    errors::Error,
    messaging::{
        port::MessagingPort,
        types::{InlineKeyboard, MessagingCapabilities},
    },
    Result,
};

#[derive(Clone)]
pub struct TelegramMessenger {
    bot: Bot,
}

impl TelegramMessenger {
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }

    fn tg_chat(chat_id: ChatId) -> teloxide::types::ChatId {
        teloxide::types::ChatId(chat_id.0)
    }

    fn map_err(e: teloxide::RequestError) -> Error {
        Error::External(format!("telegram error: {e}"))
    }

    fn msg_ref(chat_id: ChatId, msg: &Message) -> MessageRef {
        MessageRef {
            chat_id,
            message_id: MessageId(msg.id.0),
        }
    }
}

fn keyboard_markup(keyboard: InlineKeyboard) -> InlineKeyboardMarkup {
    let rows: Vec<Vec<InlineKeyboardButton>> = keyboard
        .buttons
        .into_iter()
        .map(|b| vec![InlineKeyboardButton::callback(b.label, b.callback_data)])
        .collect();
    InlineKeyboardMarkup::new(rows)
}

#[async_trait]
impl MessagingPort for TelegramMessenger {
    fn capabilities(&self) -> MessagingCapabilities {
        MessagingCapabilities {
            max_message_len: 4096,
        }
    }

    async fn send_html(&self, chat_id: ChatId, html: &str) -> Result<MessageRef> {
        let msg = self
            .bot
            .send_message(Self::tg_chat(chat_id), html.to_string())
            .parse_mode(ParseMode::Html)
            .await
            .map_err(Self::map_err)?;
        Ok(Self::msg_ref(chat_id, &msg))
    }

    async fn send_inline_keyboard(
        &self,
        chat_id: ChatId,
        text: &str,
        keyboard: InlineKeyboard,
    ) -> Result<MessageRef> {
        let msg = self
            .bot
            .send_message(Self::tg_chat(chat_id), text.to_string())
            .parse_mode(ParseMode::Html)
            .reply_markup(keyboard_markup(keyboard))
            .await
            .map_err(Self::map_err)?;
        Ok(Self::msg_ref(chat_id, &msg))
    }

    async fn send_document(
        &self,
        chat_id: ChatId,
        path: &Path,
        caption: Option<&str>,
    ) -> Result<MessageRef> {
        if !path.is_file() {
            return Err(Error::InvalidPath {
                path: path.to_path_buf(),
                reason: "not a file".to_string(),
            });
        }

        let mut req = self
            .bot
            .send_document(Self::tg_chat(chat_id), InputFile::file(path.to_path_buf()));
        if let Some(c) = caption {
            req = req.caption(c.to_string());
        }
        let msg = req.await.map_err(Self::map_err)?;
        Ok(Self::msg_ref(chat_id, &msg))
    }

    async fn answer_callback_query(&self, callback_id: &str, text: Option<&str>) -> Result<()> {
        let mut req = self.bot.answer_callback_query(callback_id.to_string());
        if let Some(t) = text {
            req = req.text(t.to_string());
        }
        req.await.map_err(Self::map_err)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use spendbot_core::form::main_menu;
    use teloxide::types::InlineKeyboardButtonKind;

    #[test]
    fn menu_becomes_one_button_per_row() {
        let markup = keyboard_markup(main_menu());
        assert_eq!(markup.inline_keyboard.len(), 4);
        assert!(markup.inline_keyboard.iter().all(|row| row.len() == 1));

        let first = &markup.inline_keyboard[0][0];
        assert_eq!(first.text, "Add Expense");
        assert!(matches!(
            &first.kind,
            InlineKeyboardButtonKind::CallbackData(d) if d == "add_expense"
        ));
    }

    #[tokio::test]
    async fn missing_report_file_is_rejected_before_upload() {
        let messenger = TelegramMessenger::new(Bot::new("123:test"));
        let err = messenger
            .send_document(ChatId(1), Path::new("/nonexistent/report.xlsx"), None)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidPath { .. }));
    }
}
