//! Telegram adapter (teloxide).
//!
//! This crate implements the `fxb-core` MessagingPort over the Telegram Bot API
//! and feeds Telegram updates into the core update handler.

use async_trait::async_trait;

use teloxide::{
    prelude::*,
    types::{InlineKeyboardButton, InlineKeyboardMarkup, ParseMode},
    ApiError, RequestError,
};

use tokio::time::sleep;

pub mod handlers;
pub mod router;

use fxb_core::{
    domain::{ChatId, MessageId, MessageRef},
    errors::Error,
    messaging::{
        port::MessagingPort,
        types::{InlineKeyboard, Reply},
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

    fn tg_msg_id(message_id: MessageId) -> teloxide::types::MessageId {
        teloxide::types::MessageId(message_id.0)
    }

    fn tg_markup(keyboard: &InlineKeyboard) -> InlineKeyboardMarkup {
        let rows: Vec<Vec<InlineKeyboardButton>> = keyboard
            .rows
            .iter()
            .map(|row| {
                row.iter()
                    .map(|b| InlineKeyboardButton::callback(b.label.clone(), b.callback_data.clone()))
                    .collect()
            })
            .collect();
        InlineKeyboardMarkup::new(rows)
    }

    fn map_err(e: RequestError) -> Error {
        match e {
            RequestError::Api(ApiError::MessageNotModified) => Error::MessageNotModified,
            other => Error::External(format!("telegram error: {other}")),
        }
    }

    async fn with_retry<T, Fut>(&self, mut op: impl FnMut() -> Fut) -> Result<T>
    where
        Fut: std::future::IntoFuture<Output = std::result::Result<T, RequestError>>,
        Fut::IntoFuture: Send,
    {
        const MAX_RETRIES: usize = 1;
        let mut attempts = 0usize;
        loop {
            match op().await {
                Ok(v) => return Ok(v),
                Err(e) => match e {
                    RequestError::RetryAfter(d) if attempts < MAX_RETRIES => {
                        attempts += 1;
                        sleep(d).await;
                        continue;
                    }
                    other => return Err(Self::map_err(other)),
                },
            }
        }
    }
}

#[async_trait]
impl MessagingPort for TelegramMessenger {
    async fn send_reply(&self, chat_id: ChatId, reply: &Reply) -> Result<MessageRef> {
        let markup = reply.keyboard.as_ref().map(Self::tg_markup);
        let msg = self
            .with_retry(|| {
                let req = self
                    .bot
                    .send_message(Self::tg_chat(chat_id), reply.html.clone())
                    .parse_mode(ParseMode::Html);
                match &markup {
                    Some(m) => req.reply_markup(m.clone()),
                    None => req,
                }
            })
            .await?;

        Ok(MessageRef {
            chat_id,
            message_id: MessageId(msg.id.0),
        })
    }

    async fn edit_reply(&self, msg: MessageRef, reply: &Reply) -> Result<()> {
        let markup = reply.keyboard.as_ref().map(Self::tg_markup);
        self.with_retry(|| {
            let req = self
                .bot
                .edit_message_text(
                    Self::tg_chat(msg.chat_id),
                    Self::tg_msg_id(msg.message_id),
                    reply.html.clone(),
                )
                .parse_mode(ParseMode::Html);
            match &markup {
                Some(m) => req.reply_markup(m.clone()),
                None => req,
            }
        })
        .await?;
        Ok(())
    }

    async fn send_text(&self, chat_id: ChatId, text: &str) -> Result<MessageRef> {
        let msg = self
            .with_retry(|| self.bot.send_message(Self::tg_chat(chat_id), text.to_string()))
            .await?;

        Ok(MessageRef {
            chat_id,
            message_id: MessageId(msg.id.0),
        })
    }

    async fn answer_callback_query(&self, callback_id: &str, text: Option<&str>) -> Result<()> {
        self.with_retry(|| {
            let mut req = self.bot.answer_callback_query(callback_id.to_string());
            if let Some(t) = text {
                req = req.text(t.to_string());
            }
            req
        })
        .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fxb_core::views;

    #[test]
    fn not_modified_maps_to_dedicated_error() {
        let err = TelegramMessenger::map_err(RequestError::Api(ApiError::MessageNotModified));
        assert!(err.is_not_modified());

        let err = TelegramMessenger::map_err(RequestError::Api(ApiError::BotBlocked));
        assert!(matches!(err, Error::External(_)));
    }

    #[test]
    fn keyboard_rows_are_preserved() {
        let markup = TelegramMessenger::tg_markup(&views::main_menu());
        let shape: Vec<usize> = markup.inline_keyboard.iter().map(|r| r.len()).collect();
        assert_eq!(shape, vec![2, 2, 1]);
    }
}
