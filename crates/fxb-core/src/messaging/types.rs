use crate::{
    commands::Command,
    domain::{ChatId, MessageRef, UserId},
};

/// Cross-messenger incoming update model.
///
/// Telegram-specific fields live in the Telegram adapter.
#[derive(Clone, Debug)]
pub enum IncomingUpdate {
    Command(CommandMessage),
    Callback(CallbackQuery),
}

#[derive(Clone, Debug)]
pub struct CommandMessage {
    pub chat_id: ChatId,
    pub user_id: UserId,
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub command: Command,
}

#[derive(Clone, Debug)]
pub struct CallbackQuery {
    pub chat_id: Option<ChatId>,
    pub user_id: UserId,
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub callback_id: String,
    pub data: String,
    /// Message carrying the keyboard that was pressed, if the transport knows it.
    pub message: Option<MessageRef>,
}

/// A rendered response: HTML body plus optional keyboard.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Reply {
    pub html: String,
    pub keyboard: Option<InlineKeyboard>,
}

impl Reply {
    pub fn text(html: impl Into<String>) -> Self {
        Self {
            html: html.into(),
            keyboard: None,
        }
    }

    pub fn with_keyboard(html: impl Into<String>, keyboard: InlineKeyboard) -> Self {
        Self {
            html: html.into(),
            keyboard: Some(keyboard),
        }
    }
}

#[cfg(test)]
impl Reply {
    /// Callback data of every button, row by row.
    pub fn tokens(&self) -> Vec<&str> {
        self.keyboard
            .as_ref()
            .map(|k| {
                k.rows
                    .iter()
                    .flatten()
                    .map(|b| b.callback_data.as_str())
                    .collect()
            })
            .unwrap_or_default()
    }
}

/// Inline keyboard (buttons) laid out in rows.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InlineKeyboard {
    pub rows: Vec<Vec<InlineButton>>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InlineButton {
    pub label: String,
    pub callback_data: String,
}

impl InlineButton {
    pub fn new(label: impl Into<String>, callback_data: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            callback_data: callback_data.into(),
        }
    }
}

impl InlineKeyboard {
    pub fn new(rows: Vec<Vec<InlineButton>>) -> Self {
        Self { rows }
    }

    /// Convenience for a single button on a single row.
    pub fn single(button: InlineButton) -> Self {
        Self {
            rows: vec![vec![button]],
        }
    }
}
