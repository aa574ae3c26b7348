//! Telegram update handlers.
//!
//! Each handler converts a teloxide update into the core update model and
//! hands it to `UpdateHandler`, which owns guards, rendering and delivery.

use std::sync::Arc;

use teloxide::{
    prelude::*,
    types::{CallbackQuery, Message, User},
};
use tracing::debug;

use fxb_core::{
    commands::Command,
    domain::{ChatId, MessageId, MessageRef, UserId},
    messaging::types::{self, CommandMessage, IncomingUpdate},
};

use crate::router::AppState;

pub async fn handle_callback(q: CallbackQuery, state: Arc<AppState>) -> ResponseResult<()> {
    state.handler.handle_update(callback_update(&q)).await;
    Ok(())
}

pub async fn handle_message(msg: Message, state: Arc<AppState>) -> ResponseResult<()> {
    let Some(update) = command_update(&msg) else {
        return Ok(());
    };

    state.handler.handle_update(update).await;
    Ok(())
}

fn user_id(user: &User) -> UserId {
    UserId(user.id.0 as i64)
}

fn command_update(msg: &Message) -> Option<IncomingUpdate> {
    let user = msg.from()?;
    let text = msg.text()?;
    if !text.starts_with('/') {
        return None;
    }

    let Some(command) = Command::parse(text) else {
        debug!(text, "Ignoring unknown command");
        return None;
    };

    Some(IncomingUpdate::Command(CommandMessage {
        chat_id: ChatId(msg.chat.id.0),
        user_id: user_id(user),
        username: user.username.clone(),
        first_name: Some(user.first_name.clone()),
        command,
    }))
}

/// Missing data is routed as an empty token so it is acknowledged and
/// answered as an unknown option like any other unrecognized value.
fn callback_update(q: &CallbackQuery) -> IncomingUpdate {
    let data = q.data.clone().unwrap_or_default();
    let message = q.message.as_ref().map(|m| MessageRef {
        chat_id: ChatId(m.chat.id.0),
        message_id: MessageId(m.id.0),
    });

    IncomingUpdate::Callback(types::CallbackQuery {
        chat_id: message.map(|m| m.chat_id),
        user_id: user_id(&q.from),
        username: q.from.username.clone(),
        first_name: Some(q.from.first_name.clone()),
        callback_id: q.id.clone(),
        data,
        message,
    })
}
