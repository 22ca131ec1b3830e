//! Telegram update handlers.
//!
//! Each handler is a small adapter that extracts who/where from the update,
//! takes the chat lock and hands the input to the flow runner.

use std::sync::Arc;

use teloxide::{
    prelude::*,
    types::{CallbackQuery, Message},
};

use spendbot_core::{
    domain::{ChatId, UserId},
    flows::FlowContext,
};

use crate::router::AppState;

mod callback;
mod commands;
mod text;

pub async fn handle_callback(
    bot: Bot,
    q: CallbackQuery,
    state: Arc<AppState>,
) -> ResponseResult<()> {
    callback::handle_callback(bot, q, state).await
}

pub async fn handle_message(bot: Bot, msg: Message, state: Arc<AppState>) -> ResponseResult<()> {
    let Some(user) = msg.from() else {
        return Ok(());
    };
    let ctx = FlowContext {
        user_id: UserId(user.id.0 as i64),
        chat_id: ChatId(msg.chat.id.0),
    };

    let Some(text) = msg.text() else {
        let _ = bot
            .send_message(msg.chat.id, "Please answer with a text message.")
            .await;
        return Ok(());
    };

    // Sequentialize messages per chat.
    let _guard = state.chat_locks.lock_chat(ctx.chat_id.0).await;

    if text.starts_with('/') {
        return commands::handle_command(&state, ctx, user, text).await;
    }
    text::handle_text(&state, ctx, text).await
}
