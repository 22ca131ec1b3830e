use std::sync::Arc;

use teloxide::prelude::*;
use tracing::warn;

use spendbot_core::{
    domain::{ChatId, UserId},
    flows::FlowContext,
    form::Flow,
};

use crate::router::AppState;

/// Menu buttons: each callback starts the matching flow.
pub async fn handle_callback(
    _bot: Bot,
    q: CallbackQuery,
    state: Arc<AppState>,
) -> ResponseResult<()> {
    let cb_id = q.id.clone();
    let flow = q.data.as_deref().and_then(Flow::from_callback_data);

    let (Some(msg), Some(flow)) = (q.message.as_ref(), flow) else {
        let _ = state
            .messenger
            .answer_callback_query(&cb_id, Some("Unknown action"))
            .await;
        return Ok(());
    };

    let ctx = FlowContext {
        user_id: UserId(q.from.id.0 as i64),
        chat_id: ChatId(msg.chat.id.0),
    };

    let _ = state.messenger.answer_callback_query(&cb_id, None).await;

    let _guard = state.chat_locks.lock_chat(ctx.chat_id.0).await;
    if let Err(e) = state.runner.begin(ctx, flow).await {
        warn!(user = ctx.user_id.0, ?flow, "flow start failed: {e}");
    }
    Ok(())
}
