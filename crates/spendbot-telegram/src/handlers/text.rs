use teloxide::prelude::*;
use tracing::warn;

use spendbot_core::{flows::FlowContext, form::MENU_IDLE};

use crate::router::AppState;

pub async fn handle_text(state: &AppState, ctx: FlowContext, text: &str) -> ResponseResult<()> {
    let result = match state.runner.handle_text(ctx, text).await {
        Ok(true) => Ok(()),
        Ok(false) => state.runner.show_menu(ctx, MENU_IDLE).await,
        Err(e) => Err(e),
    };

    if let Err(e) = result {
        warn!(user = ctx.user_id.0, "text handling failed: {e}");
    }
    Ok(())
}
