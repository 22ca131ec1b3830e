use teloxide::{prelude::*, types::User};
use tracing::{info, warn};

use spendbot_core::{flows::FlowContext, form::MENU_IDLE, formatting::bold};

use crate::router::AppState;

const HELP_TEXT: &str = "<b>Commands</b>\n\
/start - show the main menu\n\
/cancel - abandon the current operation\n\
/help - show this message\n\n\
Pick an action from the menu and answer the questions one at a time.";

fn parse_command(text: &str) -> (String, String) {
    // Telegram may send `/cmd@botname arg1 ...`
    let mut parts = text.trim().splitn(2, char::is_whitespace);
    let first = parts.next().unwrap_or("").trim();
    let rest = parts.next().unwrap_or("").trim().to_string();

    let cmd = first
        .trim_start_matches('/')
        .split('@')
        .next()
        .unwrap_or("")
        .to_lowercase();

    (cmd, rest)
}

fn greeting(user: &User) -> String {
    format!("Hello, {}!", bold(&user.full_name()))
}

pub async fn handle_command(
    state: &AppState,
    ctx: FlowContext,
    user: &User,
    text: &str,
) -> ResponseResult<()> {
    let (cmd, _args) = parse_command(text);
    info!(user = ctx.user_id.0, command = %cmd, "command");

    let result = match cmd.as_str() {
        "start" => {
            state.runner.sessions().clear(ctx.user_id).await;
            state.runner.show_menu(ctx, &greeting(user)).await
        }
        "cancel" => state.runner.cancel(ctx).await.map(|_| ()),
        "help" => state
            .messenger
            .send_html(ctx.chat_id, HELP_TEXT)
            .await
            .map(|_| ()),
        _ => state.runner.show_menu(ctx, MENU_IDLE).await,
    };

    if let Err(e) = result {
        warn!(user = ctx.user_id.0, command = %cmd, "command failed: {e}");
    }
    Ok(())
}
