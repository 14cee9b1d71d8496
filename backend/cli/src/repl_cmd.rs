//! `cmdrouter repl`: route stdin lines as chat messages.

use std::sync::Arc;

use anyhow::Result;
use futures::StreamExt;
use tokio::io::{AsyncBufReadExt, BufReader};
use uuid::Uuid;

use cmdrouter_commands::CommandRouter;
use cmdrouter_core::{MessageEvent, OutgoingMessage, TextEvent};

use crate::terminal_output::{note_info, print_reply, DIM, RESET};

/// Identity and flags applied to every message typed into the REPL.
pub struct ReplOptions {
    pub admin: bool,
    pub woken: bool,
    pub origin: String,
    pub sender: String,
}

pub async fn run(router: &CommandRouter, options: &ReplOptions) -> Result<()> {
    note_info("输入消息后回车发送，/同步 重新同步指令，/解析 <消息> 强制解析，exit 退出");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    while let Some(line) = lines.next_line().await? {
        let text = line.trim();
        if text.is_empty() {
            continue;
        }
        if matches!(text, "exit" | "quit") {
            break;
        }

        let event: Arc<dyn MessageEvent> = Arc::new(
            TextEvent::new(text)
                .with_message_id(Uuid::new_v4().to_string())
                .with_origin(options.origin.clone())
                .with_sender(options.sender.clone())
                .admin(options.admin)
                .woken(options.woken),
        );

        let mut replies = router.handle_message(event).await;
        let mut count = 0;
        while let Some(reply) = replies.next().await {
            count += 1;
            print_reply(reply.text(), matches!(reply, OutgoingMessage::QuoteReply { .. }));
        }
        if count == 0 {
            println!("{DIM}(无回复){RESET}");
        }
    }
    Ok(())
}
