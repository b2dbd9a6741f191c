use std::io::{self, BufRead, Write};

use tracing::{debug, error};

use crate::protocol::{InboundMessage, OutboundReply};
use crate::router::Router;

/// Run the chat transport on stdio: one JSON message per inbound line,
/// one JSON reply per outbound line. Blocks until stdin is closed.
///
/// Unparseable lines are logged and skipped; there is no conversation to
/// answer to.
pub fn run_server(router: &Router) -> anyhow::Result<()> {
    let stdin = io::stdin();
    let mut stdout = io::stdout();

    for line in stdin.lock().lines() {
        let line = match line {
            Ok(l) => l,
            Err(e) => {
                error!("stdin read error: {e}");
                break;
            }
        };

        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let msg: InboundMessage = match serde_json::from_str(line) {
            Ok(m) => m,
            Err(e) => {
                error!("invalid message: {e}");
                continue;
            }
        };

        debug!(
            "message from {}: command={:?}",
            msg.conversation, msg.command
        );

        let reply = router.handle(&msg);
        write_reply(&mut stdout, &reply)?;
    }

    Ok(())
}

fn write_reply(stdout: &mut io::Stdout, reply: &OutboundReply) -> anyhow::Result<()> {
    let json = serde_json::to_string(reply)?;
    writeln!(stdout, "{json}")?;
    stdout.flush()?;
    Ok(())
}
