use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Transport message types
// ---------------------------------------------------------------------------

/// One inbound line from the messaging transport: either a command
/// invocation (`command` set, `text` holds the argument string) or a plain
/// text message.
#[derive(Debug, Deserialize)]
pub struct InboundMessage {
    pub conversation: String,
    #[serde(default)]
    pub command: Option<String>,
    #[serde(default)]
    pub text: String,
}

/// One outbound reply line.
#[derive(Debug, Serialize)]
pub struct OutboundReply {
    pub conversation: String,
    pub text: String,
}

impl OutboundReply {
    pub fn new(conversation: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            conversation: conversation.into(),
            text: text.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inbound_plain_message() {
        let msg: InboundMessage =
            serde_json::from_str(r#"{"conversation": "c1", "text": "iphone 14"}"#).unwrap();
        assert_eq!(msg.conversation, "c1");
        assert!(msg.command.is_none());
        assert_eq!(msg.text, "iphone 14");
    }

    #[test]
    fn test_inbound_command() {
        let msg: InboundMessage =
            serde_json::from_str(r#"{"conversation": "c1", "command": "mkp", "text": ""}"#)
                .unwrap();
        assert_eq!(msg.command.as_deref(), Some("mkp"));
    }
}
