//! Line-delimited JSON messages exchanged with the recognizer process.

use serde::{Deserialize, Serialize};

use crate::commands::CommandId;

#[derive(Serialize, Debug)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Request<'a> {
    LoadDefaults,
    Clear,
    AddPhrase { id: CommandId, phrase: &'a str },
    Commit,
    ListPhrases,
    Feed { samples: &'a [i16] },
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct PhraseEntry {
    pub id: CommandId,
    pub phrase: String,
}

#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DetectState {
    Listening,
    Wake,
    Command,
    Timeout,
}

#[derive(Deserialize, Debug, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Reply {
    Ack,
    Error {
        message: String,
    },
    Committed {
        #[serde(default)]
        rejected: Vec<PhraseEntry>,
    },
    Phrases {
        phrases: Vec<PhraseEntry>,
    },
    Detection {
        state: DetectState,
        #[serde(default)]
        command_id: Option<CommandId>,
    },
}

/// Outcome of feeding one frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Detection {
    /// Nothing recognized yet.
    Listening,
    /// Wake word heard, the engine now listens for a command.
    WakeWord,
    Command(CommandId),
    /// Command window elapsed without a match.
    Timeout,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_wire_format() {
        let line = serde_json::to_string(&Request::AddPhrase { id: 308, phrase: "bang wo guan deng" }).unwrap();
        assert_eq!(line, r#"{"type":"add_phrase","id":308,"phrase":"bang wo guan deng"}"#);

        let line = serde_json::to_string(&Request::Feed { samples: &[1, -2] }).unwrap();
        assert_eq!(line, r#"{"type":"feed","samples":[1,-2]}"#);

        let line = serde_json::to_string(&Request::LoadDefaults).unwrap();
        assert_eq!(line, r#"{"type":"load_defaults"}"#);
    }

    #[test]
    fn test_parse_replies() {
        let reply: Reply = serde_json::from_str(r#"{"type":"committed"}"#).unwrap();
        assert_eq!(reply, Reply::Committed { rejected: vec![] });

        let reply: Reply =
            serde_json::from_str(r#"{"type":"detection","state":"command","command_id":314}"#).unwrap();
        assert_eq!(
            reply,
            Reply::Detection { state: DetectState::Command, command_id: Some(314) }
        );

        let reply: Reply = serde_json::from_str(r#"{"type":"error","message":"table full"}"#).unwrap();
        assert_eq!(reply, Reply::Error { message: "table full".to_string() });
    }

    #[test]
    fn test_unknown_reply_type_is_an_error() {
        assert!(serde_json::from_str::<Reply>(r#"{"type":"bogus"}"#).is_err());
    }
}
