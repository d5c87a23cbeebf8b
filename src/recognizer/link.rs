use std::io::{BufRead, BufReader, Write};
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};

use super::protocol::{DetectState, Detection, PhraseEntry, Reply, Request};
use super::SpeechRecognizer;
use crate::commands::CommandId;
use crate::error::RecognizerError;

/// Request/reply link to a recognizer speaking line-delimited JSON.
///
/// Every request gets exactly one reply line before the next request is
/// written.
pub struct RecognizerLink<W, R> {
    writer: W,
    reader: R,
    child: Option<ChildGuard>,
    line: String,
}

/// Kills the engine process when the link goes away.
struct ChildGuard(Child);

impl Drop for ChildGuard {
    fn drop(&mut self) {
        let _ = self.0.kill();
        let _ = self.0.wait();
    }
}

impl<W: Write, R: BufRead> RecognizerLink<W, R> {
    pub fn new(writer: W, reader: R) -> Self {
        Self {
            writer,
            reader,
            child: None,
            line: String::new(),
        }
    }

    pub fn into_parts(self) -> (W, R) {
        (self.writer, self.reader)
    }

    fn call(&mut self, request: &Request<'_>) -> Result<Reply, RecognizerError> {
        serde_json::to_writer(&mut self.writer, request)?;
        self.writer.write_all(b"\n")?;
        self.writer.flush()?;

        self.line.clear();
        if self.reader.read_line(&mut self.line)? == 0 {
            return Err(RecognizerError::Closed);
        }
        match serde_json::from_str::<Reply>(self.line.trim_end())? {
            Reply::Error { message } => Err(RecognizerError::Engine(message)),
            reply => Ok(reply),
        }
    }

    fn expect_ack(&mut self, request: &Request<'_>) -> Result<(), RecognizerError> {
        match self.call(request)? {
            Reply::Ack => Ok(()),
            other => Err(RecognizerError::Protocol(format!("{:?}", other))),
        }
    }
}

impl RecognizerLink<ChildStdin, BufReader<ChildStdout>> {
    /// Start the engine process with piped stdin/stdout. Its stderr is
    /// inherited so engine diagnostics land in our log stream.
    pub fn spawn(program: &str, args: &[String]) -> Result<Self, RecognizerError> {
        let spawn_err = |source| RecognizerError::Spawn {
            program: program.to_string(),
            source,
        };

        let mut child = Command::new(program)
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .spawn()
            .map_err(spawn_err)?;

        let (Some(stdin), Some(stdout)) = (child.stdin.take(), child.stdout.take()) else {
            return Err(RecognizerError::Protocol("child stdio not piped".to_string()));
        };

        log::info!(target: "recognizer", "Recognizer started: {} (pid {})", program, child.id());
        let mut link = Self::new(stdin, BufReader::new(stdout));
        link.child = Some(ChildGuard(child));
        Ok(link)
    }
}

impl<W, R> SpeechRecognizer for RecognizerLink<W, R>
where
    W: Write + Send,
    R: BufRead + Send,
{
    fn load_defaults(&mut self) -> Result<(), RecognizerError> {
        self.expect_ack(&Request::LoadDefaults)
    }

    fn clear_phrases(&mut self) -> Result<(), RecognizerError> {
        self.expect_ack(&Request::Clear)
    }

    fn add_phrase(&mut self, id: CommandId, phrase: &str) -> Result<(), RecognizerError> {
        self.expect_ack(&Request::AddPhrase { id, phrase })
    }

    fn commit(&mut self) -> Result<Vec<PhraseEntry>, RecognizerError> {
        match self.call(&Request::Commit)? {
            Reply::Committed { rejected } => Ok(rejected),
            other => Err(RecognizerError::Protocol(format!("{:?}", other))),
        }
    }

    fn active_phrases(&mut self) -> Result<Vec<PhraseEntry>, RecognizerError> {
        match self.call(&Request::ListPhrases)? {
            Reply::Phrases { phrases } => Ok(phrases),
            other => Err(RecognizerError::Protocol(format!("{:?}", other))),
        }
    }

    fn feed(&mut self, samples: &[i16]) -> Result<Detection, RecognizerError> {
        match self.call(&Request::Feed { samples })? {
            Reply::Detection { state, command_id } => match (state, command_id) {
                (DetectState::Listening, _) => Ok(Detection::Listening),
                (DetectState::Wake, _) => Ok(Detection::WakeWord),
                (DetectState::Timeout, _) => Ok(Detection::Timeout),
                (DetectState::Command, Some(id)) => Ok(Detection::Command(id)),
                (DetectState::Command, None) => Err(RecognizerError::Protocol(
                    "command detection without command_id".to_string(),
                )),
            },
            other => Err(RecognizerError::Protocol(format!("{:?}", other))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn link(replies: &str) -> RecognizerLink<Vec<u8>, Cursor<Vec<u8>>> {
        RecognizerLink::new(Vec::new(), Cursor::new(replies.as_bytes().to_vec()))
    }

    #[test]
    fn test_add_phrase_round() {
        let mut link = link("{\"type\":\"ack\"}\n");
        link.add_phrase(309, "bang wo kai deng").unwrap();
        let (written, _) = link.into_parts();
        assert_eq!(
            String::from_utf8(written).unwrap(),
            "{\"type\":\"add_phrase\",\"id\":309,\"phrase\":\"bang wo kai deng\"}\n"
        );
    }

    #[test]
    fn test_engine_error_is_surfaced() {
        let mut link = link("{\"type\":\"error\",\"message\":\"bad pinyin\"}\n");
        let err = link.add_phrase(1, "??").unwrap_err();
        assert!(matches!(err, RecognizerError::Engine(ref m) if m == "bad pinyin"));
    }

    #[test]
    fn test_feed_detections() {
        let mut link = link(concat!(
            "{\"type\":\"detection\",\"state\":\"listening\"}\n",
            "{\"type\":\"detection\",\"state\":\"wake\"}\n",
            "{\"type\":\"detection\",\"state\":\"command\",\"command_id\":308}\n",
            "{\"type\":\"detection\",\"state\":\"timeout\"}\n",
        ));
        let frame = [0i16; 4];
        assert_eq!(link.feed(&frame).unwrap(), Detection::Listening);
        assert_eq!(link.feed(&frame).unwrap(), Detection::WakeWord);
        assert_eq!(link.feed(&frame).unwrap(), Detection::Command(308));
        assert_eq!(link.feed(&frame).unwrap(), Detection::Timeout);
    }

    #[test]
    fn test_closed_and_mismatched_replies() {
        let mut link = link("{\"type\":\"ack\"}\n");
        assert!(matches!(link.commit(), Err(RecognizerError::Protocol(_))));
        assert!(matches!(link.commit(), Err(RecognizerError::Closed)));
    }
}
