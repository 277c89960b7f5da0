use serde::Deserialize;

/// Literal tag every valid frame starts with.
pub const FRAME_PREFIX: &str = "data:";

const DELIMITER: &[u8] = b"\n\n";

/// One structured event decoded from a frame payload.
///
/// `user` frames echo the submitted prompt back; the client already shows
/// the prompt locally, so they are accepted and ignored.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum StreamEvent {
    Log {
        #[serde(default)]
        message: Option<String>,
    },
    Artifact {
        #[serde(default)]
        file: Option<String>,
    },
    User {
        #[serde(default)]
        message: Option<String>,
    },
}

/// Splits an incrementally delivered byte stream into frames separated by
/// a blank line (`\n\n`).
///
/// Buffering happens at the byte level, so a delimiter or a multi-byte
/// UTF-8 sequence split across chunk boundaries decodes exactly the same
/// as unsplit input. Whatever is left in the buffer when the stream ends
/// never received its closing delimiter and is dropped, not emitted.
#[derive(Debug, Default)]
pub struct FrameDecoder {
    buf: Vec<u8>,
}

impl FrameDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one chunk, draining every complete frame in order. The trailing
    /// (possibly incomplete) segment stays buffered for the next chunk.
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<String> {
        self.buf.extend_from_slice(chunk);

        let mut frames = Vec::new();
        while let Some(pos) = find_delimiter(&self.buf) {
            let rest = self.buf.split_off(pos + DELIMITER.len());
            let frame = std::mem::replace(&mut self.buf, rest);
            frames.push(String::from_utf8_lossy(&frame[..pos]).into_owned());
        }
        frames
    }

    /// True if the buffer holds an unterminated frame.
    pub fn has_partial(&self) -> bool {
        !self.buf.is_empty()
    }
}

fn find_delimiter(buf: &[u8]) -> Option<usize> {
    buf.windows(DELIMITER.len()).position(|w| w == DELIMITER)
}

/// Parse one frame into an event.
///
/// Frames missing the `data:` prefix and payloads that fail to decode both
/// come back as `None`; the caller drops the frame and moves on to the next
/// one. A bad frame never aborts the rest of the stream.
pub fn parse_event(frame: &str) -> Option<StreamEvent> {
    let payload = frame.strip_prefix(FRAME_PREFIX)?.trim_start();
    serde_json::from_str(payload).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    const STREAM: &[u8] =
        b"data: {\"type\":\"log\",\"message\":\"hi\"}\n\ndata: {\"type\":\"artifact\",\"file\":\"out.csv\"}\n\n";

    fn decode_all(decoder: &mut FrameDecoder, bytes: &[u8]) -> Vec<String> {
        decoder.feed(bytes)
    }

    #[test]
    fn whole_stream_in_one_chunk() {
        let mut decoder = FrameDecoder::new();
        let frames = decode_all(&mut decoder, STREAM);
        assert_eq!(frames.len(), 2);
        assert!(frames[0].contains("\"log\""));
        assert!(frames[1].contains("out.csv"));
        assert!(!decoder.has_partial());
    }

    #[test]
    fn frames_identical_for_every_chunk_split() {
        let mut expected_decoder = FrameDecoder::new();
        let expected = expected_decoder.feed(STREAM);

        // Property: any single split point yields the same frame sequence,
        // including splits inside the "\n\n" delimiter.
        for split in 0..=STREAM.len() {
            let mut decoder = FrameDecoder::new();
            let mut frames = decoder.feed(&STREAM[..split]);
            frames.extend(decoder.feed(&STREAM[split..]));
            assert_eq!(frames, expected, "split at byte {split}");
        }

        // And so does feeding one byte at a time.
        let mut decoder = FrameDecoder::new();
        let mut frames = Vec::new();
        for byte in STREAM {
            frames.extend(decoder.feed(&[*byte]));
        }
        assert_eq!(frames, expected);
    }

    #[test]
    fn multibyte_character_split_across_chunks() {
        let stream = "data: {\"type\":\"log\",\"message\":\"héllo → wörld\"}\n\n".as_bytes();
        let mut whole = FrameDecoder::new();
        let expected = whole.feed(stream);

        for split in 0..=stream.len() {
            let mut decoder = FrameDecoder::new();
            let mut frames = decoder.feed(&stream[..split]);
            frames.extend(decoder.feed(&stream[split..]));
            assert_eq!(frames, expected, "split at byte {split}");
        }
    }

    #[test]
    fn trailing_unterminated_frame_is_never_emitted() {
        let mut decoder = FrameDecoder::new();
        let frames = decoder.feed(b"data: {\"type\":\"log\",\"message\":\"a\"}\n\ndata: {\"type\":\"log\"");
        assert_eq!(frames.len(), 1);
        assert!(decoder.has_partial());
        // End of stream: the partial frame stays unemitted.
    }

    #[test]
    fn empty_frames_between_delimiters() {
        let mut decoder = FrameDecoder::new();
        let frames = decoder.feed(b"\n\n\n\n");
        assert_eq!(frames, vec!["".to_string(), "".to_string()]);
    }

    #[test]
    fn parses_log_event() {
        let event = parse_event("data: {\"type\":\"log\",\"message\":\"working\"}");
        assert_eq!(
            event,
            Some(StreamEvent::Log {
                message: Some("working".to_string())
            })
        );
    }

    #[test]
    fn parses_log_event_without_message() {
        let event = parse_event("data: {\"type\":\"log\"}");
        assert_eq!(event, Some(StreamEvent::Log { message: None }));
    }

    #[test]
    fn parses_artifact_event() {
        let event = parse_event("data: {\"type\":\"artifact\",\"file\":\"report.pdf\"}");
        assert_eq!(
            event,
            Some(StreamEvent::Artifact {
                file: Some("report.pdf".to_string())
            })
        );
    }

    #[test]
    fn parses_user_event() {
        let event = parse_event("data: {\"type\":\"user\",\"message\":\"echo\"}");
        assert_eq!(
            event,
            Some(StreamEvent::User {
                message: Some("echo".to_string())
            })
        );
    }

    #[test]
    fn prefix_is_required_and_case_sensitive() {
        assert_eq!(parse_event("{\"type\":\"log\",\"message\":\"x\"}"), None);
        assert_eq!(parse_event("DATA: {\"type\":\"log\"}"), None);
        assert_eq!(parse_event("event: {\"type\":\"log\"}"), None);
    }

    #[test]
    fn whitespace_after_prefix_is_optional() {
        assert!(parse_event("data:{\"type\":\"log\"}").is_some());
        assert!(parse_event("data:   {\"type\":\"log\"}").is_some());
    }

    #[test]
    fn malformed_payload_is_dropped() {
        assert_eq!(parse_event("data: not json"), None);
        assert_eq!(parse_event("data: {\"type\":\"log\""), None);
        assert_eq!(parse_event("data:"), None);
    }

    #[test]
    fn unknown_tag_is_dropped() {
        assert_eq!(parse_event("data: {\"type\":\"progress\",\"pct\":50}"), None);
    }
}
