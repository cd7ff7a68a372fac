//! Incremental server-sent-events framing
//!
//! Splits an arbitrary byte stream into complete `data:` payloads. Chunk
//! boundaries fall anywhere, so the decoder buffers until it sees the blank
//! line that terminates an event. Comment lines and non-data fields are
//! dropped; multiple `data:` lines in one event are newline-joined per the
//! SSE specification.

/// Stateful decoder turning byte chunks into complete event payloads
#[derive(Debug, Default)]
pub struct SseDecoder {
    buffer: String,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one chunk, returning every data payload completed by it
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        self.buffer.push_str(&String::from_utf8_lossy(chunk));

        let mut payloads = Vec::new();
        while let Some(boundary) = find_event_boundary(&self.buffer) {
            let raw_event: String = self.buffer.drain(..boundary.end).collect();
            if let Some(payload) = extract_data(&raw_event[..boundary.start]) {
                payloads.push(payload);
            }
        }

        payloads
    }

    /// Flush a trailing event not terminated by a blank line (stream close)
    pub fn finish(&mut self) -> Option<String> {
        let remainder = std::mem::take(&mut self.buffer);
        extract_data(&remainder)
    }
}

struct Boundary {
    /// End of the event body
    start: usize,
    /// End of the separator, where the next event begins
    end: usize,
}

/// Locate the first blank-line separator, tolerating CRLF framing
fn find_event_boundary(buffer: &str) -> Option<Boundary> {
    let lf = buffer.find("\n\n").map(|i| Boundary {
        start: i,
        end: i + 2,
    });
    let crlf = buffer.find("\r\n\r\n").map(|i| Boundary {
        start: i,
        end: i + 4,
    });

    match (lf, crlf) {
        (Some(a), Some(b)) => Some(if a.start <= b.start { a } else { b }),
        (Some(a), None) => Some(a),
        (None, Some(b)) => Some(b),
        (None, None) => None,
    }
}

/// Join the data lines of one raw event block
fn extract_data(raw_event: &str) -> Option<String> {
    let data_lines: Vec<&str> = raw_event
        .lines()
        .filter_map(|line| {
            let line = line.strip_suffix('\r').unwrap_or(line);
            line.strip_prefix("data:")
                .map(|rest| rest.strip_prefix(' ').unwrap_or(rest))
        })
        .collect();

    if data_lines.is_empty() {
        None
    } else {
        Some(data_lines.join("\n"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_event() {
        let mut decoder = SseDecoder::new();
        let payloads = decoder.push(b"data: {\"kind\":\"status-update\"}\n\n");
        assert_eq!(payloads, vec!["{\"kind\":\"status-update\"}"]);
    }

    #[test]
    fn test_event_split_across_chunks() {
        let mut decoder = SseDecoder::new();
        assert!(decoder.push(b"data: {\"kind\":").is_empty());
        assert!(decoder.push(b"\"artifact-update\"}").is_empty());
        let payloads = decoder.push(b"\n\n");
        assert_eq!(payloads, vec!["{\"kind\":\"artifact-update\"}"]);
    }

    #[test]
    fn test_multiple_events_in_one_chunk() {
        let mut decoder = SseDecoder::new();
        let payloads = decoder.push(b"data: one\n\ndata: two\n\n");
        assert_eq!(payloads, vec!["one", "two"]);
    }

    #[test]
    fn test_crlf_framing() {
        let mut decoder = SseDecoder::new();
        let payloads = decoder.push(b"data: one\r\n\r\ndata: two\r\n\r\n");
        assert_eq!(payloads, vec!["one", "two"]);
    }

    #[test]
    fn test_multi_line_data_joined() {
        let mut decoder = SseDecoder::new();
        let payloads = decoder.push(b"data: line1\ndata: line2\n\n");
        assert_eq!(payloads, vec!["line1\nline2"]);
    }

    #[test]
    fn test_comments_and_other_fields_dropped() {
        let mut decoder = SseDecoder::new();
        let payloads = decoder.push(b": keepalive\nevent: message\ndata: payload\nid: 3\n\n");
        assert_eq!(payloads, vec!["payload"]);
    }

    #[test]
    fn test_event_without_data_yields_nothing() {
        let mut decoder = SseDecoder::new();
        let payloads = decoder.push(b": keepalive\n\n");
        assert!(payloads.is_empty());
    }

    #[test]
    fn test_finish_flushes_unterminated_event() {
        let mut decoder = SseDecoder::new();
        assert!(decoder.push(b"data: tail").is_empty());
        assert_eq!(decoder.finish(), Some("tail".to_string()));
        assert_eq!(decoder.finish(), None);
    }
}
