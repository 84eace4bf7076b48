//! Incremental decoder for `data: <json>` chat-completion streams.
//!
//! Bytes are buffered until a full newline-terminated record is available, so
//! records (and UTF-8 sequences) split across transport chunks decode the same
//! as unsplit ones. Records that are not valid JSON are dropped: servers
//! interleave keep-alive noise with real data.

use futures::{Stream, StreamExt};
use serde::Deserialize;
use tracing::{debug, trace};

use crate::error::{Result, SwitchboardError};

const DATA_PREFIX: &str = "data:";
const DONE_SENTINEL: &str = "[DONE]";

/// One incremental unit of a streaming response.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeltaFrame {
    /// Newly generated text, if any.
    pub content: Option<String>,
    pub tool_calls: Vec<ToolCallDelta>,
    pub finish_reason: Option<String>,
}

impl DeltaFrame {
    pub fn is_empty(&self) -> bool {
        self.content.is_none() && self.tool_calls.is_empty() && self.finish_reason.is_none()
    }
}

/// A fragment of one tool call, addressed by its position in the response.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToolCallDelta {
    pub index: u32,
    pub id: Option<String>,
    pub name: Option<String>,
    pub arguments: Option<String>,
}

/// Counters describing what a decoder has seen.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DecoderStats {
    /// `data:` records encountered.
    pub records: usize,
    /// Frames produced.
    pub frames: usize,
    /// Records dropped because they did not parse.
    pub skipped: usize,
}

/// Push-based decoder state.
#[derive(Debug, Default)]
pub struct FrameDecoder {
    buffer: Vec<u8>,
    /// Prefix of `buffer` already known to hold no newline.
    scanned: usize,
    finished: bool,
    stats: DecoderStats,
}

enum Record {
    Frame(DeltaFrame),
    Done,
    Ignored,
}

impl FrameDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the sentinel (or an in-stream error) has ended decoding.
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub fn stats(&self) -> DecoderStats {
        self.stats
    }

    /// Feed one transport chunk and return every item it completed.
    ///
    /// After an `Err` item or the sentinel, further input is ignored.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<Result<DeltaFrame>> {
        let mut out = Vec::new();
        if self.finished {
            return out;
        }
        let mut buffer = std::mem::take(&mut self.buffer);
        buffer.extend_from_slice(chunk);

        let mut start = 0;
        let mut cursor = self.scanned;
        while let Some(offset) = buffer[cursor..].iter().position(|b| *b == b'\n') {
            let end = cursor + offset;
            if self.consume_line(&buffer[start..=end], &mut out) {
                self.scanned = 0;
                return out;
            }
            start = end + 1;
            cursor = start;
        }

        buffer.drain(..start);
        self.scanned = buffer.len();
        self.buffer = buffer;
        out
    }

    /// Flush a final record that was not newline-terminated.
    pub fn finish(&mut self) -> Vec<Result<DeltaFrame>> {
        let mut out = Vec::new();
        if self.finished {
            return out;
        }
        let rest = std::mem::take(&mut self.buffer);
        self.scanned = 0;
        self.consume_line(&rest, &mut out);
        self.finished = true;
        out
    }

    /// Returns true when decoding must stop.
    fn consume_line(&mut self, raw: &[u8], out: &mut Vec<Result<DeltaFrame>>) -> bool {
        let line = String::from_utf8_lossy(raw);
        match self.parse_record(line.trim()) {
            Ok(Record::Frame(frame)) => {
                self.stats.frames += 1;
                out.push(Ok(frame));
                false
            }
            Ok(Record::Ignored) => false,
            Ok(Record::Done) => {
                self.finished = true;
                true
            }
            Err(err) => {
                self.finished = true;
                out.push(Err(err));
                true
            }
        }
    }

    fn parse_record(&mut self, line: &str) -> Result<Record> {
        if line.is_empty() || line.starts_with(':') {
            return Ok(Record::Ignored);
        }
        let Some(data) = line.strip_prefix(DATA_PREFIX) else {
            return Ok(Record::Ignored);
        };
        let data = data.trim();
        self.stats.records += 1;

        if data == DONE_SENTINEL {
            return Ok(Record::Done);
        }

        let chunk: WireChunk = match serde_json::from_str(data) {
            Ok(chunk) => chunk,
            Err(err) => {
                self.stats.skipped += 1;
                trace!(data = %data, error = %err, "Ignoring unparseable stream record");
                return Ok(Record::Ignored);
            }
        };

        if let Some(error) = chunk.error {
            let status = error
                .code
                .as_ref()
                .and_then(serde_json::Value::as_u64)
                .and_then(|code| u16::try_from(code).ok())
                .unwrap_or(200);
            let message = error
                .message
                .unwrap_or_else(|| "upstream reported an error mid-stream".to_string());
            return Err(SwitchboardError::upstream(status, message));
        }

        let frame = chunk.into_frame();
        if frame.is_empty() {
            Ok(Record::Ignored)
        } else {
            Ok(Record::Frame(frame))
        }
    }
}

/// Decode a transport byte stream into a lazy stream of frames.
///
/// The stream ends at the sentinel, at end of transport, or after the first
/// error item.
pub fn decode_stream<S, B, E>(transport: S) -> impl Stream<Item = Result<DeltaFrame>>
where
    S: Stream<Item = std::result::Result<B, E>>,
    B: AsRef<[u8]>,
    E: Into<SwitchboardError>,
{
    async_stream::stream! {
        let mut decoder = FrameDecoder::new();
        let mut failed = false;
        futures::pin_mut!(transport);

        'read: while let Some(chunk) = transport.next().await {
            let chunk = match chunk {
                Ok(chunk) => chunk,
                Err(err) => {
                    failed = true;
                    yield Err(err.into());
                    break 'read;
                }
            };
            for item in decoder.push(chunk.as_ref()) {
                if item.is_err() {
                    failed = true;
                }
                yield item;
            }
            if decoder.is_finished() {
                break 'read;
            }
        }

        if !failed && !decoder.is_finished() {
            for item in decoder.finish() {
                yield item;
            }
        }

        let stats = decoder.stats();
        debug!(
            records = stats.records,
            frames = stats.frames,
            skipped = stats.skipped,
            "stream decoded"
        );
    }
}

// Chat-completions chunk shape (internal)

#[derive(Deserialize)]
struct WireChunk {
    #[serde(default)]
    choices: Vec<WireChoice>,
    #[serde(default)]
    error: Option<WireError>,
}

impl WireChunk {
    fn into_frame(self) -> DeltaFrame {
        let Some(choice) = self.choices.into_iter().next() else {
            return DeltaFrame::default();
        };
        let delta = choice.delta.unwrap_or_default();
        DeltaFrame {
            content: delta.content.filter(|text| !text.is_empty()),
            tool_calls: delta
                .tool_calls
                .unwrap_or_default()
                .into_iter()
                .filter_map(WireToolCallDelta::into_delta)
                .collect(),
            finish_reason: choice.finish_reason,
        }
    }
}

#[derive(Deserialize)]
struct WireChoice {
    #[serde(default)]
    delta: Option<WireDelta>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Deserialize, Default)]
struct WireDelta {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    tool_calls: Option<Vec<WireToolCallDelta>>,
}

#[derive(Deserialize)]
struct WireToolCallDelta {
    #[serde(default)]
    index: Option<u32>,
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    function: Option<WireFunctionDelta>,
}

impl WireToolCallDelta {
    fn into_delta(self) -> Option<ToolCallDelta> {
        let index = self.index?;
        let function = self.function.unwrap_or_default();
        Some(ToolCallDelta {
            index,
            id: self.id.filter(|id| !id.is_empty()),
            name: function.name.filter(|name| !name.is_empty()),
            arguments: function.arguments.filter(|args| !args.is_empty()),
        })
    }
}

#[derive(Deserialize, Default)]
struct WireFunctionDelta {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    arguments: Option<String>,
}

#[derive(Deserialize)]
struct WireError {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    code: Option<serde_json::Value>,
}
