//! Streaming response decoding and tool-call reassembly.

pub mod accumulator;
pub mod decoder;

pub use accumulator::ToolCallAccumulator;
pub use decoder::{decode_stream, DecoderStats, DeltaFrame, FrameDecoder, ToolCallDelta};
