//! Reassembles fragmented tool-call deltas into complete calls.

use std::collections::BTreeMap;

use tracing::warn;

use crate::types::ToolCall;

use super::decoder::ToolCallDelta;

/// Partially received tool calls of one streaming response, keyed by index.
///
/// One accumulator belongs to exactly one pending request.
#[derive(Debug, Default)]
pub struct ToolCallAccumulator {
    slots: BTreeMap<u32, ToolCall>,
}

impl ToolCallAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Apply one delta. Argument fragments are appended in arrival order.
    pub fn apply(&mut self, delta: &ToolCallDelta) {
        let reused = match (self.slots.get(&delta.index), delta.id.as_deref()) {
            (Some(slot), Some(id)) => !slot.id.is_empty() && slot.id != id,
            _ => false,
        };
        if reused {
            warn!(
                index = delta.index,
                id = delta.id.as_deref().unwrap_or_default(),
                "tool call index reused by a different call; replacing slot"
            );
            self.slots.remove(&delta.index);
        }

        let slot = self
            .slots
            .entry(delta.index)
            .or_insert_with(|| ToolCall::function("", "", ""));

        if slot.id.is_empty() {
            if let Some(id) = &delta.id {
                slot.id = id.clone();
            }
        }
        if slot.function.name.is_empty() {
            if let Some(name) = &delta.name {
                slot.function.name = name.clone();
            }
        }
        if let Some(fragment) = &delta.arguments {
            slot.function.arguments.push_str(fragment);
        }
    }

    pub fn apply_all<'a>(&mut self, deltas: impl IntoIterator<Item = &'a ToolCallDelta>) {
        for delta in deltas {
            self.apply(delta);
        }
    }

    /// Consume the accumulator, yielding calls in ascending index order.
    pub fn finish(self) -> Vec<ToolCall> {
        self.slots
            .into_iter()
            .map(|(index, mut call)| {
                if call.id.is_empty() {
                    call.id = format!("call_{index}");
                }
                call
            })
            .collect()
    }
}
