#![allow(dead_code)]

use proptest::prelude::*;

/// Server-reported retry counts, including values past any preset's cap
pub fn retry_count_strategy() -> impl Strategy<Value = Option<u32>> {
    prop::option::of(prop_oneof![0u32..6, Just(u32::MAX)])
}

/// A sequence of poll observations: (retry_count, milliseconds since previous poll)
pub fn poll_sequence_strategy() -> impl Strategy<Value = Vec<(Option<u32>, u64)>> {
    prop::collection::vec((retry_count_strategy(), 0u64..40_000), 1..25)
}

pub fn max_attempts_strategy() -> impl Strategy<Value = u32> {
    1u32..=5
}

/// Prompts that are blank after trimming
pub fn blank_prompt_strategy() -> impl Strategy<Value = String> {
    "[ \t\n\r]{0,20}"
}
