//! Event logging. The terminal belongs to the dashboard, so events are
//! appended to a JSONL file instead of stdout/stderr.

pub mod jsonl;
