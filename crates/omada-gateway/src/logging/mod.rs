//! Structured HTTP logging
//!
//! Every request gets a short trace id, one entry line and one exit line.

mod trace_context;

pub use trace_context::{generate_trace_id, McpCall, RequestTrace};
