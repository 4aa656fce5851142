//! Observability utilities: span timing and span attributes.

mod spans;

pub use spans::{RunSpanAttributes, SpanTimer, StageSpanAttributes};
