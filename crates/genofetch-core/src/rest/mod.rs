//! REST transport: client, backoff, domain health and request context

pub mod backoff;
pub mod client;
pub mod context;
pub mod endpoints;
pub mod health;

pub use backoff::{BackoffPolicy, RecordingSleeper, Sleeper, TokioSleeper};
pub use client::{MimeTypes, RestClient};
pub use context::RequestContext;
pub use health::{Clock, DomainHealth, HealthRegistry, ManualClock, SystemClock};

use serde_json::Value;

/// A JSON string or number as text
pub(crate) fn scalar_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
