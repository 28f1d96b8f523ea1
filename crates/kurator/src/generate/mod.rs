//! Description generation against a vision-capable chat model.
//!
//! The runner only sees [`GenerationClient`]; payload assembly, the HTTP
//! transport and the retry loop live behind it. The transport itself is
//! a second seam ([`client::ChatTransport`]) so the retry behavior can be
//! exercised without a network.

pub mod client;
pub mod error;
pub mod payload;
pub mod prompt;
pub mod response;
pub mod retry;

pub use client::{ChatOutcome, ChatTransport, GenerationClient, HttpChatTransport, OpenAiClient};
pub use error::GenerationError;
pub use retry::{RetryPolicy, Sleeper, TokioSleeper};
