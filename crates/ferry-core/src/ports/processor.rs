//! MessageProcessor port - the business logic behind a message
//!
//! The worker only relies on "succeeds or fails"; what happens inside is opaque.

use async_trait::async_trait;

use crate::domain::{MessageEnvelope, ProcessingFailure};

#[async_trait]
pub trait MessageProcessor: Send + Sync {
    async fn process(&self, envelope: &MessageEnvelope) -> Result<(), ProcessingFailure>;
}
