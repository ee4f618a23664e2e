//! Delivery of command outcomes to a chat surface.

pub mod webhook;

use anyhow::Result;
use async_trait::async_trait;

use crate::commands::{Outcome, Reply};

pub use webhook::Webhook;

/// Where a command's results go: the invoking user gets the reply and
/// the shared channel gets the broadcast.
#[async_trait]
pub trait ChatContext: Send + Sync {
    async fn reply(&self, reply: &Reply) -> Result<()>;
    async fn broadcast(&self, content: &str) -> Result<()>;
}

/// Send the reply, then the broadcast if there is one. A failed
/// broadcast is logged and does not undo the reply.
pub async fn deliver(ctx: &dyn ChatContext, outcome: &Outcome) -> Result<()> {
    ctx.reply(&outcome.reply).await?;

    if let Some(content) = &outcome.broadcast
        && let Err(err) = ctx.broadcast(content).await
    {
        tracing::error!("Failed to broadcast notification: {}", err);
    }

    Ok(())
}
