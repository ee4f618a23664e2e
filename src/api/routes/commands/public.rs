//! Public types for the commands API
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::commands::{Invocation, Outcome, Reply};
use crate::core::UserIdentity;

#[derive(Debug, Deserialize, Serialize)]
pub struct CommandRequest {
    pub user: UserIdentity,
    #[serde(default)]
    pub args: Value,
}

impl From<CommandRequest> for Invocation {
    fn from(req: CommandRequest) -> Self {
        Invocation::new(req.user, req.args)
    }
}

#[derive(Debug, Deserialize, Serialize)]
pub struct CommandResponse {
    pub reply: Reply,
    pub broadcast: Option<String>,
}

impl From<Outcome> for CommandResponse {
    fn from(outcome: Outcome) -> Self {
        Self {
            reply: outcome.reply,
            broadcast: outcome.broadcast,
        }
    }
}
