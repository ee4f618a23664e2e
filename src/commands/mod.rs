//! Chat commands for the shared calendar.
//!
//! Each command is a value implementing `SlashCommand`: it carries a
//! serializable descriptor (name, description, parameter schema) that a
//! chat transport can register, and an `execute` handler that turns an
//! invocation into an `Outcome`. The transport decides how to deliver
//! the outcome, see `crate::chat`.

pub mod add;
pub mod delete;
pub mod edit;
pub mod list_day;
pub mod messages;

use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use async_trait::async_trait;
use futures::FutureExt;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::calendar::{CalendarBackend, DateResolver};
use crate::core::{AccessControl, AppConfig, UserIdentity};
use crate::google::GoogleCalendar;

pub use add::AddCommand;
pub use delete::DeleteCommand;
pub use edit::EditCommand;
pub use list_day::ListDayCommand;

#[derive(Serialize)]
pub struct Property {
    pub r#type: String,
    pub description: String,
}

impl Property {
    pub fn string(description: &str) -> Self {
        Self {
            r#type: String::from("string"),
            description: description.to_string(),
        }
    }
}

#[derive(Serialize)]
pub struct Parameters<Props: Serialize> {
    pub r#type: String,
    pub properties: Props,
    pub required: Vec<String>,
    #[serde(rename = "additionalProperties")]
    pub additional_properties: bool,
}

#[derive(Serialize)]
pub struct CommandSpec<Props: Serialize> {
    pub name: String,
    pub description: String,
    pub parameters: Parameters<Props>,
}

impl<Props: Serialize> CommandSpec<Props> {
    pub fn new(name: &str, description: &str, properties: Props, required: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            description: description.to_string(),
            parameters: Parameters {
                r#type: String::from("object"),
                properties,
                required: required.iter().map(|s| s.to_string()).collect(),
                additional_properties: false,
            },
        }
    }
}

/// The primary response to the user who ran a command. Ephemeral
/// replies are only visible to that user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reply {
    pub content: String,
    pub ephemeral: bool,
}

impl Reply {
    pub fn public(content: String) -> Self {
        Self {
            content,
            ephemeral: false,
        }
    }

    pub fn private(content: String) -> Self {
        Self {
            content,
            ephemeral: true,
        }
    }
}

/// Everything a command produced: one reply and at most one message
/// for the shared channel addressed to the actor's partner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Outcome {
    pub reply: Reply,
    pub broadcast: Option<String>,
}

impl Outcome {
    pub fn public(content: String) -> Self {
        Self {
            reply: Reply::public(content),
            broadcast: None,
        }
    }

    pub fn private(content: String) -> Self {
        Self {
            reply: Reply::private(content),
            broadcast: None,
        }
    }

    pub fn with_broadcast(mut self, broadcast: Option<String>) -> Self {
        self.broadcast = broadcast;
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Invocation {
    pub user: UserIdentity,
    /// Named string arguments, e.g. `{"date": "3/10", "schedule": "Dentist"}`
    #[serde(default)]
    pub args: serde_json::Value,
}

impl Invocation {
    pub fn new(user: UserIdentity, args: serde_json::Value) -> Self {
        Self { user, args }
    }

    pub fn parse_args<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        // No args at all reads as an empty object so the error names the
        // missing field
        let args = match &self.args {
            serde_json::Value::Null => serde_json::Value::Object(Default::default()),
            args => args.clone(),
        };
        serde_json::from_value(args)
    }
}

/// Collaborators shared by every command. Built once at startup.
#[derive(Clone)]
pub struct CommandContext {
    pub calendar: Arc<dyn CalendarBackend>,
    pub access: Arc<AccessControl>,
    pub dates: DateResolver,
}

impl CommandContext {
    pub fn new(
        calendar: Arc<dyn CalendarBackend>,
        access: Arc<AccessControl>,
        dates: DateResolver,
    ) -> Self {
        Self {
            calendar,
            access,
            dates,
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(
            Arc::new(GoogleCalendar::new(config)),
            Arc::new(AccessControl::load(&config.access_config_path)),
            DateResolver::new(),
        )
    }
}

// Same trick as tool calls: the descriptor has to be serializable
// through a trait object so `erased_serde` stands in for `serde`.
#[async_trait]
pub trait SlashCommand: erased_serde::Serialize {
    fn name(&self) -> &str;
    async fn execute(&self, invocation: &Invocation) -> Outcome;
}
erased_serde::serialize_trait_object!(SlashCommand);

pub type BoxedCommand = Box<dyn SlashCommand + Send + Sync + 'static>;

/// The fixed set of commands the bot offers.
pub struct CommandRegistry {
    commands: Vec<BoxedCommand>,
}

impl CommandRegistry {
    pub fn new(ctx: CommandContext) -> Self {
        let commands: Vec<BoxedCommand> = vec![
            Box::new(AddCommand::new(ctx.clone())),
            Box::new(DeleteCommand::new(ctx.clone())),
            Box::new(EditCommand::new(ctx.clone())),
            Box::new(ListDayCommand::new(ctx)),
        ];
        Self { commands }
    }

    pub fn get(&self, name: &str) -> Option<&BoxedCommand> {
        self.commands.iter().find(|c| c.name() == name)
    }

    pub fn commands(&self) -> &[BoxedCommand] {
        &self.commands
    }

    pub fn names(&self) -> Vec<&str> {
        self.commands.iter().map(|c| c.name()).collect()
    }

    /// Run a command by name. Returns `None` for unknown commands. A
    /// panic inside a handler is logged and turned into a generic
    /// failure reply so it never reaches the transport.
    pub async fn dispatch(&self, name: &str, invocation: &Invocation) -> Option<Outcome> {
        let command = self.get(name)?;
        tracing::debug!(
            "/{} invoked by {} ({})",
            name,
            invocation.user.display_name,
            invocation.user.id
        );

        let outcome = match AssertUnwindSafe(command.execute(invocation))
            .catch_unwind()
            .await
        {
            Ok(outcome) => outcome,
            Err(panic) => {
                let detail = panic
                    .downcast_ref::<&str>()
                    .map(|s| s.to_string())
                    .or_else(|| panic.downcast_ref::<String>().cloned())
                    .unwrap_or_default();
                tracing::error!("[/{}] Unexpected error: {}", name, detail);
                Outcome::private(messages::unexpected_error())
            }
        };

        Some(outcome)
    }
}
