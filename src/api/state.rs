use crate::chat::Webhook;
use crate::commands::{CommandContext, CommandRegistry};
use crate::core::AppConfig;

pub struct AppState {
    pub commands: CommandRegistry,
    // Shared channel for partner notifications, if one is configured
    pub webhook: Option<Webhook>,
}

impl AppState {
    pub fn new(config: AppConfig) -> Self {
        let ctx = CommandContext::from_config(&config);
        Self::with_context(ctx, config)
    }

    pub fn with_context(ctx: CommandContext, config: AppConfig) -> Self {
        let webhook = config.webhook_url.as_deref().map(Webhook::new);
        Self {
            commands: CommandRegistry::new(ctx),
            webhook,
        }
    }
}
