use anyhow::Result;

use crate::commands::{CommandContext, CommandRegistry};
use crate::core::AppConfig;

pub fn run() -> Result<()> {
    let config = AppConfig::default();
    let registry = CommandRegistry::new(CommandContext::from_config(&config));
    println!("{}", serde_json::to_string_pretty(registry.commands())?);
    Ok(())
}
