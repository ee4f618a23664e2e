use anyhow::{Result, anyhow};
use async_trait::async_trait;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use serde_json::{Map, Value};

use super::init_tracing;
use crate::chat::{ChatContext, Webhook, deliver};
use crate::commands::{CommandContext, CommandRegistry, Invocation, Reply};
use crate::core::{AppConfig, UserId, UserIdentity};

/// Prints replies to the terminal. Broadcasts are printed too and also
/// posted to the shared channel when a webhook is configured.
struct ConsoleChannel {
    webhook: Option<Webhook>,
}

#[async_trait]
impl ChatContext for ConsoleChannel {
    async fn reply(&self, reply: &Reply) -> Result<()> {
        if reply.ephemeral {
            println!("(only you) {}", reply.content);
        } else {
            println!("{}", reply.content);
        }
        Ok(())
    }

    async fn broadcast(&self, content: &str) -> Result<()> {
        println!("[channel] {}", content);
        if let Some(webhook) = &self.webhook {
            webhook.send(content).await?;
        }
        Ok(())
    }
}

/// Split a line like `/add date=3/10 schedule="Dentist visit"` into the
/// command name and its named arguments.
pub fn parse_line(line: &str) -> Result<(String, Value)> {
    let mut tokens = tokenize(line)?.into_iter();
    let name = tokens
        .next()
        .ok_or_else(|| anyhow!("Empty command"))?
        .trim_start_matches('/')
        .to_string();

    let mut args = Map::new();
    for token in tokens {
        let (key, value) = token
            .split_once('=')
            .ok_or_else(|| anyhow!("Expected key=value, got {:?}", token))?;
        args.insert(key.to_string(), Value::String(value.to_string()));
    }

    Ok((name, Value::Object(args)))
}

fn tokenize(line: &str) -> Result<Vec<String>> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut has_token = false;

    for c in line.chars() {
        match c {
            '"' => {
                in_quotes = !in_quotes;
                has_token = true;
            }
            c if c.is_whitespace() && !in_quotes => {
                if has_token {
                    tokens.push(std::mem::take(&mut current));
                    has_token = false;
                }
            }
            c => {
                current.push(c);
                has_token = true;
            }
        }
    }

    if in_quotes {
        return Err(anyhow!("Unterminated quote"));
    }
    if has_token {
        tokens.push(current);
    }
    Ok(tokens)
}

pub async fn run(user_id: u64, user_name: String) -> Result<()> {
    init_tracing(format!("{}=info", env!("CARGO_CRATE_NAME")));

    let config = AppConfig::default();
    let registry = CommandRegistry::new(CommandContext::from_config(&config));
    let channel = ConsoleChannel {
        webhook: config.webhook_url.as_deref().map(Webhook::new),
    };
    let user = UserIdentity {
        id: UserId(user_id),
        display_name: user_name,
    };

    println!("Commands: {}", registry.names().join(", "));

    let mut rl = DefaultEditor::new()?;

    loop {
        let readline = rl.readline(">>> ");
        match readline {
            Ok(line) => {
                if line.trim().is_empty() {
                    continue;
                }
                let _ = rl.add_history_entry(line.as_str());

                let (name, args) = match parse_line(&line) {
                    Ok(parsed) => parsed,
                    Err(err) => {
                        println!("Error: {}", err);
                        continue;
                    }
                };

                let invocation = Invocation::new(user.clone(), args);
                match registry.dispatch(&name, &invocation).await {
                    Some(outcome) => deliver(&channel, &outcome).await?,
                    None => println!("Unknown command /{}", name),
                }
            }
            Err(ReadlineError::Interrupted) => break,
            Err(ReadlineError::Eof) => break,
            Err(err) => {
                println!("Error: {:?}", err);
                break;
            }
        }
    }

    Ok(())
}
