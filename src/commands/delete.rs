use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::{CommandContext, CommandSpec, Invocation, Outcome, Property, SlashCommand, messages};

#[derive(Serialize)]
pub struct DeleteProps {
    pub date: Property,
    pub schedule: Property,
}

#[derive(Deserialize)]
pub struct DeleteArgs {
    pub date: String,
    pub schedule: String,
}

#[derive(Serialize)]
pub struct DeleteCommand {
    #[serde(flatten)]
    pub spec: CommandSpec<DeleteProps>,
    #[serde(skip)]
    ctx: CommandContext,
}

impl DeleteCommand {
    pub fn new(ctx: CommandContext) -> Self {
        let spec = CommandSpec::new(
            "delete",
            "Delete the event with this exact title on the given date.",
            DeleteProps {
                date: Property::string("Date of the event (yyyy/mm/dd, mm/dd or m/d)."),
                schedule: Property::string("Exact title of the event to delete."),
            },
            &["date", "schedule"],
        );
        Self { spec, ctx }
    }
}

#[async_trait]
impl SlashCommand for DeleteCommand {
    fn name(&self) -> &str {
        &self.spec.name
    }

    async fn execute(&self, invocation: &Invocation) -> Outcome {
        let user = &invocation.user;
        if !self.ctx.access.is_allowed(user.id) {
            tracing::warn!(
                "[/delete] Refused {} ({}): not on the allow-list",
                user.display_name,
                user.id
            );
            return Outcome::private(messages::delete_refused());
        }

        let args: DeleteArgs = match invocation.parse_args() {
            Ok(args) => args,
            Err(err) => return Outcome::private(messages::invalid_arguments(&err)),
        };

        let date = match self.ctx.dates.resolve(&args.date) {
            Ok(date) => date,
            Err(err) => {
                tracing::debug!("[/delete] {}", err);
                return Outcome::private(messages::date_format_error());
            }
        };

        let event = match self
            .ctx
            .calendar
            .find_by_exact_title(date, &args.schedule)
            .await
        {
            Ok(event) => event,
            Err(err) => {
                tracing::info!("[/delete] {}", err);
                return Outcome::private(messages::search_failed(&err));
            }
        };

        if let Err(err) = self.ctx.calendar.delete(&event.id).await {
            tracing::error!("[/delete] Failed to delete {}: {}", event.id, err);
            return Outcome::private(messages::delete_failed(&err));
        }

        tracing::info!(
            "[/delete] {} deleted '{}' on {} ({})",
            self.ctx.access.name_for(user),
            event.title,
            date,
            event.id
        );

        let broadcast = self.ctx.access.partner_of(user.id).map(|partner| {
            messages::deleted_notice(partner, &user.display_name, date, &event.title)
        });

        Outcome::public(messages::deleted(date, &event.title)).with_broadcast(broadcast)
    }
}
