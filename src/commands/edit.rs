use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::{CommandContext, CommandSpec, Invocation, Outcome, Property, SlashCommand, messages};

#[derive(Serialize)]
pub struct EditProps {
    pub old_date: Property,
    pub old_schedule: Property,
    pub new_date: Property,
    pub new_schedule: Property,
}

#[derive(Deserialize)]
pub struct EditArgs {
    pub old_date: String,
    pub old_schedule: String,
    pub new_date: String,
    pub new_schedule: String,
}

#[derive(Serialize)]
pub struct EditCommand {
    #[serde(flatten)]
    pub spec: CommandSpec<EditProps>,
    #[serde(skip)]
    ctx: CommandContext,
}

impl EditCommand {
    pub fn new(ctx: CommandContext) -> Self {
        let spec = CommandSpec::new(
            "edit",
            "Move and rename an event, found by its current date and exact title.",
            EditProps {
                old_date: Property::string("Current date of the event (yyyy/mm/dd, mm/dd or m/d)."),
                old_schedule: Property::string("Current exact title of the event."),
                new_date: Property::string("New date for the event (yyyy/mm/dd, mm/dd or m/d)."),
                new_schedule: Property::string("New title for the event."),
            },
            &["old_date", "old_schedule", "new_date", "new_schedule"],
        );
        Self { spec, ctx }
    }
}

#[async_trait]
impl SlashCommand for EditCommand {
    fn name(&self) -> &str {
        &self.spec.name
    }

    async fn execute(&self, invocation: &Invocation) -> Outcome {
        let user = &invocation.user;
        if !self.ctx.access.is_allowed(user.id) {
            tracing::warn!(
                "[/edit] Refused {} ({}): not on the allow-list",
                user.display_name,
                user.id
            );
            return Outcome::private(messages::edit_refused());
        }

        let args: EditArgs = match invocation.parse_args() {
            Ok(args) => args,
            Err(err) => return Outcome::private(messages::invalid_arguments(&err)),
        };

        let dates = self
            .ctx
            .dates
            .resolve(&args.old_date)
            .and_then(|old| {
                self.ctx
                    .dates
                    .resolve(&args.new_date)
                    .map(|new| (old, new))
            });
        let (old_date, new_date) = match dates {
            Ok(dates) => dates,
            Err(err) => {
                tracing::debug!("[/edit] {}", err);
                return Outcome::private(messages::date_format_error());
            }
        };

        let event = match self
            .ctx
            .calendar
            .find_by_exact_title(old_date, &args.old_schedule)
            .await
        {
            Ok(event) => event,
            Err(err) => {
                tracing::info!("[/edit] {}", err);
                return Outcome::private(messages::search_failed(&err));
            }
        };

        let updated = match self
            .ctx
            .calendar
            .update(&event.id, new_date, &args.new_schedule)
            .await
        {
            Ok(updated) => updated,
            Err(err) => {
                tracing::error!("[/edit] Failed to update {}: {}", event.id, err);
                return Outcome::private(messages::update_failed(&err));
            }
        };

        tracing::info!(
            "[/edit] {} changed '{}' on {} to '{}' on {} ({})",
            self.ctx.access.name_for(user),
            event.title,
            old_date,
            args.new_schedule,
            new_date,
            event.id
        );

        let broadcast = self.ctx.access.partner_of(user.id).map(|partner| {
            messages::edited_notice(
                partner,
                &user.display_name,
                old_date,
                new_date,
                &event.title,
                &args.new_schedule,
            )
        });

        let reply = messages::edited(
            old_date,
            new_date,
            &event.title,
            &args.new_schedule,
            updated.link.as_deref(),
        );
        Outcome::public(reply).with_broadcast(broadcast)
    }
}
