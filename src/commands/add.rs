use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::{CommandContext, CommandSpec, Invocation, Outcome, Property, SlashCommand, messages};

#[derive(Serialize)]
pub struct AddProps {
    pub date: Property,
    pub schedule: Property,
}

#[derive(Deserialize)]
pub struct AddArgs {
    pub date: String,
    pub schedule: String,
}

#[derive(Serialize)]
pub struct AddCommand {
    #[serde(flatten)]
    pub spec: CommandSpec<AddProps>,
    #[serde(skip)]
    ctx: CommandContext,
}

impl AddCommand {
    pub fn new(ctx: CommandContext) -> Self {
        let spec = CommandSpec::new(
            "add",
            "Add an all-day event to the shared calendar.",
            AddProps {
                date: Property::string("Date of the event (yyyy/mm/dd, mm/dd or m/d)."),
                schedule: Property::string("Title of the event."),
            },
            &["date", "schedule"],
        );
        Self { spec, ctx }
    }
}

#[async_trait]
impl SlashCommand for AddCommand {
    fn name(&self) -> &str {
        &self.spec.name
    }

    async fn execute(&self, invocation: &Invocation) -> Outcome {
        let args: AddArgs = match invocation.parse_args() {
            Ok(args) => args,
            Err(err) => return Outcome::private(messages::invalid_arguments(&err)),
        };
        let user = &invocation.user;

        let date = match self.ctx.dates.resolve(&args.date) {
            Ok(date) => date,
            Err(err) => {
                tracing::debug!("[/add] {}", err);
                return Outcome::private(messages::date_format_error());
            }
        };

        let reply = if self.ctx.access.is_allowed(user.id) {
            match self.ctx.calendar.create(date, &args.schedule).await {
                Ok(event) => {
                    tracing::info!(
                        "[/add] {} added '{}' on {} ({})",
                        self.ctx.access.name_for(user),
                        args.schedule,
                        date,
                        event.id
                    );
                    messages::added(date, &args.schedule, event.link.as_deref())
                }
                Err(err) => {
                    tracing::error!("[/add] Failed to create event: {}", err);
                    messages::add_failed(&err)
                }
            }
        } else {
            tracing::warn!(
                "[/add] Refused {} ({}): not on the allow-list",
                user.display_name,
                user.id
            );
            messages::add_refused()
        };

        // The partner hears about the attempt whatever the write result was
        let broadcast = self.ctx.access.partner_of(user.id).map(|partner| {
            messages::added_notice(partner, &user.display_name, date, &args.schedule)
        });

        Outcome::public(reply).with_broadcast(broadcast)
    }
}
