use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::{CommandContext, CommandSpec, Invocation, Outcome, Property, SlashCommand, messages};

#[derive(Serialize)]
pub struct ListDayProps {
    pub date: Property,
}

#[derive(Deserialize)]
pub struct ListDayArgs {
    pub date: String,
}

#[derive(Serialize)]
pub struct ListDayCommand {
    #[serde(flatten)]
    pub spec: CommandSpec<ListDayProps>,
    #[serde(skip)]
    ctx: CommandContext,
}

impl ListDayCommand {
    pub fn new(ctx: CommandContext) -> Self {
        let spec = CommandSpec::new(
            "list_day",
            "List every event on a day.",
            ListDayProps {
                date: Property::string(
                    "Day to list (yyyy/mm/dd, mm/dd, m/d, \"today\", \"tomorrow\", ...).",
                ),
            },
            &["date"],
        );
        Self { spec, ctx }
    }
}

#[async_trait]
impl SlashCommand for ListDayCommand {
    fn name(&self) -> &str {
        &self.spec.name
    }

    async fn execute(&self, invocation: &Invocation) -> Outcome {
        let args: ListDayArgs = match invocation.parse_args() {
            Ok(args) => args,
            Err(err) => return Outcome::private(messages::invalid_arguments(&err)),
        };

        let date = match self.ctx.dates.resolve_fuzzy(&args.date) {
            Ok(date) => date,
            Err(err) => {
                tracing::debug!("[/list_day] {}", err);
                return Outcome::private(messages::list_date_format_error());
            }
        };

        let window = self.ctx.dates.day_window(date);
        let events = match self.ctx.calendar.list_range(window.start, window.end).await {
            Ok(events) => events,
            Err(err) => {
                tracing::error!("[/list_day] Failed to list {}: {}", date, err);
                return Outcome::private(messages::list_failed(&err));
            }
        };

        if events.is_empty() {
            return Outcome::public(messages::no_events(date));
        }

        Outcome::public(messages::day_listing(date, &events))
    }
}
