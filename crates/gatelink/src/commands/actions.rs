//! Rule action handlers.

use tabled::Tabled;

use gatelink_core::{ActionDefinition, DeviceKind, GateAction};

use crate::cli::{ActionsArgs, ActionsCommand, GlobalOpts};
use crate::error::CliError;
use crate::output;

use super::send;

#[derive(Tabled)]
struct ActionRow {
    #[tabled(rename = "Action")]
    slug: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Sends")]
    sends: String,
}

impl From<&ActionDefinition> for ActionRow {
    fn from(d: &ActionDefinition) -> Self {
        let sends = GateAction::from_id(d.slug)
            .map(|a| a.command().to_string())
            .unwrap_or_default();
        Self {
            slug: d.slug.into(),
            name: d.name.clone(),
            id: d.id.to_string(),
            sends,
        }
    }
}

pub async fn handle(args: ActionsArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command.unwrap_or(ActionsCommand::List) {
        ActionsCommand::List => {
            let defs: Vec<ActionDefinition> = GateAction::ALL
                .into_iter()
                .map(|a| a.definition(DeviceKind::CONTROLLER))
                .collect();
            let out = output::render_list(&global.output, &defs, |d| ActionRow::from(d), |d| {
                d.slug.to_string()
            })?;
            output::print_output(&out, global.quiet);
            Ok(())
        }
        ActionsCommand::Run { action, device } => {
            let action: GateAction = action.parse()?;
            send::deliver(global, device.as_deref(), &action.command()).await
        }
    }
}
