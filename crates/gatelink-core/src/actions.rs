// ── Rule action bridge ──
//
// Exposes the two gate actions to an external rule engine and turns
// each trigger into dispatcher calls, one per target device.

use std::str::FromStr;
use std::sync::Arc;

use gatelink_api::Connector;
use serde::Serialize;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::command::Command;
use crate::dispatcher::CommandDispatcher;
use crate::error::CoreError;
use crate::model::{DeviceKind, DeviceRef};
use crate::store::DeviceStore;

// ── Actions ──────────────────────────────────────────────────────

/// The fixed set of actions offered to the rule engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GateAction {
    Open,
    Close,
}

impl GateAction {
    pub const ALL: [Self; 2] = [Self::Open, Self::Close];

    /// Stable identifier registered with the rule engine.
    pub const fn id(self) -> Uuid {
        match self {
            Self::Open => Uuid::from_u128(0xcda1_082f_852f_4a7c_b966_c761_50c0_eee3),
            Self::Close => Uuid::from_u128(0xd775_c8d5_009a_4da8_8583_d3c3_7068_70ca),
        }
    }

    /// Human-friendly identifier, accepted wherever the id is.
    pub const fn slug(self) -> &'static str {
        match self {
            Self::Open => "open-gate",
            Self::Close => "close-gate",
        }
    }

    pub fn command(self) -> Command {
        match self {
            Self::Open => Command::Open,
            Self::Close => Command::Close,
        }
    }

    /// Resolve an action from its slug or its UUID.
    pub fn from_id(id: &str) -> Option<Self> {
        let id = id.trim();
        Self::ALL.into_iter().find(|action| {
            action.slug().eq_ignore_ascii_case(id)
                || Uuid::parse_str(id).is_ok_and(|uuid| uuid == action.id())
        })
    }

    pub fn definition(self, kind: DeviceKind) -> ActionDefinition {
        let verb = match self {
            Self::Open => "Open",
            Self::Close => "Close",
        };
        ActionDefinition {
            id: self.id(),
            slug: self.slug(),
            name: format!("{verb} gate"),
            selection_text: format!("{verb} gate using <controller>"),
            description_text: format!("{verb} gate using {{0}}"),
            action_item_kind: ActionElement {
                default_text: "controller".into(),
                item_kinds: vec![kind],
            },
        }
    }
}

impl FromStr for GateAction {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_id(s).ok_or_else(|| CoreError::UnknownAction { id: s.into() })
    }
}

/// How an action presents itself in the rule engine's catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActionDefinition {
    pub id: Uuid,
    pub slug: &'static str,
    pub name: String,
    /// Shown while picking the action; `<controller>` marks the target slot.
    pub selection_text: String,
    /// Shown once configured; `{0}` is replaced by the target's name.
    pub description_text: String,
    pub action_item_kind: ActionElement,
}

/// The kind of item an action targets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActionElement {
    pub default_text: String,
    pub item_kinds: Vec<DeviceKind>,
}

// ── Bridge ───────────────────────────────────────────────────────

/// Entry point for the rule engine.
pub struct RuleActionBridge<C: Connector, S: DeviceStore> {
    kind: DeviceKind,
    store: Arc<S>,
    dispatcher: CommandDispatcher<C>,
}

impl<C: Connector, S: DeviceStore> Clone for RuleActionBridge<C, S> {
    fn clone(&self) -> Self {
        Self {
            kind: self.kind,
            store: Arc::clone(&self.store),
            dispatcher: self.dispatcher.clone(),
        }
    }
}

impl<C: Connector, S: DeviceStore> RuleActionBridge<C, S> {
    pub(crate) fn new(kind: DeviceKind, store: Arc<S>, dispatcher: CommandDispatcher<C>) -> Self {
        Self {
            kind,
            store,
            dispatcher,
        }
    }

    /// Catalog of supported actions.
    pub fn action_definitions(&self) -> Vec<ActionDefinition> {
        GateAction::ALL
            .into_iter()
            .map(|action| action.definition(self.kind))
            .collect()
    }

    /// Run `action_id` against every target.
    ///
    /// Always succeeds from the caller's point of view. Unknown actions,
    /// unresolvable targets and undelivered commands only show up in logs.
    pub async fn execute(
        &self,
        action_id: &str,
        targets: &[DeviceRef],
        source_event: Option<&serde_json::Value>,
    ) {
        let Some(action) = GateAction::from_id(action_id) else {
            warn!(action = action_id, "unknown rule action, ignoring");
            return;
        };
        debug!(action = action.slug(), targets = targets.len(), ?source_event, "executing rule action");

        let command = action.command();
        for target in targets {
            // Resolution only names the target in logs; routing is the
            // dispatcher's call.
            let name = match self.store.get_device(target.kind, target.id) {
                Some(device) => device.name,
                None => {
                    warn!(device = %target, "rule action target not found in configuration");
                    target.id.to_string()
                }
            };

            let delivery = self.dispatcher.send_command(target, &command).await;
            debug!(device = %name, action = action.slug(), ?delivery, "rule action dispatched");
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn action_ids_are_stable() {
        assert_eq!(
            GateAction::Open.id().to_string(),
            "cda1082f-852f-4a7c-b966-c76150c0eee3"
        );
        assert_eq!(
            GateAction::Close.id().to_string(),
            "d775c8d5-009a-4da8-8583-d3c3706870ca"
        );
    }

    #[test]
    fn from_id_accepts_slug_and_uuid() {
        assert_eq!(GateAction::from_id("open-gate"), Some(GateAction::Open));
        assert_eq!(GateAction::from_id("CLOSE-GATE"), Some(GateAction::Close));
        assert_eq!(
            GateAction::from_id("CDA1082F-852F-4A7C-B966-C76150C0EEE3"),
            Some(GateAction::Open)
        );
        assert_eq!(GateAction::from_id("unlock"), None);
    }

    #[test]
    fn parse_reports_unknown_action() {
        assert_eq!("open-gate".parse::<GateAction>().ok(), Some(GateAction::Open));
        let err = "unlock".parse::<GateAction>().unwrap_err();
        assert!(matches!(err, CoreError::UnknownAction { ref id } if id == "unlock"));
    }

    #[test]
    fn definitions_target_the_controller_kind() {
        let def = GateAction::Close.definition(DeviceKind::CONTROLLER);
        assert_eq!(def.name, "Close gate");
        assert_eq!(def.selection_text, "Close gate using <controller>");
        assert_eq!(def.description_text, "Close gate using {0}");
        assert_eq!(def.action_item_kind.default_text, "controller");
        assert_eq!(def.action_item_kind.item_kinds, vec![DeviceKind::CONTROLLER]);
    }

    #[test]
    fn actions_map_to_wire_commands() {
        assert_eq!(GateAction::Open.command(), Command::Open);
        assert_eq!(GateAction::Close.command(), Command::Close);
    }
}
