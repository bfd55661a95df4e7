use std::fmt;

/// Message attribute that names the action an event should trigger.
pub const EVENT_ATTRIBUTE: &str = "event";

/// The closed set of actions this deployment supports. Fixed at startup;
/// anything outside the set is routed to the unsupported fallthrough.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionSelector {
    TaskCreated,
    TaskUpdated,
    TaskCompleted,
    TaskDeleted,
}

impl ActionSelector {
    pub const ALL: [ActionSelector; 4] = [
        ActionSelector::TaskCreated,
        ActionSelector::TaskUpdated,
        ActionSelector::TaskCompleted,
        ActionSelector::TaskDeleted,
    ];

    /// Parse a wire selector. `None` for anything outside the supported set.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "task_created" => Some(ActionSelector::TaskCreated),
            "task_updated" => Some(ActionSelector::TaskUpdated),
            "task_completed" => Some(ActionSelector::TaskCompleted),
            "task_deleted" => Some(ActionSelector::TaskDeleted),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ActionSelector::TaskCreated => "task_created",
            ActionSelector::TaskUpdated => "task_updated",
            ActionSelector::TaskCompleted => "task_completed",
            ActionSelector::TaskDeleted => "task_deleted",
        }
    }
}

impl fmt::Display for ActionSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
