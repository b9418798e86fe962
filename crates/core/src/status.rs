//! Enabled/disabled switch shared by roles, menus and departments.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    #[default]
    Enabled,
    Disabled,
}

impl Status {
    pub fn is_enabled(self) -> bool {
        matches!(self, Status::Enabled)
    }
}

impl core::fmt::Display for Status {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Status::Enabled => write!(f, "enabled"),
            Status::Disabled => write!(f, "disabled"),
        }
    }
}
