// ── Command API ──
//
// Outbound commands are plain ASCII strings written verbatim to the
// controller. There is no framing, acknowledgement, or correlation.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A fire-and-forget command for a controller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Command {
    Open,
    Close,
    /// Any other text the controller understands, sent as-is.
    Raw(String),
}

impl Command {
    /// The exact text put on the wire.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Open => "OPEN",
            Self::Close => "CLOSE",
            Self::Raw(text) => text,
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.as_str().as_bytes()
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
