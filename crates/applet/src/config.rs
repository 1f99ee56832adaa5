use crate::access::{AccessRule, Condition};
use crate::constants::{APPLET_VERSION, cla};
use crate::types::Version;

/// Install-time parameters of an applet instance
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AppletConfig {
    /// Class byte DECRYPT must carry
    pub cla: u8,
    /// Version reported by GET VERSION
    pub version: Version,
    /// Execute condition placed on the private key; `None` leaves it without a rule
    pub execute: Option<Condition>,
}

impl AppletConfig {
    /// Access rule for the private key object
    pub const fn private_key_rule(&self) -> AccessRule {
        AccessRule {
            execute: self.execute,
        }
    }
}

impl Default for AppletConfig {
    fn default() -> Self {
        Self {
            cla: cla::APPLET,
            version: APPLET_VERSION,
            execute: Some(Condition::Always),
        }
    }
}
