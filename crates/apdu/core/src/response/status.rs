//! Status words closing every response frame

use derive_more::Display;
use tracing::Level;

/// Two trailing status bytes, displayed as four hex digits
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Hash)]
#[display("{sw1:02X}{sw2:02X}")]
pub struct StatusWord {
    /// SW1, the status group
    pub sw1: u8,
    /// SW2, the qualifier within the group
    pub sw2: u8,
}

impl StatusWord {
    /// Status word from its two bytes
    pub const fn new(sw1: u8, sw2: u8) -> Self {
        Self { sw1, sw2 }
    }

    /// Status word from `0xSW1SW2`
    pub const fn from_u16(status: u16) -> Self {
        let [sw1, sw2] = status.to_be_bytes();
        Self { sw1, sw2 }
    }

    /// `0xSW1SW2`
    pub const fn to_u16(&self) -> u16 {
        u16::from_be_bytes(self.to_bytes())
    }

    /// Wire order, SW1 first
    pub const fn to_bytes(&self) -> [u8; 2] {
        [self.sw1, self.sw2]
    }

    /// 9000
    pub const fn is_success(&self) -> bool {
        matches!((self.sw1, self.sw2), (0x90, 0x00))
    }

    /// Access refusals and selection problems (69xx)
    pub const fn is_security_related(&self) -> bool {
        self.sw1 == 0x69
    }

    /// Level the applet logs an exchange ending in this status at
    ///
    /// Malformed or unknown requests are the caller's problem and stay at
    /// INFO. Refusals and internal failures are WARN.
    pub const fn tracing_level(&self) -> Level {
        match self.sw1 {
            0x90 => Level::DEBUG,
            0x67 | 0x6B | 0x6D | 0x6E => Level::INFO,
            _ => Level::WARN,
        }
    }

    /// Short human readable meaning
    pub const fn description(&self) -> &'static str {
        match self.to_u16() {
            0x9000 => "Success",
            0x6700 => "Wrong length",
            0x6981 => "Command incompatible with object",
            0x6982 => "Access never granted",
            0x6985 => "Conditions of use not satisfied",
            0x6986 => "No object selected",
            0x6A80 => "Block out of range",
            0x6A81 => "Unsupported key size",
            0x6A82 => "Object not found",
            0x6B00 => "Read outside of object",
            0x6D00 => "Unsupported instruction",
            0x6E00 => "Unsupported class",
            0x6F00 => "Internal card error",
            _ => "Unknown status",
        }
    }
}

impl From<(u8, u8)> for StatusWord {
    fn from((sw1, sw2): (u8, u8)) -> Self {
        Self::new(sw1, sw2)
    }
}

impl From<u16> for StatusWord {
    fn from(status: u16) -> Self {
        Self::from_u16(status)
    }
}

impl From<StatusWord> for u16 {
    fn from(status: StatusWord) -> Self {
        status.to_u16()
    }
}

/// Status words emitted by the applet
pub mod common {
    use super::StatusWord;

    /// 9000
    pub const SUCCESS: StatusWord = StatusWord::from_u16(0x9000);
    /// 6700, frame or block length mismatch
    pub const WRONG_LENGTH: StatusWord = StatusWord::from_u16(0x6700);
    /// 6981, operation does not apply to the selected object
    pub const COMMAND_INCOMPATIBLE: StatusWord = StatusWord::from_u16(0x6981);
    /// 6982, access rule says never
    pub const SECURITY_STATUS_NOT_SATISFIED: StatusWord = StatusWord::from_u16(0x6982);
    /// 6985, no access rule for the operation
    pub const CONDITIONS_NOT_SATISFIED: StatusWord = StatusWord::from_u16(0x6985);
    /// 6986, nothing selected
    pub const COMMAND_NOT_ALLOWED: StatusWord = StatusWord::from_u16(0x6986);
    /// 6A80, block not below the modulus
    pub const INCORRECT_DATA: StatusWord = StatusWord::from_u16(0x6A80);
    /// 6A81, key size outside the supported set
    pub const FUNCTION_NOT_SUPPORTED: StatusWord = StatusWord::from_u16(0x6A81);
    /// 6A82
    pub const FILE_NOT_FOUND: StatusWord = StatusWord::from_u16(0x6A82);
    /// 6B00, read past the end of an object
    pub const WRONG_P1P2: StatusWord = StatusWord::from_u16(0x6B00);
    /// 6D00
    pub const INVALID_INSTRUCTION: StatusWord = StatusWord::from_u16(0x6D00);
    /// 6E00
    pub const CLASS_NOT_SUPPORTED: StatusWord = StatusWord::from_u16(0x6E00);
    /// 6F00
    pub const NO_PRECISE_DIAGNOSIS: StatusWord = StatusWord::from_u16(0x6F00);
}
