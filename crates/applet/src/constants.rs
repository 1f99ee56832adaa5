//! Protocol constants of the applet
//!
//! Class and instruction bytes, object identifiers and the layout of the
//! public key record.

use crate::types::Version;

/// Version reported by GET VERSION
pub const APPLET_VERSION: Version = Version { major: 1, minor: 0 };

/// Command classes
pub mod cla {
    /// Proprietary class the applet answers DECRYPT on
    pub const APPLET: u8 = 0x80;
    /// Interindustry class, used for SELECT and GET RESPONSE
    pub const ISO7816: u8 = 0x00;
}

/// Instruction codes
pub mod ins {
    /// Private key transform of one block
    pub const DECRYPT: u8 = 0x10;
    /// Modulus length in bits
    pub const GET_KEYLENGTH: u8 = 0x20;
    /// Public key disclosure
    pub const GET_PUBKEY: u8 = 0x30;
    /// Applet version
    pub const GET_VERSION: u8 = 0x32;
    /// Fetch pending response data, always empty
    pub const GET_RESPONSE: u8 = 0xC0;
    /// Applet selection
    pub const SELECT: u8 = 0xA4;
}

/// Object identifiers of the key hierarchy
pub mod fid {
    /// Root of the hierarchy
    pub const ROOT: u16 = 0x3F00;
    /// Private key object
    pub const PRIVATE_KEY: u16 = 0x0012;
    /// Public key object
    pub const PUBLIC_KEY: u16 = 0x1012;
}

/// Trailing bytes of the public key record that hold internal key metadata
///
/// They are part of the stored object but never disclosed.
pub const KEY_METADATA_LEN: usize = 16;

/// Format version of the key metadata block
pub const KEY_METADATA_FORMAT: u8 = 0x01;

/// Algorithm tag for RSA with a CRT private key
pub const ALG_RSA_CRT: u8 = 0x01;
