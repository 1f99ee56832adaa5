//! RSA decryption applet
//!
//! A card-resident command processor holding exactly one RSA key pair. It
//! answers a small command set over short ISO/IEC 7816-4 frames:
//!
//! | INS | Command | Response |
//! |---|---|---|
//! | `0x10` | DECRYPT | private key transform of the payload |
//! | `0x20` | GET KEYLENGTH | modulus bits, big-endian `u16` |
//! | `0x30` | GET PUBKEY | PKCS#1 DER public key |
//! | `0x32` | GET VERSION | major, minor |
//! | `0xC0` | GET RESPONSE | empty |
//! | `0xA4` | SELECT | empty |
//!
//! The [`Applet`] dispatches frames; the [`KeyStore`] owns the key objects and
//! the selection state; an [`AccessEvaluator`] gates DECRYPT; a
//! [`PrivateKeyTransform`] performs the private operation. [`VirtualCard`]
//! exposes an applet through the [`CardTransport`](cardcrypt_apdu::CardTransport)
//! seam.
#![cfg_attr(not(test), warn(unused_crate_dependencies))]
#![forbid(unsafe_code)]
#![warn(missing_docs, rustdoc::missing_crate_level_docs)]

pub mod access;
mod applet;
mod card;
mod config;
pub mod constants;
mod error;
pub mod key_store;
pub mod transform;
mod types;

pub use access::{
    AccessEvaluator, AccessRule, Condition, DenialReason, Permission, RuleEvaluator, Verdict,
};
pub use applet::{Applet, Lifecycle};
pub use card::VirtualCard;
pub use config::AppletConfig;
pub use error::{Error, Result};
pub use key_store::{KeyObject, KeyStore, ObjectKind};
pub use transform::{KeySize, PrivateKeyTransform, RsaTransform};
pub use types::Version;

#[cfg(test)]
pub(crate) mod test_utils {
    use std::sync::OnceLock;

    use rand_v8::SeedableRng;
    use rand_v8::rngs::StdRng;
    use rsa::RsaPrivateKey;

    /// Deterministic 512-bit key shared by the unit tests
    pub(crate) fn test_key() -> &'static RsaPrivateKey {
        static KEY: OnceLock<RsaPrivateKey> = OnceLock::new();
        KEY.get_or_init(|| {
            let mut rng = StdRng::seed_from_u64(0x3F00);
            RsaPrivateKey::new(&mut rng, 512).unwrap()
        })
    }
}
