//! Private key transform
//!
//! The transform is the only holder of usable private key material once the
//! applet is selected. It is sized first ([`PrivateKeyTransform::initialize`]),
//! then loaded with the key by the key store, and from then on applies the raw
//! RSA private operation to modulus-sized blocks.

use std::fmt;

use derive_more::Display;
use rsa::hazmat::rsa_decrypt_and_check;
use rsa::traits::PublicKeyParts;
use rsa::{BigUint, RsaPrivateKey};
use tracing::{debug, trace};
use zeroize::Zeroizing;

use crate::{Error, Result};

/// Validated RSA modulus size
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Hash)]
#[display("{_0} bits")]
pub struct KeySize(u16);

impl KeySize {
    /// Modulus sizes whose blocks fit a single-length-byte frame
    pub const SUPPORTED: [u16; 5] = [512, 768, 1024, 1280, 1536];

    /// 1024-bit modulus
    pub const RSA_1024: Self = Self(1024);

    /// Validate a modulus size
    pub fn from_bits(bits: usize) -> Result<Self> {
        u16::try_from(bits)
            .ok()
            .filter(|bits| Self::SUPPORTED.contains(bits))
            .map(Self)
            .ok_or(Error::InvalidKeySize(bits))
    }

    /// Size of the key's modulus in bits
    pub const fn bits(self) -> u16 {
        self.0
    }

    /// Block length in bytes
    pub const fn block_len(self) -> usize {
        self.0 as usize / 8
    }
}

/// Fixed-size private key operation on caller supplied blocks
pub trait PrivateKeyTransform: Send + fmt::Debug {
    /// Prepare the transform for keys of `key_bits`
    ///
    /// Fails with [`Error::InvalidKeySize`] for unsupported sizes. Calling it
    /// again with the same size is a no-op.
    fn initialize(&mut self, key_bits: usize) -> Result<()>;

    /// Bind the private key; its size must match the initialized size
    fn load(&mut self, key: &RsaPrivateKey) -> Result<()>;

    /// Whether a key is bound and the transform ready for use
    fn is_initialized(&self) -> bool;

    /// Apply the private operation to `input`, writing the result to `output`
    ///
    /// `input` must be exactly one block long. Returns the number of bytes written.
    fn transform(&mut self, input: &[u8], output: &mut [u8]) -> Result<usize>;

    /// Apply the private operation to `block`, overwriting it with the result
    fn transform_in_place(&mut self, block: &mut [u8]) -> Result<()> {
        let input = Zeroizing::new(block.to_vec());
        self.transform(&input, block)?;
        Ok(())
    }
}

#[derive(Default)]
enum State {
    #[default]
    Uninitialized,
    Sized(KeySize),
    Ready {
        size: KeySize,
        key: Box<RsaPrivateKey>,
    },
}

/// RSA transform backed by the `rsa` crate, using the CRT form of the key
///
/// Every operation is blinded and its result verified against the public
/// exponent before it is released.
#[derive(Default)]
pub struct RsaTransform {
    state: State,
}

impl RsaTransform {
    /// Create an uninitialized transform
    pub fn new() -> Self {
        Self::default()
    }

    /// Initialized key size, if any
    pub const fn key_size(&self) -> Option<KeySize> {
        match &self.state {
            State::Uninitialized => None,
            State::Sized(size) | State::Ready { size, .. } => Some(*size),
        }
    }
}

impl fmt::Debug for RsaTransform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RsaTransform")
            .field("key_size", &self.key_size())
            .field("initialized", &self.is_initialized())
            .finish()
    }
}

impl PrivateKeyTransform for RsaTransform {
    fn initialize(&mut self, key_bits: usize) -> Result<()> {
        let size = KeySize::from_bits(key_bits)?;
        match self.key_size() {
            Some(current) if current == size => Ok(()),
            Some(current) => Err(Error::InvalidKeySize(usize::from(current.bits()))),
            None => {
                debug!(%size, "Private key transform initialized");
                self.state = State::Sized(size);
                Ok(())
            }
        }
    }

    fn load(&mut self, key: &RsaPrivateKey) -> Result<()> {
        let size = self.key_size().ok_or(Error::NotInitialized)?;
        let bits = key.n().bits();
        if bits != usize::from(size.bits()) {
            return Err(Error::InvalidKeySize(bits));
        }

        let mut key = Box::new(key.clone());
        key.precompute()?;
        self.state = State::Ready { size, key };
        Ok(())
    }

    fn is_initialized(&self) -> bool {
        matches!(self.state, State::Ready { .. })
    }

    fn transform(&mut self, input: &[u8], output: &mut [u8]) -> Result<usize> {
        let State::Ready { size, key } = &self.state else {
            return Err(Error::NotInitialized);
        };

        let block_len = size.block_len();
        if input.len() != block_len {
            return Err(Error::BlockLength {
                expected: block_len,
                actual: input.len(),
            });
        }
        if output.len() < block_len {
            return Err(Error::BufferTooSmall {
                needed: block_len,
                available: output.len(),
            });
        }

        let c = BigUint::from_bytes_be(input);
        if &c >= key.n() {
            return Err(Error::BlockOutOfRange);
        }

        let m = Zeroizing::new(rsa_decrypt_and_check(
            &**key,
            Some(&mut rand_v8::thread_rng()),
            &c,
        )?);
        let plain = Zeroizing::new(m.to_bytes_be());

        // Left-pad to the block length
        let pad = block_len - plain.len();
        output[..pad].fill(0);
        output[pad..block_len].copy_from_slice(&plain);

        trace!(block_len, "Private key transform applied");
        Ok(block_len)
    }
}
