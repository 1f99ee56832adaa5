//! Key objects and their selection state
//!
//! The store holds a fixed two-level hierarchy: a root directory with the
//! private key and the public key record as its only children. Commands walk
//! it by selecting the root, then a child by identifier; the selection is
//! cleared again after every exchange.

use std::fmt;

use bytes::Bytes;
use derive_more::Display;
use rsa::pkcs1::EncodeRsaPublicKey;
use rsa::traits::PublicKeyParts;
use rsa::RsaPrivateKey;
use sha2::{Digest, Sha256};
use tracing::{debug, trace};

use crate::access::AccessRule;
use crate::constants::{ALG_RSA_CRT, KEY_METADATA_FORMAT, KEY_METADATA_LEN, fid};
use crate::transform::{KeySize, PrivateKeyTransform};
use crate::{Error, Result};

/// Kind of a stored object
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq)]
pub enum ObjectKind {
    /// Directory node, holds no data
    #[display("directory")]
    Directory,
    /// RSA private key in CRT form
    #[display("private key")]
    PrivateKey,
    /// Public key record
    #[display("public key")]
    PublicKey,
}

enum Body {
    Directory,
    PrivateKey(Box<RsaPrivateKey>),
    PublicKey(Bytes),
}

/// Object in the key hierarchy
pub struct KeyObject {
    id: u16,
    kind: ObjectKind,
    rule: AccessRule,
    size: usize,
    body: Body,
}

impl KeyObject {
    /// Object identifier
    pub const fn id(&self) -> u16 {
        self.id
    }

    /// Object kind
    pub const fn kind(&self) -> ObjectKind {
        self.kind
    }

    /// Access rule fixed at provisioning
    pub const fn rule(&self) -> AccessRule {
        self.rule
    }

    /// Stored size in bytes
    pub const fn size(&self) -> usize {
        self.size
    }
}

impl fmt::Debug for KeyObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyObject")
            .field("id", &format_args!("{:#06x}", self.id))
            .field("kind", &self.kind)
            .field("rule", &self.rule)
            .field("size", &self.size)
            .finish_non_exhaustive()
    }
}

/// Key hierarchy of one applet instance
pub struct KeyStore {
    root: KeyObject,
    private_key: KeyObject,
    public_key: KeyObject,
    key_size: KeySize,
    selection: Option<u16>,
}

impl KeyStore {
    /// Provision the store with a private key
    ///
    /// The public key record is derived from the key: its PKCS#1 DER encoding
    /// followed by the metadata trailer. `rule` guards the private key.
    pub fn provision(key: RsaPrivateKey, rule: AccessRule) -> Result<Self> {
        let key_size = KeySize::from_bits(key.n().bits())?;

        let der = key
            .to_public_key()
            .to_pkcs1_der()
            .map_err(rsa::Error::from)?;
        let der = der.as_bytes();

        let mut record = Vec::with_capacity(der.len() + KEY_METADATA_LEN);
        record.extend_from_slice(der);
        record.extend_from_slice(&metadata(key_size, der));

        let private_size = 5 * (key_size.block_len() / 2);
        debug!(
            %key_size,
            public_size = record.len(),
            private_size,
            "Key store provisioned"
        );

        Ok(Self {
            root: KeyObject {
                id: fid::ROOT,
                kind: ObjectKind::Directory,
                rule: AccessRule::none(),
                size: 0,
                body: Body::Directory,
            },
            private_key: KeyObject {
                id: fid::PRIVATE_KEY,
                kind: ObjectKind::PrivateKey,
                rule,
                size: private_size,
                body: Body::PrivateKey(Box::new(key)),
            },
            public_key: KeyObject {
                id: fid::PUBLIC_KEY,
                kind: ObjectKind::PublicKey,
                rule: AccessRule::none(),
                size: record.len(),
                body: Body::PublicKey(record.into()),
            },
            key_size,
            selection: None,
        })
    }

    /// Size of the provisioned key
    pub const fn key_size(&self) -> KeySize {
        self.key_size
    }

    /// Select the root of the hierarchy
    pub fn select_root(&mut self) -> Result<()> {
        trace!(id = format_args!("{:#06x}", fid::ROOT), "Select");
        self.selection = Some(fid::ROOT);
        Ok(())
    }

    /// Select a child of the current selection by identifier
    ///
    /// Only the root has children; selecting from a leaf or from nothing fails
    /// with [`Error::ObjectNotFound`].
    pub fn select_child(&mut self, id: u16) -> Result<()> {
        let is_child = matches!(id, fid::PRIVATE_KEY | fid::PUBLIC_KEY);
        if self.selection != Some(fid::ROOT) || !is_child {
            return Err(Error::ObjectNotFound(id));
        }

        trace!(id = format_args!("{:#06x}", id), "Select");
        self.selection = Some(id);
        Ok(())
    }

    /// Currently selected object
    pub fn selected(&self) -> Result<&KeyObject> {
        match self.selection {
            Some(fid::ROOT) => Ok(&self.root),
            Some(fid::PRIVATE_KEY) => Ok(&self.private_key),
            Some(fid::PUBLIC_KEY) => Ok(&self.public_key),
            Some(id) => Err(Error::ObjectNotFound(id)),
            None => Err(Error::NoSelection),
        }
    }

    /// Stored size of the selected object
    pub fn size(&self) -> Result<usize> {
        self.selected().map(KeyObject::size)
    }

    /// Copy `length` bytes at `offset` of the selected object into
    /// `into[into_offset..]`
    ///
    /// Only the public key record is readable.
    pub fn read_binary(
        &self,
        offset: usize,
        into: &mut [u8],
        into_offset: usize,
        length: usize,
    ) -> Result<()> {
        let object = self.selected()?;
        let Body::PublicKey(data) = &object.body else {
            return Err(Error::CommandIncompatible(object.id));
        };

        let source = offset
            .checked_add(length)
            .and_then(|end| data.get(offset..end))
            .ok_or(Error::StorageReadOutOfRange {
                offset,
                length,
                size: data.len(),
            })?;
        let available = into.len();
        let target = into_offset
            .checked_add(length)
            .and_then(|end| into.get_mut(into_offset..end))
            .ok_or(Error::BufferTooSmall {
                needed: into_offset.saturating_add(length),
                available,
            })?;

        target.copy_from_slice(source);
        Ok(())
    }

    /// Clear the selection
    pub fn reset_selection(&mut self) {
        self.selection = None;
    }

    /// Load the private key into `transform`
    ///
    /// Only the owning [`Applet`](crate::Applet) binds, on its first selection.
    pub(crate) fn bind<T: PrivateKeyTransform + ?Sized>(&self, transform: &mut T) -> Result<()> {
        let Body::PrivateKey(key) = &self.private_key.body else {
            return Err(Error::ObjectNotFound(fid::PRIVATE_KEY));
        };
        transform.load(key)
    }

    /// Swap in a public record whose declared size may disagree with its data
    #[cfg(test)]
    pub(crate) fn replace_public_record(&mut self, record: Bytes, size: usize) {
        self.public_key.body = Body::PublicKey(record);
        self.public_key.size = size;
    }
}

impl fmt::Debug for KeyStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyStore")
            .field("key_size", &self.key_size)
            .field("private_key", &self.private_key)
            .field("public_key", &self.public_key)
            .field(
                "selection",
                &self.selection.map(|id| format!("{id:#06x}")),
            )
            .finish()
    }
}

/// Metadata trailer: format, algorithm, modulus bits, DER fingerprint prefix
fn metadata(key_size: KeySize, der: &[u8]) -> [u8; KEY_METADATA_LEN] {
    let mut trailer = [0u8; KEY_METADATA_LEN];
    trailer[0] = KEY_METADATA_FORMAT;
    trailer[1] = ALG_RSA_CRT;
    trailer[2..4].copy_from_slice(&key_size.bits().to_be_bytes());
    let digest = Sha256::digest(der);
    trailer[4..].copy_from_slice(&digest[..KEY_METADATA_LEN - 4]);
    trailer
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::access::Condition;
    use crate::test_utils::test_key;
    use crate::transform::RsaTransform;
    use rsa::RsaPublicKey;
    use rsa::pkcs1::DecodeRsaPublicKey;

    fn store() -> KeyStore {
        KeyStore::provision(test_key().clone(), AccessRule::execute(Condition::Always)).unwrap()
    }

    #[test]
    fn test_provision_sizes() {
        let store = store();
        assert_eq!(store.key_size().bits(), 512);
        // 5 CRT components of half the modulus length each
        assert_eq!(store.private_key.size(), 5 * 32);

        let der_len = test_key().to_public_key().to_pkcs1_der().unwrap().as_bytes().len();
        assert_eq!(store.public_key.size(), der_len + KEY_METADATA_LEN);
    }

    #[test]
    fn test_selection_walk() {
        let mut store = store();
        assert!(matches!(store.selected(), Err(Error::NoSelection)));
        assert!(matches!(store.size(), Err(Error::NoSelection)));

        assert!(matches!(
            store.select_child(fid::PUBLIC_KEY),
            Err(Error::ObjectNotFound(fid::PUBLIC_KEY))
        ));

        store.select_root().unwrap();
        assert_eq!(store.selected().unwrap().kind(), ObjectKind::Directory);
        assert!(matches!(
            store.select_child(0x0001),
            Err(Error::ObjectNotFound(0x0001))
        ));

        store.select_child(fid::PRIVATE_KEY).unwrap();
        assert_eq!(store.selected().unwrap().id(), fid::PRIVATE_KEY);
        // Leaves have no children
        assert!(store.select_child(fid::PUBLIC_KEY).is_err());

        store.reset_selection();
        assert!(matches!(store.selected(), Err(Error::NoSelection)));
    }

    #[test]
    fn test_read_public_record() {
        let mut store = store();
        store.select_root().unwrap();
        store.select_child(fid::PUBLIC_KEY).unwrap();

        let size = store.size().unwrap();
        let mut record = vec![0u8; size];
        store.read_binary(0, &mut record, 0, size).unwrap();

        let der_len = size - KEY_METADATA_LEN;
        let public = RsaPublicKey::from_pkcs1_der(&record[..der_len]).unwrap();
        assert_eq!(public, test_key().to_public_key());

        let trailer = &record[der_len..];
        assert_eq!(&trailer[..4], &[KEY_METADATA_FORMAT, ALG_RSA_CRT, 0x02, 0x00]);
        assert_eq!(&trailer[4..], &Sha256::digest(&record[..der_len])[..12]);
    }

    #[test]
    fn test_read_bounds() {
        let mut store = store();
        store.select_root().unwrap();
        store.select_child(fid::PUBLIC_KEY).unwrap();
        let size = store.size().unwrap();

        let mut buffer = vec![0u8; size + 8];
        assert!(matches!(
            store.read_binary(1, &mut buffer, 0, size),
            Err(Error::StorageReadOutOfRange { .. })
        ));
        assert!(matches!(
            store.read_binary(usize::MAX, &mut buffer, 0, 2),
            Err(Error::StorageReadOutOfRange { .. })
        ));
        assert!(matches!(
            store.read_binary(0, &mut buffer, 9, size),
            Err(Error::BufferTooSmall { needed, available })
                if needed == size + 9 && available == size + 8
        ));

        // Offset into the destination
        store.read_binary(0, &mut buffer, 8, size).unwrap();
        assert_eq!(&buffer[..8], &[0u8; 8]);
        assert_eq!(buffer[8], 0x30);
    }

    #[test]
    fn test_private_key_and_root_unreadable() {
        let mut store = store();
        let mut buffer = [0u8; 4];

        store.select_root().unwrap();
        assert!(matches!(
            store.read_binary(0, &mut buffer, 0, 0),
            Err(Error::CommandIncompatible(fid::ROOT))
        ));

        store.select_child(fid::PRIVATE_KEY).unwrap();
        let err = store.read_binary(0, &mut buffer, 0, 4).unwrap_err();
        assert_eq!(err.status().to_u16(), 0x6981);
    }

    #[test]
    fn test_bind_loads_transform() {
        let store = store();
        let mut transform = RsaTransform::new();
        assert!(matches!(
            store.bind(&mut transform),
            Err(Error::NotInitialized)
        ));

        transform.initialize(512).unwrap();
        store.bind(&mut transform).unwrap();
        assert!(transform.is_initialized());
    }

    #[test]
    fn test_debug_hides_key_material() {
        let rendered = format!("{:?}", store());
        assert!(rendered.contains("0x0012"));
        assert!(!rendered.contains("primes"));
    }
}
