//! Applet command processor
//!
//! The [`Applet`] owns the key store, the private key transform and the access
//! evaluator. Each exchange takes one command frame and yields exactly one
//! response frame; errors never escape as anything other than a status word.

use bytes::{Bytes, BytesMut};
use cardcrypt_apdu::{CommandFrame, ResponseFrame};
use derive_more::Display;
use rsa::RsaPrivateKey;
use tracing::{Level, debug, info, instrument, warn};

use crate::access::{AccessEvaluator, Permission, RuleEvaluator};
use crate::config::AppletConfig;
use crate::constants::{KEY_METADATA_LEN, fid, ins};
use crate::key_store::KeyStore;
use crate::transform::{KeySize, PrivateKeyTransform, RsaTransform};
use crate::{Error, Result};

/// Lifecycle state of an applet instance
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq)]
pub enum Lifecycle {
    /// Installed with a provisioned key, not currently selected
    #[display("installed")]
    Installed,
    /// Selected and waiting for commands
    #[display("selected")]
    Selected,
    /// Handling a command
    #[display("processing")]
    Processing,
}

/// RSA decryption applet
///
/// The applet is the card's default selection: a command arriving before an
/// explicit SELECT selects it implicitly. The private key transform is
/// initialized and bound on the first selection and stays bound until the
/// applet is dropped.
#[derive(Debug)]
pub struct Applet<T = RsaTransform, A = RuleEvaluator> {
    config: AppletConfig,
    key_store: KeyStore,
    transform: T,
    evaluator: A,
    state: Lifecycle,
}

impl Applet {
    /// Install an applet with `key` as its private key
    pub fn install(key: RsaPrivateKey, config: AppletConfig) -> Result<Self> {
        Self::install_with(key, config, RsaTransform::new(), RuleEvaluator)
    }
}

impl<T: PrivateKeyTransform, A: AccessEvaluator> Applet<T, A> {
    /// Install an applet with a custom transform and evaluator
    ///
    /// Fails with [`Error::InvalidKeySize`] when the key's modulus size is not
    /// supported.
    pub fn install_with(
        key: RsaPrivateKey,
        config: AppletConfig,
        transform: T,
        evaluator: A,
    ) -> Result<Self> {
        let key_store = KeyStore::provision(key, config.private_key_rule())?;
        info!(
            key_size = %key_store.key_size(),
            cla = format_args!("{:#04x}", config.cla),
            version = %config.version,
            "Applet installed"
        );

        Ok(Self {
            config,
            key_store,
            transform,
            evaluator,
            state: Lifecycle::Installed,
        })
    }

    /// Select the applet, initializing the transform on first use
    ///
    /// This is the only place the private key is handed to the transform.
    pub fn select(&mut self) -> Result<()> {
        if !self.transform.is_initialized() {
            let size = self.key_store.key_size();
            self.transform.initialize(usize::from(size.bits()))?;
            self.key_store.bind(&mut self.transform)?;
            debug!(%size, "Private key bound to transform");
        }

        self.state = Lifecycle::Selected;
        Ok(())
    }

    /// Deselect the applet; the transform stays initialized
    pub fn deselect(&mut self) {
        self.key_store.reset_selection();
        self.state = Lifecycle::Installed;
        debug!("Applet deselected");
    }

    /// Current lifecycle state
    pub const fn state(&self) -> Lifecycle {
        self.state
    }

    /// Install-time configuration
    pub const fn config(&self) -> &AppletConfig {
        &self.config
    }

    /// Size of the provisioned key
    pub const fn key_size(&self) -> KeySize {
        self.key_store.key_size()
    }

    /// Private key transform of this instance
    pub const fn transform(&self) -> &T {
        &self.transform
    }

    /// Process a raw command and return the raw response
    ///
    /// Frames too short to carry a header are answered with `6700`.
    pub fn process(&mut self, raw: &[u8]) -> Bytes {
        let response = match CommandFrame::from_bytes(raw) {
            Ok(frame) => self.handle(&frame),
            Err(e) => {
                let error = Error::from(e);
                debug!(%error, "Rejected unparsable frame");
                ResponseFrame::error(error.status())
            }
        };
        response.to_bytes()
    }

    /// Handle one command frame
    #[instrument(
        skip_all,
        fields(
            cla = format_args!("{:#04x}", frame.cla),
            ins = format_args!("{:#04x}", frame.ins),
        )
    )]
    pub fn handle(&mut self, frame: &CommandFrame) -> ResponseFrame {
        let result = if self.state == Lifecycle::Installed {
            self.select().and_then(|()| self.run(frame))
        } else {
            self.run(frame)
        };

        let response = match result {
            Ok(payload) => ResponseFrame::success(payload),
            Err(error) => {
                debug!(%error, "Command failed");
                ResponseFrame::error(error.status())
            }
        };

        let status = response.status();
        let len = response.payload().len();
        let level = status.tracing_level();
        if level == Level::DEBUG {
            debug!(%status, len, "Exchange complete");
        } else if level == Level::INFO {
            info!(%status, len, description = status.description(), "Exchange complete");
        } else {
            warn!(%status, len, description = status.description(), "Exchange complete");
        }

        response
    }

    fn run(&mut self, frame: &CommandFrame) -> Result<Bytes> {
        self.state = Lifecycle::Processing;
        let result = self.dispatch(frame);
        self.key_store.reset_selection();
        self.state = Lifecycle::Selected;
        result
    }

    fn dispatch(&mut self, frame: &CommandFrame) -> Result<Bytes> {
        match frame.ins {
            ins::DECRYPT => self.decrypt(frame),
            ins::GET_KEYLENGTH => Ok(self.get_key_length()),
            ins::GET_PUBKEY => self.get_public_key(),
            ins::GET_VERSION => Ok(Bytes::copy_from_slice(&self.config.version.to_bytes())),
            ins::GET_RESPONSE => Ok(Bytes::new()),
            ins::SELECT => self.select().map(|()| Bytes::new()),
            other => Err(Error::UnsupportedInstruction(other)),
        }
    }

    fn decrypt(&mut self, frame: &CommandFrame) -> Result<Bytes> {
        if frame.cla != self.config.cla {
            return Err(Error::UnsupportedClass(frame.cla));
        }
        if !frame.has_consistent_length() {
            return Err(Error::Framing {
                declared: frame.declared_length(),
                received: frame.payload().len(),
            });
        }

        self.key_store.select_root()?;
        self.key_store.select_child(fid::PRIVATE_KEY)?;
        let object = self.key_store.selected()?;
        self.evaluator
            .check(object, Permission::Execute)
            .into_result()?;

        let mut block = BytesMut::from(frame.payload());
        self.transform.transform_in_place(&mut block)?;
        Ok(block.freeze())
    }

    fn get_public_key(&mut self) -> Result<Bytes> {
        self.key_store.select_root()?;
        self.key_store.select_child(fid::PUBLIC_KEY)?;

        let size = self.key_store.size()?;
        let length = size
            .checked_sub(KEY_METADATA_LEN)
            .ok_or(Error::StorageReadOutOfRange {
                offset: 0,
                length: KEY_METADATA_LEN,
                size,
            })?;

        let mut buffer = BytesMut::zeroed(length);
        self.key_store.read_binary(0, &mut buffer, 0, length)?;
        Ok(buffer.freeze())
    }

    fn get_key_length(&self) -> Bytes {
        Bytes::copy_from_slice(&self.key_store.key_size().bits().to_be_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::access::Condition;
    use crate::constants::cla;
    use crate::test_utils::test_key;
    use hex_literal::hex;
    use rsa::traits::PublicKeyParts;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn applet() -> Applet {
        Applet::install(test_key().clone(), AppletConfig::default()).unwrap()
    }

    #[test]
    fn test_implicit_selection() {
        let mut applet = applet();
        assert_eq!(applet.state(), Lifecycle::Installed);
        assert!(!applet.transform().is_initialized());

        let response = applet.process(&hex!("8020000000"));
        assert_eq!(&response[..], &hex!("02009000"));
        assert_eq!(applet.state(), Lifecycle::Selected);
        assert!(applet.transform().is_initialized());
    }

    #[test]
    fn test_get_version() {
        let mut applet = applet();
        let response = applet.handle(&CommandFrame::new(cla::APPLET, ins::GET_VERSION, 0, 0));
        assert!(response.is_success());
        assert_eq!(&response.payload()[..], &[0x01, 0x00]);
    }

    #[test]
    fn test_get_response_and_select_are_empty() {
        let mut applet = applet();
        for instruction in [ins::GET_RESPONSE, ins::SELECT] {
            let response = applet.handle(&CommandFrame::new(cla::ISO7816, instruction, 0, 0));
            assert!(response.is_success());
            assert!(response.payload().is_empty());
        }
    }

    #[test]
    fn test_unknown_instruction() {
        let mut applet = applet();
        let response = applet.process(&hex!("80FF000000"));
        assert_eq!(&response[..], &hex!("6D00"));
    }

    #[test]
    fn test_short_frame() {
        let mut applet = applet();
        assert_eq!(&applet.process(&hex!("8010"))[..], &hex!("6700"));
        assert_eq!(&applet.process(&[])[..], &hex!("6700"));
    }

    #[test]
    fn test_decrypt_class_checked_before_length() {
        let mut applet = applet();
        let frame = CommandFrame::new_with_data(cla::ISO7816, ins::DECRYPT, 0, 0, vec![0u8; 3])
            .unwrap()
            .with_p3(4);
        assert_eq!(applet.handle(&frame).status().to_u16(), 0x6E00);
    }

    #[test]
    fn test_decrypt_denied_by_rule() {
        let config = AppletConfig {
            execute: Some(Condition::Never),
            ..Default::default()
        };
        let mut applet = Applet::install(test_key().clone(), config).unwrap();
        let frame =
            CommandFrame::new_with_data(cla::APPLET, ins::DECRYPT, 0, 0, vec![0x01u8; 64]).unwrap();
        assert_eq!(applet.handle(&frame).status().to_u16(), 0x6982);

        let config = AppletConfig {
            execute: None,
            ..Default::default()
        };
        let mut applet = Applet::install(test_key().clone(), config).unwrap();
        assert_eq!(applet.handle(&frame).status().to_u16(), 0x6985);
    }

    #[test]
    fn test_selection_reset_after_exchange() {
        let mut applet = applet();
        applet.handle(&CommandFrame::new(cla::APPLET, ins::GET_PUBKEY, 0, 0));
        assert!(matches!(
            applet.key_store.selected(),
            Err(Error::NoSelection)
        ));
    }

    #[test]
    fn test_deselect_keeps_transform() {
        let mut applet = applet();
        applet.select().unwrap();
        applet.deselect();
        assert_eq!(applet.state(), Lifecycle::Installed);
        assert!(applet.transform().is_initialized());

        // Reselected implicitly by the next command
        assert!(applet.process(&hex!("8032000000")).ends_with(&hex!("9000")));
        assert_eq!(applet.state(), Lifecycle::Selected);
    }

    #[test]
    fn test_public_key_storage_status_passes_through() {
        let mut applet = applet();
        let frame = CommandFrame::new(cla::APPLET, ins::GET_PUBKEY, 0, 0);

        // Record shorter than its metadata trailer
        applet
            .key_store
            .replace_public_record(Bytes::from_static(&[0x30; 10]), 10);
        assert_eq!(&applet.process(&frame.to_bytes())[..], &hex!("6B00"));

        // Declared size larger than the stored data, caught by read_binary
        applet
            .key_store
            .replace_public_record(Bytes::from_static(&[0x30; 20]), 40);
        let response = applet.handle(&frame);
        assert_eq!(response.status().to_u16(), 0x6B00);
        assert!(response.payload().is_empty());
    }

    /// Transform that only counts how often it receives a key
    #[derive(Debug, Default)]
    struct LoadCounter {
        inner: RsaTransform,
        loads: Arc<AtomicUsize>,
    }

    impl PrivateKeyTransform for LoadCounter {
        fn initialize(&mut self, key_bits: usize) -> Result<()> {
            self.inner.initialize(key_bits)
        }

        fn load(&mut self, key: &RsaPrivateKey) -> Result<()> {
            self.loads.fetch_add(1, Ordering::SeqCst);
            assert_eq!(key.n(), test_key().n());
            self.inner.load(key)
        }

        fn is_initialized(&self) -> bool {
            self.inner.is_initialized()
        }

        fn transform(&mut self, input: &[u8], output: &mut [u8]) -> Result<usize> {
            self.inner.transform(input, output)
        }
    }

    #[test]
    fn test_key_reaches_transform_only_on_selection() {
        let transform = LoadCounter::default();
        let loads = Arc::clone(&transform.loads);
        let mut applet = Applet::install_with(
            test_key().clone(),
            AppletConfig::default(),
            transform,
            RuleEvaluator,
        )
        .unwrap();
        assert_eq!(loads.load(Ordering::SeqCst), 0);

        applet.select().unwrap();
        applet.deselect();
        applet.process(&hex!("8020000000"));
        applet.select().unwrap();
        assert_eq!(loads.load(Ordering::SeqCst), 1);
    }
}
