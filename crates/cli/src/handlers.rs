//! Subcommand implementations

use std::io::{BufRead, Write};
use std::path::Path;

use cardcrypt_apdu::CardExecutor;
use cardcrypt_applet::{Applet, KeySize, VirtualCard};
use eyre::{WrapErr, bail};
use rsa::pkcs1::EncodeRsaPublicKey;
use rsa::pkcs8::{DecodePrivateKey, EncodePrivateKey, LineEnding};
use rsa::{Pkcs1v15Encrypt, RsaPrivateKey};
use tracing::{debug, info};
use zeroize::Zeroizing;

use cardcrypt_cli::CardClient;
use cardcrypt_cli::config::Settings;

/// Client talking to an applet on an in-process card
pub(crate) type VirtualClient = CardClient<CardExecutor<VirtualCard>>;

/// Install the configured key into a fresh applet and connect to it
pub(crate) fn open_card(settings: &Settings) -> eyre::Result<VirtualClient> {
    let pem = Zeroizing::new(
        std::fs::read_to_string(&settings.key)
            .wrap_err_with(|| format!("reading {}", settings.key.display()))?,
    );
    let key = RsaPrivateKey::from_pkcs8_pem(&pem).wrap_err("parsing PKCS#8 private key")?;
    let applet = Applet::install(key, settings.applet_config())?;

    Ok(CardClient::new(CardExecutor::new(VirtualCard::new(applet))).with_class(settings.cla))
}

/// Generate a key and write it as PKCS#8 PEM
pub(crate) fn generate_command(path: &Path, bits: usize, force: bool) -> eyre::Result<()> {
    let size = KeySize::from_bits(bits)?;
    if path.exists() && !force {
        bail!("{} already exists, pass --force to overwrite", path.display());
    }

    info!(%size, "Generating key");
    let key = RsaPrivateKey::new(&mut rand_v8::thread_rng(), bits)?;
    let pem = key.to_pkcs8_pem(LineEnding::LF)?;
    std::fs::write(path, pem.as_bytes())
        .wrap_err_with(|| format!("writing {}", path.display()))?;

    println!("Key written to {}", path.display());
    Ok(())
}

/// Show applet version and key size
pub(crate) fn info_command(client: &mut VirtualClient) -> eyre::Result<()> {
    client.select()?;
    let version = client.version()?;
    let bits = client.key_length()?;

    println!("Applet version: {version}");
    println!("Key length: {bits} bits");
    Ok(())
}

/// Print the card's public key
pub(crate) fn pubkey_command(client: &mut VirtualClient, der: bool) -> eyre::Result<()> {
    let public = client.public_key()?;
    if der {
        println!("{}", hex::encode(public.to_pkcs1_der()?.as_bytes()));
    } else {
        print!("{}", public.to_pkcs1_pem(LineEnding::LF)?);
    }
    Ok(())
}

/// Encrypt a message to the card's public key
pub(crate) fn encrypt_command(client: &mut VirtualClient, message: &str) -> eyre::Result<()> {
    let message = parse_hex(message)?;
    let public = client.public_key()?;
    let ciphertext = public.encrypt(&mut rand_v8::thread_rng(), Pkcs1v15Encrypt, &message)?;
    println!("{}", hex::encode(ciphertext));
    Ok(())
}

/// Decrypt one block on the card
pub(crate) fn decrypt_command(
    client: &mut VirtualClient,
    ciphertext: &str,
    pkcs1: bool,
) -> eyre::Result<()> {
    let ciphertext = parse_hex(ciphertext)?;
    let plain = if pkcs1 {
        client.decrypt_pkcs1(&ciphertext)?
    } else {
        client.decrypt(&ciphertext)?
    };
    println!("{}", hex::encode(&plain[..]));
    Ok(())
}

/// Send one raw frame
pub(crate) fn apdu_command(client: &mut VirtualClient, frame: &str) -> eyre::Result<()> {
    let frame = parse_hex(frame)?;
    let response = client.send_raw(&frame)?;
    println!("{}", format_response(&response));
    Ok(())
}

/// Exchange frames read line by line from `input`
///
/// Blank lines and lines starting with `#` are skipped. A line that fails to
/// parse is reported and the session continues.
pub(crate) fn shell_command<R: BufRead, W: Write>(
    client: &mut VirtualClient,
    input: R,
    mut output: W,
) -> eyre::Result<()> {
    for line in input.lines() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let frame = match parse_hex(line) {
            Ok(frame) => frame,
            Err(e) => {
                writeln!(output, "error: {e}")?;
                continue;
            }
        };

        debug!(len = frame.len(), "Shell frame");
        match client.send_raw(&frame) {
            Ok(response) => writeln!(output, "{}", format_response(&response))?,
            Err(e) => writeln!(output, "error: {e}")?,
        }
    }
    Ok(())
}

fn format_response(response: &cardcrypt_apdu::ResponseFrame) -> String {
    if response.payload().is_empty() {
        response.status().to_string()
    } else {
        format!("{} {}", hex::encode(response.payload()), response.status())
    }
}

/// Decode hex input, ignoring whitespace and an optional `0x` prefix
fn parse_hex(input: &str) -> eyre::Result<Vec<u8>> {
    let compact: String = input.chars().filter(|c| !c.is_whitespace()).collect();
    let digits = compact
        .strip_prefix("0x")
        .or_else(|| compact.strip_prefix("0X"))
        .unwrap_or(&compact);
    hex::decode(digits).wrap_err("invalid hex input")
}
