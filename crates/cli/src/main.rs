use std::path::PathBuf;

use clap::{Parser, Subcommand};
use eyre::WrapErr;
use tracing::info;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::filter::LevelFilter;

mod handlers;

use cardcrypt_cli::config::Settings;
use handlers::*;

#[derive(Parser)]
#[command(version, about = "Provision and drive the cardcrypt RSA applet on a virtual card")]
struct Cli {
    /// Settings file (defaults to ./cardcrypt.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Private key file, overriding the settings
    #[arg(short, long)]
    key: Option<PathBuf>,

    /// Trace level output
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a private key to provision the applet with
    Generate {
        /// Modulus size in bits (512, 768, 1024, 1280 or 1536)
        #[arg(short, long, default_value_t = 1024)]
        bits: usize,

        /// Overwrite an existing key file
        #[arg(long)]
        force: bool,
    },

    /// Show applet version and key size
    Info,

    /// Print the card's public key
    Pubkey {
        /// Print PKCS#1 DER as hex instead of PEM
        #[arg(long)]
        der: bool,
    },

    /// Encrypt a message to the card's public key (PKCS#1 v1.5)
    Encrypt {
        /// Message, as a hex string
        #[arg(required = true)]
        message: String,
    },

    /// Decrypt one block on the card
    Decrypt {
        /// Ciphertext block, as a hex string
        #[arg(required = true)]
        ciphertext: String,

        /// Strip PKCS#1 v1.5 padding from the result
        #[arg(long)]
        pkcs1: bool,
    },

    /// Send a raw command frame
    Apdu {
        /// Frame, as a hex string
        #[arg(required = true)]
        frame: String,
    },

    /// Read hex frames from stdin, one per line, and print the responses
    Shell,
}

fn main() -> eyre::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose);

    let mut settings = Settings::load(cli.config.as_deref()).wrap_err("loading settings")?;
    if let Some(key) = cli.key {
        settings.key = key;
    }

    if let Commands::Generate { bits, force } = cli.command {
        return generate_command(&settings.key, bits, force);
    }

    info!("Using key: {}", settings.key.display());
    let mut client = open_card(&settings)?;

    match cli.command {
        Commands::Generate { .. } => unreachable!(), // Already handled above
        Commands::Info => info_command(&mut client)?,
        Commands::Pubkey { der } => pubkey_command(&mut client, der)?,
        Commands::Encrypt { message } => encrypt_command(&mut client, &message)?,
        Commands::Decrypt { ciphertext, pkcs1 } => {
            decrypt_command(&mut client, &ciphertext, pkcs1)?
        }
        Commands::Apdu { frame } => apdu_command(&mut client, &frame)?,
        Commands::Shell => shell_command(&mut client, std::io::stdin().lock(), std::io::stdout())?,
    }

    Ok(())
}

fn setup_logging(verbose: bool) {
    let rust_log = std::env::var(EnvFilter::DEFAULT_ENV).ok();

    tracing_subscriber::fmt()
        .with_env_filter(log_filter(verbose, rust_log.as_deref()))
        .with_writer(std::io::stderr)
        .with_ansi(true)
        .init();
}

/// `directives` (from `RUST_LOG`) refine the level picked by `--verbose`
fn log_filter(verbose: bool, directives: Option<&str>) -> EnvFilter {
    let level = if verbose {
        LevelFilter::TRACE
    } else {
        LevelFilter::INFO
    };

    EnvFilter::builder()
        .with_default_directive(level.into())
        .parse_lossy(directives.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_filter_follows_verbose() {
        assert_eq!(log_filter(false, None).max_level_hint(), Some(LevelFilter::INFO));
        assert_eq!(log_filter(true, None).max_level_hint(), Some(LevelFilter::TRACE));
        assert_eq!(log_filter(true, Some("")).max_level_hint(), Some(LevelFilter::TRACE));
    }

    #[test]
    fn test_log_filter_keeps_env_directives() {
        let filter = log_filter(false, Some("cardcrypt_applet=trace"));
        assert_eq!(filter.max_level_hint(), Some(LevelFilter::TRACE));
    }
}
