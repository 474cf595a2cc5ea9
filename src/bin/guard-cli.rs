use std::path::PathBuf;
use std::process::ExitCode;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use clap::{Parser, Subcommand};

use edge_guard::config::{load_config, ConfigError, GuardConfig};
use edge_guard::cookies::{signer::GENERATED_KEY_LEN, CookieManager, SecretKey, MIN_SECRET_KEY_LEN};
use edge_guard::security::{build_csp, NonceGenerator};

#[derive(Parser)]
#[command(name = "guard-cli")]
#[command(about = "Operator tooling for edge-guard", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a cookie secret key (base64)
    Keygen {
        #[arg(short, long, default_value_t = GENERATED_KEY_LEN)]
        bytes: usize,
    },
    /// Produce a signed cookie value
    Sign {
        /// Secret key, base64
        #[arg(short, long)]
        key: String,
        value: String,
    },
    /// Check a signed cookie value and print its payload
    Verify {
        /// Secret key, base64
        #[arg(short, long)]
        key: String,
        signed: String,
    },
    /// Render the Content-Security-Policy a config produces
    Csp {
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
    /// Load and validate a config file
    CheckConfig { path: PathBuf },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli.command) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(command: Commands) -> Result<ExitCode, Box<dyn std::error::Error>> {
    match command {
        Commands::Keygen { bytes } => {
            if bytes < MIN_SECRET_KEY_LEN {
                return Err(format!("keys shorter than {MIN_SECRET_KEY_LEN} bytes are rejected").into());
            }
            let mut key = vec![0u8; bytes];
            rand::RngCore::try_fill_bytes(&mut rand::rngs::OsRng, &mut key)?;
            println!("{}", STANDARD.encode(&key));
        }
        Commands::Sign { key, value } => {
            let manager = manager_from(&key)?;
            println!("{}", manager.encode_value(&value));
        }
        Commands::Verify { key, signed } => {
            let manager = manager_from(&key)?;
            match manager.decode_value(&signed) {
                Some(value) => println!("{value}"),
                None => {
                    eprintln!("invalid or tampered value");
                    return Ok(ExitCode::FAILURE);
                }
            }
        }
        Commands::Csp { config } => {
            let config = match config {
                Some(path) => load_config(&path)?,
                None => GuardConfig::default(),
            };
            let nonce = NonceGenerator::new().generate()?;
            let policy = build_csp(&config.csp, &nonce);
            if policy.is_empty() {
                println!("(no Content-Security-Policy header)");
            } else {
                println!("Content-Security-Policy: {policy}");
            }
        }
        Commands::CheckConfig { path } => match load_config(&path) {
            Ok(config) => {
                println!(
                    "{}: OK ({} static mounts, CSP {})",
                    path.display(),
                    config.static_mounts.len(),
                    if config.csp.is_empty() { "off" } else { "on" }
                );
            }
            Err(ConfigError::Validation(errors)) => {
                eprintln!("{}: {} problem(s)", path.display(), errors.len());
                for error in errors {
                    eprintln!("  - {error}");
                }
                return Ok(ExitCode::FAILURE);
            }
            Err(e) => return Err(e.into()),
        },
    }

    Ok(ExitCode::SUCCESS)
}

fn manager_from(encoded: &str) -> Result<CookieManager, Box<dyn std::error::Error>> {
    let bytes = STANDARD.decode(encoded.trim())?;
    if bytes.len() < MIN_SECRET_KEY_LEN {
        return Err(format!(
            "key must be at least {MIN_SECRET_KEY_LEN} bytes, got {}",
            bytes.len()
        )
        .into());
    }
    Ok(CookieManager::new(SecretKey::new(bytes)))
}
