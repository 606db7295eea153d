//! doclocker: encrypted per-user document locker
//!
//! Every command that touches documents unlocks a session first; `download`
//! additionally asks for the password a second time before decrypting.
//!
//! Usage:
//!   doclocker signup alice
//!   doclocker upload alice ./notes.txt
//!   doclocker download alice notes.txt --output ./notes.txt
//!
//! Set `DOCLOCKER_PASSWORD` to skip the interactive prompts. There is no
//! command-line flag for the password; arguments are visible to other users.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use locker_vault::{Locker, LockerConfig, LockerSession};
use tracing::{debug, info, Level};
use tracing_subscriber::FmtSubscriber;
use zeroize::Zeroizing;

const DEFAULT_CONFIG_FILE: &str = "config.json";
const PASSWORD_ENV: &str = "DOCLOCKER_PASSWORD";

#[derive(Parser, Debug)]
#[command(name = "doclocker")]
#[command(about = "Password-protected encrypted document locker")]
struct Args {
    /// Directory holding users.json and user_documents/
    #[arg(short, long, env = "DOCLOCKER_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// JSON config file (defaults to <data-dir>/config.json if present)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Enable verbose debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create a new user
    Signup { username: String },

    /// Encrypt a file into the locker
    Upload {
        username: String,
        file: PathBuf,
        /// Name to store the document under (defaults to the file name)
        #[arg(short, long)]
        name: Option<String>,
    },

    /// Decrypt a document out of the locker
    Download {
        username: String,
        name: String,
        /// Where to write the plaintext (defaults to the document name)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// List stored documents
    List { username: String },

    /// Remove a document
    Delete { username: String, name: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let log_level = if args.verbose { Level::DEBUG } else { Level::INFO };
    FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .compact()
        .init();

    let passwords = Passwords {
        env: std::env::var(PASSWORD_ENV).ok().map(Zeroizing::new),
    };

    let config = load_config(args.config.as_deref(), args.data_dir.as_deref())?;
    debug!(?config, "Resolved configuration");
    let locker = Locker::open(&config).context("Failed to open locker")?;

    match &args.command {
        Command::Signup { username } => {
            let password = passwords.read("Choose a password: ")?;
            let confirm = match passwords.env {
                Some(_) => password.clone(),
                None => passwords.read("Confirm password: ")?,
            };
            if *password != *confirm {
                bail!("Passwords do not match");
            }
            locker.signup(username, &password)?;
            println!("Account created for {}", username.trim());
        }
        Command::Upload {
            username,
            file,
            name,
        } => {
            let name = match name {
                Some(name) => name.clone(),
                None => file_name(file)?,
            };
            let plaintext =
                std::fs::read(file).with_context(|| format!("Failed to read {}", file.display()))?;

            let session = unlock(&locker, &passwords, username).await?;
            session.upload(&name, &plaintext)?;
            session.lock();
            println!("Encrypted and saved '{name}'");
        }
        Command::Download {
            username,
            name,
            output,
        } => {
            let session = unlock(&locker, &passwords, username).await?;
            let confirm = passwords.read("Confirm your password to download: ")?;
            let plaintext = session.download(name, &confirm)?;
            session.lock();

            let output = output.clone().unwrap_or_else(|| PathBuf::from(name));
            std::fs::write(&output, &plaintext)
                .with_context(|| format!("Failed to write {}", output.display()))?;
            println!("Decrypted '{}' to {}", name, output.display());
        }
        Command::List { username } => {
            let session = unlock(&locker, &passwords, username).await?;
            let names = session.list()?;
            session.lock();

            if names.is_empty() {
                println!("Your locker is empty.");
            }
            for name in names {
                println!("{name}");
            }
        }
        Command::Delete { username, name } => {
            let session = unlock(&locker, &passwords, username).await?;
            session.delete(name)?;
            session.lock();
            println!("Deleted '{name}'");
        }
    }

    Ok(())
}

fn load_config(explicit: Option<&Path>, data_dir: Option<&Path>) -> Result<LockerConfig> {
    let implicit = data_dir
        .unwrap_or(Path::new("."))
        .join(DEFAULT_CONFIG_FILE);

    let mut config = match explicit {
        Some(path) => LockerConfig::load(path)?,
        None if implicit.is_file() => {
            info!("Loading config from {:?}", implicit);
            LockerConfig::load(&implicit)?
        }
        None => LockerConfig::default(),
    };

    if let Some(dir) = data_dir {
        config.data_dir = dir.to_path_buf();
    }
    Ok(config)
}

/// Where passwords come from: the environment if set, else a hidden prompt.
struct Passwords {
    env: Option<Zeroizing<String>>,
}

impl Passwords {
    fn read(&self, prompt: &str) -> Result<Zeroizing<String>> {
        if let Some(password) = &self.env {
            return Ok(password.clone());
        }
        let password = rpassword::prompt_password(prompt).context("Failed to read password")?;
        Ok(Zeroizing::new(password))
    }
}

async fn unlock(locker: &Locker, passwords: &Passwords, username: &str) -> Result<LockerSession> {
    let password = passwords.read("Locker password: ")?;
    let session = locker.session();
    session
        .unlock_with_timeout(username, &password, locker.unlock_timeout())
        .await?;
    Ok(session)
}

fn file_name(path: &Path) -> Result<String> {
    path.file_name()
        .and_then(|n| n.to_str())
        .map(str::to_string)
        .with_context(|| format!("Cannot derive a document name from {}", path.display()))
}
