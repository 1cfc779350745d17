//! Cache Store - command line access to a file-backed cache
//!
//! Reads and writes the same envelopes as the library, so entries written
//! here are visible to any `CacheStore` over the same file and prefix.

use std::path::PathBuf;
use std::process::Stdio;

use anyhow::Context;
use clap::{Parser, Subcommand};
use serde_json::Value;
use tracing::{debug, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use cache_store::{CacheStore, Config, FileBackend, Ttl};

/// Inspect and populate a file-backed cache store.
#[derive(Debug, Parser)]
#[command(name = "cache-store", version, about)]
struct Cli {
    /// Store file (overrides CACHE_STORE_PATH)
    #[arg(long, global = true)]
    path: Option<PathBuf>,

    /// Key prefix (overrides CACHE_KEY_PREFIX)
    #[arg(long, global = true)]
    prefix: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print the live value stored under a key
    Get {
        key: String,
        /// Printed when the key is missing or expired
        #[arg(long)]
        default: Option<String>,
    },
    /// Store a value; non-JSON input is stored as a string
    Put {
        key: String,
        value: String,
        /// Seconds from now or an RFC 3339 instant; anything else never expires
        #[arg(long)]
        ttl: Option<Ttl>,
    },
    /// Remove a key, printing whether it existed
    Delete { key: String },
    /// Print the raw envelope under a key, expired or not
    Inspect { key: String },
    /// Print the cached stdout of a command, running it only on a miss
    Remember {
        key: String,
        #[arg(long)]
        ttl: Option<Ttl>,
        #[arg(required = true, trailing_var_arg = true, allow_hyphen_values = true)]
        command: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logs go to stderr so stdout stays machine readable
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "cache_store=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let mut config = Config::from_env();
    if let Some(path) = cli.path {
        config.store_path = path;
    }
    if let Some(prefix) = cli.prefix {
        config.key_prefix = Some(prefix).filter(|prefix| !prefix.is_empty());
    }
    debug!(?config, "configuration loaded");

    let store = CacheStore::from_config(FileBackend::new(&config.store_path), &config);

    match cli.command {
        Command::Get { key, default } => {
            let fallback = default.as_deref().map(parse_value).unwrap_or(Value::Null);
            let value = store.get_or(&key, fallback)?;
            println!("{value}");
        }
        Command::Put { key, value, ttl } => {
            store.put(&key, parse_value(&value), Ttl::from(ttl))?;
            info!(key = %key, path = %config.store_path.display(), "stored");
        }
        Command::Delete { key } => {
            println!("{}", store.delete(&key)?);
        }
        Command::Inspect { key } => match store.get_entry(&key)? {
            Some(entry) => println!("{}", serde_json::to_string_pretty(&entry)?),
            None => println!("null"),
        },
        Command::Remember { key, ttl, command } => {
            let output: String = store
                .remember_async(&key, Ttl::from(ttl), || run_command(command))
                .await?;
            print!("{output}");
        }
    }

    Ok(())
}

/// Parses CLI input as JSON, keeping it as a plain string otherwise.
fn parse_value(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}

/// Runs `command` and returns its stdout.
async fn run_command(command: Vec<String>) -> anyhow::Result<String> {
    let (program, args) = command
        .split_first()
        .context("no command given to remember")?;
    info!(program = %program, "cache miss, running command");

    let output = tokio::process::Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stderr(Stdio::inherit())
        .output()
        .await
        .with_context(|| format!("failed to spawn {program}"))?;

    if !output.status.success() {
        anyhow::bail!("{program} exited with {}", output.status);
    }

    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_value_json() {
        assert_eq!(parse_value("42"), json!(42));
        assert_eq!(parse_value(r#"{"a":[1,2]}"#), json!({"a": [1, 2]}));
        assert_eq!(parse_value(r#""quoted""#), json!("quoted"));
        assert_eq!(parse_value("null"), Value::Null);
    }

    #[test]
    fn test_parse_value_falls_back_to_string() {
        assert_eq!(parse_value("hello world"), json!("hello world"));
        assert_eq!(parse_value("{broken"), json!("{broken"));
        assert_eq!(parse_value(""), json!(""));
    }

    #[tokio::test]
    async fn test_run_command_empty() {
        let err = run_command(Vec::new()).await.unwrap_err();
        assert!(err.to_string().contains("no command"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_run_command_captures_stdout() {
        let output = run_command(vec!["echo".to_string(), "hi".to_string()])
            .await
            .unwrap();
        assert_eq!(output, "hi\n");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_run_command_failure() {
        let err = run_command(vec!["false".to_string()]).await.unwrap_err();
        assert!(err.to_string().contains("false exited with"));
    }

    #[tokio::test]
    async fn test_run_command_missing_program() {
        let err = run_command(vec!["definitely-not-a-real-program-xyz".to_string()])
            .await
            .unwrap_err();
        assert!(err.to_string().contains("failed to spawn"));
    }
}
