//! Utility functions for CLI commands.

use std::io::Read;
use std::path::PathBuf;

use serde::de::DeserializeOwned;
use voicegate::voiceprint::VoicePrintStore;
use voicegate::{AuthorizationGate, Config};

use crate::Cli;

/// Default base directory under $HOME.
pub const DEFAULT_BASE_DIR: &str = ".voicegate";
/// Default voice-print database filename.
pub const DEFAULT_DB_FILE: &str = "prints.redb";

/// Loads the config file, or defaults when none is given.
pub fn load_config(cli: &Cli) -> anyhow::Result<Config> {
    match cli.config.as_deref() {
        Some(path) => Ok(Config::load(path)?),
        None => Ok(Config::default()),
    }
}

/// Resolves the database path: --db, then storage.path, then
/// ~/.voicegate/prints.redb.
pub fn db_path(cli: &Cli, cfg: &Config) -> anyhow::Result<PathBuf> {
    if let Some(db) = &cli.db {
        return Ok(PathBuf::from(db));
    }
    if let Some(path) = &cfg.storage.path {
        return Ok(path.clone());
    }
    let home = dirs::home_dir().ok_or_else(|| anyhow::anyhow!("cannot determine home directory, use --db"))?;
    Ok(home.join(DEFAULT_BASE_DIR).join(DEFAULT_DB_FILE))
}

/// Opens the redb-backed voice-print store.
pub fn open_prints(cli: &Cli, cfg: &Config) -> anyhow::Result<VoicePrintStore> {
    let path = db_path(cli, cfg)?;
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir)?;
    }
    print_verbose(cli, &format!("Using database: {}", path.display()));

    let mut storage = cfg.storage.clone();
    storage.path = Some(path);
    let kv = AuthorizationGate::open_store(&storage)?;
    Ok(VoicePrintStore::new(kv, cfg.voiceprint.clone())?)
}

/// Reads JSON from a file, or from stdin when `path` is `-`.
pub fn read_json<T: DeserializeOwned>(path: &str) -> anyhow::Result<T> {
    let content = if path == "-" {
        let mut buf = String::new();
        std::io::stdin().read_to_string(&mut buf)?;
        buf
    } else {
        std::fs::read_to_string(path)?
    };
    serde_json::from_str(&content).map_err(|e| anyhow::anyhow!("{path}: expected JSON embedding data: {e}"))
}

/// Outputs result as JSON or YAML.
pub fn output_result<T: serde::Serialize>(result: &T, as_json: bool) -> anyhow::Result<()> {
    let output = if as_json {
        serde_json::to_string_pretty(result)? + "\n"
    } else {
        serde_yaml::to_string(result)?
    };
    print!("{output}");
    Ok(())
}

/// Prints verbose output if enabled.
pub fn print_verbose(cli: &Cli, msg: &str) {
    if cli.verbose {
        eprintln!("[verbose] {}", msg);
    }
}

/// Prints success message.
pub fn print_success(msg: &str) {
    eprintln!("\x1b[32m✓\x1b[0m {}", msg);
}

/// Prints warning message.
pub fn print_warning(msg: &str) {
    eprintln!("\x1b[33m⚠\x1b[0m {}", msg);
}
