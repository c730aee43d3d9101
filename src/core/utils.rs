use dirs::home_dir;
use std::{
    env, fs, io,
    path::{Path, PathBuf},
};

const DEFAULT_DIR_NAME: &str = ".cashflow";
const LEDGER_FILE: &str = "ledger.csv";
const BACKUP_DIR: &str = "backups";
const CHART_DIR: &str = "charts";
const CONFIG_FILE: &str = "config.json";

/// Resolves every path the assistant uses from one base directory.
pub struct PathResolver;

impl PathResolver {
    /// `CASHFLOW_HOME` when set, otherwise `~/.cashflow`.
    pub fn base_dir() -> PathBuf {
        if let Some(custom) = env::var_os("CASHFLOW_HOME") {
            return PathBuf::from(custom);
        }
        home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(DEFAULT_DIR_NAME)
    }

    pub fn resolve_base(base: Option<PathBuf>) -> PathBuf {
        base.unwrap_or_else(Self::base_dir)
    }

    pub fn ledger_file_in(base: &Path) -> PathBuf {
        base.join(LEDGER_FILE)
    }

    pub fn backup_dir_in(base: &Path) -> PathBuf {
        base.join(BACKUP_DIR)
    }

    pub fn chart_dir_in(base: &Path) -> PathBuf {
        base.join(CHART_DIR)
    }

    pub fn config_file_in(base: &Path) -> PathBuf {
        base.join(CONFIG_FILE)
    }
}

pub fn ensure_dir(path: &Path) -> io::Result<()> {
    if !path.exists() {
        fs::create_dir_all(path)?;
    }
    Ok(())
}
