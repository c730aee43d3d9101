use serde::{Deserialize, Serialize};
use std::{
    fs::{self, File},
    io::Write,
    path::{Path, PathBuf},
};

use crate::{
    core::{
        utils::{ensure_dir, PathResolver},
        DEFAULT_SOURCE,
    },
    errors::LedgerError,
    ledger::Locale,
    session::DEFAULT_EMPTY_NOTE,
    storage::RetryPolicy,
};

const TMP_SUFFIX: &str = "tmp";
const DEFAULT_RETENTION: usize = 5;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Ledger location; `<base>/ledger.csv` when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ledger_file: Option<PathBuf>,
    pub locale: Locale,
    pub default_source: String,
    pub empty_note: String,
    /// Number of rolling ledger backups; `0` disables them.
    pub backup_retention: usize,
    pub lock_retry: RetryPolicy,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            ledger_file: None,
            locale: Locale::Ru,
            default_source: DEFAULT_SOURCE.into(),
            empty_note: DEFAULT_EMPTY_NOTE.into(),
            backup_retention: DEFAULT_RETENTION,
            lock_retry: RetryPolicy::default(),
        }
    }
}

impl Config {
    pub fn ledger_path(&self, base: &Path) -> PathBuf {
        self.ledger_file
            .clone()
            .unwrap_or_else(|| PathResolver::ledger_file_in(base))
    }
}

pub struct ConfigManager {
    base: PathBuf,
    path: PathBuf,
}

impl ConfigManager {
    pub fn new() -> Result<Self, LedgerError> {
        Self::with_base_dir(PathResolver::base_dir())
    }

    pub fn with_base_dir(base: PathBuf) -> Result<Self, LedgerError> {
        ensure_dir(&base)?;
        Ok(Self {
            path: PathResolver::config_file_in(&base),
            base,
        })
    }

    pub fn load(&self) -> Result<Config, LedgerError> {
        if self.path.exists() {
            let data = fs::read_to_string(&self.path)?;
            serde_json::from_str(&data).map_err(|err| {
                LedgerError::Config(format!("{}: {}", self.path.display(), err))
            })
        } else {
            Ok(Config::default())
        }
    }

    pub fn save(&self, config: &Config) -> Result<(), LedgerError> {
        if let Some(parent) = self.path.parent() {
            ensure_dir(parent)?;
        }
        let json = serde_json::to_string_pretty(config)?;
        let tmp = tmp_path(&self.path);
        write_atomic(&tmp, &json)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn base_dir(&self) -> &Path {
        &self.base
    }
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut tmp = path.to_path_buf();
    let ext = match path.extension().and_then(|ext| ext.to_str()) {
        Some(existing) => format!("{}.{}", existing, TMP_SUFFIX),
        None => TMP_SUFFIX.to_string(),
    };
    tmp.set_extension(ext);
    tmp
}

fn write_atomic(path: &Path, data: &str) -> Result<(), LedgerError> {
    let mut file = File::create(path)?;
    file.write_all(data.as_bytes())?;
    file.flush()?;
    Ok(())
}
