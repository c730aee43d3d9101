use std::{
    fs::{self, File},
    io::{self, Write},
    path::{Path, PathBuf},
};

use chrono::Local;
use csv::{ReaderBuilder, StringRecord, WriterBuilder};
use tracing::{debug, info};

use crate::{
    errors::{LedgerError, Result},
    ledger::{LedgerRow, Locale, RawRow, Table, COLUMN_COUNT},
};

use super::LedgerStore;

const BACKUP_EXTENSION: &str = "csv";
const BACKUP_TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";
const TMP_SUFFIX: &str = "tmp";

const RU_COLUMNS: [&str; COLUMN_COUNT] = [
    "Дата",
    "Транзакция",
    "Сумма",
    "Источник",
    "Добавил",
    "Примечание",
];
const EN_COLUMNS: [&str; COLUMN_COUNT] =
    ["Day", "Transaction", "Amount", "Source", "Author", "Note"];

/// Ledger kept in a single CSV file with a column header line.
#[derive(Debug, Clone)]
pub struct CsvLedgerStore {
    path: PathBuf,
    backups_dir: Option<PathBuf>,
    retention: usize,
    locale: Locale,
}

impl CsvLedgerStore {
    pub fn new(path: impl Into<PathBuf>, locale: Locale) -> Self {
        Self {
            path: path.into(),
            backups_dir: None,
            retention: 0,
            locale,
        }
    }

    /// Copies the previous file into `dir` before each save, keeping `retention` copies.
    pub fn with_backups(mut self, dir: impl Into<PathBuf>, retention: usize) -> Self {
        self.backups_dir = Some(dir.into());
        self.retention = retention;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Backup files, newest first.
    pub fn list_backups(&self) -> Result<Vec<PathBuf>> {
        let Some(dir) = self.backups_dir.as_ref() else {
            return Ok(Vec::new());
        };
        if !dir.exists() {
            return Ok(Vec::new());
        }
        let prefix = format!("{}_", self.file_stem());
        let mut entries = Vec::new();
        for entry in fs::read_dir(dir)? {
            let path = entry?.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some(BACKUP_EXTENSION) {
                continue;
            }
            let matches = path
                .file_name()
                .and_then(|name| name.to_str())
                .is_some_and(|name| name.starts_with(&prefix));
            if matches {
                entries.push(path);
            }
        }
        entries.sort_by(|a, b| b.file_name().cmp(&a.file_name()));
        Ok(entries)
    }

    /// Office suites drop a sidecar next to a file they hold open for editing.
    pub fn lock_sidecars(&self) -> Vec<PathBuf> {
        let Some(name) = self.path.file_name().and_then(|name| name.to_str()) else {
            return Vec::new();
        };
        let dir = self.path.parent().unwrap_or_else(|| Path::new("."));
        [format!("~${name}"), format!(".~lock.{name}#")]
            .into_iter()
            .map(|candidate| dir.join(candidate))
            .collect()
    }

    fn ensure_unlocked(&self) -> Result<()> {
        if let Some(sidecar) = self.lock_sidecars().into_iter().find(|p| p.exists()) {
            return Err(LedgerError::ResourceLocked(format!(
                "{} is open in another program (found {})",
                self.path.display(),
                sidecar.display()
            )));
        }
        Ok(())
    }

    fn file_stem(&self) -> String {
        self.path
            .file_stem()
            .and_then(|stem| stem.to_str())
            .unwrap_or("ledger")
            .to_string()
    }

    fn backup_existing_file(&self) -> Result<()> {
        let Some(dir) = self.backups_dir.as_ref() else {
            return Ok(());
        };
        if self.retention == 0 || !self.path.exists() {
            return Ok(());
        }
        fs::create_dir_all(dir)?;
        let timestamp = Local::now().format(BACKUP_TIMESTAMP_FORMAT);
        let backup = dir.join(format!(
            "{}_{}.{}",
            self.file_stem(),
            timestamp,
            BACKUP_EXTENSION
        ));
        fs::copy(&self.path, &backup)?;
        debug!(backup = %backup.display(), "ledger backup written");
        self.prune_backups()
    }

    fn prune_backups(&self) -> Result<()> {
        for stale in self.list_backups()?.into_iter().skip(self.retention) {
            let _ = fs::remove_file(stale);
        }
        Ok(())
    }

    fn default_columns(&self) -> [&'static str; COLUMN_COUNT] {
        match self.locale {
            Locale::Ru => RU_COLUMNS,
            Locale::En => EN_COLUMNS,
        }
    }

    /// The file's own header line, with default names for any missing schema column.
    fn header_line(&self, table: &Table, width: usize) -> Vec<String> {
        let defaults = self.default_columns();
        (0..width)
            .map(|index| match table.columns.get(index) {
                Some(name) => name.clone(),
                None => defaults.get(index).copied().unwrap_or_default().to_string(),
            })
            .collect()
    }
}

impl LedgerStore for CsvLedgerStore {
    fn load(&self) -> Result<Table> {
        if !self.path.exists() {
            debug!(path = %self.path.display(), "ledger file missing, starting empty");
            return Ok(Table::default());
        }
        let file = File::open(&self.path)?;
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(file);
        let mut table = Table::default();
        table.columns = reader
            .headers()
            .map_err(csv_error)?
            .iter()
            .map(str::to_string)
            .collect();
        for record in reader.records() {
            let record = record.map_err(csv_error)?;
            table.rows.push(LedgerRow::from_cells(record_cells(&record)));
        }
        table.trim_trailing_blanks();
        debug!(rows = table.len(), "ledger loaded");
        Ok(table)
    }

    fn save(&self, table: &Table) -> Result<()> {
        self.ensure_unlocked()?;
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        self.backup_existing_file()?;

        let tmp = tmp_path(&self.path);
        if let Err(err) = self.write_rows(&tmp, table) {
            let _ = fs::remove_file(&tmp);
            return Err(err);
        }
        if let Err(err) = fs::rename(&tmp, &self.path) {
            let _ = fs::remove_file(&tmp);
            return Err(err.into());
        }
        info!(path = %self.path.display(), rows = table.len(), "ledger saved");
        Ok(())
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

impl CsvLedgerStore {
    fn write_rows(&self, path: &Path, table: &Table) -> Result<()> {
        let file = File::create(path)?;
        let records: Vec<RawRow> = table
            .rows
            .iter()
            .map(|row| row.to_cells(self.locale))
            .collect();
        let width = records
            .iter()
            .map(Vec::len)
            .chain([table.columns.len(), COLUMN_COUNT])
            .max()
            .unwrap_or(COLUMN_COUNT);

        let mut writer = WriterBuilder::new().flexible(false).from_writer(file);
        writer
            .write_record(self.header_line(table, width))
            .map_err(csv_error)?;
        for mut record in records {
            record.resize(width, String::new());
            writer.write_record(&record).map_err(csv_error)?;
        }
        let mut file = writer.into_inner().map_err(|err| {
            let cause = err.error();
            LedgerError::from(io::Error::new(cause.kind(), cause.to_string()))
        })?;
        file.flush()?;
        file.sync_all()?;
        Ok(())
    }
}

fn record_cells(record: &StringRecord) -> RawRow {
    record.iter().map(str::to_string).collect()
}

/// Keeps IO failures (permission denied in particular) on the IO mapping path.
fn csv_error(err: csv::Error) -> LedgerError {
    if err.is_io_error() {
        if let csv::ErrorKind::Io(io_err) = err.into_kind() {
            return LedgerError::from(io_err);
        }
        return LedgerError::Persistence("csv io failure".into());
    }
    LedgerError::Csv(err)
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::{Entry, EntryKind};
    use tempfile::TempDir;

    fn store_in(temp: &TempDir) -> CsvLedgerStore {
        CsvLedgerStore::new(temp.path().join("ledger.csv"), Locale::Ru)
    }

    fn sample_table() -> Table {
        Table::new(vec![
            LedgerRow::header("март 2025"),
            LedgerRow::Entry(Entry::new(
                1,
                EntryKind::Income,
                5000.0,
                "Наличка",
                "Alice",
                "salary, march",
            )),
        ])
    }

    #[test]
    fn missing_file_loads_as_empty_table() {
        let temp = TempDir::new().expect("temp dir");
        let table = store_in(&temp).load().expect("load");
        assert!(table.is_empty());
    }

    #[test]
    fn save_and_load_roundtrip() {
        let temp = TempDir::new().expect("temp dir");
        let store = store_in(&temp);
        store.save(&sample_table()).expect("save");
        let loaded = store.load().expect("load");
        assert_eq!(loaded.rows, sample_table().rows);
        assert_eq!(loaded.columns, RU_COLUMNS.map(String::from).to_vec());

        let raw = fs::read_to_string(store.path()).expect("read csv");
        assert!(raw.starts_with("Дата,Транзакция,Сумма"));
        assert!(raw.contains("\"salary, march\""));
    }

    #[test]
    fn short_rows_are_padded() {
        let temp = TempDir::new().expect("temp dir");
        let store = store_in(&temp);
        fs::write(
            store.path(),
            "Дата,Транзакция,Сумма,Источник,Добавил,Примечание\n,октябрь 2025\n3,Расход,10\n",
        )
        .expect("seed");
        let table = store.load().expect("load");
        assert_eq!(table.rows[0].header_label(), Some("октябрь 2025"));
        let entry = table.rows[1].as_entry().expect("entry");
        assert_eq!(entry.amount, 10.0);
        assert_eq!(entry.note, "");
    }

    #[test]
    fn failed_rename_leaves_no_temp_file() {
        let temp = TempDir::new().expect("temp dir");
        let store = store_in(&temp);
        fs::create_dir_all(store.path().join("occupied")).expect("directory in the way");
        assert!(store.save(&sample_table()).is_err());
        assert!(!tmp_path(store.path()).exists());
    }

    #[test]
    fn lock_sidecar_blocks_saves() {
        let temp = TempDir::new().expect("temp dir");
        let store = store_in(&temp);
        fs::write(temp.path().join(".~lock.ledger.csv#"), "user").expect("sidecar");
        let err = store.save(&sample_table()).expect_err("locked");
        assert!(matches!(err, LedgerError::ResourceLocked(_)));
        assert!(!store.path().exists());
    }

    #[test]
    fn backups_are_pruned_to_retention() {
        let temp = TempDir::new().expect("temp dir");
        let store = store_in(&temp).with_backups(temp.path().join("backups"), 2);
        store.save(&sample_table()).expect("first save");
        assert!(store.list_backups().expect("list").is_empty());

        let backups = temp.path().join("backups");
        fs::create_dir_all(&backups).unwrap();
        for stamp in ["20240101_000000", "20240102_000000", "20240103_000000"] {
            fs::write(backups.join(format!("ledger_{stamp}.csv")), "x").unwrap();
        }
        store.save(&sample_table()).expect("second save");
        let listed = store.list_backups().expect("list");
        assert_eq!(listed.len(), 2);
        let newest = listed[0].file_name().unwrap().to_str().unwrap().to_string();
        assert!(!newest.starts_with("ledger_2024"), "fresh backup sorts first");
    }
}
