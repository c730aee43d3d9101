mod common;

use std::{fs, sync::Arc};

use cashflow_core::{
    errors::LedgerError,
    ledger::{all_month_labels, EntryKind, LedgerRow, Locale},
    storage::{CsvLedgerStore, LedgerStore},
};

use common::{entry, service_over, temp_base, OCTOBER};

const SPREADSHEET_EXPORT: &str = "\
Дата,Транзакция,Сумма,Источник,Добавил,Примечание
,сентябрь 2025,,,,
1.0,Доход,5000.0,Наличка,Alice,salary
2,Expense,300,Card,Bob,groceries
,,,,,
,октябрь 2025,,,,
3,Расход,15,Наличка,Alice,
4,???,oops,,,kept as is
,,,,,
,,,,,
";

#[test]
fn spreadsheet_exports_load_into_segments() {
    let base = temp_base();
    let path = base.join("ledger.csv");
    fs::write(&path, SPREADSHEET_EXPORT).unwrap();
    let service = service_over(Arc::new(CsvLedgerStore::new(&path, Locale::Ru)));

    assert_eq!(
        service.month_labels().unwrap(),
        vec![OCTOBER.to_string(), "сентябрь 2025".to_string()]
    );

    let september = service.totals("сентябрь 2025").unwrap();
    assert_eq!((september.income, september.expense), (5000.0, 300.0));

    let october = service.listing(OCTOBER).unwrap();
    let lines: Vec<String> = october.lines().iter().map(|l| l.to_string()).collect();
    assert_eq!(lines.len(), 2);
    assert!(lines[1].contains("oops") && lines[1].contains("kept as is"));
}

#[test]
fn saving_keeps_unrecognized_rows_and_drops_trailing_blanks() {
    let base = temp_base();
    let path = base.join("ledger.csv");
    fs::write(&path, SPREADSHEET_EXPORT).unwrap();
    let store = CsvLedgerStore::new(&path, Locale::Ru);

    let table = store.load().unwrap();
    assert!(matches!(table.rows.last(), Some(LedgerRow::Unrecognized(_))));
    store.save(&table).unwrap();

    let raw = fs::read_to_string(&path).unwrap();
    assert!(raw.contains("4,???,oops,,,kept as is"));
    assert!(raw.contains("2,Расход,300,Card,Bob,groceries"));
    assert!(!raw.ends_with(",,,,,\n"));
    assert_eq!(store.load().unwrap(), table);
}

#[test]
fn appends_and_undo_persist_through_the_file() {
    let base = temp_base();
    let path = base.join("nested").join("ledger.csv");
    let store = Arc::new(CsvLedgerStore::new(&path, Locale::Ru).with_backups(base.join("backups"), 3));
    let service = service_over(store.clone());

    let first = service
        .append_entry(OCTOBER, entry(EntryKind::Income, 1000.0, "Bob", "a"))
        .unwrap();
    let second = service
        .append_entry(OCTOBER, entry(EntryKind::Expense, 400.0, "Bob", "b"))
        .unwrap();
    assert!(first.header_created);
    assert!(!second.header_created);

    let err = service.undo(Some(second.index), "Alice").unwrap_err();
    assert!(matches!(err, LedgerError::NotOwner { .. }));
    service.undo(Some(second.index), "Bob").unwrap();

    let reloaded = store.load().unwrap();
    assert_eq!(reloaded.len(), 2);
    assert_eq!(reloaded.rows[1].as_entry().unwrap().amount, 1000.0);
    assert!(!store.list_backups().unwrap().is_empty());
}

#[test]
fn open_spreadsheet_surfaces_as_resource_locked() {
    let base = temp_base();
    let path = base.join("ledger.csv");
    let store = CsvLedgerStore::new(&path, Locale::Ru);
    let service = service_over(Arc::new(store.clone()));
    service
        .append_entry(OCTOBER, entry(EntryKind::Income, 1.0, "Alice", "x"))
        .unwrap();
    let before = fs::read_to_string(&path).unwrap();

    fs::write(base.join("~$ledger.csv"), "owner").unwrap();
    let err = service
        .append_entry(OCTOBER, entry(EntryKind::Income, 2.0, "Alice", "y"))
        .unwrap_err();
    assert!(matches!(err, LedgerError::ResourceLocked(_)));
    assert_eq!(fs::read_to_string(&path).unwrap(), before);
    assert!(store.lock_sidecars().iter().any(|p| p.exists()));
}

#[test]
fn english_locale_writes_english_labels() {
    let base = temp_base();
    let path = base.join("ledger.csv");
    let store = CsvLedgerStore::new(&path, Locale::En);
    let table = cashflow_core::ledger::append(
        Default::default(),
        "October 2025",
        entry(EntryKind::Expense, 7.0, "Alice", "bus"),
    )
    .table;
    store.save(&table).unwrap();

    let raw = fs::read_to_string(&path).unwrap();
    assert!(raw.starts_with("Day,Transaction,Amount"));
    assert!(raw.contains("Expense,7"));
    assert_eq!(all_month_labels(&store.load().unwrap()), vec!["October 2025"]);
}

#[test]
fn extra_columns_and_header_names_survive_rewrites() {
    let base = temp_base();
    let path = base.join("ledger.csv");
    fs::write(
        &path,
        "Date,Kind,Sum,From,Who,Comment,Чек\n\
         ,октябрь 2025,,,,,\n\
         1,Доход,100,Наличка,Bob,salary,receipt-42\n",
    )
    .unwrap();
    let store = Arc::new(CsvLedgerStore::new(&path, Locale::Ru));
    let service = service_over(store.clone());

    let saved = service
        .append_entry(OCTOBER, entry(EntryKind::Expense, 5.0, "Alice", "x"))
        .unwrap();
    let raw = fs::read_to_string(&path).unwrap();
    assert!(raw.starts_with("Date,Kind,Sum,From,Who,Comment,Чек\n"));
    assert!(raw.contains("1,Доход,100,Наличка,Bob,salary,receipt-42"));
    assert!(raw.contains("14,Расход,5,Наличка,Alice,x,\n"));

    service.undo(Some(saved.index), "Alice").unwrap();
    let reloaded = store.load().unwrap();
    assert_eq!(reloaded.rows[1].as_entry().unwrap().extra, vec!["receipt-42"]);
    assert!(fs::read_to_string(&path).unwrap().contains("receipt-42"));
}

#[test]
fn amounts_round_trip_through_the_file_exactly() {
    let base = temp_base();
    let path = base.join("ledger.csv");
    let store = Arc::new(CsvLedgerStore::new(&path, Locale::Ru));
    let service = service_over(store.clone());

    service
        .append_entry(OCTOBER, entry(EntryKind::Income, 1e20, "Alice", "big"))
        .unwrap();
    service
        .append_entry(OCTOBER, entry(EntryKind::Expense, 0.004, "Alice", "tiny"))
        .unwrap();

    let raw = fs::read_to_string(&path).unwrap();
    assert!(raw.contains("Доход,100000000000000000000,"));
    assert!(raw.contains("Расход,0.004,"));
    let totals = service.totals(OCTOBER).unwrap();
    assert_eq!((totals.income, totals.expense), (1e20, 0.004));
}
