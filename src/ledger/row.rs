use std::fmt;

use serde::{Deserialize, Serialize};

use super::month::{has_year_token, Locale};

/// Number of schema cells in a ledger row: `[day, kind_or_label, amount, source, author, note]`.
pub const COLUMN_COUNT: usize = 6;

/// Raw cell values of one ledger row: the schema cells, then any extra columns.
///
/// Normalized rows hold at least [`COLUMN_COUNT`] cells and never end with an empty
/// extra cell.
pub type RawRow = Vec<String>;

/// Direction of a ledger entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntryKind {
    Income,
    Expense,
}

impl EntryKind {
    /// Label written into the kind cell for the given locale.
    pub fn label(self, locale: Locale) -> &'static str {
        match (self, locale) {
            (EntryKind::Income, Locale::Ru) => "Доход",
            (EntryKind::Expense, Locale::Ru) => "Расход",
            (EntryKind::Income, Locale::En) => "Income",
            (EntryKind::Expense, Locale::En) => "Expense",
        }
    }

    /// Accepts the labels of every supported locale.
    pub fn from_label(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "доход" | "income" => Some(EntryKind::Income),
            "расход" | "expense" => Some(EntryKind::Expense),
            _ => None,
        }
    }

    pub fn sign(self) -> char {
        match self {
            EntryKind::Income => '+',
            EntryKind::Expense => '-',
        }
    }
}

/// A single income or expense line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entry {
    pub day: u8,
    pub kind: EntryKind,
    pub amount: f64,
    pub source: String,
    pub author: String,
    pub note: String,
    /// Cells of columns past the schema, kept so they survive a rewrite.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub extra: Vec<String>,
}

impl Entry {
    pub fn new(
        day: u8,
        kind: EntryKind,
        amount: f64,
        source: impl Into<String>,
        author: impl Into<String>,
        note: impl Into<String>,
    ) -> Self {
        Self {
            day,
            kind,
            amount,
            source: source.into(),
            author: author.into(),
            note: note.into(),
            extra: Vec::new(),
        }
    }
}

/// One row of the flat ledger table.
#[derive(Debug, Clone, PartialEq)]
pub enum LedgerRow {
    /// Marks the start of a month segment.
    Header { label: String },
    Entry(Entry),
    /// Fully empty row; terminates the segment above it.
    Blank,
    /// Any row that is neither a header nor a well-formed entry. Kept verbatim.
    Unrecognized(RawRow),
}

impl LedgerRow {
    pub fn header(label: impl Into<String>) -> Self {
        LedgerRow::Header {
            label: label.into(),
        }
    }

    /// Classifies raw cells. Never fails: malformed rows become [`LedgerRow::Unrecognized`].
    pub fn from_cells(cells: RawRow) -> Self {
        let cells = normalize_cells(cells);
        let day = cells[0].trim();
        if day.is_empty() {
            let label = cells[1].trim();
            if cells.iter().all(|cell| cell.trim().is_empty()) {
                return LedgerRow::Blank;
            }
            if has_year_token(label) && cells[2..].iter().all(|cell| cell.trim().is_empty()) {
                return LedgerRow::Header {
                    label: label.to_string(),
                };
            }
            return LedgerRow::Unrecognized(cells);
        }

        let parsed = (
            parse_day(day),
            EntryKind::from_label(&cells[1]),
            parse_stored_amount(&cells[2]),
        );
        match parsed {
            (Some(day), Some(kind), Some(amount)) => LedgerRow::Entry(Entry {
                day,
                kind,
                amount,
                source: cells[3].clone(),
                author: cells[4].clone(),
                note: cells[5].clone(),
                extra: cells[COLUMN_COUNT..].to_vec(),
            }),
            _ => LedgerRow::Unrecognized(cells),
        }
    }

    /// Serializes the row back into schema-ordered cells followed by its extra columns.
    pub fn to_cells(&self, locale: Locale) -> RawRow {
        match self {
            LedgerRow::Header { label } => {
                let mut cells = vec![String::new(); COLUMN_COUNT];
                cells[1] = label.clone();
                cells
            }
            LedgerRow::Entry(entry) => {
                let mut cells = vec![
                    entry.day.to_string(),
                    entry.kind.label(locale).to_string(),
                    format_stored_amount(entry.amount),
                    entry.source.clone(),
                    entry.author.clone(),
                    entry.note.clone(),
                ];
                cells.extend(entry.extra.iter().cloned());
                cells
            }
            LedgerRow::Blank => vec![String::new(); COLUMN_COUNT],
            LedgerRow::Unrecognized(cells) => cells.clone(),
        }
    }

    /// Whether the day cell is empty. Such rows end the segment above them.
    pub fn day_is_empty(&self) -> bool {
        match self {
            LedgerRow::Header { .. } | LedgerRow::Blank => true,
            LedgerRow::Entry(_) => false,
            LedgerRow::Unrecognized(cells) => cell(cells, 0).trim().is_empty(),
        }
    }

    pub fn as_entry(&self) -> Option<&Entry> {
        match self {
            LedgerRow::Entry(entry) => Some(entry),
            _ => None,
        }
    }

    /// Label of a segment header. Rows carrying extra cells still mark a segment
    /// when their day cell is empty and the label holds a year.
    pub fn header_label(&self) -> Option<&str> {
        match self {
            LedgerRow::Header { label } => Some(label),
            LedgerRow::Unrecognized(cells)
                if cell(cells, 0).trim().is_empty() && has_year_token(cell(cells, 1)) =>
            {
                Some(cell(cells, 1).trim())
            }
            _ => None,
        }
    }
}

/// The whole ledger, in file order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    pub rows: Vec<LedgerRow>,
    /// Column header line as read from the backing file. Empty means the store
    /// writes its own default names.
    pub columns: Vec<String>,
}

impl Table {
    pub fn new(rows: Vec<LedgerRow>) -> Self {
        Self {
            rows,
            columns: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&LedgerRow> {
        self.rows.get(index)
    }

    /// Drops fully empty rows from the end of the table.
    pub fn trim_trailing_blanks(&mut self) {
        while matches!(self.rows.last(), Some(LedgerRow::Blank)) {
            self.rows.pop();
        }
    }
}

impl fmt::Display for EntryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntryKind::Income => write!(f, "Income"),
            EntryKind::Expense => write!(f, "Expense"),
        }
    }
}

/// Cell at `index`, empty when the row is shorter.
pub(crate) fn cell(cells: &[String], index: usize) -> &str {
    cells.get(index).map(String::as_str).unwrap_or("")
}

/// Pads short records to the schema width and drops empty trailing extra cells.
fn normalize_cells(mut cells: RawRow) -> RawRow {
    if cells.len() < COLUMN_COUNT {
        cells.resize(COLUMN_COUNT, String::new());
    }
    while cells.len() > COLUMN_COUNT && cells.last().is_some_and(|cell| cell.is_empty()) {
        cells.pop();
    }
    cells
}

/// Spreadsheet exports write whole days as `5.0`; both forms are accepted.
fn parse_day(value: &str) -> Option<u8> {
    let number: f64 = value.trim().parse().ok()?;
    if number.fract() != 0.0 || !(1.0..=31.0).contains(&number) {
        return None;
    }
    Some(number as u8)
}

fn parse_stored_amount(value: &str) -> Option<f64> {
    let amount: f64 = value.trim().parse().ok()?;
    if amount.is_finite() && amount >= 0.0 {
        Some(amount)
    } else {
        None
    }
}

/// Plain decimal form used in the file and in listings (`5000`, `12.5`).
///
/// Shortest form that parses back to the same value; never uses an exponent.
pub fn format_stored_amount(amount: f64) -> String {
    amount.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cells(values: &[&str]) -> RawRow {
        values.iter().map(|value| value.to_string()).collect()
    }

    #[test]
    fn classifies_header_rows() {
        let row = LedgerRow::from_cells(cells(&["", "октябрь 2025", "", "", "", ""]));
        assert_eq!(row.header_label(), Some("октябрь 2025"));
        assert!(row.day_is_empty());
    }

    #[test]
    fn label_without_year_is_not_a_header() {
        let row = LedgerRow::from_cells(cells(&["", "Итого", "", "", "", ""]));
        assert!(matches!(row, LedgerRow::Unrecognized(_)));
        assert!(row.day_is_empty());
    }

    #[test]
    fn parses_entries_with_spreadsheet_numbers() {
        let row = LedgerRow::from_cells(cells(&[
            "5.0", "Расход", "1250.50", "Наличка", "Bob", "lunch",
        ]));
        let entry = row.as_entry().expect("entry row");
        assert_eq!(entry.day, 5);
        assert_eq!(entry.kind, EntryKind::Expense);
        assert_eq!(entry.amount, 1250.5);
        assert_eq!(entry.author, "Bob");
    }

    #[test]
    fn header_with_extra_cells_still_marks_a_segment() {
        let raw = cells(&["", "май 2025", "", "", "", "imported"]);
        let row = LedgerRow::from_cells(raw.clone());
        assert_eq!(row.header_label(), Some("май 2025"));
        assert_eq!(row.to_cells(Locale::Ru), raw);
    }

    #[test]
    fn malformed_entries_are_kept_verbatim() {
        let raw = cells(&["12", "Перевод", "10", "", "", ""]);
        let row = LedgerRow::from_cells(raw.clone());
        assert_eq!(row, LedgerRow::Unrecognized(raw.clone()));
        assert_eq!(row.to_cells(Locale::Ru), raw);
    }

    #[test]
    fn kind_labels_are_normalized_to_the_locale() {
        let row = LedgerRow::from_cells(cells(&["3", "income", "10", "card", "Ann", "gift"]));
        assert_eq!(row.to_cells(Locale::Ru)[1], "Доход");
    }

    #[test]
    fn new_entries_use_locale_labels() {
        let entry = Entry::new(1, EntryKind::Income, 5000.0, "cash", "Alice", "salary");
        let cells = LedgerRow::Entry(entry).to_cells(Locale::En);
        assert_eq!(cells[1], "Income");
        assert_eq!(cells[2], "5000");
    }

    #[test]
    fn stored_amounts_drop_trailing_zeros() {
        assert_eq!(format_stored_amount(5000.0), "5000");
        assert_eq!(format_stored_amount(12.5), "12.5");
        assert_eq!(format_stored_amount(0.25), "0.25");
    }

    #[test]
    fn stored_amounts_keep_every_digit() {
        for amount in [1e20, 0.004, 1234567.891, 0.1 + 0.2] {
            let text = format_stored_amount(amount);
            assert!(!text.contains('e'), "{text}");
            assert_eq!(text.parse::<f64>().unwrap(), amount);
        }
        assert_eq!(format_stored_amount(1e20), "100000000000000000000");
        assert_eq!(format_stored_amount(0.004), "0.004");
    }

    #[test]
    fn extra_columns_ride_along_with_entries() {
        let raw = cells(&["2", "Доход", "10", "card", "Ann", "gift", "", "receipt-42"]);
        let row = LedgerRow::from_cells(raw.clone());
        let entry = row.as_entry().expect("entry row");
        assert_eq!(entry.extra, vec!["".to_string(), "receipt-42".to_string()]);
        assert_eq!(row.to_cells(Locale::Ru), raw);
    }

    #[test]
    fn empty_trailing_cells_are_not_extras() {
        let row = LedgerRow::from_cells(cells(&["", "", "", "", "", "", "", ""]));
        assert_eq!(row, LedgerRow::Blank);
        let row = LedgerRow::from_cells(cells(&["3", "Расход", "1", "", "", "", ""]));
        assert!(row.as_entry().expect("entry").extra.is_empty());
    }

    #[test]
    fn trailing_blank_rows_are_trimmed() {
        let mut table = Table::new(vec![
            LedgerRow::header("март 2025"),
            LedgerRow::Blank,
            LedgerRow::Blank,
        ]);
        table.trim_trailing_blanks();
        assert_eq!(table.len(), 1);
    }
}
