//! Month labels used as segment headers (`"октябрь 2025"`, `"October 2025"`).

use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt;

use chrono::{Datelike, NaiveDate};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

/// Language of month names and kind labels written into the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    #[default]
    Ru,
    En,
}

const RU_MONTHS: [&str; 12] = [
    "январь", "февраль", "март", "апрель", "май", "июнь", "июль", "август", "сентябрь",
    "октябрь", "ноябрь", "декабрь",
];

const EN_MONTHS: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

static MONTH_LOOKUP: Lazy<HashMap<String, u32>> = Lazy::new(|| {
    RU_MONTHS
        .iter()
        .chain(EN_MONTHS.iter())
        .enumerate()
        .map(|(idx, name)| (name.to_lowercase(), (idx % 12) as u32 + 1))
        .collect()
});

impl Locale {
    /// Month name for `month` in `1..=12`.
    pub fn month_name(self, month: u32) -> &'static str {
        let idx = (month.clamp(1, 12) - 1) as usize;
        match self {
            Locale::Ru => RU_MONTHS[idx],
            Locale::En => EN_MONTHS[idx],
        }
    }

    /// Header label for the month containing `date`.
    pub fn label_for(self, date: NaiveDate) -> String {
        format!("{} {}", self.month_name(date.month()), date.year())
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Locale::Ru => write!(f, "ru"),
            Locale::En => write!(f, "en"),
        }
    }
}

/// Calendar month recovered from a header label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct YearMonth {
    pub year: i32,
    pub month: u32,
}

/// Whether `value` contains a standalone run of exactly four digits.
pub fn has_year_token(value: &str) -> bool {
    year_token(value).is_some()
}

fn year_token(value: &str) -> Option<i32> {
    value
        .split(|c: char| !c.is_ascii_digit())
        .find(|run| run.len() == 4)
        .and_then(|run| run.parse().ok())
}

/// Parses labels written in any supported locale. Unknown month names yield `None`.
pub fn parse_label(label: &str) -> Option<YearMonth> {
    let year = year_token(label)?;
    let month = label
        .split_whitespace()
        .find_map(|word| MONTH_LOOKUP.get(&word.to_lowercase()).copied())?;
    Some(YearMonth { year, month })
}

/// Most-recent-first ordering of header labels.
///
/// Labels that parse as a calendar month sort chronologically and come before labels
/// that do not; the latter fall back to reverse lexical order.
pub fn compare_recent_first(a: &str, b: &str) -> Ordering {
    match (parse_label(a), parse_label(b)) {
        (Some(left), Some(right)) => right.cmp(&left).then_with(|| b.cmp(a)),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => b.cmp(a),
    }
}
