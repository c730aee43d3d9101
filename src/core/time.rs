use chrono::{DateTime, Local, NaiveDate, TimeZone};

/// Clock abstracts access to the current time so services remain deterministic in tests.
pub trait Clock: Send + Sync {
    /// Returns the current local timestamp.
    fn now(&self) -> DateTime<Local>;

    /// Returns the current local date. Defaults to `now().date_naive()`.
    fn today(&self) -> NaiveDate {
        self.now().date_naive()
    }
}

/// Real-time clock backed by the system local time.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Local> {
        Local::now()
    }
}

/// Clock pinned to one calendar day, at local noon.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock {
    date: NaiveDate,
}

impl FixedClock {
    pub fn new(date: NaiveDate) -> Self {
        Self { date }
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Local> {
        let noon = self.date.and_hms_opt(12, 0, 0).unwrap_or_default();
        Local
            .from_local_datetime(&noon)
            .earliest()
            .unwrap_or_else(Local::now)
    }

    fn today(&self) -> NaiveDate {
        self.date
    }
}
