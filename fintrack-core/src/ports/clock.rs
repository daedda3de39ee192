//! Calendar source for default date ranges

use chrono::{Local, NaiveDate};

pub trait Clock: Send + Sync {
    /// Today's date in the process' local time zone
    fn today(&self) -> NaiveDate;
}

/// Wall clock
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        Local::now().date_naive()
    }
}

/// Clock pinned to one date
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub NaiveDate);

impl Clock for FixedClock {
    fn today(&self) -> NaiveDate {
        self.0
    }
}
