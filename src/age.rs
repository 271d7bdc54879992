//! "Years in business" phrase for the page header.
//!
//! The winery's age is shown as a count followed by the Russian word for
//! "year" in the form that agrees with the count:
//!
//! ```text
//! 1 год   21 год   101 год
//! 2 года  34 года  104 года
//! 5 лет   11 лет   0 лет   111 лет
//! ```
//!
//! The current year comes from a [`Clock`], so builds are reproducible in
//! tests by pinning the year with [`FixedYear`].

use chrono::Datelike;
use std::fmt;

/// Source of the current calendar year.
pub trait Clock {
    fn current_year(&self) -> i32;
}

/// Reads the year from the local wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn current_year(&self) -> i32 {
        chrono::Local::now().year()
    }
}

/// A clock stuck at a given year.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedYear(pub i32);

impl Clock for FixedYear {
    fn current_year(&self) -> i32 {
        self.0
    }
}

/// Pick the form of "год" that agrees with `years`.
///
/// Depends only on the last one and two decimal digits:
/// - ends in 1, but not 11 → "год"
/// - ends in 2–4, but not 12–14 → "года"
/// - everything else → "лет"
pub fn years_suffix(years: u32) -> &'static str {
    let last_digit = years % 10;
    let last_two_digits = years % 100;

    if last_digit == 1 && last_two_digits != 11 {
        "год"
    } else if (2..=4).contains(&last_digit) && !(11..=19).contains(&last_two_digits) {
        "года"
    } else {
        "лет"
    }
}

/// How long the winery has existed, ready for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WineryAge {
    pub years: u32,
    pub suffix: &'static str,
}

impl WineryAge {
    pub fn new(years: u32) -> Self {
        Self {
            years,
            suffix: years_suffix(years),
        }
    }
}

impl fmt::Display for WineryAge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.years, self.suffix)
    }
}

/// Age of a winery founded in `foundation_year`, as of `clock`'s year.
///
/// A foundation year in the future yields zero years rather than a negative
/// count.
pub fn winery_age(foundation_year: i32, clock: &impl Clock) -> WineryAge {
    let current_year = clock.current_year();
    let elapsed = current_year.saturating_sub(foundation_year);
    if elapsed < 0 {
        tracing::warn!(
            foundation_year,
            current_year,
            "foundation year is in the future, showing age as 0"
        );
    }
    WineryAge::new(u32::try_from(elapsed).unwrap_or(0))
}
