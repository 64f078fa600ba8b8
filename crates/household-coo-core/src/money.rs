//! Dollar amounts for the AI-credit budget.
//!
//! Amounts are held as whole cents so that ledger arithmetic is exact, and
//! serialized as a floating-point dollar value (`12.48`) for the JSON state
//! documents.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, AddAssign, Sub, SubAssign};
use std::str::FromStr;

/// A US dollar amount with cent precision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(from = "f64", into = "f64")]
pub struct Usd(i64);

impl Usd {
    pub const ZERO: Usd = Usd(0);

    /// Largest magnitude accepted from user input: cents stay exact as `f64`.
    pub const MAX: Usd = Usd(1 << 53);

    pub const fn from_cents(cents: i64) -> Self {
        Usd(cents)
    }

    /// Round a dollar value to the nearest cent.
    pub fn from_dollars(dollars: f64) -> Self {
        Usd((dollars * 100.0).round() as i64)
    }

    /// Like [`Usd::from_dollars`], but `None` for values that are not
    /// finite or exceed [`Usd::MAX`] in magnitude.
    pub fn try_from_dollars(dollars: f64) -> Option<Self> {
        if !dollars.is_finite() {
            return None;
        }
        let cents = (dollars * 100.0).round();
        if cents.abs() > Usd::MAX.0 as f64 {
            return None;
        }
        Some(Usd(cents as i64))
    }

    pub fn checked_add(self, rhs: Usd) -> Option<Usd> {
        self.0.checked_add(rhs.0).map(Usd)
    }

    pub fn checked_sub(self, rhs: Usd) -> Option<Usd> {
        self.0.checked_sub(rhs.0).map(Usd)
    }

    pub const fn cents(self) -> i64 {
        self.0
    }

    pub fn dollars(self) -> f64 {
        self.0 as f64 / 100.0
    }

    pub const fn is_positive(self) -> bool {
        self.0 > 0
    }
}

impl From<f64> for Usd {
    fn from(dollars: f64) -> Self {
        Usd::from_dollars(dollars)
    }
}

impl From<Usd> for f64 {
    fn from(amount: Usd) -> Self {
        amount.dollars()
    }
}

impl fmt::Display for Usd {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        write!(f, "{sign}${}.{:02}", abs / 100, abs % 100)
    }
}

impl FromStr for Usd {
    type Err = String;

    /// Accepts `5`, `5.5`, `5.50` and `$5.50`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim().trim_start_matches('$');
        let dollars: f64 = trimmed
            .parse()
            .map_err(|_| format!("cannot parse '{s}' as a dollar amount"))?;
        Usd::try_from_dollars(dollars)
            .ok_or_else(|| format!("'{s}' is outside the supported range (max {})", Usd::MAX))
    }
}

impl Add for Usd {
    type Output = Usd;

    fn add(self, rhs: Usd) -> Usd {
        Usd(self.0 + rhs.0)
    }
}

impl AddAssign for Usd {
    fn add_assign(&mut self, rhs: Usd) {
        self.0 += rhs.0;
    }
}

impl Sub for Usd {
    type Output = Usd;

    fn sub(self, rhs: Usd) -> Usd {
        Usd(self.0 - rhs.0)
    }
}

impl SubAssign for Usd {
    fn sub_assign(&mut self, rhs: Usd) {
        self.0 -= rhs.0;
    }
}
