//! Bottle records - the single beer value every cellar box stores.
//!
//! A record is persisted as one `~`-delimited line:
//!
//! ```text
//! <id>~<DD/MM/YY>~<bomber|small>
//! ```
//!
//! Parsing happens in two steps so that callers can hold on to a partially
//! valid line: [`RawRecord::parse`] only checks the field layout, and
//! [`RawRecord::validate`] checks the date and then the size. When both are
//! wrong the date error wins.

use crate::error::{CellarError, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Field separator for every persisted line
pub const DELIMITER: char = '~';

/// External date form (`DD/MM/YY`)
pub const DATE_FORMAT: &str = "%d/%m/%y";

/// Parse a `DD/MM/YY` date.
///
/// Exactly two digits per field; chrono alone would also take `1/2/16` or
/// leading spaces.
pub fn parse_date(text: &str) -> Option<NaiveDate> {
    let bytes = text.as_bytes();
    let well_formed = bytes.len() == 8
        && bytes[2] == b'/'
        && bytes[5] == b'/'
        && [0, 1, 3, 4, 6, 7].iter().all(|&i| bytes[i].is_ascii_digit());
    if !well_formed {
        return None;
    }

    NaiveDate::parse_from_str(text, DATE_FORMAT).ok()
}

/// Format a date as `DD/MM/YY`
pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

/// Bottle size category. Each category has its own box capacity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BeerSize {
    Bomber,
    Small,
}

impl BeerSize {
    /// Maximum number of bottles a box of this size holds
    pub fn capacity(self) -> usize {
        match self {
            BeerSize::Bomber => 20,
            BeerSize::Small => 30,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            BeerSize::Bomber => "bomber",
            BeerSize::Small => "small",
        }
    }
}

impl fmt::Display for BeerSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BeerSize {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "bomber" => Ok(BeerSize::Bomber),
            "small" => Ok(BeerSize::Small),
            other => Err(format!("{} is not a valid beer size", other)),
        }
    }
}

/// A single cellared bottle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Beer {
    pub id: u32,
    pub drink_date: NaiveDate,
    pub size: BeerSize,
}

impl Beer {
    pub fn new(id: u32, drink_date: NaiveDate, size: BeerSize) -> Self {
        Self {
            id,
            drink_date,
            size,
        }
    }

    /// Parse a persisted line into a fully valid beer
    pub fn parse(line: &str) -> Result<Self> {
        RawRecord::parse(line)?.validate()
    }

    /// Should this beer be drunk after `other`?
    ///
    /// Only the drink dates are compared. Bottles sharing a date are never
    /// after each other, which keeps equal dates in insertion order.
    pub fn drinks_after(&self, other: &Beer) -> bool {
        self.drink_date > other.drink_date
    }

    /// Serialize to the persisted line form (without newline)
    pub fn to_line(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Beer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{d}{}{d}{}",
            self.id,
            format_date(self.drink_date),
            self.size,
            d = DELIMITER
        )
    }
}

impl FromStr for Beer {
    type Err = CellarError;

    fn from_str(s: &str) -> Result<Self> {
        Beer::parse(s)
    }
}

/// A line split into its three fields, before date and size are checked
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRecord {
    pub line: String,
    pub id: u32,
    pub drink_date: String,
    pub size: String,
}

impl RawRecord {
    /// Split a line into identifier, date and size
    ///
    /// Fails with `MalformedRecord` unless there are exactly three fields and
    /// the first is a non-negative integer.
    pub fn parse(line: &str) -> Result<Self> {
        let elems: Vec<&str> = line.split(DELIMITER).collect();
        if elems.len() != 3 {
            return Err(CellarError::MalformedRecord(line.to_string()));
        }

        let id = elems[0]
            .parse::<u32>()
            .map_err(|_| CellarError::MalformedRecord(line.to_string()))?;

        Ok(Self {
            line: line.to_string(),
            id,
            drink_date: elems[1].to_string(),
            size: elems[2].to_string(),
        })
    }

    /// The drink date, if it parses
    pub fn date(&self) -> Option<NaiveDate> {
        parse_date(&self.drink_date)
    }

    /// The size, if it is a recognised category
    pub fn beer_size(&self) -> Option<BeerSize> {
        self.size.parse().ok()
    }

    /// Turn the raw fields into a beer; a bad date is reported before a bad size
    pub fn validate(&self) -> Result<Beer> {
        let drink_date = self.date().ok_or_else(|| CellarError::InvalidDate {
            line: self.line.clone(),
            date: self.drink_date.clone(),
        })?;

        let size = self.beer_size().ok_or_else(|| CellarError::InvalidSize {
            line: self.line.clone(),
            size: self.size.clone(),
        })?;

        Ok(Beer::new(self.id, drink_date, size))
    }
}
