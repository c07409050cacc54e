use std::fmt;

use rust_decimal::Decimal;
use serde::{Serialize, Serializer};
use time::{Date, Month};

use crate::error::{Error, Result};

pub use self::header::*;

pub mod header;

/// A `YYYYMMDD` date as written in an OFX document, shown as `YYYY-MM-DD`.
///
/// The parts are kept as written, so a date such as `20210230` survives the trip even though no
/// such day exists. Use [`OfxDate::to_date`] for a checked calendar date.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct OfxDate {
    year: u16,
    month: u8,
    day: u8,
}

impl OfxDate {
    pub const fn new(year: u16, month: u8, day: u8) -> Self {
        OfxDate { year, month, day }
    }

    pub fn year(&self) -> u16 {
        self.year
    }

    pub fn month(&self) -> u8 {
        self.month
    }

    pub fn day(&self) -> u8 {
        self.day
    }

    /// The calendar date, failing with [`Error::MalformedDate`] if the day does not exist.
    pub fn to_date(&self) -> Result<Date> {
        let malformed = || Error::MalformedDate(self.to_string());
        let month = Month::try_from(self.month).map_err(|_| malformed())?;
        Date::from_calendar_date(i32::from(self.year), month, self.day).map_err(|_| malformed())
    }
}

impl From<Date> for OfxDate {
    fn from(date: Date) -> Self {
        // Dates outside of 0000-9999 cannot be written in OFX.
        OfxDate {
            year: date.year().clamp(0, 9999) as u16,
            month: u8::from(date.month()),
            day: date.day(),
        }
    }
}

impl fmt::Display for OfxDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}-{:02}", self.year, self.month, self.day)
    }
}

impl Serialize for OfxDate {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}

/// A ledger balance and the date it was reported for.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Balance {
    pub amount: Decimal,
    pub date: OfxDate,
}

/// Identity and balance of the statement's bank and account.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatementInfo {
    /// `ORG` of the sign-on financial institution.
    pub bank_name: String,
    /// `FID` of the sign-on financial institution.
    pub bank_id: String,
    pub bank_marketing_info: Option<String>,
    pub account_id: String,
    pub currency_code: String,
    pub language: String,
    pub balance: Balance,
}

/// One entry of a statement's transaction list.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    /// The `TRNTYPE` code, such as `DEP`, `DEBIT` or `CHECK`.
    #[serde(rename = "type")]
    pub kind: String,
    pub date: OfxDate,
    /// Signed: credits are positive, debits negative.
    pub amount: Decimal,
    /// The financial institution's transaction id, stable across downloads.
    pub id: String,
    pub check_number: Option<String>,
    pub payee: Option<String>,
    pub description: String,
}

/// A bank statement response, normalized from either OFX dialect.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct OfxDocument {
    /// The header section of the document.
    pub header: HeaderMap,
    pub info: StatementInfo,
    pub transactions: Vec<Transaction>,
}
