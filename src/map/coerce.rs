//! Coercion of OFX leaf text into typed values.

use std::{num::ParseIntError, str::FromStr};

use nom::{
    bytes::complete::{is_not, take_while_m_n},
    character::complete::char,
    combinator::{eof, map, map_res, opt, value},
    error::{FromExternalError, ParseError},
    sequence::{delimited, pair, preceded, terminated, tuple},
    IResult,
};
use rust_decimal::Decimal;

use crate::error::{Error, Result};
use crate::ofx::OfxDate;
use crate::parse::use_nom_opt;

fn digits<'a, E>(n: usize) -> impl FnMut(&'a str) -> IResult<&'a str, &'a str, E>
where
    E: ParseError<&'a str>,
{
    take_while_m_n(n, n, |c: char| c.is_ascii_digit())
}

/// Parses the `YYYYMMDD` calendar part of an OFX date.
fn ymd<'a, E>(input: &'a str) -> IResult<&'a str, OfxDate, E>
where
    E: ParseError<&'a str> + FromExternalError<&'a str, ParseIntError>,
{
    map(
        tuple((
            map_res(digits(4), str::parse::<u16>),
            map_res(digits(2), str::parse::<u8>),
            map_res(digits(2), str::parse::<u8>),
        )),
        |(year, month, day)| OfxDate::new(year, month, day),
    )(input)
}

/// Parses the optional `HHMMSS[.XXX]` time and `[offset:TZ]` zone that may follow a date.
fn time_tail<'a, E>(input: &'a str) -> IResult<&'a str, (), E>
where
    E: ParseError<&'a str>,
{
    value(
        (),
        pair(
            opt(pair(digits(6), opt(preceded(char('.'), digits(3))))),
            opt(delimited(char('['), is_not("]"), char(']'))),
        ),
    )(input)
}

/// Coerces an OFX date.
///
/// Only `YYYYMMDD` is accepted unless `lenient`, in which case a trailing time and zone are
/// accepted and dropped. The digits are taken as written; no calendar check is made.
pub(crate) fn date(literal: &str, lenient: bool) -> Result<OfxDate> {
    let parsed = if lenient {
        use_nom_opt(terminated(ymd, pair(time_tail, eof)), literal)
    } else {
        use_nom_opt(terminated(ymd, eof), literal)
    };
    parsed
        .map(|(_, date)| date)
        .ok_or_else(|| Error::MalformedDate(String::from(literal)))
}

/// Picks the decimal separator of an amount, if it has one.
///
/// When both `,` and `.` appear, the last one is the decimal separator and the other groups
/// thousands. A separator that appears more than once on its own is grouping too.
fn decimal_separator(s: &str) -> Option<char> {
    match (s.matches(',').count(), s.matches('.').count()) {
        (0, 1) => Some('.'),
        (1, 0) => Some(','),
        (0, _) | (_, 0) => None,
        _ => s.chars().rev().find(|c| matches!(c, ',' | '.')),
    }
}

/// Coerces an OFX amount, which may use either `,` or `.` as its decimal separator.
pub(crate) fn amount(literal: &str) -> Result<Decimal> {
    let trimmed = literal.trim();
    let unsigned = trimmed.strip_prefix('+').unwrap_or(trimmed);
    let separator = decimal_separator(unsigned);
    let canonical: String = unsigned
        .chars()
        .filter_map(|c| match c {
            ',' | '.' if Some(c) == separator => Some('.'),
            ',' | '.' => None,
            c => Some(c),
        })
        .collect();

    Decimal::from_str(&canonical).map_err(|_| Error::MalformedAmount(String::from(literal)))
}
