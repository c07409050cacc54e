//! Parsers for the header block that precedes the `<OFX>` element.

use log::warn;
use nom::{
    bytes::complete::{tag, take_until},
    character::complete::multispace0,
    combinator::rest,
    error::ParseError,
    multi::many0,
    sequence::{delimited, pair, separated_pair, terminated},
    IResult,
};

use crate::error::{Error, Result};
use crate::ofx::header::HeaderMap;
use crate::parse::element::attribute;
use crate::parse::use_nom_opt;

/// Marks the start of the document body.
pub(crate) const BODY_START: &str = "<OFX>";

const KNOWN_HEADER_VERSIONS: [u32; 2] = [100, 200];
const KNOWN_VERSIONS: [u32; 11] = [102, 103, 151, 160, 200, 201, 202, 203, 210, 211, 220];

/// Parses everything up to the body.
fn header_block<'a, E>(input: &'a str) -> IResult<&'a str, &'a str, E>
where
    E: ParseError<&'a str>,
{
    take_until(BODY_START)(input)
}

/// Parses a `KEY:value` element. The value runs to the end of the line and may contain colons.
fn colon_elem<'a, E>(input: &'a str) -> IResult<&'a str, (&'a str, &'a str), E>
where
    E: ParseError<&'a str>,
{
    separated_pair(take_until(":"), tag(":"), rest)(input)
}

/// Parses the attributes of an OFX 2 `<?OFX ...?>` header.
fn processing_instruction<'a, E>(input: &'a str) -> IResult<&'a str, Vec<(&'a str, &'a str)>, E>
where
    E: ParseError<&'a str>,
{
    delimited(
        tag("<?OFX"),
        many0(attribute),
        pair(multispace0, tag("?>")),
    )(input)
}

/// Parses one trimmed header line into its entries.
fn header_line(line: &str) -> Vec<(&str, &str)> {
    if let Some((_, attrs)) = use_nom_opt(terminated(processing_instruction, multispace0), line) {
        return attrs;
    }
    if line.starts_with("<?") {
        return Vec::new();
    }
    match use_nom_opt(colon_elem, line) {
        Some((_, (key, value))) => vec![(key.trim(), value.trim())],
        _ => Vec::new(),
    }
}

/// Builds the header map from the text of a header block.
pub(crate) fn header_map(block: &str) -> HeaderMap {
    let mut header = HeaderMap::new();
    for line in block
        .split(|c: char| c == '\r' || c == '\n')
        .map(str::trim)
        .filter(|l| !l.is_empty())
    {
        for (key, value) in header_line(line) {
            header.insert(key, value);
        }
    }

    if let Some(v) = header.header_version() {
        if !KNOWN_HEADER_VERSIONS.contains(&v) {
            warn!("unrecognized OFXHEADER value `{v}`");
        }
    }
    if let Some(v) = header.version() {
        if !KNOWN_VERSIONS.contains(&v) {
            warn!("unrecognized VERSION value `{v}`");
        }
    }

    header
}

/// Splits a document into its header map and its body, which starts at `<OFX>`.
pub(crate) fn split(document: &str) -> Result<(HeaderMap, &str)> {
    let (body, block) = use_nom_opt(header_block, document).ok_or(Error::MalformedDocument)?;
    Ok((header_map(block), body))
}

#[allow(non_snake_case)]
#[cfg(test)]
mod tests {
    use nom::error::ErrorKind;
    use test_case::test_case;

    use crate::parse::test_utils::{assert_parser, Expected};

    use super::*;

    #[test_case("OFXHEADER:100"  , Ok(("OFXHEADER", "100"))   , "" ; "simple"          )]
    #[test_case("NAME:"          , Ok(("NAME", ""))           , "" ; "empty value"     )]
    #[test_case("TIME:12:30:00"  , Ok(("TIME", "12:30:00"))   , "" ; "colons in value" )]
    #[test_case("NO COLON"       , Err(ErrorKind::TakeUntil)  , "NO COLON" ; "no colon")]
    fn colon_elem(input: &str, expected: Expected<(&str, &str)>, remaining: &str) {
        assert_parser(super::colon_elem, input, expected, remaining);
    }

    #[test_case(
        "<?OFX OFXHEADER=\"200\" VERSION=\"211\"?>",
        Ok(vec![("OFXHEADER", "200"), ("VERSION", "211")]),
        "" ;
        "ofx 2 header"
    )]
    #[test_case(
        "<?xml version=\"1.0\"?>",
        Err(ErrorKind::Tag),
        "<?xml version=\"1.0\"?>" ;
        "xml declaration"
    )]
    fn processing_instruction(
        input: &str,
        expected: Expected<Vec<(&str, &str)>>,
        remaining: &str,
    ) {
        assert_parser(super::processing_instruction, input, expected, remaining);
    }

    #[test]
    fn header_map__sgml() {
        let header = header_map(
            "OFXHEADER:100\r\n\
             DATA:OFXSGML\r\n\
             VERSION:102\r\n\
             SECURITY:NONE\r\n\
             ENCODING:USASCII\r\n\
             CHARSET:1252\r\n\
             COMPRESSION:NONE\r\n\
             OLDFILEUID:NONE\r\n\
             NEWFILEUID:NONE\r\n\r\n",
        );

        assert_eq!(header.len(), 9);
        assert_eq!(header.get("OFXHEADER"), Some("100"));
        assert_eq!(header.get("ENCODING"), Some("USASCII"));
        assert_eq!(header.get("NEWFILEUID"), Some("NONE"));
    }

    #[test_case("A:1\nB:2"     ; "unix line endings"   )]
    #[test_case("A:1\r\nB:2"   ; "windows line endings")]
    #[test_case("A:1\rB:2"     ; "mac line endings"    )]
    #[test_case("  A : 1 \n\nB:2\njunk\n"; "blank and colonless lines")]
    fn header_map__line_endings(block: &str) {
        assert_eq!(header_map(block), HeaderMap::from_iter([("A", "1"), ("B", "2")]));
    }

    #[test]
    fn header_map__empty_key_is_kept() {
        let header = header_map("A:1\n:3\n : 4\n");

        assert_eq!(header.iter().collect::<Vec<_>>(), vec![("A", "1"), ("", "4")]);
    }

    #[test]
    fn header_map__duplicate_key_last_wins() {
        let header = header_map("VERSION:102\nDATA:OFXSGML\nVERSION:151\n");

        assert_eq!(
            header.iter().collect::<Vec<_>>(),
            vec![("VERSION", "151"), ("DATA", "OFXSGML")]
        );
    }

    #[test]
    fn header_map__xml() {
        let header = header_map(
            "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"no\"?>\n\
             <?OFX OFXHEADER=\"200\" VERSION=\"211\" SECURITY=\"NONE\" OLDFILEUID=\"NONE\" NEWFILEUID=\"NONE\"?>\n",
        );

        assert_eq!(header.header_version(), Some(200));
        assert_eq!(header.version(), Some(211));
        assert_eq!(header.len(), 5);
    }

    #[test]
    fn split__header_and_body() {
        let (header, body) = split("OFXHEADER:100\nENCODING:USASCII\n\n<OFX><A>1</A></OFX>").unwrap();

        assert_eq!(header.get("OFXHEADER"), Some("100"));
        assert_eq!(header.get("ENCODING"), Some("USASCII"));
        assert_eq!(body, "<OFX><A>1</A></OFX>");
    }

    #[test]
    fn split__body_only() {
        let (header, body) = split("<OFX></OFX>").unwrap();

        assert!(header.is_empty());
        assert_eq!(body, "<OFX></OFX>");
    }

    #[test_case("OFXHEADER:100\n<ofx></ofx>" ; "lowercase")]
    #[test_case("OFXHEADER:100\n"            ; "header only")]
    #[test_case(""                           ; "empty")]
    fn split__missing_body(document: &str) {
        assert_eq!(split(document), Err(Error::MalformedDocument));
    }
}
