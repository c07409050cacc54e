//! Lexical parsers for the markup of an OFX body.
//!
//! These know nothing about OFX itself; they are shared by the tree builder and the SGML
//! normalizer.

use std::borrow::Cow;

use nom::{
    branch::alt,
    bytes::complete::{is_not, tag, take, take_till, take_until, take_while},
    character::complete::{char, multispace0, multispace1, satisfy},
    combinator::{eof, map, opt, peek, recognize, value, verify},
    error::ParseError,
    multi::{many0, many0_count, many_till},
    sequence::{delimited, pair, preceded, separated_pair, tuple},
    IResult,
};

/// A start tag, with its attributes already discarded.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) struct StartTag<'a> {
    pub name: &'a str,
    /// Whether the tag was written self-closing, as in `<NAME/>`.
    pub empty: bool,
}

fn is_name_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

fn is_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-' | ':')
}

/// Parses the name of a tag.
pub(crate) fn tag_name<'a, E>(input: &'a str) -> IResult<&'a str, &'a str, E>
where
    E: ParseError<&'a str>,
{
    recognize(pair(satisfy(is_name_start), take_while(is_name_char)))(input)
}

/// Parses a quoted attribute value.
fn quoted<'a, E>(input: &'a str) -> IResult<&'a str, &'a str, E>
where
    E: ParseError<&'a str>,
{
    alt((
        delimited(char('"'), take_till(|c| c == '"'), char('"')),
        delimited(char('\''), take_till(|c| c == '\''), char('\'')),
    ))(input)
}

/// Parses a `name="value"` attribute, including the whitespace before it.
pub(crate) fn attribute<'a, E>(input: &'a str) -> IResult<&'a str, (&'a str, &'a str), E>
where
    E: ParseError<&'a str>,
{
    preceded(
        multispace1,
        separated_pair(
            tag_name,
            tuple((multispace0, char('='), multispace0)),
            quoted,
        ),
    )(input)
}

/// Parses the start tag of an element.
pub(crate) fn any_start_tag<'a, E>(input: &'a str) -> IResult<&'a str, StartTag<'a>, E>
where
    E: ParseError<&'a str>,
{
    map(
        delimited(
            tag("<"),
            tuple((tag_name, many0_count(attribute), multispace0, opt(char('/')))),
            tag(">"),
        ),
        |(name, _, _, slash)| StartTag {
            name,
            empty: slash.is_some(),
        },
    )(input)
}

/// Parses the end tag of an element.
pub(crate) fn any_end_tag<'a, E>(input: &'a str) -> IResult<&'a str, &'a str, E>
where
    E: ParseError<&'a str>,
{
    delimited(tag("</"), tag_name, preceded(multispace0, tag(">")))(input)
}

/// Parses a named end tag of an element.
pub(crate) fn end_tag<'a, E>(name: &'a str) -> impl FnMut(&'a str) -> IResult<&'a str, &'a str, E>
where
    E: ParseError<&'a str>,
{
    delimited(tag("</"), tag(name), preceded(multispace0, tag(">")))
}

/// Parses a CDATA section, yielding its contents.
pub(crate) fn cdata<'a, E>(input: &'a str) -> IResult<&'a str, &'a str, E>
where
    E: ParseError<&'a str>,
{
    const CDATA_END: &str = "]]>";

    delimited(tag("<![CDATA["), take_until(CDATA_END), tag(CDATA_END))(input)
}

/// Parses markup that carries no content: comments, processing instructions and declarations.
pub(crate) fn misc<'a, E>(input: &'a str) -> IResult<&'a str, &'a str, E>
where
    E: ParseError<&'a str>,
{
    alt((
        recognize(tuple((tag("<!--"), take_until("-->"), tag("-->")))),
        recognize(tuple((tag("<?"), take_until("?>"), tag("?>")))),
        recognize(tuple((
            tag("<!"),
            satisfy(|c| c.is_ascii_alphabetic()),
            opt(is_not(">")),
            tag(">"),
        ))),
    ))(input)
}

/// Skips any run of whitespace and content-free markup.
pub(crate) fn misc0<'a, E>(input: &'a str) -> IResult<&'a str, (), E>
where
    E: ParseError<&'a str>,
{
    value((), many0_count(alt((multispace1, misc))))(input)
}

/// Parses the start of anything that is markup rather than text.
fn markup<'a, E>(input: &'a str) -> IResult<&'a str, &'a str, E>
where
    E: ParseError<&'a str>,
{
    alt((recognize(any_start_tag), recognize(any_end_tag), misc))(input)
}

/// Parses a run of raw text up to the next piece of markup.
///
/// A `<` that does not begin a tag, comment or processing instruction is part of the text. CDATA
/// sections are kept verbatim.
pub(crate) fn text_run<'a, E>(input: &'a str) -> IResult<&'a str, &'a str, E>
where
    E: ParseError<&'a str>,
{
    verify(
        recognize(many_till(
            alt((recognize(cdata), take(1u8))),
            peek(alt((markup, eof))),
        )),
        |o: &str| !o.is_empty(),
    )(input)
}

/// Parses text devoid of special characters.
fn normal_chars1<'a, E>(input: &'a str) -> IResult<&'a str, &'a str, E>
where
    E: ParseError<&'a str>,
{
    is_not("<&")(input)
}

/// Parses the value of an element, decoding entities and CDATA sections and dropping comments and
/// processing instructions.
pub(crate) fn elem_value<'a, E>(input: &'a str) -> IResult<&'a str, Cow<'a, str>, E>
where
    E: ParseError<&'a str>,
{
    let (input, chunks) = many0(alt((
        normal_chars1,
        value("<", tag("&lt;")),
        value(">", tag("&gt;")),
        value("&", tag("&amp;")),
        value("\"", tag("&quot;")),
        value("'", tag("&apos;")),
        value(" ", tag("&nbsp;")),
        cdata,
        value("", misc),
        tag("&"),
    )))(input)?;

    Ok((
        input,
        match chunks.len() {
            0 => Cow::Borrowed(""),
            1 => Cow::Borrowed(chunks[0]),
            _ => Cow::Owned(chunks.concat()),
        },
    ))
}
