//! Rewrites an SGML-flavoured OFX body into well-formed markup.
//!
//! OFX 1.x lets leaf elements omit their end tags, so `<CODE>0<SEVERITY>INFO</STATUS>` is a
//! valid status block. There is no DTD at hand to tell leaves from containers, so a start tag
//! directly followed by text is taken to be a leaf and closed right after that text. Anything
//! followed by another tag is a container and keeps whatever end tag the document gave it.

use std::borrow::Cow;

use nom::{branch::alt, combinator::map, error::Error as BriefError, IResult};

use crate::parse::element::{any_end_tag, any_start_tag, cdata, misc, text_run, StartTag};

#[derive(Clone, Debug, PartialEq)]
enum Token<'a> {
    Start(StartTag<'a>),
    End(&'a str),
    Skip,
    Text(Cow<'a, str>),
}

fn next_token(input: &str) -> IResult<&str, Token<'_>, BriefError<&str>> {
    alt((
        map(any_start_tag, Token::Start),
        map(any_end_tag, Token::End),
        map(misc, |_| Token::Skip),
        map(text_run, |text| Token::Text(Cow::Borrowed(text))),
    ))(input)
}

/// Flushes pending text as a trimmed text token, unless it is only whitespace.
fn flush_text<'a>(tokens: &mut Vec<Token<'a>>, pending: &mut Option<Cow<'a, str>>) {
    if let Some(text) = pending.take() {
        let trimmed = text.trim();
        if !trimmed.is_empty() {
            tokens.push(Token::Text(match text {
                Cow::Borrowed(text) => Cow::Borrowed(text.trim()),
                Cow::Owned(text) => Cow::Owned(String::from(text.trim())),
            }));
        }
    }
}

/// Splits a body into significant tokens.
///
/// Content-free markup is dropped and the text on either side of it joined. Whitespace-only text
/// is dropped, as is whitespace around text.
fn tokenize(mut input: &str) -> Vec<Token<'_>> {
    let mut tokens = Vec::new();
    let mut pending: Option<Cow<str>> = None;
    while let Ok((rest, token)) = next_token(input) {
        match token {
            Token::Skip => {}
            Token::Text(text) => {
                pending = Some(match pending.take() {
                    Some(before) => Cow::Owned(before.into_owned() + text.as_ref()),
                    None => text,
                });
            }
            token => {
                flush_text(&mut tokens, &mut pending);
                tokens.push(token);
            }
        }
        input = rest;
    }
    flush_text(&mut tokens, &mut pending);
    tokens
}

/// Merges dotted tag names such as `BANK.ID` into `BANKID`.
fn merged_name(name: &str) -> Cow<'_, str> {
    if name.contains('.') {
        Cow::Owned(name.replace('.', ""))
    } else {
        Cow::Borrowed(name)
    }
}

/// Appends text, escaping any `<` outside of CDATA sections.
fn push_text(out: &mut String, text: &str) {
    let mut rest = text;
    while let Some(pos) = rest.find('<') {
        out.push_str(&rest[..pos]);
        rest = &rest[pos..];
        match cdata::<BriefError<&str>>(rest) {
            Ok((after, _)) => {
                out.push_str(&rest[..rest.len() - after.len()]);
                rest = after;
            }
            Err(_) => {
                out.push_str("&lt;");
                rest = &rest[1..];
            }
        }
    }
    out.push_str(rest);
}

fn push_start(out: &mut String, name: &str) {
    out.push('<');
    out.push_str(name);
    out.push('>');
}

fn push_end(out: &mut String, name: &str) {
    out.push_str("</");
    out.push_str(name);
    out.push('>');
}

fn is_end_of(token: Option<&Token>, name: &str) -> bool {
    matches!(token, Some(Token::End(end)) if merged_name(end) == name)
}

/// Normalizes a body so that every leaf has exactly one end tag.
///
/// Normalization never fails, and markup that is already well-formed comes out describing the
/// same tree.
pub fn normalize(body: &str) -> String {
    let tokens = tokenize(body);
    let mut out = String::with_capacity(body.len() + body.len() / 4);

    let mut i = 0;
    while i < tokens.len() {
        match &tokens[i] {
            &Token::Start(StartTag { name, empty }) => {
                let name = merged_name(name);
                push_start(&mut out, &name);
                match tokens.get(i + 1) {
                    _ if empty => {
                        push_end(&mut out, &name);
                        i += 1;
                    }
                    Some(Token::Text(text)) => {
                        push_text(&mut out, text);
                        push_end(&mut out, &name);
                        i += if is_end_of(tokens.get(i + 2), &name) { 3 } else { 2 };
                    }
                    // An element closed by some other end tag can only be an empty leaf.
                    Some(Token::End(_)) if !is_end_of(tokens.get(i + 1), &name) => {
                        push_end(&mut out, &name);
                        i += 1;
                    }
                    _ => i += 1,
                }
            }
            Token::End(name) => {
                push_end(&mut out, &merged_name(name));
                i += 1;
            }
            // Stray text is passed on for the tree builder to reject.
            Token::Text(text) => {
                push_text(&mut out, text);
                i += 1;
            }
            Token::Skip => i += 1,
        }
    }

    out
}

#[allow(non_snake_case)]
#[cfg(test)]
mod tests {
    use test_case::test_case;

    use crate::parse::tree::build;

    #[test_case(
        "<CODE>0",
        "<CODE>0</CODE>" ;
        "unterminated leaf"
    )]
    #[test_case(
        "<STATUS>\r\n  <CODE>0\r\n  <SEVERITY>INFO\r\n</STATUS>",
        "<STATUS><CODE>0</CODE><SEVERITY>INFO</SEVERITY></STATUS>" ;
        "sgml container"
    )]
    #[test_case(
        "<STATUS><CODE>0</CODE><SEVERITY>INFO</SEVERITY></STATUS>",
        "<STATUS><CODE>0</CODE><SEVERITY>INFO</SEVERITY></STATUS>" ;
        "already closed"
    )]
    #[test_case(
        "<STATUS><CODE>0</CODE><SEVERITY>INFO</STATUS>",
        "<STATUS><CODE>0</CODE><SEVERITY>INFO</SEVERITY></STATUS>" ;
        "partially closed"
    )]
    #[test_case(
        "<MEMO>  DEPÓSITO  ONLINE  \n<TRNAMT>",
        "<MEMO>DEPÓSITO  ONLINE</MEMO><TRNAMT>" ;
        "leaf text trimmed"
    )]
    #[test_case(
        "<BANK.ID>0001</BANK.ID><ACCT.ID>42",
        "<BANKID>0001</BANKID><ACCTID>42</ACCTID>" ;
        "dotted names"
    )]
    #[test_case(
        "<MEMO>A < B > C<NAME>x",
        "<MEMO>A &lt; B > C</MEMO><NAME>x</NAME>" ;
        "angle brackets in text"
    )]
    #[test_case(
        "<STMTTRN><MEMO>\n</STMTTRN>",
        "<STMTTRN><MEMO></MEMO></STMTTRN>" ;
        "empty sgml leaf"
    )]
    #[test_case(
        "<MEMO/><!-- note --><NAME a=\"1\">x",
        "<MEMO></MEMO><NAME>x</NAME>" ;
        "self-closing comments and attributes"
    )]
    #[test_case(
        "<MEMO>a <!-- note --> b<?pi?>c<NAME>x",
        "<MEMO>a  bc</MEMO><NAME>x</NAME>" ;
        "text joined around comments"
    )]
    #[test_case(
        "<MEMO><![CDATA[<b>]]>",
        "<MEMO><![CDATA[<b>]]></MEMO>" ;
        "cdata kept"
    )]
    fn normalize(input: &str, expected: &str) {
        assert_eq!(super::normalize(input), expected);
    }

    #[test_case("<A><B>x</B><C>y</C></A>"                        ; "flat"          )]
    #[test_case("<A>\n  <B>x</B>\n  <B>y</B>\n</A>\n"            ; "indented"      )]
    #[test_case("<A><A><B> x </B></A><C/></A>"                   ; "nested same name")]
    #[test_case("<A><B>AT&amp;T &lt;x&gt;</B><C></C></A>"        ; "entities"      )]
    #[test_case("<OFX><SONRS><STATUS><CODE>0</CODE></STATUS></SONRS></OFX>" ; "ofx")]
    #[test_case("<A><B><!-- c --></B></A>"                       ; "comment in empty leaf")]
    #[test_case("<A><B>abc<!-- c --></B></A>"                    ; "comment after text")]
    #[test_case("<A><B>a<?x?>bc</B><C> <!-- c --> </C></A>"       ; "comment and pi in text")]
    fn normalize__idempotent_on_well_formed(input: &str) {
        assert_eq!(build(&super::normalize(input)), build(input));
    }

    #[test]
    fn normalize__twice_is_once() {
        let once = super::normalize("<A><B>1<C>2</C><D>3</A>");

        assert_eq!(super::normalize(&once), once);
    }
}
