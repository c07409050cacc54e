//! The parse pipeline: header split, tree building with SGML fallback, schema mapping.

use log::{debug, trace};
use nom::{error::Error as BriefError, Parser};

use crate::error::{Error, Result};
use crate::map::ofx_document;
use crate::ofx::OfxDocument;
use crate::options::ParseOptions;

use self::tree::Element;

pub(crate) mod element;
pub(crate) mod header;
pub mod sgml;
pub mod tree;

pub(crate) fn use_nom_opt<'a, O, P>(mut p: P, input: &'a str) -> Option<(&'a str, O)>
where
    P: Parser<&'a str, O, BriefError<&'a str>>,
{
    p.parse(input).ok()
}

/// Builds the tree of a body, retrying once through the SGML normalizer if it is not well-formed.
fn body_tree(body: &str, options: &ParseOptions) -> Result<Element> {
    match tree::build(body) {
        Err(Error::MalformedMarkup(reason)) if options.sgml_fallback => {
            debug!(
                "body is not well-formed ({}), normalizing as SGML",
                reason.lines().next().unwrap_or_default()
            );
            let normalized = sgml::normalize(body);
            trace!(
                "normalized {} bytes of body into {} bytes",
                body.len(),
                normalized.len()
            );
            tree::build(&normalized)
        }
        result => result,
    }
}

/// Parses an OFX document with the given options.
pub fn parse_with(document: &str, options: &ParseOptions) -> Result<OfxDocument> {
    let (header, body) = header::split(document)?;
    let root = body_tree(body, options)?;
    ofx_document(header, &root, options)
}

/// Parses an OFX document, in either its SGML or its XML dialect, into a bank statement.
pub fn parse(document: &str) -> Result<OfxDocument> {
    parse_with(document, &ParseOptions::default())
}
