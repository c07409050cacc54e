//! A strict parser from well-formed markup into a generic element tree.

use std::{mem, slice};

use nom::{
    combinator::eof,
    error::{context, convert_error, ContextError, ErrorKind, ParseError, VerboseError},
    multi::many0,
    sequence::{preceded, terminated, tuple},
    Err, IResult,
};

use crate::error::{Error, Result};
use crate::parse::element::{any_start_tag, elem_value, end_tag, misc0};

/// A node of a parsed document.
///
/// An element either holds text or holds other elements, never both.
#[derive(Clone, Debug, PartialEq)]
pub enum Element {
    Container { name: String, children: Vec<Child> },
    Leaf { name: String, text: String },
}

/// The children of a container that share one tag name.
///
/// A name that appears once is a `Single`; repeated siblings are collapsed into a `Sequence`, in
/// document order. Groups themselves keep the order in which each name first appeared.
#[derive(Clone, Debug, PartialEq)]
pub enum Child {
    Single(Element),
    Sequence(Vec<Element>),
}

impl Element {
    pub fn leaf(name: impl Into<String>, text: impl Into<String>) -> Self {
        Element::Leaf {
            name: name.into(),
            text: text.into(),
        }
    }

    /// Creates a container, grouping repeated sibling names.
    pub fn container(name: impl Into<String>, elements: Vec<Element>) -> Self {
        let mut children: Vec<Child> = Vec::new();
        for element in elements {
            match children.iter_mut().find(|c| c.name() == element.name()) {
                Some(child) => child.push(element),
                None => children.push(Child::Single(element)),
            }
        }
        Element::Container {
            name: name.into(),
            children,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Element::Container { name, .. } | Element::Leaf { name, .. } => name,
        }
    }

    /// The text of a leaf, or `None` for a container.
    pub fn text(&self) -> Option<&str> {
        match self {
            Element::Leaf { text, .. } => Some(text),
            Element::Container { .. } => None,
        }
    }

    /// The child groups of a container; empty for a leaf.
    pub fn children(&self) -> &[Child] {
        match self {
            Element::Container { children, .. } => children,
            Element::Leaf { .. } => &[],
        }
    }

    /// Looks up the child group with the given name.
    pub fn get(&self, name: &str) -> Option<&Child> {
        self.children().iter().find(|c| c.name() == name)
    }
}

impl Child {
    pub fn name(&self) -> &str {
        self.elements()
            .first()
            .map(Element::name)
            .unwrap_or_default()
    }

    /// All elements of the group, whichever shape it has.
    pub fn elements(&self) -> &[Element] {
        match self {
            Child::Single(element) => slice::from_ref(element),
            Child::Sequence(elements) => elements,
        }
    }

    fn push(&mut self, element: Element) {
        match self {
            Child::Sequence(elements) => elements.push(element),
            Child::Single(_) => {
                let previous = mem::replace(self, Child::Sequence(Vec::with_capacity(2)));
                if let (Child::Single(first), Child::Sequence(elements)) = (previous, self) {
                    elements.extend([first, element]);
                }
            }
        }
    }
}

/// How deeply elements may nest before a document is rejected.
pub const MAX_DEPTH: usize = 256;

/// Parses an element at the given nesting depth and everything inside it.
fn element<'a, E>(input: &'a str, depth: usize) -> IResult<&'a str, Element, E>
where
    E: ParseError<&'a str> + ContextError<&'a str>,
{
    if depth > MAX_DEPTH {
        return Err(Err::Failure(E::add_context(
            input,
            "nesting too deep",
            E::from_error_kind(input, ErrorKind::TooLarge),
        )));
    }

    let (input, start) = context("start tag", any_start_tag)(input)?;
    if start.empty {
        return Ok((input, Element::leaf(start.name, "")));
    }

    let (input, children) =
        many0(preceded(misc0, |i: &'a str| element(i, depth + 1)))(input)?;
    if children.is_empty() {
        let (input, text) = elem_value(input)?;
        let (input, _) = context("leaf end tag", end_tag(start.name))(input)?;
        Ok((input, Element::leaf(start.name, text.trim())))
    } else {
        let (input, _) = misc0(input)?;
        let (input, _) = context("container end tag", end_tag(start.name))(input)?;
        Ok((input, Element::container(start.name, children)))
    }
}

/// Parses a whole document consisting of one root element.
fn document<'a, E>(input: &'a str) -> IResult<&'a str, Element, E>
where
    E: ParseError<&'a str> + ContextError<&'a str>,
{
    terminated(
        preceded(misc0, |i: &'a str| element(i, 1)),
        tuple((misc0, context("trailing input", eof))),
    )(input)
}

/// Builds the element tree of well-formed markup.
pub fn build(input: &str) -> Result<Element> {
    document::<VerboseError<&str>>(input)
        .map(|(_, root)| root)
        .map_err(|e| match e {
            Err::Incomplete(_) => Error::MalformedMarkup(String::from("incomplete input")),
            Err::Error(e) | Err::Failure(e) => Error::MalformedMarkup(convert_error(input, e)),
        })
}

#[allow(non_snake_case)]
#[cfg(test)]
mod tests {
    use test_case::test_case;

    use super::*;

    fn is_malformed(result: Result<Element>) -> bool {
        matches!(result, Err(Error::MalformedMarkup(_)))
    }

    #[test]
    fn build__leaf() {
        assert_eq!(build("<CODE>0</CODE>"), Ok(Element::leaf("CODE", "0")));
    }

    #[test]
    fn build__leaf_text_is_trimmed_and_decoded() {
        assert_eq!(
            build("<MEMO>\n  A &amp; B &lt;C&gt;  \n</MEMO>"),
            Ok(Element::leaf("MEMO", "A & B <C>"))
        );
    }

    #[test_case("<MEMO></MEMO>"           ; "explicit end tag"           )]
    #[test_case("<MEMO/>"                 ; "self-closing"               )]
    #[test_case("<MEMO>  \r\n</MEMO>"     ; "whitespace only"            )]
    #[test_case("<MEMO><!-- c --></MEMO>" ; "comment only"               )]
    #[test_case("<MEMO> <?pi x?> </MEMO>" ; "processing instruction only")]
    fn build__empty_leaf(input: &str) {
        assert_eq!(build(input), Ok(Element::leaf("MEMO", "")));
    }

    #[test]
    fn build__nested() {
        assert_eq!(
            build("<STATUS>\n  <CODE>0</CODE>\n  <SEVERITY>INFO</SEVERITY>\n</STATUS>"),
            Ok(Element::Container {
                name: String::from("STATUS"),
                children: vec![
                    Child::Single(Element::leaf("CODE", "0")),
                    Child::Single(Element::leaf("SEVERITY", "INFO")),
                ],
            })
        );
    }

    #[test]
    fn build__repeated_siblings_collapse_into_sequence() {
        let root = build(
            "<LIST><DTSTART>1</DTSTART><ITEM>a</ITEM><ITEM>b</ITEM><DTEND>2</DTEND><ITEM>c</ITEM></LIST>",
        );

        assert_eq!(
            root,
            Ok(Element::Container {
                name: String::from("LIST"),
                children: vec![
                    Child::Single(Element::leaf("DTSTART", "1")),
                    Child::Sequence(vec![
                        Element::leaf("ITEM", "a"),
                        Element::leaf("ITEM", "b"),
                        Element::leaf("ITEM", "c"),
                    ]),
                    Child::Single(Element::leaf("DTEND", "2")),
                ],
            })
        );
    }

    #[test]
    fn build__nested_same_name() {
        let root = build("<A><A><B>x</B></A></A>").unwrap();
        let inner = &root.get("A").unwrap().elements()[0];

        assert_eq!(inner.get("B").unwrap().elements(), &[Element::leaf("B", "x")]);
    }

    #[test_case("<MEMO>abc<!-- c --></MEMO>"     ; "after text" )]
    #[test_case("<MEMO><!-- c -->abc</MEMO>"     ; "before text")]
    #[test_case("<MEMO>a<!-- c -->b<?x?>c</MEMO>"; "inside text")]
    fn build__comments_in_leaf_text_are_skipped(input: &str) {
        assert_eq!(build(input), Ok(Element::leaf("MEMO", "abc")));
    }

    #[test]
    fn build__skips_comments_and_attributes() {
        assert_eq!(
            build("<!-- head --><OFX version=\"2\"><!-- c --><CODE>0</CODE></OFX>\n"),
            Ok(Element::container("OFX", vec![Element::leaf("CODE", "0")]))
        );
    }

    #[test_case("<CODE>0"                              ; "unterminated leaf"     )]
    #[test_case("<STATUS><CODE>0</CODE>"               ; "unterminated container")]
    #[test_case("<STATUS><CODE>0<SEVERITY>INFO</STATUS>"; "sgml leaves"          )]
    #[test_case("<A>text<B>x</B></A>"                  ; "text before child"     )]
    #[test_case("<A><B>x</B>text</A>"                  ; "text after child"      )]
    #[test_case("<A><B>x</A></B>"                      ; "crossed tags"          )]
    #[test_case("<A>x</A><B>y</B>"                     ; "two roots"             )]
    #[test_case("junk<A>x</A>"                         ; "leading text"          )]
    #[test_case(""                                     ; "empty"                 )]
    fn build__malformed(input: &str) {
        assert!(is_malformed(build(input)));
    }

    fn nested(depth: usize) -> String {
        format!(
            "{}<X>1</X>{}",
            "<A>".repeat(depth - 1),
            "</A>".repeat(depth - 1)
        )
    }

    #[test]
    fn build__nesting_up_to_limit() {
        let mut element = &build(&nested(MAX_DEPTH)).unwrap();
        for _ in 1..MAX_DEPTH {
            element = &element.get("A").or_else(|| element.get("X")).unwrap().elements()[0];
        }

        assert_eq!(element, &Element::leaf("X", "1"));
    }

    #[test_case(MAX_DEPTH + 1 ; "just over the limit")]
    #[test_case(5000          ; "far over the limit" )]
    fn build__nesting_too_deep(depth: usize) {
        assert!(is_malformed(build(&nested(depth))));
    }

    #[test]
    fn child__shapes_expose_uniform_elements() {
        let single = Child::Single(Element::leaf("X", "1"));
        let sequence = Child::Sequence(vec![Element::leaf("X", "1"), Element::leaf("X", "2")]);

        assert_eq!(single.name(), "X");
        assert_eq!(single.elements().len(), 1);
        assert_eq!(sequence.name(), "X");
        assert_eq!(sequence.elements().len(), 2);
    }
}
