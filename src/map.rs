//! Maps a generic element tree onto the OFX bank statement model.

use log::trace;

use crate::error::{Error, Result};
use crate::ofx::{Balance, HeaderMap, OfxDocument, StatementInfo, Transaction};
use crate::options::ParseOptions;
use crate::parse::tree::Element;

mod coerce;

/// An element together with the path that led to it, for error reporting.
#[derive(Clone, Debug)]
struct Cursor<'a> {
    element: &'a Element,
    path: String,
}

impl<'a> Cursor<'a> {
    fn root(element: &'a Element, name: &str) -> Result<Self> {
        if element.name() == name {
            Ok(Cursor {
                element,
                path: String::from(name),
            })
        } else {
            Err(Error::FieldNotFound(String::from(name)))
        }
    }

    fn path_to(&self, name: &str) -> String {
        format!("{}/{}", self.path, name)
    }

    /// Every child with the given name, whether the tree holds one or several of them.
    fn children(&self, name: &str) -> Vec<Cursor<'a>> {
        self.element
            .get(name)
            .map(|child| child.elements())
            .unwrap_or_default()
            .iter()
            .map(|element| Cursor {
                element,
                path: self.path_to(name),
            })
            .collect()
    }

    fn opt_child(&self, name: &str) -> Option<Cursor<'a>> {
        self.element
            .get(name)
            .and_then(|child| child.elements().first())
            .map(|element| Cursor {
                element,
                path: self.path_to(name),
            })
    }

    /// The first child with the given name.
    fn child(&self, name: &str) -> Result<Cursor<'a>> {
        self.opt_child(name)
            .ok_or_else(|| Error::FieldNotFound(self.path_to(name)))
    }

    /// The text of a leaf child, if present and not empty.
    fn opt_text(&self, name: &str) -> Option<&'a str> {
        self.opt_child(name)
            .and_then(|c| c.element.text())
            .filter(|t| !t.is_empty())
    }

    /// The text of a leaf child. A container in its place counts as missing.
    fn text(&self, name: &str) -> Result<&'a str> {
        self.opt_child(name)
            .and_then(|c| c.element.text())
            .ok_or_else(|| Error::FieldNotFound(self.path_to(name)))
    }
}

fn balance(ledger: &Cursor, options: &ParseOptions) -> Result<Balance> {
    Ok(Balance {
        amount: coerce::amount(ledger.text("BALAMT")?)?,
        date: coerce::date(ledger.text("DTASOF")?, options.lenient_dates)?,
    })
}

fn transaction(stmttrn: &Cursor, options: &ParseOptions) -> Result<Transaction> {
    let payee = stmttrn.opt_text("NAME");
    Ok(Transaction {
        kind: String::from(stmttrn.text("TRNTYPE")?),
        date: coerce::date(stmttrn.text("DTPOSTED")?, options.lenient_dates)?,
        amount: coerce::amount(stmttrn.text("TRNAMT")?)?,
        id: String::from(stmttrn.text("FITID")?),
        check_number: stmttrn.opt_text("CHECKNUM").map(String::from),
        payee: payee.map(String::from),
        description: String::from(stmttrn.opt_text("MEMO").or(payee).unwrap_or_default()),
    })
}

/// Maps the tree of an `<OFX>` body onto a bank statement.
pub(crate) fn ofx_document(
    header: HeaderMap,
    root: &Element,
    options: &ParseOptions,
) -> Result<OfxDocument> {
    let ofx = Cursor::root(root, "OFX")?;

    let sonrs = ofx.child("SIGNONMSGSRSV1")?.child("SONRS")?;
    let fi = sonrs.child("FI")?;
    let stmtrs = ofx
        .child("BANKMSGSRSV1")?
        .child("STMTTRNRS")?
        .child("STMTRS")?;

    let info = StatementInfo {
        bank_name: String::from(fi.text("ORG")?),
        bank_id: String::from(fi.text("FID")?),
        bank_marketing_info: stmtrs.opt_text("MKTGINFO").map(String::from),
        account_id: String::from(stmtrs.child("BANKACCTFROM")?.text("ACCTID")?),
        currency_code: String::from(stmtrs.text("CURDEF")?),
        language: String::from(sonrs.text("LANGUAGE")?),
        balance: balance(&stmtrs.child("LEDGERBAL")?, options)?,
    };

    let transactions = stmtrs
        .child("BANKTRANLIST")?
        .children("STMTTRN")
        .iter()
        .map(|t| transaction(t, options))
        .collect::<Result<Vec<_>>>()?;
    trace!("mapped {} transactions", transactions.len());

    Ok(OfxDocument {
        header,
        info,
        transactions,
    })
}
