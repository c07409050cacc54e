//! Converts OFX bank statements, whether legacy SGML or well-formed XML, into one normalized
//! record of headers, account identity, balance and transactions.
//!
//! ```
//! let document = "OFXHEADER:100\nDATA:OFXSGML\nVERSION:102\n\n\
//!     <OFX><SIGNONMSGSRSV1><SONRS><LANGUAGE>ENG<FI><ORG>Bank<FID>42</FI></SONRS></SIGNONMSGSRSV1>\
//!     <BANKMSGSRSV1><STMTTRNRS><STMTRS><CURDEF>USD<BANKACCTFROM><ACCTID>1</BANKACCTFROM>\
//!     <BANKTRANLIST><STMTTRN><TRNTYPE>DEP<DTPOSTED>20210601<TRNAMT>10,00<FITID>1</STMTTRN>\
//!     </BANKTRANLIST><LEDGERBAL><BALAMT>10.00<DTASOF>20210601</LEDGERBAL>\
//!     </STMTRS></STMTTRNRS></BANKMSGSRSV1></OFX>";
//!
//! let statement = ofx_normalize::parse(document)?;
//! assert_eq!(statement.header.get("VERSION"), Some("102"));
//! assert_eq!(statement.info.bank_name, "Bank");
//! assert_eq!(statement.transactions[0].amount, statement.info.balance.amount);
//! # Ok::<(), ofx_normalize::Error>(())
//! ```

mod error;
mod map;
mod options;

pub mod ofx;
pub mod parse;

pub use error::{Error, Result};
pub use ofx::*;
pub use options::ParseOptions;
pub use parse::{parse, parse_with};
