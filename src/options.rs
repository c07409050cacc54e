use serde::Deserialize;

/// Settings for [`parse_with`](crate::parse_with).
///
/// Deserializable so that a host application can keep them in its own configuration.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
#[serde(default)]
pub struct ParseOptions {
    /// Retry a body that is not well-formed after normalizing it as OFX 1.x SGML.
    pub sgml_fallback: bool,
    /// Accept full OFX date-times such as `20210601120000.000[-3:BRT]`, keeping only their
    /// calendar date. When unset, dates must be exactly `YYYYMMDD`.
    pub lenient_dates: bool,
}

impl Default for ParseOptions {
    fn default() -> Self {
        ParseOptions {
            sgml_fallback: true,
            lenient_dates: false,
        }
    }
}
