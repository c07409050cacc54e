use serde::{Serialize, Serializer};

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum OfxSecurity {
    None,
    Type1,
    Unknown(String),
}

impl From<&str> for OfxSecurity {
    fn from(value: &str) -> Self {
        match value {
            "NONE" => OfxSecurity::None,
            "TYPE1" => OfxSecurity::Type1,
            other => OfxSecurity::Unknown(String::from(other)),
        }
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum OfxEncoding {
    UsAscii,
    Utf8,
    Unknown(String),
}

impl From<&str> for OfxEncoding {
    fn from(value: &str) -> Self {
        match value {
            "USASCII" => OfxEncoding::UsAscii,
            "UTF-8" => OfxEncoding::Utf8,
            other => OfxEncoding::Unknown(String::from(other)),
        }
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum OfxCharset {
    Latin1,
    WindowsLatin1,
    None,
    Unknown(String),
}

impl From<&str> for OfxCharset {
    fn from(value: &str) -> Self {
        match value {
            "ISO-8859-1" => OfxCharset::Latin1,
            "1252" => OfxCharset::WindowsLatin1,
            "NONE" => OfxCharset::None,
            other => OfxCharset::Unknown(String::from(other)),
        }
    }
}

/// The header segment of an OFX document.
///
/// Entries keep the order in which their keys first appeared. Inserting a key that is already
/// present replaces its value in place, so the last occurrence in a document wins.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct HeaderMap {
    entries: Vec<(String, String)>,
}

impl HeaderMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a header value, returning the value it replaced.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) -> Option<String> {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, existing)) => Some(std::mem::replace(existing, value)),
            None => {
                self.entries.push((key, value));
                None
            }
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// The version of the header portion of the document: `100` for SGML documents, `200` for
    /// XML ones.
    pub fn header_version(&self) -> Option<u32> {
        self.get("OFXHEADER").and_then(|v| v.parse().ok())
    }

    /// The version of the content portion of the document.
    pub fn version(&self) -> Option<u32> {
        self.get("VERSION").and_then(|v| v.parse().ok())
    }

    /// The type of application-level security used for the `<OFX>` block.
    pub fn security(&self) -> Option<OfxSecurity> {
        self.get("SECURITY").map(OfxSecurity::from)
    }

    /// The text encoding used for character data.
    pub fn encoding(&self) -> Option<OfxEncoding> {
        self.get("ENCODING").map(OfxEncoding::from)
    }

    /// The character set used for character data.
    pub fn charset(&self) -> Option<OfxCharset> {
        self.get("CHARSET").map(OfxCharset::from)
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for HeaderMap {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let mut map = HeaderMap::new();
        for (k, v) in iter {
            map.insert(k, v);
        }
        map
    }
}

impl Serialize for HeaderMap {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_map(self.iter())
    }
}
