//! # Origins
//!
//! A tuple origin (`scheme://host[:port]`) identifies who may receive a posted
//! message and whose inbound messages are trusted. Parsing follows the WHATWG
//! URL rules through the `url` crate, so hosts are IDNA-normalized and default
//! ports dropped. Comparison uses the ASCII serialization.

use crate::errors::OriginError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use url::{Host, Url};

/// A normalized tuple origin.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Origin {
    scheme: String,
    host: Host<String>,
    port: Option<u16>,
    serialized: String,
}

impl Origin {
    /// Parse and normalize an origin or a full URL.
    pub fn parse(raw: &str) -> Result<Self, OriginError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(OriginError::Empty);
        }
        if trimmed.eq_ignore_ascii_case("null") {
            return Err(OriginError::Opaque);
        }

        let url = Url::parse(trimmed).map_err(|source| OriginError::Invalid {
            origin: raw.to_string(),
            source,
        })?;

        let origin = url.origin();
        let serialized = origin.ascii_serialization();
        match origin {
            url::Origin::Tuple(scheme, host, _) => Ok(Self {
                scheme,
                host,
                port: url.port(),
                serialized,
            }),
            url::Origin::Opaque(_) => Err(OriginError::Opaque),
        }
    }

    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    /// Host in ASCII (punycode) form.
    pub fn host(&self) -> &Host<String> {
        &self.host
    }

    /// Explicit non-default port, if any.
    pub fn port(&self) -> Option<u16> {
        self.port
    }

    /// Whether a raw origin string reported by the transport names this origin.
    ///
    /// Unparseable input never matches.
    pub fn matches(&self, raw: &str) -> bool {
        Url::parse(raw.trim()).is_ok_and(|url| url.origin().ascii_serialization() == self.serialized)
    }
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.serialized)
    }
}

impl FromStr for Origin {
    type Err = OriginError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for Origin {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Origin {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(serde::de::Error::custom)
    }
}
