// Hardware address normalization
//
// Five textual layouts are accepted: colon pairs, hyphen pairs, one
// hyphen between two six-digit halves, dotted quads, and bare hex.
// The address is kept as twelve lowercase hex digits and rendered into
// any layout on demand.

use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::CoreError;

static MAC_GRAMMAR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?ix)^(?:
            (?:[0-9a-f]{2}-){5}[0-9a-f]{2}
          | (?:[0-9a-f]{2}:){5}[0-9a-f]{2}
          | [0-9a-f]{6}-[0-9a-f]{6}
          | (?:[0-9a-f]{4}\.){2}[0-9a-f]{4}
          | [0-9a-f]{12}
        )$",
    )
    .expect("MAC_GRAMMAR is a valid regex pattern")
});

/// Target layout for [`MacAddress::render`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MacLayout {
    /// `aa:bb:cc:dd:ee:ff`
    Colon,
    /// `aabb.ccdd.eeff`
    Dot,
    /// `aa-bb-cc-dd-ee-ff`
    Hyphen,
    /// `aabbcc-ddeeff`
    Midpoint,
}

impl MacLayout {
    fn group_and_separator(self) -> (usize, char) {
        match self {
            Self::Colon => (2, ':'),
            Self::Dot => (4, '.'),
            Self::Hyphen => (2, '-'),
            Self::Midpoint => (6, '-'),
        }
    }
}

/// A validated six-octet hardware address.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct MacAddress(String);

impl MacAddress {
    /// Matches `raw` exactly; surrounding whitespace is rejected.
    pub fn parse(raw: &str) -> Result<Self, CoreError> {
        if !MAC_GRAMMAR.is_match(raw) {
            return Err(CoreError::validation(format!(
                "'{raw}' is not a valid MAC address"
            )));
        }
        let bare = raw
            .chars()
            .filter(char::is_ascii_hexdigit)
            .map(|c| c.to_ascii_lowercase())
            .collect();
        Ok(Self(bare))
    }

    /// Twelve lowercase hex digits, no delimiter.
    pub fn as_bare(&self) -> &str {
        &self.0
    }

    pub fn render(&self, layout: MacLayout) -> String {
        let (group, separator) = layout.group_and_separator();
        let mut out = String::with_capacity(17);
        for (i, c) in self.0.chars().enumerate() {
            if i > 0 && i % group == 0 {
                out.push(separator);
            }
            out.push(c);
        }
        out
    }
}

impl fmt::Display for MacAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render(MacLayout::Colon))
    }
}

impl FromStr for MacAddress {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for MacAddress {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<MacAddress> for String {
    fn from(mac: MacAddress) -> Self {
        mac.render(MacLayout::Colon)
    }
}
