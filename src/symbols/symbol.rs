use std::fmt;
use std::hash::{Hash, Hasher};

use smol_str::SmolStr;

/// An immutable structural path used as a resolution key.
///
/// Components compare case-insensitively: two symbols are equal iff they
/// have the same number of components and every pair of components matches
/// ignoring ASCII case. A symbol never changes once built; renames produce
/// new symbols.
#[derive(Clone, Debug, Eq)]
pub struct Symbol {
    parts: Vec<SmolStr>,
}

impl Symbol {
    pub fn from_parts<I, S>(parts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<SmolStr>,
    {
        Self {
            parts: parts.into_iter().map(Into::into).collect(),
        }
    }

    /// Split a dotted qualified name (`Model1.Customer`) into components.
    pub fn from_dotted(raw: &str) -> Self {
        Self::from_parts(raw.split('.'))
    }

    /// A new symbol with one more trailing component.
    pub fn child(&self, part: impl Into<SmolStr>) -> Self {
        let mut parts = self.parts.clone();
        parts.push(part.into());
        Self { parts }
    }

    pub fn parts(&self) -> &[SmolStr] {
        &self.parts
    }

    pub fn len(&self) -> usize {
        self.parts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    /// Final path component, if any.
    pub fn last(&self) -> Option<&str> {
        self.parts.last().map(|p| p.as_str())
    }
}

impl PartialEq for Symbol {
    fn eq(&self, other: &Self) -> bool {
        self.parts.len() == other.parts.len()
            && self
                .parts
                .iter()
                .zip(&other.parts)
                .all(|(a, b)| a.eq_ignore_ascii_case(b))
    }
}

impl Hash for Symbol {
    fn hash<H: Hasher>(&self, state: &mut H) {
        for part in &self.parts {
            for byte in part.bytes() {
                state.write_u8(byte.to_ascii_lowercase());
            }
            // Component separator so ["ab","c"] != ["a","bc"]
            state.write_u8(0);
        }
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (index, part) in self.parts.iter().enumerate() {
            if index > 0 {
                f.write_str(".")?;
            }
            f.write_str(part)?;
        }
        Ok(())
    }
}

/// Pairs the symbol a reference is expected to resolve under with the raw
/// reference text it was computed from.
#[derive(Clone, Debug, PartialEq)]
pub struct NormalizedName {
    pub symbol: Symbol,
    pub raw: SmolStr,
}

impl NormalizedName {
    pub fn new(symbol: Symbol, raw: impl Into<SmolStr>) -> Self {
        Self {
            symbol,
            raw: raw.into(),
        }
    }
}
