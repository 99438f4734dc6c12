//! Core types: Symbol, Date

use std::fmt;

/// Calendar date of a closing price. Intraday timing is not modelled.
pub type Date = chrono::NaiveDate;

/// Maximum number of bytes a [`Symbol`] can hold.
pub const SYMBOL_CAPACITY: usize = 16;

/// Instrument identifier stored inline (no heap allocation).
///
/// Symbols are `Copy`, so they can be used freely as map keys and
/// in per-column lookup tables. At most [`SYMBOL_CAPACITY`] bytes.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Symbol {
    len: u8,
    bytes: [u8; SYMBOL_CAPACITY],
}

impl Symbol {
    /// Create a symbol from a string.
    ///
    /// # Panics
    ///
    /// Panics if `s` is empty or longer than [`SYMBOL_CAPACITY`] bytes.
    /// Use [`Symbol::try_new`] for untrusted input.
    pub fn new(s: &str) -> Self {
        match Self::try_new(s) {
            Some(sym) => sym,
            None => panic!("invalid symbol {s:?}: must be 1..={SYMBOL_CAPACITY} bytes"),
        }
    }

    /// Create a symbol, returning `None` if `s` is empty or too long.
    pub fn try_new(s: &str) -> Option<Self> {
        let raw = s.as_bytes();
        if raw.is_empty() || raw.len() > SYMBOL_CAPACITY {
            return None;
        }
        let mut bytes = [0u8; SYMBOL_CAPACITY];
        bytes[..raw.len()].copy_from_slice(raw);
        Some(Self {
            len: raw.len() as u8,
            bytes,
        })
    }

    /// The symbol as a string slice.
    pub fn as_str(&self) -> &str {
        // Constructed only from a valid &str, so the prefix is valid UTF-8.
        std::str::from_utf8(&self.bytes[..self.len as usize]).unwrap_or_default()
    }
}

impl PartialOrd for Symbol {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Symbol {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.as_str().cmp(other.as_str())
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Debug for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Symbol({})", self.as_str())
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for Symbol {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

#[cfg(feature = "serde")]
impl<'de> serde::Deserialize<'de> for Symbol {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = <std::borrow::Cow<'de, str>>::deserialize(deserializer)?;
        Symbol::try_new(&s).ok_or_else(|| {
            serde::de::Error::custom(format!(
                "symbol {s:?} must be 1..={SYMBOL_CAPACITY} bytes"
            ))
        })
    }
}

/// Format a symbol list as `A, B, C` for error messages.
pub(crate) fn join_symbols(symbols: &[Symbol]) -> String {
    symbols
        .iter()
        .map(Symbol::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}
