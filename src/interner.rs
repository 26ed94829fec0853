use std::hash::{BuildHasher, Hasher};

use string_interner::{DefaultBackend, DefaultSymbol, StringInterner};
use tracing::debug;

use crate::error::ArenaError;

/// Multiplier of the polynomial rolling hash.
const HASH_BASE: u64 = 257;

/// Polynomial rolling hash over bytes: `h = h * 257 + b`.
///
/// The table masks the hash down to its power-of-two bucket count, so
/// `finish` scatters the accumulated value over all 64 bits first; short
/// identifiers would otherwise differ only in their low bits.
#[derive(Debug, Clone, Copy, Default)]
pub struct RollingHasher {
    hash: u64,
}

impl Hasher for RollingHasher {
    fn write(&mut self, bytes: &[u8]) {
        for &byte in bytes {
            self.hash = self
                .hash
                .wrapping_mul(HASH_BASE)
                .wrapping_add(u64::from(byte));
        }
    }

    fn finish(&self) -> u64 {
        self.hash.wrapping_mul(0x9E37_79B9_7F4A_7C15)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct RollingHashBuilder;

impl BuildHasher for RollingHashBuilder {
    type Hasher = RollingHasher;

    fn build_hasher(&self) -> RollingHasher {
        RollingHasher::default()
    }
}

/// Handle to a piece of interned text.
///
/// Two handles from the same table are equal exactly when their contents are,
/// so identifier comparison never touches the bytes. The generation ties a
/// handle to one lifetime of the table; a reset invalidates it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Text {
    symbol: DefaultSymbol,
    generation: u32,
}

/// Content-addressed table holding one canonical copy of every text.
pub struct Interner {
    table: StringInterner<DefaultBackend, RollingHashBuilder>,
    generation: u32,
}

impl Default for Interner {
    fn default() -> Self {
        Self::new()
    }
}

impl Interner {
    pub fn new() -> Self {
        Interner {
            table: StringInterner::with_hasher(RollingHashBuilder),
            generation: 0,
        }
    }

    fn handle(&self, symbol: DefaultSymbol) -> Text {
        Text {
            symbol,
            generation: self.generation,
        }
    }

    /// Intern a string and return its canonical handle
    pub fn intern(&mut self, text: &str) -> Text {
        let symbol = self.table.get_or_intern(text);
        self.handle(symbol)
    }

    /// Look a string up without interning it
    pub fn get(&self, text: &str) -> Option<Text> {
        self.table.get(text).map(|symbol| self.handle(symbol))
    }

    /// Resolve a handle back to its contents.
    pub fn resolve(&self, text: Text) -> Result<&str, ArenaError> {
        let stale = ArenaError::StaleText {
            generation: text.generation,
        };
        if text.generation != self.generation {
            return Err(stale);
        }
        self.table.resolve(text.symbol).ok_or(stale)
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    pub fn generation(&self) -> u32 {
        self.generation
    }

    /// Drop every interned string. Handles issued before the reset no longer
    /// resolve.
    pub fn reset(&mut self) {
        debug!(
            strings = self.table.len(),
            generation = self.generation,
            "clearing interned text"
        );
        self.table = StringInterner::with_hasher(RollingHashBuilder);
        self.generation = self.generation.wrapping_add(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hash_of(bytes: &[u8]) -> u64 {
        let mut hasher = RollingHashBuilder.build_hasher();
        hasher.write(bytes);
        hasher.hash
    }

    #[test]
    fn test_intern_same_string_returns_same_text() {
        let mut interner = Interner::new();
        let a = interner.intern("foo");
        let b = interner.intern("foo");
        assert_eq!(a, b);
        assert_eq!(interner.len(), 1);
    }

    #[test]
    fn test_intern_different_strings_returns_different_text() {
        let mut interner = Interner::new();
        assert_ne!(interner.intern("foo"), interner.intern("bar"));
        assert_ne!(interner.intern("ab"), interner.intern("ba"));
    }

    #[test]
    fn test_resolve_returns_original_string() {
        let mut interner = Interner::new();
        let text = interner.intern("hello world");
        assert_eq!(interner.resolve(text).unwrap(), "hello world");
    }

    #[test]
    fn test_empty_string_is_interned() {
        let mut interner = Interner::new();
        let text = interner.intern("");
        assert_eq!(interner.resolve(text).unwrap(), "");
        assert_eq!(interner.get(""), Some(text));
    }

    #[test]
    fn test_get_does_not_intern() {
        let mut interner = Interner::new();
        assert_eq!(interner.get("missing"), None);
        assert!(interner.is_empty());
        let text = interner.intern("present");
        assert_eq!(interner.get("present"), Some(text));
    }

    #[test]
    fn test_rolling_hash_is_polynomial() {
        assert_eq!(hash_of(b""), 0);
        assert_eq!(hash_of(b"a"), 97);
        assert_eq!(hash_of(b"ab"), 97 * 257 + 98);
    }

    #[test]
    fn test_reset_empties_table() {
        let mut interner = Interner::new();
        interner.intern("x");
        interner.intern("y");
        interner.reset();
        assert!(interner.is_empty());
        assert_eq!(interner.get("x"), None);
    }

    #[test]
    fn test_handle_from_before_reset_is_stale() {
        let mut interner = Interner::new();
        let hello = interner.intern("hello");
        interner.reset();
        let other = interner.intern("other");

        assert_eq!(
            interner.resolve(hello),
            Err(ArenaError::StaleText { generation: 0 })
        );
        assert_eq!(interner.resolve(other).unwrap(), "other");
        assert_ne!(hello, other);
        assert_eq!(interner.generation(), 1);
    }
}
