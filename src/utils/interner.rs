//! Global String Interner
//!
//! Converts context token names into compact integer symbols so that
//! engine-defined [`ContextKey::Named`](crate::renderer::graph::ContextKey::Named)
//! keys hash and compare as cheaply as the built-in ones.

use std::sync::LazyLock;

use lasso::{Spur, ThreadedRodeo};

static INTERNER: LazyLock<ThreadedRodeo> = LazyLock::new(ThreadedRodeo::new);

/// Symbol type alias.
pub type Symbol = Spur;

/// Interns a string, returning its symbol.
///
/// Returns the existing symbol if the string was interned before.
#[inline]
pub fn intern(s: &str) -> Symbol {
    INTERNER.get_or_intern(s)
}

/// Looks up the symbol of an already interned string without allocating.
#[inline]
pub fn get(s: &str) -> Option<Symbol> {
    INTERNER.get(s)
}

/// Resolves a symbol back to its string.
#[inline]
pub fn resolve(sym: Symbol) -> &'static str {
    INTERNER.resolve(&sym)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_intern_and_resolve() {
        let s1 = intern("oitRequestFlag");
        let s2 = intern("oitRequestFlag");
        let s3 = intern("aovBindings");

        assert_eq!(s1, s2);
        assert_ne!(s1, s3);

        assert_eq!(resolve(s1), "oitRequestFlag");
        assert_eq!(resolve(s3), "aovBindings");
    }

    #[test]
    fn test_get() {
        let _ = intern("selectionBuffer");

        assert!(get("selectionBuffer").is_some());
        assert!(get("never_interned_token").is_none());
    }
}
