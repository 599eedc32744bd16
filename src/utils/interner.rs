//! Global string interner.
//!
//! Uniform names, texture slots, vertex attribute names and shader define
//! symbols are compared constantly on the bind path; interning turns those
//! comparisons into integer comparisons with consistent hashing.

use lasso::{Spur, ThreadedRodeo};
use std::sync::OnceLock;

static INTERNER: OnceLock<ThreadedRodeo> = OnceLock::new();

/// A compact integer identifier for an interned string.
pub type Symbol = Spur;

fn rodeo() -> &'static ThreadedRodeo {
    INTERNER.get_or_init(ThreadedRodeo::new)
}

/// Intern a string, returning its [`Symbol`].
///
/// Returns the existing Symbol when the string is already in the pool.
#[inline]
pub fn intern(s: &str) -> Symbol {
    rodeo().get_or_intern(s)
}

/// Look up the Symbol of an already-interned string without allocating.
#[inline]
#[must_use]
pub fn get(s: &str) -> Option<Symbol> {
    rodeo().get(s)
}

/// Resolve a Symbol back to its string.
#[inline]
#[must_use]
pub fn resolve(sym: Symbol) -> &'static str {
    rodeo().resolve(&sym)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_intern_and_resolve() {
        let s1 = intern("diffuse_color");
        let s2 = intern("diffuse_color");
        let s3 = intern("specular_color");

        assert_eq!(s1, s2);
        assert_ne!(s1, s3);

        assert_eq!(resolve(s1), "diffuse_color");
        assert_eq!(resolve(s3), "specular_color");
    }

    #[test]
    fn test_get() {
        let _ = intern("existing_key");

        assert!(get("existing_key").is_some());
        assert!(get("never_interned_key").is_none());
    }
}
