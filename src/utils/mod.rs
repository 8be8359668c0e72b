//! Utility Module
//!
//! - [`interner`]: String interning for efficient symbol storage
//!
//! Interned strings (Symbols) back engine-defined context keys and buffer
//! field names, and compare in O(1) time.
//!
//! ```rust,ignore
//! use myth_oit::utils::interner;
//!
//! let sym1 = interner::intern("renderTags");
//! let sym2 = interner::intern("renderTags");
//! assert_eq!(sym1, sym2); // O(1) comparison
//! ```

pub mod interner;

pub use interner::Symbol;
