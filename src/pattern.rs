//! Turning search terms into executable match patterns.
//!
//! - [`builder`] - the staged term-to-regex pipeline (wildcards, escaping,
//!   synonyms, joiner tolerance, diacritics, accuracy wrapping)
//! - [`diacritics`] - the default character equivalence classes
//! - [`groups`] - source-level classification of top-level capture groups

pub mod builder;
pub mod diacritics;
pub mod groups;

pub use self::builder::{Pattern, PatternBuilder};
pub use self::diacritics::default_diacritics_table;
pub use self::groups::top_level_groups;
