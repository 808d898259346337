//! Seed loader for SRM rule sets.
//!
//! A seed document `{rule_set: {...}, rules: [...]}` is validated into a
//! [`SeedDocument`] first and only then handed to the rule store in a single
//! write, so a rejected document never leaves a partial rule set behind.

#![deny(unsafe_code)]
#![cfg_attr(feature = "strict-docs", warn(missing_docs))]
#![cfg_attr(not(feature = "strict-docs"), allow(missing_docs))]
#![warn(rust_2018_idioms)]

mod document;
mod error;
mod loader;
mod validate;

pub use document::SeedDocument;
pub use error::{SeedError, SeedResult};
pub use loader::SeedLoader;
