//! SRM advisor storage.
//!
//! Two stores sit behind explicit traits:
//! - the rule store, holding versioned rule sets and their rules
//! - the assessment log, an append-only record of past evaluations
//!
//! Design stance:
//! - the seed write path is the only writer and runs as one transaction
//! - readers take a whole rule set snapshot in one consistent read

#![deny(unsafe_code)]
#![cfg_attr(feature = "strict-docs", warn(missing_docs))]
#![cfg_attr(not(feature = "strict-docs"), allow(missing_docs))]
#![warn(rust_2018_idioms)]

mod error;
pub mod memory;
mod model;
#[cfg(feature = "sqlite")]
pub mod sqlite;
mod traits;

pub use error::{StorageError, StorageResult};
pub use memory::InMemoryStorage;
pub use model::{AssessmentRecord, NewAssessmentRecord};
#[cfg(feature = "sqlite")]
pub use sqlite::SqliteStorage;
pub use traits::{AssessmentLog, RuleSetWrite, RuleStore};
