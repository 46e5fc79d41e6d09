//! The transactional configuration store.
//!
//! This module handles:
//! - Parsing INI-style config text, including includes and line continuations
//! - Staging parsed directives as operations under a transaction
//! - Committing transactions into the live binding table
//! - Typed, indirection-aware lookups and configuration dumps

pub mod loader;
pub mod parser;
pub mod query;
pub mod report;
pub mod store;
pub mod table;
pub mod transaction;
pub mod types;

pub use loader::{FsLoader, Loader};
pub use parser::{Directive, MAX_INCLUDE_DEPTH, ParseWarning, Parser, SectionContext, WarningKind, parse_line};
pub use store::{ConfStore, DEFAULT_CONFIG_PATH, ENVIRONMENT_SECTION, SIGIL};
pub use table::{BindingTable, SectionHasher, section_hash};
pub use transaction::TransactionQueue;
pub use types::{Binding, Operation, PendingOp, SetOp, SetOutcome, TransactionId};
