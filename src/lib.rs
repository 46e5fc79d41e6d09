//! nfsconf - transactional store for INI-style NFS configuration files.
//!
//! This library provides:
//! - A line parser for `[section "arg"]` headers, `tag = value` assignments,
//!   comments, quoting, continuation lines and `include` directives
//! - A transaction queue staging parsed directives until they are committed
//! - A binding table with case-insensitive lookup and `$NAME` indirection
//! - Typed accessors and a dump of the effective configuration
//!
//! # Example
//!
//! ```no_run
//! use nfsconf::config::ConfStore;
//!
//! let mut store = ConfStore::new();
//! store.register_default("nfsd", "threads", "8");
//! let warnings = store.init(None).unwrap();
//! for warning in &warnings {
//!     eprintln!("{warning}");
//! }
//!
//! let threads = store.get_num("nfsd", "threads", 8);
//! let versions = store.get_list("nfsd", "vers");
//! println!("{threads} threads, versions {versions:?}");
//! ```

pub mod codec;
pub mod config;
pub mod error;
pub mod logging;

pub use config::ConfStore;
pub use error::{ConfError, Result};
