use crate::config::loader::{FsLoader, Loader};
use crate::config::parser::{ParseWarning, Parser, SectionContext};
use crate::config::table::BindingTable;
use crate::config::transaction::TransactionQueue;
use crate::config::types::{Binding, Operation, SetOp, TransactionId};
use crate::error::{ConfError, Result};
use std::borrow::Cow;
use std::path::Path;
use tracing::{info, warn};

/// Config file read when no explicit path is given.
pub const DEFAULT_CONFIG_PATH: &str = "/etc/nfs.conf";

/// Section consulted when a `$NAME` value has no usable environment variable.
pub const ENVIRONMENT_SECTION: &str = "environment";

/// Prefix marking a value as an indirection.
pub const SIGIL: char = '$';

/// A value as seen by readers, after indirection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Resolved<'a> {
	pub value: Cow<'a, str>,
	pub quoted: bool,
}

/// Transactional configuration store.
///
/// Owns the live binding table, the queue of staged operations and the
/// transaction counter. Reloading needs `&mut self`, so readers holding
/// `&ConfStore` can never observe a half-applied transaction.
pub struct ConfStore {
	pub(crate) table: BindingTable,
	queue: TransactionQueue,
	loader: Box<dyn Loader>,
	defaults: Vec<SetOp>,
}

impl Default for ConfStore {
	fn default() -> Self {
		Self::new()
	}
}

impl ConfStore {
	/// Empty store reading files from the filesystem.
	pub fn new() -> Self {
		Self::with_loader(FsLoader)
	}

	/// Empty store reading files through `loader`.
	pub fn with_loader(loader: impl Loader + 'static) -> Self {
		ConfStore {
			table: BindingTable::new(),
			queue: TransactionQueue::new(),
			loader: Box::new(loader),
			defaults: Vec::new(),
		}
	}

	/// Register a built-in default. Defaults are applied on every (re)load after
	/// the file's own directives, so a value from the file always wins.
	pub fn register_default(&mut self, section: &str, tag: &str, value: &str) {
		self.defaults.push(SetOp::new(section, tag, value).as_default());
	}

	/// Load the config at `path`, or [`DEFAULT_CONFIG_PATH`] when `None`.
	///
	/// A missing default file is not an error. An empty store gets only the
	/// registered defaults; a store that already holds a configuration keeps it.
	pub fn init(&mut self, path: Option<&Path>) -> Result<Vec<ParseWarning>> {
		match path {
			Some(path) => self.reinit(path),
			None => match self.reload(Path::new(DEFAULT_CONFIG_PATH)) {
				Err(ConfError::ConfigNotFound { path }) if self.table.is_empty() => {
					info!(path = %path.display(), "no config file, using defaults");
					self.apply_defaults_only();
					Ok(Vec::new())
				}
				Err(ConfError::ConfigNotFound { path }) => {
					info!(path = %path.display(), "no config file, keeping previous configuration");
					Ok(Vec::new())
				}
				Err(err) => {
					warn!(path = DEFAULT_CONFIG_PATH, error = %err, "config load failed");
					Err(err)
				}
				ok => ok,
			},
		}
	}

	/// Reload from `path`.
	///
	/// The file is parsed into a fresh transaction while the current table stays
	/// live. Only when loading succeeds is the old table dropped and the
	/// transaction committed; otherwise the transaction is rolled back and the
	/// previous configuration remains in effect.
	pub fn reinit(&mut self, path: &Path) -> Result<Vec<ParseWarning>> {
		self.reload(path).inspect_err(|err| {
			warn!(path = %path.display(), error = %err, "config load failed, keeping previous configuration");
		})
	}

	fn reload(&mut self, path: &Path) -> Result<Vec<ParseWarning>> {
		let trans = self.begin();

		let text = match self.loader.load(path) {
			Ok(text) => text,
			Err(err) => {
				self.end(trans, false);
				return Err(err);
			}
		};

		let origin = path.display().to_string();
		let warnings = self.parse_into(trans, &text, &origin);
		self.queue_defaults(trans);

		self.table.clear();
		self.end(trans, true);
		info!(path = %origin, bindings = self.table.len(), "configuration loaded");
		Ok(warnings)
	}

	/// Parse `text` into transaction `trans` without committing it.
	pub fn parse_into(&mut self, trans: TransactionId, text: &str, origin: &str) -> Vec<ParseWarning> {
		let mut parser = Parser::new(trans, &mut self.queue, self.loader.as_ref());
		parser.parse(text, origin, &mut SectionContext::default());
		parser.finish()
	}

	/// Drop the table and every in-flight operation.
	pub fn cleanup(&mut self) {
		self.table.clear();
		self.queue.clear();
	}

	/// Start a transaction.
	pub fn begin(&mut self) -> TransactionId {
		self.queue.begin()
	}

	/// Queue a `Set` under `trans`.
	pub fn queue_set(&mut self, trans: TransactionId, set: SetOp) -> Result<()> {
		self.queue.push(trans, Operation::Set(set))
	}

	/// Queue removal of one (section, tag) binding under `trans`.
	pub fn queue_remove(&mut self, trans: TransactionId, section: &str, tag: &str) -> Result<()> {
		self.queue.push(
			trans,
			Operation::RemoveTag {
				section: section.to_string(),
				tag: tag.to_string(),
			},
		)
	}

	/// Queue removal of a whole section under `trans`.
	pub fn queue_remove_section(&mut self, trans: TransactionId, section: &str) -> Result<()> {
		self.queue.push(
			trans,
			Operation::RemoveSection {
				section: section.to_string(),
			},
		)
	}

	/// Finish `trans`, applying its operations if `commit`. Returns the number of
	/// operations drained from the queue.
	pub fn end(&mut self, trans: TransactionId, commit: bool) -> usize {
		self.queue.end(trans, commit, &mut self.table)
	}

	/// Number of staged operations across all open transactions.
	pub fn pending(&self) -> usize {
		self.queue.len()
	}

	/// Number of live bindings.
	pub fn len(&self) -> usize {
		self.table.len()
	}

	pub fn is_empty(&self) -> bool {
		self.table.is_empty()
	}

	/// Raw binding lookup, without indirection.
	pub fn binding(&self, section: &str, arg: Option<&str>, tag: &str) -> Option<&Binding> {
		self.table.find(section, arg, tag)
	}

	/// Resolve (section, arg, tag) to its effective value.
	pub fn get_section(&self, section: &str, arg: Option<&str>, tag: &str) -> Option<Cow<'_, str>> {
		self.resolve(section, arg, tag).map(|r| r.value)
	}

	/// Follow `$NAME` indirections: environment variable `NAME` when set and
	/// non-empty, otherwise tag `NAME` of the `[environment]` section.
	pub(crate) fn resolve(&self, section: &str, arg: Option<&str>, tag: &str) -> Option<Resolved<'_>> {
		let mut binding = self.table.find(section, arg, tag)?;
		let mut followed: Vec<&str> = Vec::new();

		loop {
			let Some(name) = binding.value.strip_prefix(SIGIL) else {
				return Some(Resolved {
					value: Cow::Borrowed(&binding.value),
					quoted: binding.quoted,
				});
			};

			if let Some(value) = env_value(name) {
				return Some(Resolved {
					value: Cow::Owned(value),
					quoted: false,
				});
			}

			if followed.iter().any(|seen| seen.eq_ignore_ascii_case(name)) {
				warn!(section, tag, name, "indirection cycle through [environment]");
				return None;
			}
			followed.push(name);

			binding = self.table.find(ENVIRONMENT_SECTION, None, name)?;
		}
	}

	fn queue_defaults(&mut self, trans: TransactionId) {
		for set in &self.defaults {
			if let Err(err) = self.queue.push(trans, Operation::Set(set.clone())) {
				warn!(section = %set.section, tag = %set.tag, error = %err, "default rejected");
			}
		}
	}

	fn apply_defaults_only(&mut self) {
		let trans = self.begin();
		self.queue_defaults(trans);
		self.table.clear();
		self.end(trans, true);
	}
}

/// Non-empty environment variable, skipping names the platform cannot hold.
fn env_value(name: &str) -> Option<String> {
	if name.is_empty() || name.contains(['=', '\0']) {
		return None;
	}
	std::env::var(name).ok().filter(|v| !v.is_empty())
}
