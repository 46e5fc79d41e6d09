use std::fmt;

/// Identifier shared by every operation staged in one transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TransactionId(pub u64);

impl fmt::Display for TransactionId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "#{}", self.0)
	}
}

/// A resolved configuration fact owned by the binding table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Binding {
	/// Section name, lower-cased.
	pub section: String,

	/// Optional argument qualifying the section instance, e.g. `[export "/srv"]`.
	pub arg: Option<String>,

	pub tag: String,

	/// Raw value text. Never empty.
	pub value: String,

	/// Whether the value was written as a quoted literal.
	pub quoted: bool,

	/// Built-in fallback rather than a value read from a file.
	pub is_default: bool,

	/// Table-wide insertion sequence; higher is more recent.
	pub seq: u64,
}

impl Binding {
	/// Whether this binding belongs to `section` and `tag`, ignoring case.
	pub fn matches(&self, section: &str, tag: &str) -> bool {
		self.section.eq_ignore_ascii_case(section) && self.tag.eq_ignore_ascii_case(tag)
	}

	/// Argument filter used by lookups: `None` accepts any argument.
	pub fn matches_arg(&self, arg: Option<&str>) -> bool {
		match (arg, self.arg.as_deref()) {
			(None, _) => true,
			(Some(wanted), Some(stored)) => wanted.eq_ignore_ascii_case(stored),
			(Some(_), None) => false,
		}
	}
}

/// A staged `Set` mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetOp {
	pub section: String,
	pub arg: Option<String>,
	pub tag: String,
	pub value: String,

	/// Replace an existing (section, tag) binding instead of keeping it.
	pub override_existing: bool,

	pub is_default: bool,
	pub quoted: bool,
}

impl SetOp {
	/// Plain assignment: no argument, no override, not a default.
	pub fn new(section: impl Into<String>, tag: impl Into<String>, value: impl Into<String>) -> Self {
		SetOp {
			section: section.into(),
			arg: None,
			tag: tag.into(),
			value: value.into(),
			override_existing: false,
			is_default: false,
			quoted: false,
		}
	}

	pub fn with_arg(mut self, arg: Option<&str>) -> Self {
		self.arg = arg.map(str::to_string);
		self
	}

	pub fn overriding(mut self) -> Self {
		self.override_existing = true;
		self
	}

	pub fn as_default(mut self) -> Self {
		self.is_default = true;
		self
	}

	pub fn quoted(mut self, quoted: bool) -> Self {
		self.quoted = quoted;
		self
	}
}

/// Kinds of staged mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
	Set(SetOp),
	RemoveTag { section: String, tag: String },
	RemoveSection { section: String },
}

impl Operation {
	pub fn section(&self) -> &str {
		match self {
			Operation::Set(set) => &set.section,
			Operation::RemoveTag { section, .. } | Operation::RemoveSection { section } => section,
		}
	}
}

/// An operation waiting in the transaction queue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingOp {
	pub transaction: TransactionId,
	pub op: Operation,
}

/// Outcome of applying a `Set` to the table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetOutcome {
	Inserted,
	Duplicate,
	EmptyValue,
}

#[cfg(test)]
mod tests {
	use super::*;

	fn binding(arg: Option<&str>) -> Binding {
		Binding {
			section: "nfsd".to_string(),
			arg: arg.map(str::to_string),
			tag: "Threads".to_string(),
			value: "8".to_string(),
			quoted: false,
			is_default: false,
			seq: 0,
		}
	}

	#[test]
	fn test_matches_ignores_case() {
		let b = binding(None);
		assert!(b.matches("NFSD", "threads"));
		assert!(!b.matches("mountd", "threads"));
	}

	#[test]
	fn test_matches_arg() {
		let with_arg = binding(Some("Local"));
		assert!(with_arg.matches_arg(None));
		assert!(with_arg.matches_arg(Some("local")));
		assert!(!with_arg.matches_arg(Some("remote")));
		assert!(!binding(None).matches_arg(Some("local")));
	}

	#[test]
	fn test_set_op_builder() {
		let op = SetOp::new("general", "pipefs-directory", "/run/rpc_pipefs")
			.with_arg(Some("x"))
			.overriding()
			.as_default();
		assert_eq!(op.arg.as_deref(), Some("x"));
		assert!(op.override_existing);
		assert!(op.is_default);
		assert!(!op.quoted);
	}
}
