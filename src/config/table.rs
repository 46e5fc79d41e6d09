//! The live binding table.
//!
//! Bindings are grouped per lower-cased section name in a hash map whose
//! hasher runs the classic section fold ([`section_hash`]) over the key's hash
//! input. Inside a section the
//! bindings are kept in insertion order, so "most recently inserted wins" is a
//! reverse scan rather than a property of list-head insertion.

use crate::config::types::{Binding, SetOp, SetOutcome};
use std::collections::HashMap;
use std::hash::{BuildHasherDefault, Hasher};
use tracing::info;

/// Case-insensitive rotate-left-by-one XOR fold over a section name.
pub fn section_hash(section: &str) -> u8 {
	fold(0, section.as_bytes())
}

fn fold(hash: u8, bytes: &[u8]) -> u8 {
	bytes
		.iter()
		.fold(hash, |hash, b| hash.rotate_left(1) ^ b.to_ascii_lowercase())
}

/// [`Hasher`] applying the [`section_hash`] fold to whatever bytes it is fed.
///
/// A `str` key also feeds a trailing `0xff` terminator, so the state for a
/// map key is `section_hash(key)` folded once more with that byte.
#[derive(Debug, Default, Clone, Copy)]
pub struct SectionHasher(u8);

impl Hasher for SectionHasher {
	fn write(&mut self, bytes: &[u8]) {
		self.0 = fold(self.0, bytes);
	}

	fn finish(&self) -> u64 {
		// Spread the 256 buckets across the full word.
		u64::from(self.0).wrapping_mul(0x9E37_79B9_7F4A_7C15)
	}
}

type SectionMap = HashMap<String, Vec<Binding>, BuildHasherDefault<SectionHasher>>;

/// Resolved (section, argument, tag) → value facts.
#[derive(Debug, Default)]
pub struct BindingTable {
	sections: SectionMap,
	next_seq: u64,
}

impl BindingTable {
	pub fn new() -> Self {
		Self::default()
	}

	/// Most recent binding for (section, arg, tag); `arg = None` accepts any argument.
	pub fn find(&self, section: &str, arg: Option<&str>, tag: &str) -> Option<&Binding> {
		self.sections
			.get(&section.to_ascii_lowercase())?
			.iter()
			.rev()
			.find(|b| b.matches(section, tag) && b.matches_arg(arg))
	}

	/// Bindings of one section in insertion order.
	pub fn section(&self, section: &str) -> &[Binding] {
		self.sections
			.get(&section.to_ascii_lowercase())
			.map(Vec::as_slice)
			.unwrap_or_default()
	}

	/// Apply a staged `Set`.
	pub fn apply_set(&mut self, set: &SetOp) -> SetOutcome {
		if set.value.is_empty() {
			return SetOutcome::EmptyValue;
		}

		if set.override_existing {
			self.remove_tag(&set.section, &set.tag);
		} else if self
			.find(&set.section, set.arg.as_deref(), &set.tag)
			.is_some()
		{
			if !set.is_default {
				info!(
					section = %set.section,
					tag = %set.tag,
					"duplicate tag, ignoring"
				);
			}
			return SetOutcome::Duplicate;
		}

		let seq = self.next_seq;
		self.next_seq += 1;

		let bindings = self
			.sections
			.entry(set.section.to_ascii_lowercase())
			.or_default();

		// Last write wins for an exact (argument, tag) key.
		bindings.retain(|b| {
			!(b.tag.eq_ignore_ascii_case(&set.tag) && same_arg(b.arg.as_deref(), set.arg.as_deref()))
		});

		bindings.push(Binding {
			section: set.section.to_ascii_lowercase(),
			arg: set.arg.clone(),
			tag: set.tag.clone(),
			value: set.value.clone(),
			quoted: set.quoted,
			is_default: set.is_default,
			seq,
		});
		SetOutcome::Inserted
	}

	/// Remove the most recent (section, tag) binding, whatever its argument.
	pub fn remove_tag(&mut self, section: &str, tag: &str) -> bool {
		let key = section.to_ascii_lowercase();
		let Some(bindings) = self.sections.get_mut(&key) else {
			return false;
		};
		let Some(pos) = bindings.iter().rposition(|b| b.matches(section, tag)) else {
			return false;
		};

		let removed = bindings.remove(pos);
		info!(section = %removed.section, tag = %removed.tag, value = %removed.value, "removed");
		if bindings.is_empty() {
			self.sections.remove(&key);
		}
		true
	}

	/// Remove every binding of a section.
	pub fn remove_section(&mut self, section: &str) -> bool {
		match self.sections.remove(&section.to_ascii_lowercase()) {
			Some(bindings) => {
				for removed in &bindings {
					info!(section = %removed.section, tag = %removed.tag, value = %removed.value, "removed");
				}
				true
			}
			None => false,
		}
	}

	/// All bindings ordered by insertion across sections.
	pub fn iter_ordered(&self) -> Vec<&Binding> {
		let mut all: Vec<&Binding> = self.sections.values().flatten().collect();
		all.sort_by_key(|b| b.seq);
		all
	}

	pub fn len(&self) -> usize {
		self.sections.values().map(Vec::len).sum()
	}

	pub fn is_empty(&self) -> bool {
		self.sections.is_empty()
	}

	pub fn clear(&mut self) {
		self.sections.clear();
	}
}

fn same_arg(a: Option<&str>, b: Option<&str>) -> bool {
	match (a, b) {
		(None, None) => true,
		(Some(a), Some(b)) => a.eq_ignore_ascii_case(b),
		_ => false,
	}
}
