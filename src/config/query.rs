//! Typed accessors for readers of the store.
//!
//! Everything is stored as text; these helpers interpret a value only when it
//! is read.

use crate::config::store::ConfStore;
use regex::Regex;
use std::borrow::Cow;
use std::sync::LazyLock;
use tracing::info;

/// Leading integer, as accepted by `get_num`.
static INTEGER: LazyLock<Regex> =
	LazyLock::new(|| Regex::new(r"^\s*([+-]?[0-9]+)").expect("integer pattern is valid"));

/// `val` or `val,min:max`, as accepted by `match_num`.
static NUMBER_SPEC: LazyLock<Regex> = LazyLock::new(|| {
	Regex::new(r"^\s*([+-]?[0-9]+)(?:,\s*([+-]?[0-9]+)(?::\s*([+-]?[0-9]+))?)?")
		.expect("number spec pattern is valid")
});

const TRUE_WORDS: [&str; 6] = ["1", "t", "true", "y", "yes", "on"];
const FALSE_WORDS: [&str; 6] = ["0", "f", "false", "n", "no", "off"];

impl ConfStore {
	/// Value of `tag` in `section`, whatever the section argument.
	pub fn get_str(&self, section: &str, tag: &str) -> Option<Cow<'_, str>> {
		self.get_section(section, None, tag)
	}

	/// Value of `tag` in `section`, or `default` when unset.
	pub fn get_str_or<'a>(&'a self, section: &str, tag: &str, default: &'a str) -> Cow<'a, str> {
		self.get_str(section, tag).unwrap_or(Cow::Borrowed(default))
	}

	/// Leading integer of the value (surrounding text ignored), or `default`
	/// when unset or not numeric.
	pub fn get_num(&self, section: &str, tag: &str, default: i64) -> i64 {
		self.get_str(section, tag)
			.and_then(|value| leading_integer(&value))
			.unwrap_or(default)
	}

	/// Boolean interpretation of the value, or `default` when unset or not one
	/// of the recognised words.
	pub fn get_bool(&self, section: &str, tag: &str, default: bool) -> bool {
		let Some(value) = self.get_str(section, tag) else {
			return default;
		};

		if TRUE_WORDS.iter().any(|w| w.eq_ignore_ascii_case(&value)) {
			true
		} else if FALSE_WORDS.iter().any(|w| w.eq_ignore_ascii_case(&value)) {
			false
		} else {
			default
		}
	}

	/// Check `candidate` against a value of the form `val` (equality) or
	/// `val,min:max` (inclusive range).
	pub fn match_num(&self, section: &str, tag: &str, candidate: i64) -> bool {
		let Some(value) = self.get_str(section, tag) else {
			return false;
		};

		let groups = NUMBER_SPEC.captures(&value).map(|caps| {
			[1, 2, 3].map(|i| caps.get(i).and_then(|m| m.as_str().parse::<i64>().ok()))
		});

		match groups {
			Some([Some(val), None, None]) => {
				info!(section, tag, "match_num: {val}=={candidate}?");
				candidate == val
			}
			Some([Some(_), Some(min), Some(max)]) => {
				info!(section, tag, "match_num: {min}<={candidate}<={max}?");
				(min..=max).contains(&candidate)
			}
			_ => {
				info!(section, tag, value = %value, "match_num: invalid number spec");
				false
			}
		}
	}

	/// Comma-separated fields of the value, trimmed, empty fields skipped.
	/// A quoted value is returned as a single field.
	pub fn get_list(&self, section: &str, tag: &str) -> Vec<String> {
		let Some(resolved) = self.resolve(section, None, tag) else {
			return Vec::new();
		};

		if resolved.quoted {
			return vec![resolved.value.into_owned()];
		}

		resolved
			.value
			.split(',')
			.map(str::trim)
			.filter(|field| {
				if field.is_empty() {
					info!(section, tag, "get_list: empty field, ignoring");
				}
				!field.is_empty()
			})
			.map(str::to_string)
			.collect()
	}

	/// Tag names bound in `section` in insertion order, restricted to `arg`
	/// when given.
	pub fn get_tags(&self, section: &str, arg: Option<&str>) -> Vec<String> {
		self.table
			.section(section)
			.iter()
			.filter(|b| b.matches_arg(arg))
			.map(|b| b.tag.clone())
			.collect()
	}
}

fn leading_integer(value: &str) -> Option<i64> {
	INTEGER.captures(value)?.get(1)?.as_str().parse().ok()
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::config::types::SetOp;

	fn store_with(entries: &[(&str, &str, &str)]) -> ConfStore {
		let mut store = ConfStore::new();
		let t = store.begin();
		for (section, tag, value) in entries {
			store.queue_set(t, SetOp::new(*section, *tag, *value)).unwrap();
		}
		store.end(t, true);
		store
	}

	fn parsed(text: &str) -> ConfStore {
		let mut store = ConfStore::new();
		let t = store.begin();
		let warnings = store.parse_into(t, text, "inline");
		assert!(warnings.is_empty(), "unexpected warnings: {warnings:?}");
		store.end(t, true);
		store
	}

	#[test]
	fn test_get_str_or() {
		let store = store_with(&[("general", "pipefs-directory", "/run/rpc_pipefs")]);
		assert_eq!(store.get_str_or("general", "pipefs-directory", "/var/lib"), "/run/rpc_pipefs");
		assert_eq!(store.get_str_or("general", "missing", "/var/lib"), "/var/lib");
	}

	#[test]
	fn test_get_num() {
		let store = store_with(&[
			("n", "plain", "42"),
			("n", "padded", "  -7 seconds"),
			("n", "words", "many"),
			("n", "huge", "99999999999999999999999"),
		]);
		assert_eq!(store.get_num("n", "plain", 0), 42);
		assert_eq!(store.get_num("n", "padded", 0), -7);
		assert_eq!(store.get_num("n", "words", 5), 5);
		assert_eq!(store.get_num("n", "huge", 5), 5);
		assert_eq!(store.get_num("n", "missing", 9), 9);
	}

	#[test]
	fn test_get_bool() {
		let store = store_with(&[
			("b", "yes", "YES"),
			("b", "on", "on"),
			("b", "t", "T"),
			("b", "off", "Off"),
			("b", "zero", "0"),
			("b", "junk", "maybe"),
		]);
		assert!(store.get_bool("b", "yes", false));
		assert!(store.get_bool("b", "on", false));
		assert!(store.get_bool("b", "t", false));
		assert!(!store.get_bool("b", "off", true));
		assert!(!store.get_bool("b", "zero", true));
		assert!(store.get_bool("b", "junk", true));
		assert!(!store.get_bool("b", "junk", false));
		assert!(store.get_bool("b", "missing", true));
	}

	#[test]
	fn test_match_num_range() {
		let store = store_with(&[("m", "range", "5,1:10")]);
		assert!(store.match_num("m", "range", 7));
		assert!(store.match_num("m", "range", 1));
		assert!(store.match_num("m", "range", 10));
		assert!(!store.match_num("m", "range", 15));
	}

	#[test]
	fn test_match_num_single() {
		let store = store_with(&[("m", "single", "5")]);
		assert!(store.match_num("m", "single", 5));
		assert!(!store.match_num("m", "single", 6));
	}

	#[test]
	fn test_match_num_malformed() {
		let store = store_with(&[("m", "half", "5,1"), ("m", "junk", "abc")]);
		assert!(!store.match_num("m", "half", 5));
		assert!(!store.match_num("m", "junk", 0));
		assert!(!store.match_num("m", "missing", 0));
	}

	#[test]
	fn test_get_list_splits_unquoted() {
		let store = parsed("[a]\ntag = a,b, c\nsparse = x,, ,y\n");
		assert_eq!(store.get_list("a", "tag"), vec!["a", "b", "c"]);
		assert_eq!(store.get_list("a", "sparse"), vec!["x", "y"]);
		assert!(store.get_list("a", "missing").is_empty());
	}

	#[test]
	fn test_get_list_keeps_quoted_value_whole() {
		let store = parsed("[a]\ntag = \"a, b\"\n");
		assert_eq!(store.get_list("a", "tag"), vec!["a, b"]);
		assert_eq!(store.get_str("a", "tag").as_deref(), Some("a, b"));
	}

	#[test]
	fn test_get_tags() {
		let store = parsed("[sec]\nfirst = 1\n[sec \"x\"]\nsecond = 2\n[SEC]\nthird = 3\n[other]\nno = 0\n");
		assert_eq!(store.get_tags("sec", None), vec!["first", "second", "third"]);
		assert_eq!(store.get_tags("Sec", Some("X")), vec!["second"]);
		assert!(store.get_tags("missing", None).is_empty());
	}

	#[test]
	fn test_comment_line_produces_no_binding() {
		let store = parsed("[a]\n# comment = 1\n; other = 2\n");
		assert!(store.is_empty());
	}
}
