//! Line parser for the INI-style config format.
//!
//! The parser never aborts a buffer: a malformed line is reported as a
//! [`ParseWarning`] and dropped, and parsing continues with the next line.
//! Directives are not applied directly; they are queued under a transaction
//! and only reach the binding table when that transaction is committed.

use crate::config::loader::Loader;
use crate::config::transaction::TransactionQueue;
use crate::config::types::{Operation, SetOp, TransactionId};
use std::fmt;
use std::path::Path;
use tracing::warn;

/// Includes nested deeper than this are skipped.
pub const MAX_INCLUDE_DEPTH: usize = 16;

/// What went wrong on a single line.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WarningKind {
	#[error("non-matched ']', ignoring until next section")]
	UnmatchedBracket,

	#[error("non-matched '\"' in section header, ignoring until next section")]
	UnmatchedHeaderQuote,

	#[error("empty section name, ignoring until next section")]
	EmptySectionName,

	#[error("line not empty and not an assignment")]
	NotAnAssignment,

	#[error("ignoring line due to no section")]
	NoSection,

	#[error("unmatched quotes")]
	UnmatchedQuote,

	#[error("missing tag in assignment")]
	MissingTag,

	#[error("missing value in assignment")]
	MissingValue,

	#[error("error loading included config {path}: {reason}")]
	IncludeFailed { path: String, reason: String },

	#[error("includes nested too deeply, skipping {path}")]
	IncludeTooDeep { path: String },

	#[error("directive rejected: {reason}")]
	Rejected { reason: String },

	#[error("last line non-terminated, ignored")]
	UnterminatedLastLine,
}

impl WarningKind {
	/// Header failures leave the parser without a current section.
	fn resets_section(&self) -> bool {
		matches!(
			self,
			WarningKind::UnmatchedBracket
				| WarningKind::UnmatchedHeaderQuote
				| WarningKind::EmptySectionName
		)
	}
}

/// A non-fatal problem found while parsing, with its location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseWarning {
	/// File (or other source) the line came from.
	pub origin: String,

	/// 1-based physical line number.
	pub line: usize,

	pub kind: WarningKind,
}

impl fmt::Display for ParseWarning {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}:{}: {}", self.origin, self.line, self.kind)
	}
}

/// One classified logical line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Directive<'a> {
	/// Blank or comment line.
	Empty,

	Section { name: &'a str, arg: Option<&'a str> },

	Assign { tag: &'a str, value: &'a str, quoted: bool },
}

fn is_blank(c: char) -> bool {
	c == ' ' || c == '\t'
}

/// Classify one logical line.
///
/// A quoted value runs to the next occurrence of the same quote character;
/// there is no escape syntax, and anything after the closing quote is ignored.
/// Unquoted values end at the first `#` or `;`.
pub fn parse_line(line: &str) -> Result<Directive<'_>, WarningKind> {
	let line = line.trim_start_matches(is_blank);

	if line.is_empty() || line.starts_with(['#', ';']) {
		return Ok(Directive::Empty);
	}

	if let Some(header) = line.strip_prefix('[') {
		return parse_header(header);
	}

	let Some((tag, rest)) = line.split_once('=') else {
		return Err(WarningKind::NotAnAssignment);
	};

	let tag = tag.trim_end_matches(is_blank);
	let rest = rest.trim_start_matches(is_blank);

	let (value, quoted) = match rest.chars().next() {
		Some(quote @ ('"' | '\'')) => {
			let inner = &rest[1..];
			match inner.find(quote) {
				Some(end) => (&inner[..end], true),
				None => return Err(WarningKind::UnmatchedQuote),
			}
		}
		_ => {
			let end = rest.find(['#', ';']).unwrap_or(rest.len());
			(rest[..end].trim_end(), false)
		}
	};

	if tag.is_empty() {
		return Err(WarningKind::MissingTag);
	}
	if value.is_empty() {
		return Err(WarningKind::MissingValue);
	}

	Ok(Directive::Assign { tag, value, quoted })
}

/// Parse the remainder of a `[name]` or `[name "arg"]` header.
fn parse_header(header: &str) -> Result<Directive<'_>, WarningKind> {
	let header = header.trim_start_matches(is_blank);
	let Some(close) = header.find(']') else {
		return Err(WarningKind::UnmatchedBracket);
	};
	let inner = header[..close].trim_end_matches(is_blank);

	let (name, arg) = match inner.split_once('"') {
		None => (inner, None),
		Some((name, tail)) => {
			let Some((arg, _)) = tail.split_once('"') else {
				return Err(WarningKind::UnmatchedHeaderQuote);
			};
			(name.trim_end_matches(is_blank), Some(arg))
		}
	};

	if name.is_empty() {
		return Err(WarningKind::EmptySectionName);
	}

	Ok(Directive::Section { name, arg })
}

/// The section a line's assignments belong to.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SectionContext {
	pub section: Option<String>,
	pub arg: Option<String>,
}

impl SectionContext {
	pub fn clear(&mut self) {
		self.section = None;
		self.arg = None;
	}
}

/// Walks text buffers and queues their directives under one transaction.
pub struct Parser<'a> {
	transaction: TransactionId,
	queue: &'a mut TransactionQueue,
	loader: &'a dyn Loader,
	warnings: Vec<ParseWarning>,
	depth: usize,
}

impl<'a> Parser<'a> {
	pub fn new(transaction: TransactionId, queue: &'a mut TransactionQueue, loader: &'a dyn Loader) -> Self {
		Parser {
			transaction,
			queue,
			loader,
			warnings: Vec::new(),
			depth: 0,
		}
	}

	/// Parse `buf`, whose lines are attributed to `origin`.
	///
	/// A line ending in a backslash is joined with the next one; the backslash
	/// and the newline are both dropped.
	pub fn parse(&mut self, buf: &str, origin: &str, ctx: &mut SectionContext) {
		let mut logical = String::new();
		let mut lineno = 0;
		let mut first_line = 1;
		let mut continuing = false;
		let mut terminated = true;

		for raw in buf.split_inclusive('\n') {
			lineno += 1;
			if !continuing {
				first_line = lineno;
			}

			let Some(body) = raw.strip_suffix('\n') else {
				terminated = false;
				break;
			};

			if let Some(joined) = body.strip_suffix('\\') {
				logical.push_str(joined);
				continuing = true;
				continue;
			}

			logical.push_str(body);
			self.handle_line(&logical, origin, first_line, ctx);
			logical.clear();
			continuing = false;
		}

		if continuing || !terminated {
			self.warn(origin, lineno, WarningKind::UnterminatedLastLine);
		}
	}

	fn handle_line(&mut self, line: &str, origin: &str, lineno: usize, ctx: &mut SectionContext) {
		match parse_line(line) {
			Ok(Directive::Empty) => {}
			Ok(Directive::Section { name, arg }) => {
				ctx.section = Some(name.to_string());
				ctx.arg = arg.map(str::to_string);
			}
			Ok(Directive::Assign { tag, value, quoted }) => {
				let Some(section) = ctx.section.as_deref() else {
					self.warn(origin, lineno, WarningKind::NoSection);
					return;
				};

				if tag.eq_ignore_ascii_case("include") {
					self.include(value, origin, lineno, ctx);
					return;
				}

				let op = SetOp::new(section, tag, value)
					.with_arg(ctx.arg.as_deref())
					.quoted(quoted);
				if let Err(err) = self.queue.push(self.transaction, Operation::Set(op)) {
					self.warn(
						origin,
						lineno,
						WarningKind::Rejected {
							reason: err.to_string(),
						},
					);
				}
			}
			Err(kind) => {
				if kind.resets_section() {
					ctx.clear();
				}
				self.warn(origin, lineno, kind);
			}
		}
	}

	/// Parse an included file under a copy of the current section context.
	fn include(&mut self, path: &str, origin: &str, lineno: usize, ctx: &SectionContext) {
		if self.depth >= MAX_INCLUDE_DEPTH {
			self.warn(
				origin,
				lineno,
				WarningKind::IncludeTooDeep {
					path: path.to_string(),
				},
			);
			return;
		}

		let text = match self.loader.load(Path::new(path)) {
			Ok(text) => text,
			Err(err) => {
				self.warn(
					origin,
					lineno,
					WarningKind::IncludeFailed {
						path: path.to_string(),
						reason: err.to_string(),
					},
				);
				return;
			}
		};

		let mut inherited = ctx.clone();
		self.depth += 1;
		self.parse(&text, path, &mut inherited);
		self.depth -= 1;
	}

	fn warn(&mut self, origin: &str, line: usize, kind: WarningKind) {
		warn!(origin = %origin, line, "config file error: {kind}");
		self.warnings.push(ParseWarning {
			origin: origin.to_string(),
			line,
			kind,
		});
	}

	/// Warnings collected so far, including those from included files.
	pub fn finish(self) -> Vec<ParseWarning> {
		self.warnings
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::error::{ConfError, Result};
	use std::collections::HashMap;
	use std::path::PathBuf;

	#[derive(Default)]
	struct MemoryLoader {
		files: HashMap<PathBuf, String>,
	}

	impl MemoryLoader {
		fn with(mut self, path: &str, text: &str) -> Self {
			self.files.insert(PathBuf::from(path), text.to_string());
			self
		}
	}

	impl Loader for MemoryLoader {
		fn load(&self, path: &Path) -> Result<String> {
			self.files
				.get(path)
				.cloned()
				.ok_or_else(|| ConfError::ConfigNotFound {
					path: path.to_path_buf(),
				})
		}
	}

	/// Parse `text` and return the queued set operations plus warnings.
	fn run(loader: &MemoryLoader, text: &str) -> (Vec<SetOp>, Vec<ParseWarning>) {
		let mut queue = TransactionQueue::new();
		let trans = queue.begin();
		let mut parser = Parser::new(trans, &mut queue, loader);
		parser.parse(text, "test.conf", &mut SectionContext::default());
		let warnings = parser.finish();

		let sets = queue
			.take(trans)
			.into_iter()
			.map(|op| match op {
				Operation::Set(set) => set,
				other => panic!("unexpected operation {other:?}"),
			})
			.collect();
		(sets, warnings)
	}

	fn kinds(warnings: &[ParseWarning]) -> Vec<WarningKind> {
		warnings.iter().map(|w| w.kind.clone()).collect()
	}

	#[test]
	fn test_parse_line_comments_and_blanks() {
		assert_eq!(parse_line(""), Ok(Directive::Empty));
		assert_eq!(parse_line(" \t "), Ok(Directive::Empty));
		assert_eq!(parse_line("  # comment"), Ok(Directive::Empty));
		assert_eq!(parse_line("; comment = 1"), Ok(Directive::Empty));
	}

	#[test]
	fn test_parse_line_headers() {
		assert_eq!(
			parse_line("[ General ]"),
			Ok(Directive::Section {
				name: "General",
				arg: None
			})
		);
		assert_eq!(
			parse_line("[exportd \"/srv/nfs\"] trailing"),
			Ok(Directive::Section {
				name: "exportd",
				arg: Some("/srv/nfs")
			})
		);
		assert_eq!(parse_line("[nfsd"), Err(WarningKind::UnmatchedBracket));
		assert_eq!(parse_line("[nfsd \"x]"), Err(WarningKind::UnmatchedHeaderQuote));
		assert_eq!(parse_line("[ ]"), Err(WarningKind::EmptySectionName));
	}

	#[test]
	fn test_parse_line_assignments() {
		assert_eq!(
			parse_line("  threads =  8   # eight"),
			Ok(Directive::Assign {
				tag: "threads",
				value: "8",
				quoted: false
			})
		);
		assert_eq!(
			parse_line("tag = a,b; c"),
			Ok(Directive::Assign {
				tag: "tag",
				value: "a,b",
				quoted: false
			})
		);
		assert_eq!(
			parse_line("tag = \"a # b; c\" ignored"),
			Ok(Directive::Assign {
				tag: "tag",
				value: "a # b; c",
				quoted: true
			})
		);
		assert_eq!(
			parse_line("tag = 'it\"s'"),
			Ok(Directive::Assign {
				tag: "tag",
				value: "it\"s",
				quoted: true
			})
		);
	}

	#[test]
	fn test_parse_line_errors() {
		assert_eq!(parse_line("just words"), Err(WarningKind::NotAnAssignment));
		assert_eq!(parse_line("tag = \"open"), Err(WarningKind::UnmatchedQuote));
		assert_eq!(parse_line(" = value"), Err(WarningKind::MissingTag));
		assert_eq!(parse_line("tag = # nothing"), Err(WarningKind::MissingValue));
		assert_eq!(parse_line("tag = \"\""), Err(WarningKind::MissingValue));
	}

	#[test]
	fn test_quoted_value_ends_at_next_quote() {
		// The second quote closes the value even though more text follows.
		assert_eq!(
			parse_line("tag = \"say \"hi\"\""),
			Ok(Directive::Assign {
				tag: "tag",
				value: "say ",
				quoted: true
			})
		);
	}

	#[test]
	fn test_queues_sets_with_context() {
		let (sets, warnings) = run(
			&MemoryLoader::default(),
			"[General]\nverbosity = 2\n[exportd \"local\"]\nthreads = 4\n",
		);
		assert!(warnings.is_empty());
		assert_eq!(sets.len(), 2);
		assert_eq!(sets[0].section, "general");
		assert_eq!(sets[0].arg, None);
		assert_eq!(sets[1].section, "exportd");
		assert_eq!(sets[1].arg.as_deref(), Some("local"));
		assert!(!sets[1].override_existing);
		assert!(!sets[1].is_default);
	}

	#[test]
	fn test_no_section_warns_and_skips() {
		let (sets, warnings) = run(&MemoryLoader::default(), "tag = value\n[a]\nx = 1\n");
		assert_eq!(sets.len(), 1);
		assert_eq!(kinds(&warnings), vec![WarningKind::NoSection]);
		assert_eq!(warnings[0].line, 1);
	}

	#[test]
	fn test_bad_header_drops_lines_until_next_header() {
		let (sets, warnings) = run(&MemoryLoader::default(), "[a]\nx = 1\n[broken\ny = 2\n[b]\nz = 3\n");
		let tags: Vec<_> = sets.iter().map(|s| s.tag.as_str()).collect();
		assert_eq!(tags, vec!["x", "z"]);
		assert_eq!(
			kinds(&warnings),
			vec![WarningKind::UnmatchedBracket, WarningKind::NoSection]
		);
	}

	#[test]
	fn test_continuation_joins_lines() {
		let (sets, warnings) = run(&MemoryLoader::default(), "[a]\ntag = val \\\nue\nnext = 1\n");
		assert!(warnings.is_empty());
		assert_eq!(sets[0].value, "val ue");
		assert_eq!(sets[1].tag, "next");
	}

	#[test]
	fn test_unterminated_last_line_is_dropped() {
		let (sets, warnings) = run(&MemoryLoader::default(), "[a]\nx = 1\ny = 2");
		assert_eq!(sets.len(), 1);
		assert_eq!(kinds(&warnings), vec![WarningKind::UnterminatedLastLine]);
		assert_eq!(warnings[0].line, 3);
	}

	#[test]
	fn test_dangling_continuation_is_dropped() {
		let (sets, warnings) = run(&MemoryLoader::default(), "[a]\nx = 1 \\\n");
		assert!(sets.is_empty());
		assert_eq!(kinds(&warnings), vec![WarningKind::UnterminatedLastLine]);
	}

	#[test]
	fn test_line_errors_do_not_abort() {
		let (sets, warnings) = run(
			&MemoryLoader::default(),
			"[a]\nnonsense\nq = \"open\n = 1\nok = yes\n",
		);
		assert_eq!(sets.len(), 1);
		assert_eq!(sets[0].tag, "ok");
		assert_eq!(
			kinds(&warnings),
			vec![
				WarningKind::NotAnAssignment,
				WarningKind::UnmatchedQuote,
				WarningKind::MissingTag
			]
		);
		let lines: Vec<_> = warnings.iter().map(|w| w.line).collect();
		assert_eq!(lines, vec![2, 3, 4]);
	}

	#[test]
	fn test_include_inherits_context_copy() {
		let loader = MemoryLoader::default().with("/etc/nfs.conf.d/extra.conf", "inner = 1\n[other]\nx = 2\n");
		let (sets, warnings) = run(
			&loader,
			"[outer \"arg\"]\ninclude = /etc/nfs.conf.d/extra.conf\nafter = 3\n",
		);
		assert!(warnings.is_empty());

		let placed: Vec<_> = sets
			.iter()
			.map(|s| (s.section.as_str(), s.arg.as_deref(), s.tag.as_str()))
			.collect();
		assert_eq!(
			placed,
			vec![
				("outer", Some("arg"), "inner"),
				("other", None, "x"),
				// The included file's header did not leak back.
				("outer", Some("arg"), "after"),
			]
		);
	}

	#[test]
	fn test_missing_include_is_a_warning() {
		let (sets, warnings) = run(
			&MemoryLoader::default(),
			"[a]\nINCLUDE = /nowhere.conf\nx = 1\n",
		);
		assert_eq!(sets.len(), 1);
		assert_eq!(warnings.len(), 1);
		assert!(matches!(
			&warnings[0].kind,
			WarningKind::IncludeFailed { path, .. } if path == "/nowhere.conf"
		));
	}

	#[test]
	fn test_include_warnings_name_included_file() {
		let loader = MemoryLoader::default().with("inc.conf", "garbage\n");
		let (_, warnings) = run(&loader, "[a]\ninclude = inc.conf\n");
		assert_eq!(warnings.len(), 1);
		assert_eq!(warnings[0].origin, "inc.conf");
		assert_eq!(warnings[0].to_string(), "inc.conf:1: line not empty and not an assignment");
	}

	#[test]
	fn test_self_include_is_bounded() {
		let loader = MemoryLoader::default().with("loop.conf", "[a]\ninclude = loop.conf\n");
		let (sets, warnings) = run(&loader, "[a]\ninclude = loop.conf\n");
		assert!(sets.is_empty());
		assert_eq!(warnings.len(), 1);
		assert!(matches!(warnings[0].kind, WarningKind::IncludeTooDeep { .. }));
	}
}
