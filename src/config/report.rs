//! Dumping the effective configuration.

use crate::config::store::ConfStore;
use crate::config::types::Binding;
use toml::{Table, Value};
use tracing::{info, warn};

/// Bindings sharing one `[section "arg"]` header.
struct Group<'a> {
	section: &'a str,
	arg: Option<&'a str>,
	bindings: Vec<&'a Binding>,
}

impl ConfStore {
	/// Non-default bindings grouped by (section, argument), groups in order of
	/// first appearance and bindings in insertion order.
	fn groups(&self) -> Vec<Group<'_>> {
		let mut groups: Vec<Group<'_>> = Vec::new();

		for binding in self.table.iter_ordered() {
			if binding.is_default {
				continue;
			}

			let arg = binding.arg.as_deref();
			match groups
				.iter_mut()
				.find(|g| g.section == binding.section && g.arg == arg)
			{
				Some(group) => group.bindings.push(binding),
				None => groups.push(Group {
					section: &binding.section,
					arg,
					bindings: vec![binding],
				}),
			}
		}

		groups
	}

	/// The effective configuration as config-file lines. Default bindings are
	/// left out; values are quoted where needed to parse back unchanged.
	pub fn dump_lines(&self) -> Vec<String> {
		let mut lines = Vec::new();

		for (i, group) in self.groups().iter().enumerate() {
			if i > 0 {
				lines.push(String::new());
			}
			lines.push(match group.arg {
				Some(arg) => format!("[{} \"{}\"]", group.section, arg),
				None => format!("[{}]", group.section),
			});
			for binding in &group.bindings {
				match render_value(binding) {
					Some(value) => lines.push(format!("{} = {}", binding.tag, value)),
					None => warn!(
						section = group.section,
						tag = %binding.tag,
						"value cannot be written back as config text, skipping"
					),
				}
			}
		}

		lines
	}

	/// The effective configuration as config-file text.
	pub fn render(&self) -> String {
		let mut out = String::new();
		for line in self.dump_lines() {
			out.push_str(&line);
			out.push('\n');
		}
		out
	}

	/// Log the running configuration at info level.
	pub fn report(&self) {
		info!("dumping running configuration");
		for line in self.dump_lines() {
			info!("{line}");
		}
	}

	/// The effective configuration as a TOML table: `[section]` holds plain
	/// tags, `[section.arg]` holds tags of an argument-qualified section.
	pub fn to_toml(&self) -> Table {
		let mut root = Table::new();

		for group in self.groups() {
			let Value::Table(section) = root
				.entry(group.section.to_string())
				.or_insert(Value::Table(Table::new()))
			else {
				continue;
			};

			let target = match group.arg {
				None => section,
				Some(arg) => match section
					.entry(arg.to_string())
					.or_insert(Value::Table(Table::new()))
				{
					Value::Table(table) => table,
					_ => {
						warn!(section = group.section, arg, "argument clashes with a tag name, skipping");
						continue;
					}
				},
			};

			for binding in group.bindings {
				if matches!(target.get(&binding.tag), Some(Value::Table(_))) {
					warn!(section = group.section, tag = %binding.tag, "tag clashes with an argument name, skipping");
					continue;
				}
				target.insert(binding.tag.clone(), Value::String(binding.value.clone()));
			}
		}

		root
	}
}

/// Quote a value when writing it bare would not parse back to the same text.
///
/// `None` when no spelling parses back: a line break inside the value, or a
/// value that needs quoting but holds both quote characters.
fn render_value(binding: &Binding) -> Option<String> {
	let value = &binding.value;
	if value.contains('\n') {
		return None;
	}

	let needs_quotes = binding.quoted
		|| value.contains(['#', ';'])
		|| value.starts_with(['"', '\''])
		|| value.ends_with('\\')
		|| value.trim() != value;

	if !needs_quotes {
		Some(value.clone())
	} else if !value.contains('"') {
		Some(format!("\"{value}\""))
	} else if !value.contains('\'') {
		Some(format!("'{value}'"))
	} else {
		None
	}
}
