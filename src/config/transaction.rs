//! Staged operations and their commit into the binding table.

use crate::config::table::BindingTable;
use crate::config::types::{Operation, PendingOp, SetOutcome, TransactionId};
use crate::error::{ConfError, Result};
use tracing::{debug, info};

/// Ordered log of staged operations spanning all open transactions.
#[derive(Debug, Default)]
pub struct TransactionQueue {
	pending: Vec<PendingOp>,
	sequence: u64,
}

impl TransactionQueue {
	pub fn new() -> Self {
		Self::default()
	}

	/// Hand out a fresh transaction id. Ids are never reused by one queue.
	pub fn begin(&mut self) -> TransactionId {
		self.sequence += 1;
		TransactionId(self.sequence)
	}

	/// Append an operation to the queue.
	///
	/// A `Set` with an empty value is accepted but never queued, since empty
	/// values are never stored.
	pub fn push(&mut self, transaction: TransactionId, op: Operation) -> Result<()> {
		validate(&op)?;

		let op = match op {
			Operation::Set(set) if set.value.is_empty() => return Ok(()),
			Operation::Set(mut set) => {
				set.section.make_ascii_lowercase();
				Operation::Set(set)
			}
			other => other,
		};

		self.pending.push(PendingOp { transaction, op });
		Ok(())
	}

	/// Drain every operation of `transaction`, keeping queue order.
	pub fn take(&mut self, transaction: TransactionId) -> Vec<Operation> {
		let (mine, rest): (Vec<_>, Vec<_>) = std::mem::take(&mut self.pending)
			.into_iter()
			.partition(|p| p.transaction == transaction);
		self.pending = rest;
		mine.into_iter().map(|p| p.op).collect()
	}

	/// End a transaction: drain its operations and, if `commit`, replay them
	/// against `table`. Returns how many operations were drained.
	pub fn end(&mut self, transaction: TransactionId, commit: bool, table: &mut BindingTable) -> usize {
		let ops = self.take(transaction);
		let drained = ops.len();

		if commit {
			for op in &ops {
				apply(table, op);
			}
			debug!(%transaction, operations = drained, "transaction committed");
		} else {
			debug!(%transaction, operations = drained, "transaction rolled back");
		}

		drained
	}

	pub fn len(&self) -> usize {
		self.pending.len()
	}

	pub fn is_empty(&self) -> bool {
		self.pending.is_empty()
	}

	pub fn clear(&mut self) {
		self.pending.clear();
	}
}

/// Replay one operation. Failures are logged, never propagated.
pub fn apply(table: &mut BindingTable, op: &Operation) {
	match op {
		Operation::Set(set) => {
			if table.apply_set(set) == SetOutcome::EmptyValue {
				debug!(section = %set.section, tag = %set.tag, "empty value, nothing stored");
			}
		}
		Operation::RemoveTag { section, tag } => {
			if !table.remove_tag(section, tag) {
				info!(%section, %tag, "remove: tag not found");
			}
		}
		Operation::RemoveSection { section } => {
			if !table.remove_section(section) {
				info!(%section, "remove: section not found");
			}
		}
	}
}

fn validate(op: &Operation) -> Result<()> {
	if op.section().is_empty() {
		return Err(ConfError::InvalidOperation {
			reason: "empty section name".to_string(),
		});
	}

	let tag = match op {
		Operation::Set(set) => Some(&set.tag),
		Operation::RemoveTag { tag, .. } => Some(tag),
		Operation::RemoveSection { .. } => None,
	};
	if tag.is_some_and(|t| t.is_empty()) {
		return Err(ConfError::InvalidOperation {
			reason: format!("empty tag in section [{}]", op.section()),
		});
	}

	Ok(())
}
