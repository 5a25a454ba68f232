// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 Gridbase

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use gridbase_engine::{Driver, Error, Result, Row};
use gridbase_sql::{Dialect, Statement};
use parking_lot::Mutex;

/// A driver fake that records every statement it receives and answers
/// queries from a queue of canned row sets.
///
/// Transactions are counted, not simulated; fault injection fails the
/// n-th execute so rollback paths can be exercised.
pub struct RecordingDriver {
	dialect: Dialect,
	external: AtomicBool,
	queries: Mutex<Vec<Statement>>,
	executes: Mutex<Vec<Statement>>,
	canned: Mutex<VecDeque<Vec<Row>>>,
	execute_count: AtomicUsize,
	fail_execute_at: AtomicUsize,
	begins: AtomicUsize,
	commits: AtomicUsize,
	rollbacks: AtomicUsize,
}

const NEVER: usize = usize::MAX;

impl RecordingDriver {
	pub fn new(dialect: Dialect) -> Self {
		crate::init_tracing();
		Self {
			dialect,
			external: AtomicBool::new(false),
			queries: Mutex::new(Vec::new()),
			executes: Mutex::new(Vec::new()),
			canned: Mutex::new(VecDeque::new()),
			execute_count: AtomicUsize::new(0),
			fail_execute_at: AtomicUsize::new(NEVER),
			begins: AtomicUsize::new(0),
			commits: AtomicUsize::new(0),
			rollbacks: AtomicUsize::new(0),
		}
	}

	pub fn set_external(&self, external: bool) {
		self.external.store(external, Ordering::SeqCst);
	}

	/// Queue the row set the next `query` call returns.
	pub fn push_rows(&self, rows: Vec<Row>) {
		self.canned.lock().push_back(rows);
	}

	/// Fail the n-th (0-based) execute with a storage error.
	pub fn fail_execute_at(&self, index: usize) {
		self.fail_execute_at.store(index, Ordering::SeqCst);
	}

	pub fn queries(&self) -> Vec<Statement> {
		self.queries.lock().clone()
	}

	pub fn executes(&self) -> Vec<Statement> {
		self.executes.lock().clone()
	}

	pub fn begins(&self) -> usize {
		self.begins.load(Ordering::SeqCst)
	}

	pub fn commits(&self) -> usize {
		self.commits.load(Ordering::SeqCst)
	}

	pub fn rollbacks(&self) -> usize {
		self.rollbacks.load(Ordering::SeqCst)
	}
}

#[async_trait]
impl Driver for RecordingDriver {
	fn dialect(&self) -> Dialect {
		self.dialect
	}

	fn is_external(&self) -> bool {
		self.external.load(Ordering::SeqCst)
	}

	async fn query(&self, statement: &Statement) -> Result<Vec<Row>> {
		self.queries.lock().push(statement.clone());
		Ok(self.canned.lock().pop_front().unwrap_or_default())
	}

	async fn execute(&self, statement: &Statement) -> Result<u64> {
		let index = self.execute_count.fetch_add(1, Ordering::SeqCst);
		self.executes.lock().push(statement.clone());
		if index == self.fail_execute_at.load(Ordering::SeqCst) {
			return Err(Error::Storage {
				reason: "injected execute failure".to_string(),
			});
		}
		Ok(1)
	}

	async fn begin(&self) -> Result<()> {
		self.begins.fetch_add(1, Ordering::SeqCst);
		Ok(())
	}

	async fn commit(&self) -> Result<()> {
		self.commits.fetch_add(1, Ordering::SeqCst);
		Ok(())
	}

	async fn rollback(&self) -> Result<()> {
		self.rollbacks.fetch_add(1, Ordering::SeqCst);
		Ok(())
	}
}
