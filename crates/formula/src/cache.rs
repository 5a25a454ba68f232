// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 Gridbase

use std::collections::HashSet;
use std::sync::Arc;

use dashmap::DashMap;
use gridbase_sql::Dialect;
use tracing::trace;

use crate::{FormulaNode, Result, parse};

/// A parsed formula with its resolved identifier set, shared immutably.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledFormula {
	pub ast: FormulaNode,
	/// Column titles the expression references; drives invalidation
	/// when a referenced column is renamed, retyped or deleted.
	pub dependencies: HashSet<String>,
}

/// Process-wide cache of compiled formulas keyed by `(expression,
/// dialect)`. Entries are immutable and replaced wholesale, mirroring the
/// metadata cache's copy-on-write discipline.
#[derive(Debug, Default)]
pub struct FormulaCache {
	entries: DashMap<(String, Dialect), Arc<CompiledFormula>>,
}

impl FormulaCache {
	pub fn new() -> Self {
		Self::default()
	}

	/// Parse-or-reuse. Parse failures propagate and are never cached.
	pub fn compile(&self, expression: &str, dialect: Dialect) -> Result<Arc<CompiledFormula>> {
		let key = (expression.to_string(), dialect);
		if let Some(compiled) = self.entries.get(&key) {
			return Ok(Arc::clone(compiled.value()));
		}

		let ast = parse(expression)?;
		let compiled = Arc::new(CompiledFormula {
			dependencies: ast.identifiers(),
			ast,
		});
		self.entries.insert(key, Arc::clone(&compiled));
		Ok(compiled)
	}

	/// Drop every compiled formula that references `column_title`.
	/// Called by metadata mutators on rename/retype/delete, before the
	/// mutation returns.
	pub fn invalidate_dependents(&self, column_title: &str) {
		trace!(column_title, "formula cache invalidation");
		self.entries.retain(|_, compiled| !compiled.dependencies.contains(column_title));
	}

	pub fn clear(&self) {
		self.entries.clear();
	}

	pub fn len(&self) -> usize {
		self.entries.len()
	}

	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_compile_caches_per_dialect() {
		let cache = FormulaCache::new();
		let first = cache.compile("a + b", Dialect::Postgres).unwrap();
		let again = cache.compile("a + b", Dialect::Postgres).unwrap();
		assert!(Arc::ptr_eq(&first, &again));

		cache.compile("a + b", Dialect::Sqlite).unwrap();
		assert_eq!(cache.len(), 2);
	}

	#[test]
	fn test_dependencies_collected() {
		let cache = FormulaCache::new();
		let compiled = cache.compile("CONCAT(first, ' ', last)", Dialect::Sqlite).unwrap();
		assert_eq!(compiled.dependencies, HashSet::from(["first".to_string(), "last".to_string()]));
	}

	#[test]
	fn test_invalidate_dependents() {
		let cache = FormulaCache::new();
		cache.compile("price * qty", Dialect::Postgres).unwrap();
		cache.compile("a + b", Dialect::Postgres).unwrap();

		cache.invalidate_dependents("price");

		assert_eq!(cache.len(), 1);
		assert!(cache.compile("a + b", Dialect::Postgres).is_ok());
	}

	#[test]
	fn test_parse_failure_not_cached() {
		let cache = FormulaCache::new();
		assert!(cache.compile("a +", Dialect::Postgres).is_err());
		assert!(cache.is_empty());
	}
}
