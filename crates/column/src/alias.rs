// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 Gridbase

use std::sync::atomic::{AtomicUsize, Ordering};

/// Generates unique table aliases for nested subqueries within one
/// statement build.
#[derive(Debug)]
pub struct AliasGen {
	prefix: &'static str,
	counter: AtomicUsize,
}

impl AliasGen {
	pub fn new(prefix: &'static str) -> Self {
		Self {
			prefix,
			counter: AtomicUsize::new(0),
		}
	}

	pub fn next(&self) -> String {
		let n = self.counter.fetch_add(1, Ordering::Relaxed);
		format!("{}{}", self.prefix, n)
	}
}

impl Default for AliasGen {
	fn default() -> Self {
		Self::new("__gb_alias_")
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_aliases_are_unique() {
		let aliases = AliasGen::new("__gb_lk_");
		assert_eq!(aliases.next(), "__gb_lk_0");
		assert_eq!(aliases.next(), "__gb_lk_1");
	}
}
