// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 Gridbase

use std::fmt::{self, Display, Formatter};

use serde::{Deserialize, Serialize};

macro_rules! string_id {
	($name:ident) => {
		#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
		#[serde(transparent)]
		pub struct $name(pub String);

		impl $name {
			pub fn as_str(&self) -> &str {
				&self.0
			}
		}

		impl Display for $name {
			fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
				f.write_str(&self.0)
			}
		}

		impl From<&str> for $name {
			fn from(value: &str) -> Self {
				Self(value.to_string())
			}
		}

		impl From<String> for $name {
			fn from(value: String) -> Self {
				Self(value)
			}
		}
	};
}

string_id!(TableId);
string_id!(ColumnId);
string_id!(ViewId);
string_id!(SourceId);

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_display_and_from() {
		let id = TableId::from("tbl_9f2");
		assert_eq!(id.to_string(), "tbl_9f2");
		assert_eq!(id, TableId("tbl_9f2".to_string()));
	}

	#[test]
	fn test_serde_transparent() {
		let id = ColumnId::from("col_1");
		let json = serde_json::to_string(&id).unwrap();
		assert_eq!(json, "\"col_1\"");
		let back: ColumnId = serde_json::from_str(&json).unwrap();
		assert_eq!(back, id);
	}
}
