// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 Gridbase

use std::collections::HashMap;

use gridbase_type::Value;
use indexmap::IndexMap;

/// A shaped result row, keyed by column title. Expanded links nest child
/// records as JSON values under the link column's title.
pub type Record = IndexMap<String, Value>;

/// Alias the correlation key hides under in link-expansion child queries.
pub(crate) const PARENT_KEY: &str = "__gb_parent";

pub(crate) fn record_to_json(record: &Record) -> serde_json::Value {
	let mut map = serde_json::Map::with_capacity(record.len());
	for (title, value) in record {
		map.insert(title.clone(), value.to_json());
	}
	serde_json::Value::Object(map)
}

/// Attach child records to their parents: an array per parent for
/// multi-row links, a single object (or null) for belongs-to.
pub(crate) fn nest_children(
	records: &mut [Record],
	base_key_title: &str,
	link_title: &str,
	children: Vec<Record>,
	multi_row: bool,
) {
	let mut buckets: HashMap<String, Vec<serde_json::Value>> = HashMap::new();
	for mut child in children {
		let Some(key) = child.shift_remove(PARENT_KEY) else {
			continue;
		};
		buckets.entry(bucket_key(&key)).or_default().push(record_to_json(&child));
	}

	for record in records.iter_mut() {
		let nested = record
			.get(base_key_title)
			.filter(|key| !key.is_null())
			.and_then(|key| buckets.get(&bucket_key(key)));
		let value = if multi_row {
			Value::Json(serde_json::Value::Array(nested.cloned().unwrap_or_default()))
		} else {
			match nested.and_then(|children| children.first()) {
				Some(child) => Value::Json(child.clone()),
				None => Value::Null,
			}
		};
		record.insert(link_title.to_string(), value);
	}
}

fn bucket_key(value: &Value) -> String {
	value.to_string()
}

#[cfg(test)]
mod tests {
	use serde_json::json;

	use super::*;

	fn record(pairs: &[(&str, Value)]) -> Record {
		pairs.iter().map(|(title, value)| (title.to_string(), value.clone())).collect()
	}

	#[test]
	fn test_multi_row_nesting_groups_by_key() {
		let mut parents = vec![
			record(&[("Id", Value::Int(1)), ("Name", Value::from("X"))]),
			record(&[("Id", Value::Int(2)), ("Name", Value::from("Y"))]),
		];
		let children = vec![
			record(&[(PARENT_KEY, Value::Int(1)), ("Name", Value::from("a"))]),
			record(&[(PARENT_KEY, Value::Int(1)), ("Name", Value::from("b"))]),
			record(&[(PARENT_KEY, Value::Int(2)), ("Name", Value::from("c"))]),
		];

		nest_children(&mut parents, "Id", "Cities", children, true);

		assert_eq!(parents[0]["Cities"], Value::Json(json!([{"Name": "a"}, {"Name": "b"}])));
		assert_eq!(parents[1]["Cities"], Value::Json(json!([{"Name": "c"}])));
	}

	#[test]
	fn test_belongs_to_nests_single_object_or_null() {
		let mut parents = vec![
			record(&[("CountryId", Value::Int(7)), ("Name", Value::from("city"))]),
			record(&[("CountryId", Value::Null), ("Name", Value::from("orphan"))]),
		];
		let children = vec![record(&[(PARENT_KEY, Value::Int(7)), ("Name", Value::from("X"))])];

		nest_children(&mut parents, "CountryId", "Country", children, false);

		assert_eq!(parents[0]["Country"], Value::Json(json!({"Name": "X"})));
		assert_eq!(parents[1]["Country"], Value::Null);
	}
}
