// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 Gridbase

use std::fmt::{self, Display, Formatter};

use serde::{Deserialize, Serialize};

/// User-interface datatype tag: the semantic kind of a column.
///
/// Plain kinds map one-to-one onto a physical column; the computed kinds
/// (`LinkToAnotherRecord`, `Rollup`, `Lookup`, `Formula`) are virtual and
/// resolve to SQL fragments at query time.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Uidt {
	SingleLineText,
	LongText,
	Number,
	Decimal,
	Checkbox,
	Date,
	DateTime,
	Json,
	LinkToAnotherRecord,
	Rollup,
	Lookup,
	Formula,
}

impl Uidt {
	/// Computed kinds have no physical column of their own.
	pub fn is_virtual(&self) -> bool {
		matches!(self, Uidt::LinkToAnotherRecord | Uidt::Rollup | Uidt::Lookup | Uidt::Formula)
	}

	/// The abstract type used for aggregate validation and filter
	/// predicate mapping. Computed kinds resolve through their target,
	/// so they have no abstract type of their own.
	pub fn abstract_type(&self) -> Option<AbstractType> {
		match self {
			Uidt::SingleLineText | Uidt::LongText => Some(AbstractType::Text),
			Uidt::Number | Uidt::Decimal => Some(AbstractType::Number),
			Uidt::Checkbox => Some(AbstractType::Boolean),
			Uidt::Date | Uidt::DateTime => Some(AbstractType::Temporal),
			Uidt::Json => Some(AbstractType::Json),
			Uidt::LinkToAnotherRecord | Uidt::Rollup | Uidt::Lookup | Uidt::Formula => None,
		}
	}
}

impl Display for Uidt {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		let name = match self {
			Uidt::SingleLineText => "SingleLineText",
			Uidt::LongText => "LongText",
			Uidt::Number => "Number",
			Uidt::Decimal => "Decimal",
			Uidt::Checkbox => "Checkbox",
			Uidt::Date => "Date",
			Uidt::DateTime => "DateTime",
			Uidt::Json => "Json",
			Uidt::LinkToAnotherRecord => "LinkToAnotherRecord",
			Uidt::Rollup => "Rollup",
			Uidt::Lookup => "Lookup",
			Uidt::Formula => "Formula",
		};
		f.write_str(name)
	}
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AbstractType {
	Text,
	Number,
	Boolean,
	Temporal,
	Json,
}

impl Display for AbstractType {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		match self {
			AbstractType::Text => f.write_str("text"),
			AbstractType::Number => f.write_str("number"),
			AbstractType::Boolean => f.write_str("boolean"),
			AbstractType::Temporal => f.write_str("temporal"),
			AbstractType::Json => f.write_str("json"),
		}
	}
}

/// The closed set of rollup aggregate functions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RollupFn {
	Count,
	Min,
	Max,
	Avg,
	CountDistinct,
	SumDistinct,
	AvgDistinct,
	Sum,
}

impl RollupFn {
	/// Whether the aggregate is valid against a target column of the
	/// given abstract type. `count`/`countDistinct` accept anything;
	/// the arithmetic aggregates require numbers; `min`/`max` accept
	/// anything with an ordering.
	pub fn accepts(&self, target: AbstractType) -> bool {
		match self {
			RollupFn::Count | RollupFn::CountDistinct => true,
			RollupFn::Min | RollupFn::Max => {
				matches!(target, AbstractType::Number | AbstractType::Text | AbstractType::Temporal)
			}
			RollupFn::Sum | RollupFn::Avg | RollupFn::SumDistinct | RollupFn::AvgDistinct => {
				matches!(target, AbstractType::Number)
			}
		}
	}

	/// The SQL aggregate name, without the DISTINCT qualifier.
	pub fn sql_name(&self) -> &'static str {
		match self {
			RollupFn::Count | RollupFn::CountDistinct => "count",
			RollupFn::Min => "min",
			RollupFn::Max => "max",
			RollupFn::Avg | RollupFn::AvgDistinct => "avg",
			RollupFn::Sum | RollupFn::SumDistinct => "sum",
		}
	}

	pub fn is_distinct(&self) -> bool {
		matches!(self, RollupFn::CountDistinct | RollupFn::SumDistinct | RollupFn::AvgDistinct)
	}
}

impl Display for RollupFn {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		let name = match self {
			RollupFn::Count => "count",
			RollupFn::Min => "min",
			RollupFn::Max => "max",
			RollupFn::Avg => "avg",
			RollupFn::CountDistinct => "countDistinct",
			RollupFn::SumDistinct => "sumDistinct",
			RollupFn::AvgDistinct => "avgDistinct",
			RollupFn::Sum => "sum",
		};
		f.write_str(name)
	}
}
