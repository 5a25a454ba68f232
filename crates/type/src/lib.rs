// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 Gridbase

#![cfg_attr(not(debug_assertions), deny(warnings))]

pub mod error;
mod id;
mod uidt;
mod value;

pub use error::{ConfigError, ResolveError};
pub use id::{ColumnId, SourceId, TableId, ViewId};
pub use uidt::{AbstractType, RollupFn, Uidt};
pub use value::Value;
