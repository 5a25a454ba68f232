// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 Gridbase

#![cfg_attr(not(debug_assertions), deny(warnings))]

mod dialect;
mod error;
mod raw;
mod statement;

pub use dialect::Dialect;
pub use error::Error;
pub use raw::{Bind, RawSql};
pub use statement::{Statement, StatementPlan};

pub type Result<T> = std::result::Result<T, Error>;
