// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 Gridbase

#![cfg_attr(not(debug_assertions), deny(warnings))]

mod ast;
mod cache;
mod error;
mod lower;
mod parse;
mod token;

pub use ast::{BinaryOp, FormulaNode, UnaryOp};
pub use cache::{CompiledFormula, FormulaCache};
pub use error::Error;
pub use lower::{ColumnResolver, lower};
pub use parse::parse;
pub use token::{Token, tokenize};

pub type Result<T> = std::result::Result<T, Error>;
