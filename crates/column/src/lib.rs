// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 Gridbase

#![cfg_attr(not(debug_assertions), deny(warnings))]

mod alias;
mod error;
mod fragment;
mod link;
mod types;
mod validate;

pub use alias::AliasGen;
pub use error::Error;
pub use fragment::{FragmentContext, sql_fragment};
pub use link::{JoinSpec, Junction, LinkContext, resolve_link};
pub use types::resolve_abstract_type;
pub use validate::{resolve_dependencies, validate_config};

pub type Result<T> = std::result::Result<T, Error>;
