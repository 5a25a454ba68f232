// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 Gridbase

#![cfg_attr(not(debug_assertions), deny(warnings))]

pub mod cache;
pub mod catalog;
mod error;
pub mod model;
mod store;

pub use cache::{CacheScope, DelDirection, MetaCache};
pub use catalog::Catalog;
pub use error::Error;
pub use store::MetaStore;

pub type Result<T> = std::result::Result<T, Error>;
