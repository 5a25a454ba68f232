// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 Gridbase

#![cfg_attr(not(debug_assertions), deny(warnings))]

mod builder;
mod condition;
mod context;
mod driver;
mod engine;
mod error;
mod executor;
mod params;
mod shape;

pub use context::EngineContext;
pub use driver::{Driver, Row};
pub use engine::Engine;
pub use error::Error;
pub use executor::{LocalTxExecutor, RemoteRenderExecutor, run_plan};
pub use params::{ListParams, ReadParams};
pub use shape::Record;

pub type Result<T> = std::result::Result<T, Error>;
