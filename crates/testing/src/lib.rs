// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 Gridbase

#![cfg_attr(not(debug_assertions), deny(warnings))]

mod driver;
mod fixture;
mod store;

pub use driver::RecordingDriver;
pub use fixture::{CountryCityFixture, country_city_fixture};
pub use store::MemoryMetaStore;

/// Install a fmt subscriber honouring `RUST_LOG`. Repeated calls are
/// no-ops, so every fixture constructor calls it and tests get trace
/// output for free.
pub fn init_tracing() {
	let _ = tracing_subscriber::fmt()
		.with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
		.with_test_writer()
		.try_init();
}
