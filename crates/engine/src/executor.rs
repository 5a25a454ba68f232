// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 Gridbase

use std::future::Future;
use std::time::Duration;

use gridbase_sql::StatementPlan;
use tracing::{instrument, warn};

use crate::{Driver, Error, Result};

/// Runs a plan inside one transaction against the local backing store.
/// Any statement failure or timeout rolls the whole plan back.
pub struct LocalTxExecutor<'a> {
	driver: &'a dyn Driver,
}

impl<'a> LocalTxExecutor<'a> {
	pub fn new(driver: &'a dyn Driver) -> Self {
		Self {
			driver,
		}
	}

	#[instrument(name = "engine::executor::local", level = "trace", skip_all, fields(statements = plan.len()))]
	pub async fn run(&self, plan: &StatementPlan, limit: Option<Duration>) -> Result<u64> {
		self.driver.begin().await?;
		match bounded(limit, self.execute_all(plan)).await {
			Ok(affected) => {
				self.driver.commit().await?;
				Ok(affected)
			}
			Err(err) => {
				if let Err(rollback_err) = self.driver.rollback().await {
					warn!(error = %rollback_err, "rollback failed after statement error");
				}
				Err(err)
			}
		}
	}

	async fn execute_all(&self, plan: &StatementPlan) -> Result<u64> {
		let mut affected = 0u64;
		for statement in &plan.statements {
			affected += self.driver.execute(statement).await?;
		}
		Ok(affected)
	}
}

/// Forwards a plan's pre-rendered statements one by one to an external
/// execution channel. No transaction; the remote side owns atomicity.
pub struct RemoteRenderExecutor<'a> {
	driver: &'a dyn Driver,
}

impl<'a> RemoteRenderExecutor<'a> {
	pub fn new(driver: &'a dyn Driver) -> Self {
		Self {
			driver,
		}
	}

	#[instrument(name = "engine::executor::remote", level = "trace", skip_all, fields(statements = plan.len()))]
	pub async fn run(&self, plan: &StatementPlan, limit: Option<Duration>) -> Result<u64> {
		bounded(limit, async {
			let mut affected = 0u64;
			for statement in &plan.statements {
				affected += self.driver.execute(statement).await?;
			}
			Ok(affected)
		})
		.await
	}
}

/// Run a plan over the channel the driver's capability selects. Both
/// channels consume the identical plan, so the SQL never diverges. The
/// timeout bounds the statement loop only; the local channel always
/// rolls back before a timeout surfaces, never abandoning an open
/// transaction.
pub async fn run_plan(
	driver: &dyn Driver,
	plan: &StatementPlan,
	limit: Option<Duration>,
) -> Result<u64> {
	if driver.is_external() {
		RemoteRenderExecutor::new(driver).run(plan, limit).await
	} else {
		LocalTxExecutor::new(driver).run(plan, limit).await
	}
}

async fn bounded<T>(limit: Option<Duration>, operation: impl Future<Output = Result<T>>) -> Result<T> {
	match limit {
		Some(limit) => match tokio::time::timeout(limit, operation).await {
			Ok(result) => result,
			Err(_) => Err(Error::Timeout {
				elapsed_ms: limit.as_millis() as u64,
			}),
		},
		None => operation.await,
	}
}
