// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Time source for `issued_at`.

use chrono::Utc;

pub trait Clock: Send + Sync {
	/// Current time in whole seconds since the Unix epoch.
	fn now_secs(&self) -> u64;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
	fn now_secs(&self) -> u64 {
		u64::try_from(Utc::now().timestamp()).unwrap_or(0)
	}
}

/// Always reports the same instant. Used for golden vectors and expiry tests.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub u64);

impl Clock for FixedClock {
	fn now_secs(&self) -> u64 {
		self.0
	}
}
