// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Configuration sections.

mod logging;
mod rtc;

pub use logging::{LoggingConfig, LoggingConfigLayer};
pub use rtc::{RtcConfig, RtcConfigLayer, DEFAULT_SECRET_ENV_VAR};
