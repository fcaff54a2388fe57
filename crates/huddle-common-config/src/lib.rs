// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Where Huddle's shared secrets come from.
//!
//! - [`load_secret_env`]: read a secret from `VAR` or the file named by
//!   `VAR_FILE`
//! - [`SecretStore`]: the seam the credential issuer reads its raw secret
//!   through, with environment, static and caching implementations
//!
//! Values handed out here are raw. Trimming, unquoting and shape checks
//! belong to the consumer that knows what the secret should look like.

pub mod env;
pub mod store;

pub use huddle_common_secret::{Secret, SecretString, REDACTED};

pub use env::{load_secret_env, SecretEnvError};
pub use store::{
	CachedSecretStore, EnvSecretStore, SecretStore, SecretStoreError, StaticSecretStore,
};
