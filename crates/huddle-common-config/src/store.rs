// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Secret stores: the read side of whatever secrets manager is deployed.
//!
//! The credential issuer only ever *reads* through a [`SecretStore`]. It does
//! not own the secret's lifecycle; [`CachedSecretStore`] lets a process avoid
//! re-reading on every issuance while leaving refresh to the caller.

use std::sync::RwLock;

use huddle_common_secret::SecretString;
use thiserror::Error;
use tracing::{debug, instrument};

use crate::env::{load_secret_env, SecretEnvError};

#[derive(Debug, Error)]
pub enum SecretStoreError {
	#[error(transparent)]
	Env(#[from] SecretEnvError),

	#[error("secret store {store} unavailable: {message}")]
	Unavailable { store: &'static str, message: String },
}

/// Read access to a single raw shared secret.
///
/// `Ok(None)` means "not configured", which callers surface as a
/// configuration error rather than a transient failure.
pub trait SecretStore: Send + Sync {
	fn name(&self) -> &'static str;
	fn load(&self) -> Result<Option<SecretString>, SecretStoreError>;
}

/// Reads the secret from an environment variable (or its `_FILE` companion).
#[derive(Debug, Clone)]
pub struct EnvSecretStore {
	var: String,
}

impl EnvSecretStore {
	pub fn new(var: impl Into<String>) -> Self {
		Self { var: var.into() }
	}

	pub fn var(&self) -> &str {
		&self.var
	}
}

impl SecretStore for EnvSecretStore {
	fn name(&self) -> &'static str {
		"environment"
	}

	fn load(&self) -> Result<Option<SecretString>, SecretStoreError> {
		Ok(load_secret_env(&self.var)?)
	}
}

/// A fixed secret, for tests and for callers that already fetched it.
#[derive(Debug, Clone, Default)]
pub struct StaticSecretStore {
	secret: Option<SecretString>,
}

impl StaticSecretStore {
	pub fn new(secret: impl Into<SecretString>) -> Self {
		Self {
			secret: Some(secret.into()),
		}
	}

	pub fn empty() -> Self {
		Self::default()
	}
}

impl SecretStore for StaticSecretStore {
	fn name(&self) -> &'static str {
		"static"
	}

	fn load(&self) -> Result<Option<SecretString>, SecretStoreError> {
		Ok(self.secret.clone())
	}
}

/// Caches the first successful read of another store.
///
/// Missing secrets are not cached, so a secret configured after start-up is
/// picked up on the next read. Call [`CachedSecretStore::refresh`] after a
/// rotation.
pub struct CachedSecretStore<S> {
	inner: S,
	cached: RwLock<Option<SecretString>>,
}

impl<S: SecretStore> CachedSecretStore<S> {
	pub fn new(inner: S) -> Self {
		Self {
			inner,
			cached: RwLock::new(None),
		}
	}

	/// Re-read the underlying store and replace the cached value.
	#[instrument(skip(self), fields(store = self.inner.name()))]
	pub fn refresh(&self) -> Result<Option<SecretString>, SecretStoreError> {
		let fresh = self.inner.load()?;
		debug!(configured = fresh.is_some(), "refreshed cached secret");
		*self.cached.write().unwrap_or_else(|e| e.into_inner()) = fresh.clone();
		Ok(fresh)
	}

	/// Drop the cached value; the next `load` reads through.
	pub fn invalidate(&self) {
		*self.cached.write().unwrap_or_else(|e| e.into_inner()) = None;
	}

	pub fn is_cached(&self) -> bool {
		self.cached
			.read()
			.unwrap_or_else(|e| e.into_inner())
			.is_some()
	}
}

impl<S: SecretStore> SecretStore for CachedSecretStore<S> {
	fn name(&self) -> &'static str {
		self.inner.name()
	}

	fn load(&self) -> Result<Option<SecretString>, SecretStoreError> {
		if let Some(secret) = self
			.cached
			.read()
			.unwrap_or_else(|e| e.into_inner())
			.as_ref()
		{
			return Ok(Some(secret.clone()));
		}

		let loaded = self.inner.load()?;
		if let Some(secret) = &loaded {
			*self.cached.write().unwrap_or_else(|e| e.into_inner()) = Some(secret.clone());
		}
		Ok(loaded)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::sync::atomic::{AtomicUsize, Ordering};
	use std::sync::Mutex;

	struct CountingStore {
		value: Mutex<Option<String>>,
		reads: AtomicUsize,
	}

	impl CountingStore {
		fn new(value: Option<&str>) -> Self {
			Self {
				value: Mutex::new(value.map(str::to_string)),
				reads: AtomicUsize::new(0),
			}
		}

		fn set(&self, value: &str) {
			*self.value.lock().unwrap() = Some(value.to_string());
		}
	}

	impl SecretStore for CountingStore {
		fn name(&self) -> &'static str {
			"counting"
		}

		fn load(&self) -> Result<Option<SecretString>, SecretStoreError> {
			self.reads.fetch_add(1, Ordering::SeqCst);
			Ok(self.value.lock().unwrap().clone().map(SecretString::new))
		}
	}

	#[test]
	fn static_store_returns_value() {
		let store = StaticSecretStore::new("abc");
		assert_eq!(store.load().unwrap().unwrap().expose(), "abc");
		assert!(StaticSecretStore::empty().load().unwrap().is_none());
	}

	#[test]
	fn env_store_reads_through_env() {
		let var = "HUDDLE_TEST_ENV_STORE_SECRET";
		std::env::set_var(var, "env-value");
		std::env::remove_var(format!("{var}_FILE"));

		let store = EnvSecretStore::new(var);
		assert_eq!(store.var(), var);
		assert_eq!(store.load().unwrap().unwrap().expose(), "env-value");

		std::env::remove_var(var);
	}

	#[test]
	fn cached_store_reads_inner_once() {
		let cached = CachedSecretStore::new(CountingStore::new(Some("first")));

		assert_eq!(cached.load().unwrap().unwrap().expose(), "first");
		assert_eq!(cached.load().unwrap().unwrap().expose(), "first");
		assert_eq!(cached.inner.reads.load(Ordering::SeqCst), 1);
		assert!(cached.is_cached());
	}

	#[test]
	fn cached_store_does_not_cache_absence() {
		let cached = CachedSecretStore::new(CountingStore::new(None));

		assert!(cached.load().unwrap().is_none());
		assert!(!cached.is_cached());

		cached.inner.set("late");
		assert_eq!(cached.load().unwrap().unwrap().expose(), "late");
		assert_eq!(cached.inner.reads.load(Ordering::SeqCst), 2);
	}

	#[test]
	fn refresh_picks_up_rotation() {
		let cached = CachedSecretStore::new(CountingStore::new(Some("old")));
		cached.load().unwrap();

		cached.inner.set("new");
		assert_eq!(cached.load().unwrap().unwrap().expose(), "old");
		assert_eq!(cached.refresh().unwrap().unwrap().expose(), "new");
		assert_eq!(cached.load().unwrap().unwrap().expose(), "new");
	}

	#[test]
	fn invalidate_forces_read_through() {
		let cached = CachedSecretStore::new(CountingStore::new(Some("v")));
		cached.load().unwrap();
		cached.invalidate();
		assert!(!cached.is_cached());
		cached.load().unwrap();
		assert_eq!(cached.inner.reads.load(Ordering::SeqCst), 2);
	}
}
