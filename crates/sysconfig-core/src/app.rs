//! SysConfig service object and its builder
//!
//! One `SysConfig` is constructed at process start and handed to every caller.
//! It owns the registry, the accessor and the encryption service.

use std::{env, sync::Arc};

use crate::accessor::ConfigAccessor;
use crate::cache::LruConfigCache;
use crate::encryption::Encryption;
use crate::prelude::*;
use crate::registry::{Namespace, Registry, SectionDefinition};
use crate::value_type::ValueTypes;
use sysconfig_types::cache_adapter::CacheAdapter;

pub const ENV_SECRET_KEY: &str = "SYSCONFIG_SECRET_KEY";
pub const ENV_CACHE_SIZE: &str = "SYSCONFIG_CACHE_SIZE";
pub const DEFAULT_CACHE_CAPACITY: usize = 1024;

#[derive(Debug, Clone)]
pub struct SysConfigOpts {
	pub secret_key: Box<str>,
	pub cache_capacity: usize,
}

impl SysConfigOpts {
	/// Read options from `SYSCONFIG_SECRET_KEY` (required) and `SYSCONFIG_CACHE_SIZE`
	pub fn from_env() -> ClResult<Self> {
		Self::from_vars(env::var(ENV_SECRET_KEY).ok(), env::var(ENV_CACHE_SIZE).ok())
	}

	fn from_vars(secret_key: Option<String>, cache_size: Option<String>) -> ClResult<Self> {
		let secret_key = secret_key
			.filter(|s| !s.is_empty())
			.ok_or_else(|| Error::ConfigError(format!("{} must be set", ENV_SECRET_KEY)))?;
		let cache_capacity = match cache_size {
			Some(size) => size.trim().parse().map_err(|_| {
				Error::ConfigError(format!("{} must be a number, got '{}'", ENV_CACHE_SIZE, size))
			})?,
			None => DEFAULT_CACHE_CAPACITY,
		};
		Ok(Self { secret_key: secret_key.into(), cache_capacity })
	}
}

pub struct SysConfigBuilder {
	secret_key: Option<Box<str>>,
	cache_capacity: usize,
	store_adapter: Option<Arc<dyn StoreAdapter>>,
	cache_adapter: Option<Arc<dyn CacheAdapter>>,
}

impl Default for SysConfigBuilder {
	fn default() -> Self {
		Self::new()
	}
}

impl SysConfigBuilder {
	pub fn new() -> Self {
		SysConfigBuilder {
			secret_key: None,
			cache_capacity: DEFAULT_CACHE_CAPACITY,
			store_adapter: None,
			cache_adapter: None,
		}
	}

	pub fn from_opts(opts: SysConfigOpts) -> Self {
		let mut builder = Self::new();
		builder.secret_key(opts.secret_key).cache_capacity(opts.cache_capacity);
		builder
	}

	// Opts
	pub fn secret_key(&mut self, secret_key: impl Into<Box<str>>) -> &mut Self {
		self.secret_key = Some(secret_key.into());
		self
	}
	pub fn cache_capacity(&mut self, cache_capacity: usize) -> &mut Self {
		self.cache_capacity = cache_capacity;
		self
	}

	// Adapters
	pub fn store_adapter(&mut self, store_adapter: Arc<dyn StoreAdapter>) -> &mut Self {
		self.store_adapter = Some(store_adapter);
		self
	}
	/// Cache backend; defaults to an in-process LRU cache of `cache_capacity` entries
	pub fn cache_adapter(&mut self, cache_adapter: Arc<dyn CacheAdapter>) -> &mut Self {
		self.cache_adapter = Some(cache_adapter);
		self
	}

	pub fn build(&mut self) -> ClResult<SysConfig> {
		let secret_key = self
			.secret_key
			.take()
			.ok_or_else(|| Error::ConfigError("secret key is required".into()))?;
		let store = self
			.store_adapter
			.take()
			.ok_or_else(|| Error::ConfigError("store adapter is required".into()))?;
		let cache = self
			.cache_adapter
			.take()
			.unwrap_or_else(|| Arc::new(LruConfigCache::new(self.cache_capacity)));

		let encryption = Arc::new(Encryption::new(&secret_key)?);
		let registry = Arc::new(Registry::new(store.clone(), ValueTypes::new(encryption.clone())));
		let accessor = Arc::new(ConfigAccessor::new(registry.clone(), store, cache.clone()));

		Ok(SysConfig { registry, accessor, encryption })
	}
}

#[derive(Debug, Clone)]
pub struct SysConfig {
	registry: Arc<Registry>,
	accessor: Arc<ConfigAccessor>,
	encryption: Arc<Encryption>,
}

impl SysConfig {
	pub fn builder() -> SysConfigBuilder {
		SysConfigBuilder::new()
	}

	/// Register a namespace declaration (see [`Registry::register`]).
	///
	/// Cached values are dropped, since the new declaration may decode them
	/// differently. This also happens when materializing defaults fails after
	/// the declaration was published.
	pub async fn register(
		&self,
		namespace: &str,
		sections: Vec<SectionDefinition>,
	) -> ClResult<Arc<Namespace>> {
		let result = self.registry.register(namespace, sections).await;
		self.accessor.clear_cache();
		result
	}

	pub fn accessor(&self) -> &Arc<ConfigAccessor> {
		&self.accessor
	}

	pub fn registry(&self) -> &Arc<Registry> {
		&self.registry
	}

	pub fn encryption(&self) -> &Arc<Encryption> {
		&self.encryption
	}

	/// Forget every declaration and cached value. Persisted values are untouched.
	pub fn reset(&self) {
		self.registry.reset();
		self.accessor.clear_cache();
		info!("Configuration registry reset");
	}
}


// vim: ts=4
