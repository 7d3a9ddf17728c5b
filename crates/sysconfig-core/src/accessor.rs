//! Configuration accessor: the public read/write API
//!
//! Every operation takes a public path `namespace.section.field`. Reads go
//! through the cache, which mirrors the decoded stored value (or its absence);
//! field and caller defaults are applied after the cache, so they never go stale.
//!
//! A read that misses the cache only fills it if no write or clear touched the
//! key while the store was being read. Each key carries a generation, bumped on
//! every invalidation; a global epoch is bumped on every clear.

use parking_lot::Mutex;
use rust_decimal::Decimal;
use std::{collections::BTreeMap, collections::HashMap, fmt, sync::Arc};

use crate::prelude::*;
use crate::registry::{Field, Registry};
use sysconfig_types::cache_adapter::{CacheAdapter, CacheLookup, cache_key};

/// Typed snapshot of one section: field name -> value
pub type SectionValues = BTreeMap<String, Option<ConfigValue>>;

/// Typed snapshot of a namespace: section key -> field name -> value
pub type NamespaceValues = BTreeMap<String, SectionValues>;

pub struct ConfigAccessor {
	registry: Arc<Registry>,
	store: Arc<dyn StoreAdapter>,
	cache: Arc<dyn CacheAdapter>,
	generations: Mutex<Generations>,
}

#[derive(Debug, Default)]
struct Generations {
	epoch: u64,
	keys: HashMap<Box<str>, u64>,
}

impl Generations {
	fn current(&self, key: &str) -> (u64, u64) {
		(self.epoch, self.keys.get(key).copied().unwrap_or(0))
	}
}

impl fmt::Debug for ConfigAccessor {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("ConfigAccessor")
			.field("store", &self.store)
			.field("cache", &self.cache)
			.finish_non_exhaustive()
	}
}

fn describe(value: Option<&ConfigValue>) -> Box<str> {
	value.map_or_else(|| "null".into(), |v| v.to_string().into())
}

impl ConfigAccessor {
	pub fn new(
		registry: Arc<Registry>,
		store: Arc<dyn StoreAdapter>,
		cache: Arc<dyn CacheAdapter>,
	) -> Self {
		Self { registry, store, cache, generations: Mutex::new(Generations::default()) }
	}

	/// Drop every cached value.
	///
	/// Reads still in flight will not repopulate the cache with what they fetched.
	pub fn clear_cache(&self) {
		let mut generations = self.generations.lock();
		generations.epoch = generations.epoch.wrapping_add(1);
		generations.keys.clear();
		self.cache.clear();
	}

	fn invalidate(&self, key: &str) {
		let mut generations = self.generations.lock();
		let generation = generations.keys.entry(key.into()).or_insert(0);
		*generation = generation.wrapping_add(1);
		self.cache.invalidate(key);
	}

	/// Cache a value read from the store, unless the key was invalidated since `seen`
	fn fill_cache(&self, key: &str, seen: (u64, u64), value: Option<ConfigValue>) {
		let generations = self.generations.lock();
		if generations.current(key) == seen {
			self.cache.set(key, value);
		} else {
			debug!("Config value {} changed during read, not cached", key);
		}
	}

	fn resolve(&self, path: &str) -> ClResult<Arc<Field>> {
		let path = ConfigPath::parse(path)?;
		self.registry.resolve(&path)
	}

	/// Decoded stored value of a field, read through the cache
	async fn read_stored(&self, field: &Field) -> ClResult<Option<ConfigValue>> {
		let key = cache_key(&field.path());
		if let CacheLookup::Hit(value) = self.cache.get(&key) {
			debug!("Config cache hit: {}", key);
			return Ok(value);
		}

		let seen = self.generations.lock().current(&key);
		let row = self.store.read_value(&field.namespace, &field.key.to_string()).await?;
		let raw = row.and_then(|row| row.value);
		let value = field.value_type.decode(raw.as_deref())?;
		self.fill_cache(&key, seen, value.clone());
		Ok(value)
	}

	/// Read a value, falling back to the field default and then to `default`.
	///
	/// When `default` is given, path resolution errors are suppressed into it.
	pub async fn get(
		&self,
		path: &str,
		default: Option<ConfigValue>,
	) -> ClResult<Option<ConfigValue>> {
		let field = match self.resolve(path) {
			Ok(field) => field,
			Err(err) if err.is_resolution() && default.is_some() => {
				debug!("Config path {} not resolved, using caller default: {}", path, err);
				return Ok(default);
			}
			Err(err) => return Err(err),
		};

		let stored = self.read_stored(&field).await?;
		Ok(stored.or_else(|| field.default.clone()).or(default))
	}

	/// Encode, validate and persist a value, then run the field's `on_save` hook.
	///
	/// A failing hook is reported to the caller, but the write stays committed.
	pub async fn set(&self, path: &str, value: Option<ConfigValue>) -> ClResult<()> {
		let field = self.resolve(path)?;
		let canonical = field.path();

		let raw = field.value_type.encode(value.as_ref()).map_err(|err| Error::ConfigValueError {
			path: canonical.as_str().into(),
			value: describe(value.as_ref()),
			reason: err.to_string().into(),
		})?;

		let errors = field.validate(value.as_ref());
		if !errors.is_empty() {
			debug!("Rejected value for {}: {} validation errors", canonical, errors.len());
			return Err(Error::Validation(errors));
		}

		let old_value = match field.on_save() {
			Some(_) => match self.read_stored(&field).await {
				Ok(stored) => stored.or_else(|| field.default.clone()),
				Err(err) => {
					warn!("Could not read previous value of {}: {}", canonical, err);
					field.default.clone()
				}
			},
			None => None,
		};

		self.store.upsert_value(&field.namespace, &field.key.to_string(), raw.as_deref()).await?;
		self.invalidate(&cache_key(&canonical));
		info!("Config value {} updated", canonical);

		if let Some(on_save) = field.on_save() {
			if let Err(err) = on_save(&canonical, value.as_ref(), old_value.as_ref()) {
				warn!("on_save hook of {} failed after the write committed: {}", canonical, err);
				return Err(err);
			}
		}
		Ok(())
	}

	/// Apply `set` for each entry in order, stopping at the first failure.
	///
	/// Entries applied before a failure stay committed.
	pub async fn set_many<P, I>(&self, entries: I) -> ClResult<usize>
	where
		P: AsRef<str>,
		I: IntoIterator<Item = (P, Option<ConfigValue>)>,
	{
		let mut count = 0;
		for (path, value) in entries {
			self.set(path.as_ref(), value).await?;
			count += 1;
		}
		Ok(count)
	}

	/// Snapshot every field of a namespace with a single store query
	pub async fn all(&self, namespace: &str) -> ClResult<NamespaceValues> {
		let declaration = self
			.registry
			.get(namespace)
			.ok_or_else(|| Error::NamespaceNotFound(namespace.into()))?;

		let rows: HashMap<Box<str>, Option<Box<str>>> = self
			.store
			.list_values(namespace)
			.await?
			.into_iter()
			.map(|row| (row.key, row.value))
			.collect();

		let mut result = NamespaceValues::new();
		for section in &declaration.sections {
			let mut values = SectionValues::new();
			for field in &section.fields {
				let raw = rows.get(field.key.to_string().as_str()).and_then(|v| v.as_deref());
				let decoded = field.value_type.decode(raw).unwrap_or_else(|err| {
					warn!("Could not decode stored value of {}: {}", field.path(), err);
					None
				});
				values.insert(field.name.to_string(), decoded.or_else(|| field.default.clone()));
			}
			result.insert(section.key.to_string(), values);
		}
		Ok(result)
	}

	/// Snapshot one section (`namespace.section`); unknown sections are empty
	pub async fn section(&self, path: &str) -> ClResult<SectionValues> {
		let path = SectionPath::parse(path)?;
		let mut all = self.all(&path.namespace).await?;
		Ok(all.remove(path.section.to_lowercase().as_str()).unwrap_or_default())
	}

	/// True iff the path resolves to a registered field
	pub fn exists(&self, path: &str) -> bool {
		self.resolve(path).is_ok()
	}

	/// True iff a stored row exists for the path, even one holding null.
	///
	/// Paths that do not resolve are reported as not set.
	pub async fn is_set(&self, path: &str) -> ClResult<bool> {
		let Ok(field) = self.resolve(path) else { return Ok(false) };
		let row = self.store.read_value(&field.namespace, &field.key.to_string()).await?;
		Ok(row.is_some())
	}

	/// Run the field's validators without writing
	pub fn validate(&self, path: &str, value: Option<&ConfigValue>) -> ClResult<Vec<ValidationError>> {
		Ok(self.resolve(path)?.validate(value))
	}

	/// Type-safe getters: `None` when unset without a default, error on a type mismatch
	pub async fn get_string(&self, path: &str) -> ClResult<Option<String>> {
		match self.get(path, None).await? {
			None => Ok(None),
			Some(ConfigValue::String(s)) => Ok(Some(s)),
			Some(v) => Err(type_mismatch(path, "string", &v)),
		}
	}

	pub async fn get_int(&self, path: &str) -> ClResult<Option<i64>> {
		match self.get(path, None).await? {
			None => Ok(None),
			Some(ConfigValue::Int(i)) => Ok(Some(i)),
			Some(v) => Err(type_mismatch(path, "integer", &v)),
		}
	}

	pub async fn get_bool(&self, path: &str) -> ClResult<Option<bool>> {
		match self.get(path, None).await? {
			None => Ok(None),
			Some(ConfigValue::Bool(b)) => Ok(Some(b)),
			Some(v) => Err(type_mismatch(path, "boolean", &v)),
		}
	}

	pub async fn get_decimal(&self, path: &str) -> ClResult<Option<Decimal>> {
		match self.get(path, None).await? {
			None => Ok(None),
			Some(ConfigValue::Decimal(d)) => Ok(Some(d)),
			Some(ConfigValue::Int(i)) => Ok(Some(Decimal::from(i))),
			Some(v) => Err(type_mismatch(path, "decimal", &v)),
		}
	}
}

fn type_mismatch(path: &str, expected: &str, value: &ConfigValue) -> Error {
	Error::ConfigValueError {
		path: path.into(),
		value: value.to_string().into(),
		reason: format!("expected {}, got {}", expected, value.type_name()).into(),
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::cache::LruConfigCache;
	use crate::encryption::Encryption;
	use crate::memory_store::MemoryStore;
	use crate::registry::{FieldDefinition, SectionDefinition};
	use crate::validator::{Length, Range, Required};
	use crate::value_type::ValueTypes;
	use std::sync::Mutex;

	struct Fixture {
		accessor: ConfigAccessor,
		store: Arc<MemoryStore>,
		cache: Arc<LruConfigCache>,
	}

	async fn fixture(sections: Vec<SectionDefinition>) -> Fixture {
		let store = Arc::new(MemoryStore::new());
		let cache = Arc::new(LruConfigCache::new(64));
		let encryption = Arc::new(Encryption::new("accessor-tests").unwrap());
		let registry = Arc::new(Registry::new(store.clone(), ValueTypes::new(encryption)));
		registry.register("todo", sections).await.unwrap();
		let accessor = ConfigAccessor::new(registry, store.clone(), cache.clone());
		Fixture { accessor, store, cache }
	}

	fn general() -> SectionDefinition {
		SectionDefinition::builder("General")
			.field(
				FieldDefinition::builder("max_items")
					.value_type("integer")
					.default(100)
					.validator(Range::new(1, 1000))
					.build()
					.unwrap(),
			)
			.field(FieldDefinition::builder("title").label("Title").build().unwrap())
			.field(FieldDefinition::builder("api_key").value_type("secret").build().unwrap())
			.build()
			.unwrap()
	}

	#[tokio::test]
	async fn test_get_falls_back_to_defaults() {
		let fx = fixture(vec![general()]).await;
		assert_eq!(fx.accessor.get("todo.general.max_items", None).await.unwrap(), Some(100.into()));
		assert_eq!(fx.accessor.get("todo.general.title", None).await.unwrap(), None);
		assert_eq!(
			fx.accessor.get("todo.general.title", Some("Inbox".into())).await.unwrap(),
			Some("Inbox".into())
		);
	}

	#[tokio::test]
	async fn test_get_resolution_errors() {
		let fx = fixture(vec![general()]).await;
		let err = fx.accessor.get("todo.general", None).await.unwrap_err();
		assert!(matches!(err, Error::InvalidPath { .. }));
		let err = fx.accessor.get("nope.general.x", None).await.unwrap_err();
		assert!(matches!(err, Error::NamespaceNotFound(_)));
		let err = fx.accessor.get("todo.general.nope", None).await.unwrap_err();
		assert!(matches!(err, Error::FieldNotFound(_)));

		let value = fx.accessor.get("todo.general.nope", Some(5.into())).await.unwrap();
		assert_eq!(value, Some(5.into()));
	}

	#[tokio::test]
	async fn test_set_then_get() {
		let fx = fixture(vec![general()]).await;
		assert!(!fx.accessor.is_set("todo.general.title").await.unwrap());
		fx.accessor.set("todo.general.title", Some("Groceries".into())).await.unwrap();
		assert!(fx.accessor.is_set("todo.general.title").await.unwrap());
		assert_eq!(
			fx.accessor.get_string("todo.general.title").await.unwrap().as_deref(),
			Some("Groceries")
		);
	}

	#[tokio::test]
	async fn test_section_lookup_is_case_insensitive() {
		let fx = fixture(vec![general()]).await;
		fx.accessor.set("todo.GENERAL.max_items", Some(55.into())).await.unwrap();
		assert_eq!(fx.accessor.get_int("todo.General.max_items").await.unwrap(), Some(55));
		let row = fx.store.read_value("todo", "general/max_items").await.unwrap().unwrap();
		assert_eq!(row.value.as_deref(), Some("55"));
	}

	#[tokio::test]
	async fn test_set_invalidates_cache() {
		let fx = fixture(vec![general()]).await;
		assert_eq!(fx.accessor.get_int("todo.general.max_items").await.unwrap(), Some(100));
		assert!(fx.cache.get("config:todo.general.max_items").is_hit());

		fx.accessor.set("todo.general.max_items", Some(250.into())).await.unwrap();
		assert!(!fx.cache.get("config:todo.general.max_items").is_hit());
		assert_eq!(fx.accessor.get_int("todo.general.max_items").await.unwrap(), Some(250));
	}

	#[tokio::test]
	async fn test_null_cached_value_still_uses_default() {
		let fx = fixture(vec![general()]).await;
		fx.accessor.set("todo.general.max_items", None).await.unwrap();
		assert_eq!(fx.accessor.get_int("todo.general.max_items").await.unwrap(), Some(100));
		assert_eq!(fx.cache.get("config:todo.general.max_items"), CacheLookup::Hit(None));
		assert!(fx.accessor.is_set("todo.general.max_items").await.unwrap());
	}

	#[tokio::test]
	async fn test_set_encode_failure() {
		let fx = fixture(vec![general()]).await;
		let err = fx.accessor.set("todo.general.max_items", Some("lots".into())).await.unwrap_err();
		assert!(matches!(
			err,
			Error::ConfigValueError { ref path, ref value, .. }
				if &**path == "todo.general.max_items" && &**value == "lots"
		));
	}

	#[tokio::test]
	async fn test_set_validation_failure_keeps_value() {
		let fx = fixture(vec![general()]).await;
		fx.accessor.set("todo.general.max_items", Some(250.into())).await.unwrap();
		let err = fx.accessor.set("todo.general.max_items", Some(5000.into())).await.unwrap_err();
		assert!(matches!(err, Error::Validation(ref errors) if errors.len() == 1));
		assert_eq!(fx.accessor.get_int("todo.general.max_items").await.unwrap(), Some(250));
	}

	#[tokio::test]
	async fn test_validation_collects_every_failure() {
		let section = SectionDefinition::builder("profile")
			.field(
				FieldDefinition::builder("nickname")
					.label("Nickname")
					.validator(Required::new())
					.validator(Length::min(3))
					.build()
					.unwrap(),
			)
			.build()
			.unwrap();
		let fx = fixture(vec![section]).await;

		let errors = fx.accessor.validate("todo.profile.nickname", Some(&"".into())).unwrap();
		assert_eq!(errors.len(), 2);
		assert!(errors.iter().all(|e| &*e.label == "Nickname"));

		let err = fx.accessor.set("todo.profile.nickname", Some("".into())).await.unwrap_err();
		assert_eq!(err.validation_messages().len(), 2);
		assert!(!fx.accessor.is_set("todo.profile.nickname").await.unwrap());
	}

	#[tokio::test]
	async fn test_secret_stored_encrypted() {
		let fx = fixture(vec![general()]).await;
		fx.accessor.set("todo.general.api_key", Some("hunter2".into())).await.unwrap();
		let row = fx.store.read_value("todo", "general/api_key").await.unwrap().unwrap();
		let raw = row.value.unwrap();
		assert!(Encryption::is_encrypted(&raw));
		assert_eq!(fx.accessor.get_string("todo.general.api_key").await.unwrap().as_deref(), Some("hunter2"));
	}

	#[tokio::test]
	async fn test_on_save_receives_old_and_new() {
		let calls: Arc<Mutex<Vec<(String, Option<ConfigValue>, Option<ConfigValue>)>>> =
			Arc::default();
		let recorded = calls.clone();
		let section = SectionDefinition::builder("general")
			.field(
				FieldDefinition::builder("limit")
					.value_type("int")
					.default(10)
					.on_save(move |path, new, old| {
						recorded.lock().unwrap().push((path.to_string(), new.cloned(), old.cloned()));
						Ok(())
					})
					.build()
					.unwrap(),
			)
			.build()
			.unwrap();
		let fx = fixture(vec![section]).await;

		fx.accessor.set("todo.general.limit", Some(20.into())).await.unwrap();
		fx.accessor.set("todo.general.limit", Some(30.into())).await.unwrap();

		let calls = calls.lock().unwrap();
		assert_eq!(calls.len(), 2);
		assert_eq!(calls[0], ("todo.general.limit".to_string(), Some(20.into()), Some(10.into())));
		assert_eq!(calls[1].2, Some(20.into()));
	}

	#[tokio::test]
	async fn test_failing_on_save_keeps_write() {
		let section = SectionDefinition::builder("general")
			.field(
				FieldDefinition::builder("limit")
					.value_type("int")
					.on_save(|_, _, _| Err(Error::Internal("hook failed".into())))
					.build()
					.unwrap(),
			)
			.build()
			.unwrap();
		let fx = fixture(vec![section]).await;

		let err = fx.accessor.set("todo.general.limit", Some(3.into())).await.unwrap_err();
		assert!(matches!(err, Error::Internal(_)));
		assert_eq!(fx.accessor.get_int("todo.general.limit").await.unwrap(), Some(3));
	}

	#[tokio::test]
	async fn test_set_many_stops_at_first_failure() {
		let fx = fixture(vec![general()]).await;
		let count = fx
			.accessor
			.set_many(vec![
				("todo.general.title", Some("A".into())),
				("todo.general.max_items", Some(20.into())),
			])
			.await
			.unwrap();
		assert_eq!(count, 2);

		let err = fx
			.accessor
			.set_many(vec![
				("todo.general.title", Some("B".into())),
				("todo.general.max_items", Some(0.into())),
				("todo.general.title", Some("C".into())),
			])
			.await
			.unwrap_err();
		assert!(matches!(err, Error::Validation(_)));
		assert_eq!(fx.accessor.get_string("todo.general.title").await.unwrap().as_deref(), Some("B"));
		assert_eq!(fx.accessor.get_int("todo.general.max_items").await.unwrap(), Some(20));
	}

	#[tokio::test]
	async fn test_all_and_section() {
		let fx = fixture(vec![general()]).await;
		fx.accessor.set("todo.general.title", Some("Inbox".into())).await.unwrap();

		let all = fx.accessor.all("todo").await.unwrap();
		let general = &all["general"];
		assert_eq!(general["max_items"], Some(100.into()));
		assert_eq!(general["title"], Some("Inbox".into()));
		assert_eq!(general["api_key"], None);

		let section = fx.accessor.section("todo.General").await.unwrap();
		assert_eq!(&section, general);
		assert!(fx.accessor.section("todo.missing").await.unwrap().is_empty());
		assert!(matches!(fx.accessor.all("nope").await, Err(Error::NamespaceNotFound(_))));
	}

	#[tokio::test]
	async fn test_exists_and_is_set_on_bad_paths() {
		let fx = fixture(vec![general()]).await;
		assert!(fx.accessor.exists("todo.general.title"));
		assert!(!fx.accessor.exists("todo.general"));
		assert!(!fx.accessor.exists("todo.general.nope"));
		assert!(!fx.accessor.is_set("todo.general").await.unwrap());
		assert!(!fx.accessor.is_set("a.b.c.d").await.unwrap());
	}

	#[tokio::test]
	async fn test_typed_getter_mismatch() {
		let fx = fixture(vec![general()]).await;
		let err = fx.accessor.get_bool("todo.general.max_items").await.unwrap_err();
		assert!(matches!(err, Error::ConfigValueError { .. }));
		assert_eq!(
			fx.accessor.get_decimal("todo.general.max_items").await.unwrap(),
			Some(Decimal::from(100))
		);
	}
}

// vim: ts=4
