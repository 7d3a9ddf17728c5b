//! Configuration registry
//!
//! Holds, per namespace, the declared sections and fields. A declaration is
//! built with [`SectionDefinition::builder`] / [`FieldDefinition::builder`],
//! compiled against the value-type table and published as a whole, so readers
//! observe either the previous or the new declaration of a namespace.
//!
//! Registering a namespace also materializes defaults: every field with a
//! default gets a stored row unless one already exists.

use parking_lot::RwLock;
use std::{
	collections::{HashMap, HashSet},
	fmt::{self, Debug},
	sync::Arc,
};

use crate::prelude::*;
use crate::validator::{Validator, validate_value};
use crate::value_type::{Extra, Presentation, ValueType, ValueTypes};

/// Post-commit hook of a field, called with `(path, new_value, old_value)`
pub type OnSaveHook =
	Box<dyn Fn(&str, Option<&ConfigValue>, Option<&ConfigValue>) -> ClResult<()> + Send + Sync>;

fn check_name(kind: &str, name: &str) -> ClResult<()> {
	if name.is_empty() || name.contains(['.', '/']) || name.trim() != name {
		return Err(Error::ConfigError(format!("Invalid {} name: '{}'", kind, name)));
	}
	Ok(())
}

// Declarations
//**************

/// Declared field, before compilation against the value-type table
pub struct FieldDefinition {
	name: Box<str>,
	value_type: Box<str>,
	label: Option<Box<str>>,
	help_text: Box<str>,
	default: Option<ConfigValue>,
	sort_order: i32,
	validators: Vec<Box<dyn Validator>>,
	on_save: Option<OnSaveHook>,
	extra: Extra,
}

impl Debug for FieldDefinition {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("FieldDefinition")
			.field("name", &self.name)
			.field("value_type", &self.value_type)
			.field("default", &self.default)
			.field("validators", &self.validators.len())
			.field("on_save", &self.on_save.is_some())
			.finish_non_exhaustive()
	}
}

impl FieldDefinition {
	pub fn builder(name: impl Into<Box<str>>) -> FieldDefinitionBuilder {
		FieldDefinitionBuilder::new(name)
	}
}

/// Builder for FieldDefinition with fluent API
pub struct FieldDefinitionBuilder {
	def: FieldDefinition,
}

impl FieldDefinitionBuilder {
	pub fn new(name: impl Into<Box<str>>) -> Self {
		Self {
			def: FieldDefinition {
				name: name.into(),
				value_type: "string".into(),
				label: None,
				help_text: "".into(),
				default: None,
				sort_order: 0,
				validators: Vec::new(),
				on_save: None,
				extra: Extra::new(),
			},
		}
	}

	/// Value-type plugin name or alias (defaults to `string`)
	pub fn value_type(mut self, value_type: impl Into<Box<str>>) -> Self {
		self.def.value_type = value_type.into();
		self
	}

	/// Display label (defaults to the field name)
	pub fn label(mut self, label: impl Into<Box<str>>) -> Self {
		self.def.label = Some(label.into());
		self
	}

	pub fn help_text(mut self, help_text: impl Into<Box<str>>) -> Self {
		self.def.help_text = help_text.into();
		self
	}

	pub fn default(mut self, value: impl Into<ConfigValue>) -> Self {
		self.def.default = Some(value.into());
		self
	}

	pub fn sort_order(mut self, sort_order: i32) -> Self {
		self.def.sort_order = sort_order;
		self
	}

	/// Append a validator; validators run in the order they were added
	pub fn validator(mut self, validator: impl Validator + 'static) -> Self {
		self.def.validators.push(Box::new(validator));
		self
	}

	pub fn on_save<F>(mut self, f: F) -> Self
	where
		F: Fn(&str, Option<&ConfigValue>, Option<&ConfigValue>) -> ClResult<()>
			+ Send
			+ Sync
			+ 'static,
	{
		self.def.on_save = Some(Box::new(f));
		self
	}

	/// Plugin-specific parameter (e.g. `step`, `choices`)
	pub fn extra(mut self, key: impl Into<Box<str>>, value: serde_json::Value) -> Self {
		self.def.extra.insert(key.into(), value);
		self
	}

	pub fn build(self) -> ClResult<FieldDefinition> {
		check_name("field", &self.def.name)?;
		Ok(self.def)
	}
}

/// Declared section: an ordered group of fields
#[derive(Debug)]
pub struct SectionDefinition {
	name: Box<str>,
	label: Option<Box<str>>,
	sort_order: i32,
	fields: Vec<FieldDefinition>,
}

impl SectionDefinition {
	pub fn builder(name: impl Into<Box<str>>) -> SectionDefinitionBuilder {
		SectionDefinitionBuilder {
			def: SectionDefinition { name: name.into(), label: None, sort_order: 0, fields: Vec::new() },
		}
	}
}

pub struct SectionDefinitionBuilder {
	def: SectionDefinition,
}

impl SectionDefinitionBuilder {
	pub fn label(mut self, label: impl Into<Box<str>>) -> Self {
		self.def.label = Some(label.into());
		self
	}

	pub fn sort_order(mut self, sort_order: i32) -> Self {
		self.def.sort_order = sort_order;
		self
	}

	pub fn field(mut self, field: FieldDefinition) -> Self {
		self.def.fields.push(field);
		self
	}

	pub fn build(self) -> ClResult<SectionDefinition> {
		check_name("section", &self.def.name)?;
		let mut seen = HashSet::new();
		for field in &self.def.fields {
			if !seen.insert(&field.name) {
				return Err(Error::ConfigError(format!(
					"Duplicate field '{}' in section '{}'",
					field.name, self.def.name
				)));
			}
		}
		Ok(self.def)
	}
}

// Compiled metadata
//*******************

/// A registered field
pub struct Field {
	pub name: Box<str>,
	pub namespace: Box<str>,
	/// Internal store key (`section_key/field_name`)
	pub key: StoreKey,
	pub value_type: Arc<dyn ValueType>,
	pub label: Box<str>,
	pub help_text: Box<str>,
	pub default: Option<ConfigValue>,
	pub sort_order: i32,
	pub extra: Extra,
	validators: Vec<Box<dyn Validator>>,
	on_save: Option<OnSaveHook>,
}

impl Debug for Field {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Field")
			.field("path", &self.path())
			.field("value_type", &self.value_type.name())
			.field("default", &self.default)
			.field("validators", &self.validators)
			.field("on_save", &self.on_save.is_some())
			.finish_non_exhaustive()
	}
}

impl Field {
	/// Canonical public path (`namespace.section_key.field`)
	pub fn path(&self) -> String {
		format!("{}.{}.{}", self.namespace, self.key.section, self.key.field)
	}

	/// True iff the field carries a presence validator
	pub fn required(&self) -> bool {
		self.validators.iter().any(|v| v.is_presence())
	}

	pub fn presentation(&self) -> Presentation {
		self.value_type.presentation(&self.extra)
	}

	/// Run every validator, collecting all failures
	pub fn validate(&self, value: Option<&ConfigValue>) -> Vec<ValidationError> {
		validate_value(value, &self.validators, &self.label)
	}

	pub(crate) fn on_save(&self) -> Option<&OnSaveHook> {
		self.on_save.as_ref()
	}
}

#[derive(Debug)]
pub struct Section {
	/// Lower-cased section name, as used in store keys and canonical paths
	pub key: Box<str>,
	pub name: Box<str>,
	pub label: Box<str>,
	pub sort_order: i32,
	pub fields: Vec<Arc<Field>>,
}

impl Section {
	pub fn field(&self, name: &str) -> Option<&Arc<Field>> {
		self.fields.iter().find(|f| &*f.name == name)
	}
}

/// The published declaration of one namespace
#[derive(Debug)]
pub struct Namespace {
	pub name: Box<str>,
	pub sections: Vec<Section>,
}

impl Namespace {
	/// Section by case-insensitive name
	pub fn section(&self, name: &str) -> Option<&Section> {
		let key = name.to_lowercase();
		self.sections.iter().find(|s| *s.key == *key)
	}

	pub fn field(&self, key: &StoreKey) -> Option<&Arc<Field>> {
		self.section(&key.section)?.field(&key.field)
	}

	pub fn fields(&self) -> impl Iterator<Item = &Arc<Field>> {
		self.sections.iter().flat_map(|s| s.fields.iter())
	}

	pub fn field_count(&self) -> usize {
		self.sections.iter().map(|s| s.fields.len()).sum()
	}
}

/// Counts shown by namespace listings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamespaceSummary {
	pub namespace: Box<str>,
	pub section_count: usize,
	pub field_count: usize,
}

// Registry
//**********

pub struct Registry {
	store: Arc<dyn StoreAdapter>,
	value_types: ValueTypes,
	namespaces: RwLock<HashMap<Box<str>, Arc<Namespace>>>,
}

impl Debug for Registry {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Registry")
			.field("namespaces", &self.list_namespaces())
			.finish_non_exhaustive()
	}
}

impl Registry {
	pub fn new(store: Arc<dyn StoreAdapter>, value_types: ValueTypes) -> Self {
		Self { store, value_types, namespaces: RwLock::new(HashMap::new()) }
	}

	pub fn value_types(&self) -> &ValueTypes {
		&self.value_types
	}

	/// Register (or replace) the declaration of a namespace, then materialize defaults.
	///
	/// Persisted values are never deleted. Store-unready errors during
	/// materialization are logged and swallowed; any other error is returned,
	/// but the declaration stays published.
	///
	/// Callers go through [`SysConfig::register`](crate::SysConfig::register),
	/// which also drops cached values decoded under the previous declaration.
	pub(crate) async fn register(
		&self,
		namespace: &str,
		sections: Vec<SectionDefinition>,
	) -> ClResult<Arc<Namespace>> {
		check_name("namespace", namespace)?;
		let (compiled, defaults) = self.compile(namespace, sections)?;
		let compiled = Arc::new(compiled);

		let replaced =
			self.namespaces.write().insert(namespace.into(), compiled.clone()).is_some();
		info!(
			"Registered config namespace '{}' ({} sections, {} fields{})",
			namespace,
			compiled.sections.len(),
			compiled.field_count(),
			if replaced { ", replacing previous declaration" } else { "" }
		);

		self.materialize(namespace, &defaults).await?;
		Ok(compiled)
	}

	/// Build the full declaration, encoding every default up front so a bad
	/// default fails registration before anything is published
	fn compile(
		&self,
		namespace: &str,
		sections: Vec<SectionDefinition>,
	) -> ClResult<(Namespace, Vec<(String, String)>)> {
		let mut compiled = Vec::with_capacity(sections.len());
		let mut defaults = Vec::new();
		let mut seen = HashSet::new();

		for section in sections {
			let key: Box<str> = section.name.to_lowercase().into();
			if !seen.insert(key.clone()) {
				return Err(Error::ConfigError(format!(
					"Duplicate section '{}' in namespace '{}'",
					section.name, namespace
				)));
			}

			let mut fields = Vec::with_capacity(section.fields.len());
			for def in section.fields {
				let value_type = self.value_types.resolve(&def.value_type);
				let field = Field {
					namespace: namespace.into(),
					key: StoreKey::new(&key, &def.name),
					label: def.label.unwrap_or_else(|| def.name.clone()),
					name: def.name,
					value_type,
					help_text: def.help_text,
					default: def.default,
					sort_order: def.sort_order,
					extra: def.extra,
					validators: def.validators,
					on_save: def.on_save,
				};
				if let Some(default) = &field.default {
					let encoded = field.value_type.encode(Some(default)).map_err(|e| {
						Error::ConfigValueError {
							path: field.path().into(),
							value: default.to_string().into(),
							reason: e.to_string().into(),
						}
					})?;
					if let Some(encoded) = encoded {
						defaults.push((field.key.to_string(), encoded));
					}
				}
				fields.push(Arc::new(field));
			}
			fields.sort_by(|a, b| (a.sort_order, &a.name).cmp(&(b.sort_order, &b.name)));

			compiled.push(Section {
				label: section.label.unwrap_or_else(|| section.name.clone()),
				key,
				name: section.name,
				sort_order: section.sort_order,
				fields,
			});
		}
		compiled.sort_by(|a, b| (a.sort_order, &a.name).cmp(&(b.sort_order, &b.name)));

		Ok((Namespace { name: namespace.into(), sections: compiled }, defaults))
	}

	async fn materialize(&self, namespace: &str, defaults: &[(String, String)]) -> ClResult<()> {
		let mut created = 0;
		for (key, raw) in defaults {
			match self.store.get_or_create_value(namespace, key, Some(raw)).await {
				Ok(true) => created += 1,
				Ok(false) => {}
				Err(err) if err.is_store_unready() => {
					warn!(
						"Skipping default materialization for namespace '{}': {}",
						namespace, err
					);
					return Ok(());
				}
				Err(err) => return Err(err),
			}
		}
		if created > 0 {
			debug!("Materialized {} default values for namespace '{}'", created, namespace);
		}
		Ok(())
	}

	pub fn get(&self, namespace: &str) -> Option<Arc<Namespace>> {
		self.namespaces.read().get(namespace).cloned()
	}

	/// Field by internal path `section/field` (section matched case-insensitively)
	pub fn get_field(&self, namespace: &str, path: &str) -> Option<Arc<Field>> {
		let key = StoreKey::parse(path).ok()?;
		self.get(namespace)?.field(&key).cloned()
	}

	/// Resolve a public path to its field
	pub fn resolve(&self, path: &ConfigPath) -> ClResult<Arc<Field>> {
		let namespace = self
			.get(&path.namespace)
			.ok_or_else(|| Error::NamespaceNotFound(path.namespace.clone()))?;
		namespace
			.field(&path.store_key())
			.cloned()
			.ok_or_else(|| Error::FieldNotFound(path.to_string().into()))
	}

	/// Sorted names of every registered namespace
	pub fn list_namespaces(&self) -> Vec<Box<str>> {
		let mut names: Vec<_> = self.namespaces.read().keys().cloned().collect();
		names.sort();
		names
	}

	pub fn summaries(&self) -> Vec<NamespaceSummary> {
		let mut summaries: Vec<_> = self
			.namespaces
			.read()
			.values()
			.map(|ns| NamespaceSummary {
				namespace: ns.name.clone(),
				section_count: ns.sections.len(),
				field_count: ns.field_count(),
			})
			.collect();
		summaries.sort_by(|a, b| a.namespace.cmp(&b.namespace));
		summaries
	}

	/// Forget every declaration. Persisted values are untouched.
	pub(crate) fn reset(&self) {
		self.namespaces.write().clear();
	}
}


// vim: ts=4
