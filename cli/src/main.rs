//! sysconfig - inspect and change configuration values stored in SQLite

#![deny(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![forbid(unsafe_code)]

mod demo;

use clap::{Parser, Subcommand};
use std::{path::PathBuf, process::ExitCode, sync::Arc};

use sysconfig_core::display;
use sysconfig_core::prelude::*;
use sysconfig_core::value_type::Presentation;
use sysconfig_core::{SysConfig, SysConfigBuilder, SysConfigOpts};
use sysconfig_store_adapter_sqlite::StoreAdapterSqlite;

#[derive(Parser)]
#[command(name = "sysconfig")]
#[command(about = "Inspect and change typed configuration values")]
struct Cli {
	/// SQLite database file
	#[arg(long, env = "SYSCONFIG_DB", default_value = "./data/sysconfig.db")]
	db: PathBuf,

	#[command(subcommand)]
	command: Command,
}

#[derive(Subcommand)]
enum Command {
	/// Print the value of namespace.section.field
	Get { path: String },
	/// Change the value of namespace.section.field
	Set {
		path: String,
		/// New value, parsed according to the field's type
		value: Option<String>,
		/// Store null, falling back to the default on read
		#[arg(long, conflicts_with = "value")]
		null: bool,
	},
	/// Print every field of a namespace
	Show { namespace: String },
	/// Print the stored rows of a namespace (secrets masked)
	Raw { namespace: String },
	/// List registered namespaces
	Namespaces,
	/// Exit with success iff a stored row exists for the path
	IsSet { path: String },
}

async fn set(sysconfig: &SysConfig, path: &str, input: Option<&str>) -> ClResult<()> {
	let field = sysconfig.registry().resolve(&ConfigPath::parse(path)?)?;
	let value = match input {
		Some(input) => field.value_type.parse_input(input).map_err(|err| Error::ConfigValueError {
			path: path.into(),
			value: input.into(),
			reason: err.to_string().into(),
		})?,
		None => None,
	};
	sysconfig.accessor().set(path, value).await
}

async fn show(sysconfig: &SysConfig, namespace: &str) -> ClResult<()> {
	let declaration = sysconfig
		.registry()
		.get(namespace)
		.ok_or_else(|| Error::NamespaceNotFound(namespace.into()))?;
	let values = sysconfig.accessor().all(namespace).await?;

	for section in &declaration.sections {
		println!("[{}] {}", section.key, section.label);
		for field in &section.fields {
			let value = values.get(&*section.key).and_then(|s| s.get(&*field.name)).cloned().flatten();
			let shown = match (&value, field.presentation()) {
				(None, _) => display::NULL_PREVIEW.to_string(),
				(Some(_), Presentation::Password) => display::MASK.to_string(),
				(Some(value), _) => value.to_string(),
			};
			let required = if field.required() { " *" } else { "" };
			println!("  {} = {}    # {}{}", field.name, shown, field.label, required);
		}
	}
	Ok(())
}

async fn run(cli: Cli) -> ClResult<bool> {
	let opts = SysConfigOpts::from_env()?;
	let store = Arc::new(StoreAdapterSqlite::new(&cli.db).await?);
	let sysconfig = SysConfigBuilder::from_opts(opts).store_adapter(store.clone()).build()?;
	demo::register(&sysconfig).await?;

	match cli.command {
		Command::Get { path } => {
			let value = sysconfig.accessor().get(&path, None).await?;
			println!("{}", value.map_or_else(|| display::NULL_PREVIEW.to_string(), |v| v.to_string()));
		}
		Command::Set { path, value, null } => {
			let input = if null { None } else { value.as_deref() };
			if input.is_none() && !null {
				return Err(Error::ConfigError("a value or --null is required".into()));
			}
			set(&sysconfig, &path, input).await?;
			println!("{} updated", path);
		}
		Command::Show { namespace } => show(&sysconfig, &namespace).await?,
		Command::Raw { namespace } => {
			for row in store.list_values(&namespace).await? {
				println!("{} = {}", row.key, display::preview(row.value.as_deref()));
			}
		}
		Command::Namespaces => {
			for summary in sysconfig.registry().summaries() {
				println!(
					"{}: {} sections, {} fields",
					summary.namespace, summary.section_count, summary.field_count
				);
			}
		}
		Command::IsSet { path } => {
			let is_set = sysconfig.accessor().is_set(&path).await?;
			println!("{}", is_set);
			return Ok(is_set);
		}
	}
	Ok(true)
}

#[tokio::main]
async fn main() -> ExitCode {
	sysconfig_core::logging::init();
	let cli = Cli::parse();

	match run(cli).await {
		Ok(true) => ExitCode::SUCCESS,
		Ok(false) => ExitCode::FAILURE,
		Err(Error::Validation(errors)) => {
			for error in errors {
				eprintln!("error: {}", error);
			}
			ExitCode::FAILURE
		}
		Err(err) => {
			eprintln!("error: {}", err);
			ExitCode::FAILURE
		}
	}
}

// vim: ts=4
