//! Namespaces registered by the operator binary

use serde_json::json;

use sysconfig_core::SysConfig;
use sysconfig_core::prelude::*;
use sysconfig_core::registry::{FieldDefinition, SectionDefinition};
use sysconfig_core::validator::{Choice, Email, Hostname, Length, Port, Range, Required, Url};

fn todo() -> ClResult<Vec<SectionDefinition>> {
	let general = SectionDefinition::builder("General")
		.label("General")
		.field(
			FieldDefinition::builder("max_items")
				.value_type("integer")
				.label("Maximum items per list")
				.default(100)
				.validator(Range::new(1, 1000))
				.build()?,
		)
		.field(
			FieldDefinition::builder("title")
				.label("Default list title")
				.default("Inbox")
				.validator(Length::between(1, 80))
				.sort_order(-1)
				.build()?,
		)
		.field(
			FieldDefinition::builder("reminder")
				.value_type("select")
				.label("Reminder interval")
				.default("daily")
				.extra("choices", json!([["daily", "Daily"], ["weekly", "Weekly"], ["never", "Never"]]))
				.validator(Choice::new(["daily", "weekly", "never"]))
				.build()?,
		)
		.build()?;

	let notifications = SectionDefinition::builder("Notifications")
		.sort_order(10)
		.field(
			FieldDefinition::builder("enabled")
				.value_type("boolean")
				.label("Send notifications")
				.default(true)
				.build()?,
		)
		.field(
			FieldDefinition::builder("reply_to")
				.label("Reply-to address")
				.validator(Email::new())
				.build()?,
		)
		.build()?;

	Ok(vec![general, notifications])
}

fn core() -> ClResult<Vec<SectionDefinition>> {
	let site = SectionDefinition::builder("Site")
		.field(
			FieldDefinition::builder("name")
				.label("Site name")
				.default("My site")
				.validator(Required::new())
				.build()?,
		)
		.field(FieldDefinition::builder("url").label("Public URL").validator(Url::new()).build()?)
		.build()?;

	let smtp = SectionDefinition::builder("Smtp")
		.label("Outgoing mail")
		.sort_order(10)
		.field(
			FieldDefinition::builder("host")
				.label("SMTP host")
				.default("localhost")
				.validator(Hostname::new())
				.build()?,
		)
		.field(
			FieldDefinition::builder("port")
				.value_type("int")
				.label("SMTP port")
				.default(25)
				.validator(Port::new())
				.build()?,
		)
		.field(FieldDefinition::builder("username").label("SMTP user").build()?)
		.field(
			FieldDefinition::builder("password")
				.value_type("password")
				.label("SMTP password")
				.on_save(|path, _, _| {
					info!("Credential {} changed", path);
					Ok(())
				})
				.build()?,
		)
		.field(
			FieldDefinition::builder("from_email")
				.label("Sender address")
				.validator(Email::new())
				.build()?,
		)
		.build()?;

	Ok(vec![site, smtp])
}

pub async fn register(sysconfig: &SysConfig) -> ClResult<()> {
	sysconfig.register("todo", todo()?).await?;
	sysconfig.register("core", core()?).await?;
	Ok(())
}

// vim: ts=4
