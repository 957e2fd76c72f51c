//! Turns parsed arguments into one query run.

use std::io::Read;

use anyhow::Context;
use chatpoll::{QueryConfig, QueryResult, QueryRunner};
use tracing::{debug, info};

use crate::cli::Cli;
use crate::error::{CliError, Result};

/// Loads the config file (if any), applies overrides and validates.
pub fn resolve_config(cli: &Cli) -> Result<QueryConfig> {
	let mut config = match &cli.config {
		Some(path) => {
			debug!(target = "chatpoll", path = %path.display(), "loading config");
			QueryConfig::load(path)?
		}
		None => QueryConfig::default(),
	};
	cli.apply_overrides(&mut config);
	config.validate()?;
	Ok(config)
}

/// Query from the arguments, or all of `stdin` when none was given.
pub fn resolve_query(cli: &Cli, stdin: impl Read) -> Result<String> {
	let query = match cli.inline_query() {
		Some(query) => query,
		None => read_all(stdin)?,
	};
	let query = query.trim();
	if query.is_empty() {
		return Err(CliError::Input("query is empty".into()));
	}
	Ok(query.to_string())
}

fn read_all(mut stdin: impl Read) -> anyhow::Result<String> {
	let mut buffer = String::new();
	stdin.read_to_string(&mut buffer).context("reading query from stdin")?;
	Ok(buffer)
}

/// Runs the query against a real browser.
pub async fn execute(cli: &Cli) -> Result<QueryResult> {
	let config = resolve_config(cli)?;
	let query = resolve_query(cli, std::io::stdin().lock())?;
	info!(target = "chatpoll", url = %config.url, chars = query.chars().count(), "query accepted");

	let runner = QueryRunner::from_config(config);
	Ok(runner.run(query).await?)
}
