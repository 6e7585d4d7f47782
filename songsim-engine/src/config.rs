use std::path::PathBuf;

use clap::Parser;

use crate::types::DEFAULT_TOP_K;

#[derive(Parser, Debug)]
#[command(
	name = "songsim-engine",
	about = "Content-based song, artist and album recommendations over JSON-RPC / NDJSON stdio"
)]
pub struct CliArgs {
	/// Dataset file: CSV (`.csv`) or JSON array of track rows, optionally gzip-compressed
	#[arg(long, env = "SONGSIM_DATASET")]
	pub dataset: PathBuf,

	/// Feature file with one vector per cleaned dataset row
	#[arg(long, env = "SONGSIM_FEATURES")]
	pub features: PathBuf,

	/// Number of recommendations when a request does not say
	#[arg(
		long,
		default_value_t = DEFAULT_TOP_K,
		value_parser = parse_top_k,
		env = "SONGSIM_DEFAULT_TOP_K"
	)]
	pub default_top_k: usize,

	/// Log level (trace, debug, info, warn, error)
	#[arg(long, default_value = "info", env = "SONGSIM_LOG_LEVEL")]
	pub log_level: String,
}

/// Result counts must be at least 1.
fn parse_top_k(raw: &str) -> Result<usize, String> {
	let value: usize = raw
		.trim()
		.parse()
		.map_err(|e| format!("'{}' is not a count: {}", raw, e))?;
	if value == 0 {
		return Err("must be at least 1".to_string());
	}
	Ok(value)
}
