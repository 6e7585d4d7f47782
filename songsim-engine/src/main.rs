use anyhow::{Context, Result};
use clap::Parser;
use songsim_engine::config::CliArgs;
use songsim_engine::persistence::load_recommender;
use songsim_engine::server::{RecommendServer, ServerConfig};
use songsim_engine::transport::NdjsonTransport;

fn main() -> Result<()> {
	let args = CliArgs::parse();

	// Logs go to stderr; stdout carries the protocol
	tracing_subscriber::fmt()
		.with_writer(std::io::stderr)
		.with_env_filter(
			tracing_subscriber::EnvFilter::try_from_default_env()
				.unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&args.log_level)),
		)
		.init();

	let recommender = load_recommender(&args.dataset, &args.features).with_context(|| {
		format!(
			"loading {} and {}",
			args.dataset.display(),
			args.features.display()
		)
	})?;

	let config = ServerConfig {
		default_top_k: args.default_top_k,
	};
	let mut server = RecommendServer::new(config, recommender, NdjsonTransport::new());

	tracing::info!("songsim-engine ready");
	server.run(std::io::stdin().lock())?;
	Ok(())
}
