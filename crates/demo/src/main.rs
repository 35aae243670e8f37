//! Relay demo binary.
//!
//! Attaches two greeting interceptors at the chosen site, greets, detaches
//! them, and greets again.

mod cli;
mod greeter;

use anyhow::Context;
use clap::Parser;
use cli::Cli;
use relay_chain::ChainConfig;

fn main() -> anyhow::Result<()> {
	let cli = Cli::parse();
	setup_tracing(cli.verbose);

	let config = match &cli.config {
		Some(path) => ChainConfig::load(path).with_context(|| format!("loading {}", path.display()))?,
		None => ChainConfig::default(),
	};
	tracing::debug!(?config, "chain configuration");

	for line in greeter::run(cli.site, &cli.name, &config)? {
		println!("{line}");
	}
	Ok(())
}

fn setup_tracing(verbose: bool) {
	use tracing_subscriber::EnvFilter;

	let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
		if verbose {
			EnvFilter::new("relay_chain=trace,relay_demo=debug")
		} else {
			EnvFilter::new("warn")
		}
	});

	tracing_subscriber::fmt()
		.with_env_filter(filter)
		.with_writer(std::io::stderr)
		.init();
}
