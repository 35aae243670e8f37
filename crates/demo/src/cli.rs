use std::path::PathBuf;

use clap::{Parser, ValueEnum};

#[derive(Parser, Debug)]
#[command(name = "relay-demo")]
#[command(about = "Runs the greeting scenario through interception chains")]
#[command(version)]
/// Command-line arguments.
pub struct Cli {
	/// Name passed to the greeting
	#[arg(long, default_value = "Max")]
	pub name: String,

	/// Where the interceptors are attached
	#[arg(long, value_enum, default_value_t = Site::Type)]
	pub site: Site,

	/// Chain configuration file (TOML)
	#[arg(long, value_name = "PATH")]
	pub config: Option<PathBuf>,

	/// Verbose logging
	#[arg(short, long)]
	pub verbose: bool,
}

/// Attachment site selected on the command line.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Site {
	/// Shared by every greeter
	Type,
	/// Only the greeter being called
	Instance,
	/// Both scenarios, followed by the sibling isolation check
	Both,
}
