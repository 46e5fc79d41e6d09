use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;

use nfsconf::config::{ConfStore, ParseWarning};
use nfsconf::logging;

#[derive(Parser)]
#[command(name = "nfsconf")]
#[command(
	author,
	version,
	about = "Query and dump INI-style NFS configuration files"
)]
#[command(arg_required_else_help = true)]
struct Cli {
	/// Config file to load (defaults to /etc/nfs.conf; a missing default is not an error)
	#[arg(long, short, global = true, value_name = "PATH")]
	file: Option<PathBuf>,

	/// Log level for diagnostics on stderr (overrides RUST_LOG)
	#[arg(long, global = true, value_name = "LEVEL")]
	log_level: Option<String>,

	#[command(subcommand)]
	command: Commands,
}

#[derive(Subcommand)]
enum Commands {
	/// Print the effective configuration
	Dump {
		/// Emit a TOML document instead of config-file syntax
		#[arg(long)]
		toml: bool,
	},
	/// Print the value of a tag, exiting 1 if it is not set
	Get {
		section: String,
		tag: String,
		/// Section argument, as in [section "arg"]
		#[arg(long)]
		arg: Option<String>,
	},
	/// Exit 0 if a tag is set, 1 otherwise
	Isset {
		section: String,
		tag: String,
		/// Section argument, as in [section "arg"]
		#[arg(long)]
		arg: Option<String>,
	},
	/// Print the comma-separated fields of a tag, one per line
	List { section: String, tag: String },
	/// Print the tag names of a section, one per line
	Tags {
		section: String,
		/// Section argument, as in [section "arg"]
		#[arg(long)]
		arg: Option<String>,
	},
	/// Report syntax problems in the config file and its includes
	Validate,
}

fn main() -> ExitCode {
	match run() {
		Ok(code) => code,
		Err(e) => {
			eprintln!("error: {e:?}");
			ExitCode::FAILURE
		}
	}
}

fn run() -> Result<ExitCode> {
	let cli = Cli::parse();

	logging::init(cli.log_level.as_deref(), "warn").context("Failed to initialise logging")?;

	let mut store = ConfStore::new();
	let warnings = store
		.init(cli.file.as_deref())
		.with_context(|| match &cli.file {
			Some(path) => format!("Failed to load {}", path.display()),
			None => "Failed to load default configuration".to_string(),
		})?;

	match cli.command {
		Commands::Dump { toml } => handle_dump(&store, toml),
		Commands::Get { section, tag, arg } => {
			handle_get(&store, &section, arg.as_deref(), &tag)
		}
		Commands::Isset { section, tag, arg } => {
			Ok(exit_for(store.get_section(&section, arg.as_deref(), &tag).is_some()))
		}
		Commands::List { section, tag } => {
			let fields = store.get_list(&section, &tag);
			for field in &fields {
				println!("{field}");
			}
			Ok(exit_for(!fields.is_empty()))
		}
		Commands::Tags { section, arg } => {
			for tag in store.get_tags(&section, arg.as_deref()) {
				println!("{tag}");
			}
			Ok(ExitCode::SUCCESS)
		}
		Commands::Validate => handle_validate(&warnings),
	}
}

fn handle_dump(store: &ConfStore, as_toml: bool) -> Result<ExitCode> {
	if as_toml {
		let text = toml::to_string(&store.to_toml()).context("Failed to render configuration as TOML")?;
		print!("{text}");
	} else {
		print!("{}", store.render());
	}
	Ok(ExitCode::SUCCESS)
}

fn handle_get(store: &ConfStore, section: &str, arg: Option<&str>, tag: &str) -> Result<ExitCode> {
	match store.get_section(section, arg, tag) {
		Some(value) => {
			println!("{value}");
			Ok(ExitCode::SUCCESS)
		}
		None => {
			match arg {
				Some(arg) => eprintln!("[{section} \"{arg}\"] {tag} is not set"),
				None => eprintln!("[{section}] {tag} is not set"),
			}
			Ok(ExitCode::FAILURE)
		}
	}
}

fn handle_validate(warnings: &[ParseWarning]) -> Result<ExitCode> {
	if warnings.is_empty() {
		println!("Configuration is valid.");
		return Ok(ExitCode::SUCCESS);
	}

	for warning in warnings {
		println!("{warning}");
	}
	println!("{} problem(s) found.", warnings.len());
	Ok(ExitCode::FAILURE)
}

fn exit_for(found: bool) -> ExitCode {
	if found {
		ExitCode::SUCCESS
	} else {
		ExitCode::FAILURE
	}
}
