//! Soliloquy runtime inspector.
//!
//! Boots a runtime, runs every registered initializer and prints the tables
//! the startup pass produced. Useful for checking tier ordering and which
//! declarations made it into the binary.

use std::io::Write;
use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, ValueEnum};
use soliloquy_runtime::{Band, Implant, Runtime, RuntimeConfig, Startup, Visibility};
use tracing::info;

/// Inspector command line arguments.
#[derive(Parser, Debug)]
#[command(name = "soliloquy-inspect")]
#[command(about = "Print the Soliloquy runtime tables after startup")]
struct Args {
	/// Runtime configuration file (TOML)
	#[arg(short, long, value_name = "PATH")]
	config: Option<PathBuf>,

	/// Tables to print
	#[arg(short, long, value_enum, default_values_t = [Table::Symbols, Table::Classes, Table::Hooks])]
	table: Vec<Table>,

	/// Verbose logging
	#[arg(short, long)]
	verbose: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Table {
	Symbols,
	Domains,
	Classes,
	Hooks,
}

fn main() -> anyhow::Result<()> {
	let args = Args::parse();
	setup_tracing(args.verbose);

	let config = match &args.config {
		Some(path) => {
			RuntimeConfig::load(path).with_context(|| format!("loading runtime config {}", path.display()))?
		}
		None => RuntimeConfig::default(),
	};
	info!(?config, "booting runtime");
	let rt = Startup::new().config(config).boot().context("runtime startup failed")?;

	let stdout = std::io::stdout();
	let mut out = stdout.lock();
	for table in &args.table {
		match table {
			Table::Symbols => print_symbols(&rt, &mut out)?,
			Table::Domains => print_domains(&rt, &mut out)?,
			Table::Classes => print_classes(&rt, &mut out)?,
			Table::Hooks => print_hooks(&rt, &mut out)?,
		}
		writeln!(out)?;
	}
	Ok(())
}

fn print_symbols(rt: &Runtime, out: &mut impl Write) -> std::io::Result<()> {
	writeln!(out, "symbols ({})", rt.symbol_count())?;
	let root = rt.root();
	for symbol in rt.symbols() {
		let in_root = root.is_some_and(|root| rt.is_implanted(root, symbol.id));
		let visibility = match symbol.visibility {
			Visibility::Public => "public",
			Visibility::Private => "private",
		};
		writeln!(
			out,
			"  {:<28} {:>3}B  {:<7}  owners={}{}",
			symbol.name,
			symbol.size,
			visibility,
			symbol.owners,
			if in_root { "  root" } else { "" }
		)?;
	}
	Ok(())
}

fn print_domains(rt: &Runtime, out: &mut impl Write) -> std::io::Result<()> {
	writeln!(out, "domains ({})", rt.domain_count())?;
	for domain in rt.domains() {
		let members: Vec<String> = rt
			.domain_members(domain)
			.iter()
			.map(|member| match *member {
				Implant::Symbol(sym) => rt.symbol_name(sym).to_string(),
				Implant::Domain(nested) => format!("[{}]", rt.domain_name(nested)),
			})
			.collect();
		writeln!(out, "  {:<28} {}", rt.domain_name(domain), members.join(" "))?;
	}
	Ok(())
}

fn print_classes(rt: &Runtime, out: &mut impl Write) -> std::io::Result<()> {
	writeln!(out, "classes ({})", rt.class_count())?;
	for class in rt.classes() {
		match class.parent {
			Some(parent) => writeln!(out, "  {} : {}", class.name, parent)?,
			None => writeln!(out, "  {}", class.name)?,
		}
	}
	Ok(())
}

fn print_hooks(rt: &Runtime, out: &mut impl Write) -> std::io::Result<()> {
	writeln!(out, "hook points ({})", rt.hook_count())?;
	for hook in rt.hook_points() {
		writeln!(out, "  {}", hook.name)?;
		for band in Band::ALL {
			let ids = &hook.bands[band.index()];
			if !ids.is_empty() {
				writeln!(out, "    {:<6} {}", band.as_str(), ids.join(", "))?;
			}
		}
	}
	Ok(())
}

fn setup_tracing(verbose: bool) {
	use tracing_subscriber::EnvFilter;

	let filter = EnvFilter::try_from_env("SOLILOQUY_LOG")
		.or_else(|_| EnvFilter::try_from_default_env())
		.unwrap_or_else(|_| {
			if verbose {
				EnvFilter::new("soliloquy_runtime=trace,debug")
			} else {
				EnvFilter::new("soliloquy_runtime=info,warn")
			}
		});

	tracing_subscriber::fmt()
		.with_env_filter(filter)
		.with_writer(std::io::stderr)
		.init();
}
