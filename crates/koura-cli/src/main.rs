/*
 * main.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Command-line renderer for Koura templates
 */

use anyhow::{Context, Result};
use clap::Parser;
use koura::{DEFAULT_MAX_DEPTH, Engine};
use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod context;

#[derive(Parser, Debug)]
#[command(name = "koura")]
#[command(version)]
#[command(about = "Render a Koura template against a JSON or YAML context")]
struct Args {
    /// Template file to render ('-' reads from stdin)
    #[arg(value_name = "TEMPLATE")]
    template: PathBuf,

    /// JSON or YAML file providing the template variables
    #[arg(short = 'c', long, value_name = "FILE")]
    context: Option<PathBuf>,

    /// Variable definition (KEY=VALUE), applied on top of the context file
    #[arg(short = 'D', long = "define", value_name = "KEY=VALUE")]
    defines: Vec<String>,

    /// Write output to FILE instead of stdout
    #[arg(short = 'o', long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Maximum nesting depth of if/unless/for blocks
    #[arg(long, default_value_t = DEFAULT_MAX_DEPTH)]
    max_depth: usize,

    /// Verbose logging (-v for debug, -vv for trace)
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count)]
    verbose: u8,
}

fn init_logging(verbose: u8) {
    let default_filter = match verbose {
        0 => "koura=warn",
        1 => "koura=debug",
        _ => "koura=trace",
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn read_template(path: &Path) -> Result<String> {
    if path.as_os_str() == "-" {
        let mut source = String::new();
        std::io::stdin()
            .read_to_string(&mut source)
            .context("Failed to read template from stdin")?;
        return Ok(source);
    }
    fs::read_to_string(path).context(format!("Failed to read template: {:?}", path))
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    let source = read_template(&args.template)?;
    let mut scope = context::build_scope(args.context.as_deref(), &args.defines)?;
    debug!(bindings = scope.len(), "scope ready");

    let engine = Engine::new().with_max_depth(args.max_depth);
    let output = engine
        .render_to_string(&source, &mut scope)
        .context(format!("Failed to render {:?}", args.template))?;

    match &args.output {
        Some(path) => {
            fs::write(path, &output).context(format!("Failed to write output: {:?}", path))?;
            info!("Output: {}", path.display());
        }
        None => print!("{}", output),
    }

    Ok(())
}
