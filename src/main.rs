use std::{env, fs};

use anyhow::Context;
use monkey::{EvaluationContext, InterpreterConfig};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

fn init_tracing() {
    // Only initialize if RUST_LOG is set
    if env::var("RUST_LOG").is_ok() {
        tracing_subscriber::registry()
            .with(fmt::layer().with_writer(std::io::stderr))
            .with(EnvFilter::from_default_env())
            .init();
    }
}

fn main() -> anyhow::Result<()> {
    init_tracing();

    let mut args = env::args().skip(1);
    let script = args.next().context("usage: monkey <script> [config.json]")?;
    let config = match args.next() {
        Some(path) => InterpreterConfig::from_json(&fs::read_to_string(&path).with_context(|| format!("reading {}", path))?)?,
        None => InterpreterConfig::default(),
    };

    let source = fs::read_to_string(&script).with_context(|| format!("reading {}", script))?;
    let mut context = EvaluationContext::new().with_config(config);
    match context.evaluate_str(&source) {
        Ok(value) => println!("{}", value),
        Err(err) => {
            eprintln!("{}", err);
            std::process::exit(1);
        }
    }

    Ok(())
}
