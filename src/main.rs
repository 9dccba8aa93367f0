use std::fs;
use std::io::{self, BufWriter, Read, Write};
use std::path::Path;

use anyhow::{Context, Result};

use gctk::config::{Commands, Config};
use gctk::diagnostics::Diagnostics;
use gctk::interpreter::{interpret, Interpreter, InterpreterOptions, Position};
use gctk::tools::{self, Rendered};

fn init_logging(level: &str) {
    let env = env_logger::Env::default().default_filter_or(level);
    env_logger::Builder::from_env(env).init();
}

fn read_input(path: Option<&Path>) -> Result<String> {
    match path {
        Some(path) => fs::read_to_string(path)
            .with_context(|| format!("Failed to read input file: {}", path.display())),
        None => {
            let mut src = String::new();
            io::stdin()
                .read_to_string(&mut src)
                .context("Failed to read standard input")?;
            Ok(src)
        }
    }
}

fn report(diagnostics: &Diagnostics) {
    for diagnostic in diagnostics {
        eprintln!("{}", diagnostic);
    }
}

fn print_rendered(rendered: &Rendered) -> Result<()> {
    report(&rendered.diagnostics);
    io::stdout()
        .write_all(rendered.text.as_bytes())
        .context("Failed to write output")
}

fn main() -> Result<()> {
    // Parse configuration from command line and config file
    let config = Config::from_args_and_env()?;
    init_logging(&config.log_level);

    let src = read_input(config.input.as_deref())?;
    let options = InterpreterOptions {
        initial_state: config.modal.initial_state(),
        table: config.code_table(&src)?,
    };

    match &config.command {
        Commands::Events => {
            let mut out = BufWriter::new(io::stdout().lock());
            let mut interpreter = Interpreter::new(&src, &options);
            for event in interpreter.by_ref() {
                serde_json::to_writer(&mut out, &event)?;
                writeln!(out)?;
            }
            out.flush()?;
            report(interpreter.diagnostics());
        }
        Commands::Extent => {
            let result = interpret(&src, &options);
            report(&result.diagnostics);
            let extent = tools::extent(&result.events, result.final_state.units)?;
            println!("{}", serde_json::to_string(&extent)?);
        }
        Commands::Translate { x, y, z } => {
            let rendered = tools::translate(&src, &options, Position::new(*x, *y, *z));
            print_rendered(&rendered)?;
        }
        Commands::Mirror { axis } => {
            let (axis, value) = axis
                .axis()
                .context("Mirror needs one of -x, -y or -z")?;
            let rendered = tools::mirror(&src, &options, axis, value);
            print_rendered(&rendered)?;
        }
        Commands::Check => {
            let result = interpret(&src, &options);
            report(&result.diagnostics);
            let rejected = result.diagnostics.errors().count();
            if rejected > 0 {
                anyhow::bail!("{} line(s) rejected", rejected);
            }
        }
    }

    Ok(())
}
