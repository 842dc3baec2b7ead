use std::collections::BTreeMap;
use std::io::{self, Read};
use std::process::ExitCode;

use anyhow::{Context, Result, anyhow, bail};
use clap::{Parser, Subcommand};
use itertools::Itertools;

use recordfmt::{
    CompiledPattern, EvalError, ExtractMode, Extraction, FunctionLibrary, KeyValueExtractor,
};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Evaluate a display pattern against attributes given on the command line
    Format {
        /// Display pattern, e.g. "$zfill(%track%). %title%"
        #[arg(value_name = "PATTERN")]
        pattern: String,

        /// Attribute value
        #[arg(short = 's', long = "set", value_name = "KEY=VALUE", value_parser = parse_attribute)]
        attributes: Vec<(String, String)>,
    },
    /// Extract one record per line of stdin
    Extract {
        /// Extraction pattern, e.g. "%artist% - %title%"
        #[arg(value_name = "PATTERN")]
        pattern: String,

        /// Match against whole lines (string) or file paths (path)
        #[arg(short, long, default_value = "string")]
        mode: ExtractMode,

        /// Print each extracted record through this display pattern
        #[arg(short, long, value_name = "PATTERN")]
        format: Option<String>,
    },
    /// List the builtin functions
    Functions,
}

fn main() -> ExitCode {
    let args = Args::parse();
    match run(args.command) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("Error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(command: Command) -> Result<ExitCode> {
    let funcs = FunctionLibrary::with_defaults();
    match command {
        Command::Format {
            pattern,
            attributes,
        } => {
            let compiled = compile_pattern(&pattern)?;
            let record: BTreeMap<String, String> = attributes.into_iter().collect();
            let text = compiled.evaluate(&funcs, &record)?;
            println!("{text}");
            Ok(ExitCode::SUCCESS)
        }
        Command::Extract {
            pattern,
            mode,
            format,
        } => {
            let (extractor, error) = KeyValueExtractor::compile(&pattern, mode);
            if let Some(error) = error {
                bail!("{error}");
            }
            let display = format.as_deref().map(compile_pattern).transpose()?;

            let mut input = String::new();
            io::stdin()
                .read_to_string(&mut input)
                .context("Failed to read stdin")?;

            let batch = extractor.extract_lines(&input);
            for row in &batch.rows {
                match (&display, row.is_ok()) {
                    (Some(display), true) => println!("{}", display.display(&funcs, &row.result)),
                    _ => println!("{}", format_row(&batch.columns, row)),
                }
            }
            if batch.rows.iter().all(Extraction::is_ok) {
                Ok(ExitCode::SUCCESS)
            } else {
                Ok(ExitCode::FAILURE)
            }
        }
        Command::Functions => {
            for name in funcs.names() {
                println!("{name}");
            }
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn compile_pattern(pattern: &str) -> Result<CompiledPattern> {
    CompiledPattern::compile(pattern).map_err(|err| match err {
        EvalError::SyntaxError { detail } => anyhow!("Invalid pattern {pattern:?}: {detail}"),
        other => anyhow!("Invalid pattern {pattern:?}: {other}"),
    })
}

fn parse_attribute(s: &str) -> Result<(String, String)> {
    let Some((key, value)) = s.split_once('=') else {
        bail!("expected KEY=VALUE, got {s:?}");
    };
    if key.is_empty() {
        bail!("attribute name is empty in {s:?}");
    }
    Ok((key.to_string(), value.to_string()))
}

/// `key=value` cells for the columns present, then the failure message.
fn format_row(columns: &[String], row: &Extraction) -> String {
    columns
        .iter()
        .filter_map(|column| row.result.get(column).map(|value| format!("{column}={value}")))
        .chain(row.message.clone())
        .join("\t")
}
