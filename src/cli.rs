//! Command-line interface implementation for wiseguy.
//! Provides argument parsing and help text formatting using clap.

use clap::{error::ErrorKind, CommandFactory, Parser};
use std::io::Read;
use std::path::PathBuf;

use crate::context::Context;
use crate::error::{Error, Result};

/// Command-line arguments structure for wiseguy.
#[derive(Parser, Debug)]
#[command(author, version, about = "wiseguy: render markup templates from template files", long_about = None)]
pub struct Args {
    /// Path to a template file, or a directory containing wiseguy.json/yml/yaml
    #[arg(value_name = "TEMPLATE")]
    pub template: PathBuf,

    /// Input values as a JSON object
    #[arg(short, long, value_name = "JSON", conflicts_with = "stdin")]
    pub input: Option<String>,

    /// Read the JSON input object from stdin
    #[arg(short, long)]
    pub stdin: bool,

    /// Emit compact markup instead of pretty-printed markup
    #[arg(short, long)]
    pub compact: bool,

    /// List transforms left pending for lack of input on stderr
    #[arg(short, long)]
    pub report: bool,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,
}

impl Args {
    /// Reads the render input from `--input` or stdin; no input means an
    /// empty map.
    ///
    /// # Errors
    /// * `Error::ConfigError` if the input is not a JSON object
    /// * `Error::IoError` if stdin cannot be read
    pub fn read_input(&self) -> Result<Context> {
        let raw = if self.stdin {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf)?;
            Some(buf)
        } else {
            self.input.clone()
        };
        match raw {
            Some(raw) => parse_input(&raw),
            None => Ok(Context::new()),
        }
    }
}

/// Parses a JSON object into a render input; blank input is an empty map.
///
/// # Errors
/// * `Error::ConfigError` if the text is not a JSON object
pub fn parse_input(raw: &str) -> Result<Context> {
    if raw.trim().is_empty() {
        return Ok(Context::new());
    }
    let value: serde_json::Value = serde_json::from_str(raw)
        .map_err(|e| Error::ConfigError(format!("Failed to parse input as JSON: {}", e)))?;
    Context::from_json(value)
}

/// Parses command line arguments and returns the Args structure.
///
/// # Returns
/// * `Args` - Parsed command line arguments
///
/// # Exits
/// * With status code 1 if required arguments are missing
/// * With clap's default error handling for other argument errors
pub fn get_args() -> Args {
    match Args::try_parse() {
        Ok(args) => args,
        Err(e) => {
            if e.kind() == ErrorKind::MissingRequiredArgument {
                let _ = Args::command()
                    .help_template(
                        r#"{about-section}
{usage-heading} {usage}

{all-args}
{after-help}
"#,
                    )
                    .print_help();
                std::process::exit(1);
            } else {
                e.exit();
            }
        }
    }
}
