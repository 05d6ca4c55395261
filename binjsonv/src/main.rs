//! JSONV command-line tool for validating and transcoding JSONV documents.
//!
//! Usage: jsonv [OPTIONS] [FILE|DIR]
//!
//! Reads stdin when no path (or `-`) is given. A directory argument
//! processes every `.jsonv`, `.json5` and `.json` file in it.

use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{bail, Context, Result};
use clap::{Parser, ValueEnum};
use libjsonv::{
    encode, parse_with_options, Diagnostic, DuplicateKeys, Format, Mode, ParseOptions, Value,
    Year, DEFAULT_MAX_DEPTH,
};
use tracing::debug;

mod transcode;

#[derive(Parser)]
#[command(name = "jsonv")]
#[command(about = "Validate and transcode JSONV documents", long_about = None)]
#[command(version)]
#[allow(clippy::struct_excessive_bools)]
struct Cli {
    /// Input file or directory (stdin when omitted or "-")
    input: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "jsonv")]
    to: OutputFormat,

    /// Write output to the specified file
    #[arg(short, long, value_name = "FILE", conflicts_with = "write")]
    output: Option<PathBuf>,

    /// Write output next to the input, with the output format's extension
    #[arg(short, long)]
    write: bool,

    /// Only check that the input is valid (exit 1 if not)
    #[arg(long)]
    check: bool,

    /// How to print diagnostics
    #[arg(long, value_enum, default_value = "text")]
    diagnostics: DiagnosticFormat,

    /// Target ECMAScript year: es5, es2015 .. es2022, or latest
    #[arg(long, default_value = "latest")]
    year: Year,

    /// Syntax family: strict-json, json5 or jsonv
    #[arg(long, default_value = "jsonv")]
    mode: Mode,

    /// Reject integers outside the safe range unless they carry an "n" suffix
    #[arg(long)]
    strict_bigint: bool,

    /// Report every error instead of stopping at the first
    #[arg(long)]
    tolerant: bool,

    /// What to do when an object repeats a key
    #[arg(long, value_enum, default_value = "last-wins")]
    duplicate_keys: DuplicateKeyPolicy,

    /// Maximum object and array nesting
    #[arg(long, default_value_t = DEFAULT_MAX_DEPTH)]
    max_depth: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Jsonv,
    Json,
    #[value(alias = "yml")]
    Yaml,
    Toml,
}

impl OutputFormat {
    fn extension(self) -> &'static str {
        match self {
            OutputFormat::Jsonv => "jsonv",
            OutputFormat::Json => "json",
            OutputFormat::Yaml => "yaml",
            OutputFormat::Toml => "toml",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum DiagnosticFormat {
    Text,
    Json,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum DuplicateKeyPolicy {
    LastWins,
    Error,
}

impl Cli {
    fn parse_options(&self) -> ParseOptions {
        ParseOptions {
            year: self.year,
            strict_big_int: self.strict_bigint,
            mode: self.mode,
            preserve_comments: false,
            tolerant: self.tolerant,
            duplicate_keys: match self.duplicate_keys {
                DuplicateKeyPolicy::LastWins => DuplicateKeys::LastWins,
                DuplicateKeyPolicy::Error => DuplicateKeys::Error,
            },
            max_depth: self.max_depth,
        }
    }
}

fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();
    match run(&cli) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(err) => {
            eprintln!("Error: {:#}", err);
            ExitCode::FAILURE
        }
    }
}

/// Initialize tracing; `RUST_LOG` selects what is shown.
fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("off")),
        )
        .with_writer(std::io::stderr)
        .init();
}

/// Returns whether every input was valid.
fn run(cli: &Cli) -> Result<bool> {
    let options = cli.parse_options();
    match cli.input.as_deref() {
        Some(path) if path.as_os_str() != "-" && path.is_dir() => {
            process_directory(cli, &options, path)
        }
        Some(path) if path.as_os_str() != "-" => {
            let input = fs::read_to_string(path)
                .with_context(|| format!("reading {}", path.display()))?;
            process_input(cli, &options, &input, Some(path))
        }
        _ => {
            let mut input = String::new();
            io::stdin()
                .read_to_string(&mut input)
                .context("reading stdin")?;
            process_input(cli, &options, &input, None)
        }
    }
}

fn process_directory(cli: &Cli, options: &ParseOptions, dir: &Path) -> Result<bool> {
    if cli.output.is_some() {
        bail!("--output cannot be used with a directory; use --write");
    }

    let mut paths: Vec<PathBuf> = fs::read_dir(dir)
        .with_context(|| format!("reading directory {}", dir.display()))?
        .flatten()
        .map(|entry| entry.path())
        .filter(|path| {
            path.extension()
                .and_then(|ext| ext.to_str())
                .map_or(false, |ext| matches!(ext, "jsonv" | "json5" | "json"))
        })
        .collect();
    paths.sort();
    debug!(dir = %dir.display(), files = paths.len(), "processing directory");

    let mut all_valid = true;
    for path in &paths {
        let outcome = fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))
            .and_then(|input| process_input(cli, options, &input, Some(path)));
        match outcome {
            Ok(valid) => all_valid &= valid,
            Err(err) => {
                eprintln!("Error: {:#}", err);
                all_valid = false;
            }
        }
    }
    Ok(all_valid)
}

fn process_input(
    cli: &Cli,
    options: &ParseOptions,
    input: &str,
    path: Option<&Path>,
) -> Result<bool> {
    let label = path.map_or_else(|| "<stdin>".to_string(), |p| p.display().to_string());

    if cli.check {
        let diagnostics = libjsonv::check(input, options);
        report(cli.diagnostics, &label, &diagnostics)?;
        return Ok(diagnostics.is_empty());
    }

    let document = match parse_with_options(input, options) {
        Ok(document) => document,
        Err(failure) => {
            let diagnostics: Vec<Diagnostic> = failure.errors().map(Diagnostic::from).collect();
            report(cli.diagnostics, &label, &diagnostics)?;
            return Ok(false);
        }
    };

    let output = render(&document.value, cli.to)?;
    write_output(cli, &output, path)?;
    Ok(true)
}

fn report(format: DiagnosticFormat, label: &str, diagnostics: &[Diagnostic]) -> Result<()> {
    match format {
        DiagnosticFormat::Text if diagnostics.is_empty() => println!("{}: ok", label),
        DiagnosticFormat::Text => {
            for diagnostic in diagnostics {
                eprintln!("{}:{}", label, diagnostic);
            }
        }
        DiagnosticFormat::Json => {
            let report = serde_json::json!({
                "file": label,
                "diagnostics": diagnostics,
            });
            println!("{}", serde_json::to_string(&report)?);
        }
    }
    Ok(())
}

fn render(value: &Value, to: OutputFormat) -> Result<String> {
    match to {
        OutputFormat::Jsonv => Ok(encode(value, Format::Jsonv)),
        OutputFormat::Json => {
            if let Some(reason) = value.json_incompatibility() {
                bail!(
                    "Cannot convert to JSON because the document contains {}.\n\
                     Hint: Try JSONV output instead (-t jsonv), which supports these values.",
                    reason
                );
            }
            Ok(encode(value, Format::Json))
        }
        OutputFormat::Yaml => transcode::yaml::encode(value).context("Cannot convert to YAML"),
        OutputFormat::Toml => transcode::toml::encode(value).context("Cannot convert to TOML"),
    }
}

fn write_output(cli: &Cli, output: &str, input: Option<&Path>) -> Result<()> {
    let mut text = output.to_string();
    if !text.ends_with('\n') {
        text.push('\n');
    }

    if let Some(path) = &cli.output {
        fs::write(path, &text).with_context(|| format!("writing {}", path.display()))?;
    } else if cli.write {
        let Some(input) = input else {
            bail!("--write requires an input file");
        };
        let target = input.with_extension(cli.to.extension());
        if target == input {
            bail!(
                "refusing to overwrite {} with its own {} rendering",
                input.display(),
                cli.to.extension()
            );
        }
        fs::write(&target, &text).with_context(|| format!("writing {}", target.display()))?;
        debug!(path = %target.display(), "wrote output");
    } else {
        print!("{}", text);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_flags_map_to_options() {
        let cli = Cli::parse_from([
            "jsonv",
            "--year",
            "es2020",
            "--mode",
            "json5",
            "--strict-bigint",
            "--duplicate-keys",
            "error",
            "--max-depth",
            "8",
            "config.jsonv",
        ]);
        let options = cli.parse_options();
        assert_eq!(options.year, Year::Es2020);
        assert_eq!(options.mode, Mode::Json5);
        assert!(options.strict_big_int);
        assert_eq!(options.duplicate_keys, DuplicateKeys::Error);
        assert_eq!(options.max_depth, 8);
        assert_eq!(cli.input.as_deref(), Some(Path::new("config.jsonv")));
    }

    #[test]
    fn test_json_output_refuses_big_int() {
        let value = libjsonv::parse("{ id: 10n }").unwrap();
        let err = render(&value, OutputFormat::Json).unwrap_err();
        assert!(err.to_string().contains("BigInt values"));
        assert!(render(&value, OutputFormat::Jsonv).unwrap().contains("10n"));
    }

    #[test]
    fn test_bad_year_is_rejected() {
        assert!(Cli::try_parse_from(["jsonv", "--year", "es4"]).is_err());
    }
}
