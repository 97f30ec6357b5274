use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing::debug;
use tracing_subscriber::EnvFilter;
use wit_morphir_core::compiler::{build_with, gen_wit_with, make_with};
use wit_morphir_core::ir::ModuleDefinition;
use wit_morphir_core::typemap::{Registry, TypeMappingConfig};
use wit_morphir_core::wit_defaults::new_wit_registry;
use wit_morphir_core::{
    BuildOptions, Diagnostic, FormatOptions, GenOptions, MakeOptions, StepResult,
};

/// Convert between WIT and Morphir IR.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    #[arg(short, long, global = true, help = "Log pipeline progress (debug level)")]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// WIT source to Morphir IR JSON
    Make {
        #[arg(value_name = "INPUT", help = "WIT file, or - for stdin")]
        input: String,
        #[command(flatten)]
        make: MakeArgs,
        #[command(flatten)]
        common: CommonArgs,
    },
    /// Morphir IR JSON to WIT source
    Gen {
        #[arg(value_name = "INPUT", help = "IR JSON file, or - for stdin")]
        input: String,
        #[arg(long, default_value_t = 4, help = "Spaces per indentation level")]
        indent: usize,
        #[arg(long, help = "Leave out /// documentation")]
        no_comments: bool,
        #[command(flatten)]
        common: CommonArgs,
    },
    /// WIT → IR → WIT with a round-trip check
    Build {
        #[arg(value_name = "INPUT", help = "WIT file, or - for stdin")]
        input: String,
        #[command(flatten)]
        make: MakeArgs,
        #[command(flatten)]
        common: CommonArgs,
    },
}

#[derive(Args, Debug)]
struct MakeArgs {
    #[arg(long, help = "Reject flags and resources instead of approximating them")]
    strict: bool,
}

#[derive(Args, Debug)]
struct CommonArgs {
    #[arg(short, long, value_name = "PATH", help = "Output file (defaults to stdout)")]
    output: Option<PathBuf>,

    #[arg(long, help = "Fail when any warning is reported")]
    warnings_as_errors: bool,

    #[arg(long, value_name = "PATH", help = "TOML file with type mapping overrides")]
    typemap: Option<PathBuf>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    execute(cli.command)
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn execute(command: Command) -> Result<()> {
    match command {
        Command::Make {
            input,
            make,
            common,
        } => {
            let source = read_input(&input)?;
            let registry = load_registry(common.typemap.as_deref())?;
            let options = MakeOptions {
                strict_mode: make.strict,
                warnings_as_errors: common.warnings_as_errors,
            };
            let output = finish("make", make_with(&source, &options, &registry))?;
            let json = serde_json::to_string_pretty(&output.module)
                .context("failed to serialize IR module")?;
            write_output(common.output.as_deref(), &json)
        }
        Command::Gen {
            input,
            indent,
            no_comments,
            common,
        } => {
            let text = read_input(&input)?;
            let module: ModuleDefinition = serde_json::from_str(&text)
                .with_context(|| format!("failed to parse IR module from {input}"))?;
            let registry = load_registry(common.typemap.as_deref())?;
            let options = GenOptions {
                warnings_as_errors: common.warnings_as_errors,
                format: FormatOptions {
                    indent_size: indent,
                    include_comments: !no_comments,
                },
            };
            let output = finish("gen", gen_wit_with(&module, &options, &registry))?;
            write_output(common.output.as_deref(), &output.source)
        }
        Command::Build {
            input,
            make,
            common,
        } => {
            let source = read_input(&input)?;
            let registry = load_registry(common.typemap.as_deref())?;
            let options = BuildOptions {
                make: MakeOptions {
                    strict_mode: make.strict,
                    warnings_as_errors: common.warnings_as_errors,
                },
                gen_options: GenOptions {
                    warnings_as_errors: common.warnings_as_errors,
                    ..GenOptions::default()
                },
            };
            let output = finish("build", build_with(&source, &options, &registry))?;
            if output.round_trip_valid {
                eprintln!("round-trip: valid");
            } else {
                eprintln!("round-trip: mismatch");
            }
            let source = output
                .gen_output
                .map(|generated| generated.source)
                .context("build produced no WIT output")?;
            write_output(common.output.as_deref(), &source)
        }
    }
}

/// Print diagnostics, then turn the step result into its output or error.
fn finish<T>(step: &str, result: StepResult<T>) -> Result<T> {
    report(&result.diagnostics);
    if let Some(err) = result.error {
        return Err(anyhow::Error::new(err).context(format!("{step} failed")));
    }
    result
        .output
        .with_context(|| format!("{step} produced no output"))
}

fn report(diagnostics: &[Diagnostic]) {
    for diagnostic in diagnostics {
        eprintln!("{diagnostic}");
    }
}

fn read_input(input: &str) -> Result<String> {
    if input == "-" {
        let mut buffer = String::new();
        io::stdin()
            .read_to_string(&mut buffer)
            .context("failed to read stdin")?;
        return Ok(buffer);
    }
    fs::read_to_string(input).with_context(|| format!("failed to read input file {input}"))
}

fn load_registry(path: Option<&Path>) -> Result<Registry> {
    let Some(path) = path else {
        return Ok(new_wit_registry(None));
    };
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read type mapping file {}", path.display()))?;
    let config: TypeMappingConfig = toml::from_str(&text)
        .with_context(|| format!("invalid type mapping file {}", path.display()))?;
    debug!(
        primitives = config.primitives.len(),
        containers = config.containers.len(),
        "loaded type mapping overrides"
    );
    Ok(new_wit_registry(Some(&config)))
}

fn write_output(path: Option<&Path>, text: &str) -> Result<()> {
    let Some(path) = path else {
        print!("{text}");
        if !text.ends_with('\n') {
            println!();
        }
        return Ok(());
    };
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create directory {parent:?}"))?;
        }
    }
    fs::write(path, text)
        .with_context(|| format!("failed to write output file {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_cmd::Command;
    use predicates::prelude::*;
    use tempfile::tempdir;

    const WALL_CLOCK: &str = "package wasi:clocks@0.2.0;\n\ninterface wall-clock {\n    record datetime {\n        seconds: u64,\n        nanoseconds: u32,\n    }\n\n    now: func() -> datetime;\n}\n";

    #[test]
    fn make_writes_ir_json() {
        let dir = tempdir().expect("tempdir");
        let input_path = dir.path().join("clock.wit");
        fs::write(&input_path, WALL_CLOCK).expect("write input");
        let output_path = dir.path().join("out/clock.json");

        Command::cargo_bin("wit-morphir")
            .expect("binary exists")
            .arg("make")
            .arg(&input_path)
            .arg("--output")
            .arg(&output_path)
            .assert()
            .success()
            .stderr(predicate::str::contains("warning[WIT001]"));

        let json = fs::read_to_string(&output_path).expect("read ir");
        let module = ModuleDefinition::from_json(&json).expect("valid IR");
        assert_eq!(module.types.len(), 1);
        assert_eq!(module.values.len(), 1);
    }

    #[test]
    fn make_reads_stdin() {
        Command::cargo_bin("wit-morphir")
            .expect("binary exists")
            .arg("make")
            .arg("-")
            .write_stdin("package a:b; interface i { f: func() -> string; }")
            .assert()
            .success()
            .stdout(predicate::str::contains("\"values\""));
    }

    #[test]
    fn warnings_as_errors_fails() {
        let dir = tempdir().expect("tempdir");
        let input_path = dir.path().join("clock.wit");
        fs::write(&input_path, WALL_CLOCK).expect("write input");

        Command::cargo_bin("wit-morphir")
            .expect("binary exists")
            .arg("make")
            .arg(&input_path)
            .arg("--warnings-as-errors")
            .assert()
            .failure()
            .stderr(predicate::str::contains("make failed"));
    }

    #[test]
    fn reports_parse_errors_with_location() {
        Command::cargo_bin("wit-morphir")
            .expect("binary exists")
            .arg("make")
            .arg("-")
            .write_stdin("package a:b;\ninterface i {\n    f: func(x: );\n}")
            .assert()
            .failure()
            .stderr(predicate::str::contains("error[WIT007]"))
            .stderr(predicate::str::contains("(at 3:16)"));
    }

    #[test]
    fn gen_turns_ir_back_into_wit() {
        let dir = tempdir().expect("tempdir");
        let input_path = dir.path().join("clock.wit");
        fs::write(&input_path, WALL_CLOCK).expect("write input");
        let ir_path = dir.path().join("clock.json");

        Command::cargo_bin("wit-morphir")
            .expect("binary exists")
            .arg("make")
            .arg(&input_path)
            .arg("-o")
            .arg(&ir_path)
            .assert()
            .success();

        Command::cargo_bin("wit-morphir")
            .expect("binary exists")
            .arg("gen")
            .arg(&ir_path)
            .arg("--indent")
            .arg("2")
            .assert()
            .success()
            .stdout(predicate::str::contains("package generated:module;"))
            .stdout(predicate::str::contains("\n  record datetime {\n    seconds: u32,"));
    }

    #[test]
    fn build_reports_round_trip() {
        let dir = tempdir().expect("tempdir");
        let input_path = dir.path().join("clock.wit");
        fs::write(&input_path, WALL_CLOCK).expect("write input");
        let output_path = dir.path().join("generated.wit");

        Command::cargo_bin("wit-morphir")
            .expect("binary exists")
            .arg("build")
            .arg(&input_path)
            .arg("-o")
            .arg(&output_path)
            .assert()
            .success()
            .stderr(predicate::str::contains("round-trip: valid"));

        let wit = fs::read_to_string(&output_path).expect("read wit");
        assert!(wit.contains("now: func() -> datetime;"));
    }

    #[test]
    fn strict_build_rejects_flags() {
        Command::cargo_bin("wit-morphir")
            .expect("binary exists")
            .arg("build")
            .arg("-")
            .arg("--strict")
            .write_stdin("package a:b; interface i { flags perms { read, write } }")
            .assert()
            .failure()
            .stderr(predicate::str::contains("error[WIT003]"));
    }

    #[test]
    fn typemap_overrides_apply() {
        let dir = tempdir().expect("tempdir");
        let typemap_path = dir.path().join("typemap.toml");
        fs::write(
            &typemap_path,
            "[[primitives]]\nexternal = \"u64\"\nmorphir = \"Morphir.SDK:Int:Int64\"\npriority = 10\n",
        )
        .expect("write typemap");

        Command::cargo_bin("wit-morphir")
            .expect("binary exists")
            .arg("make")
            .arg("-")
            .arg("--typemap")
            .arg(&typemap_path)
            .write_stdin("package a:b; interface i { type big = u64; }")
            .assert()
            .success()
            .stdout(predicate::str::contains("\"64\""));
    }

    #[test]
    fn reports_missing_input() {
        let dir = tempdir().expect("tempdir");
        Command::cargo_bin("wit-morphir")
            .expect("binary exists")
            .arg("make")
            .arg(dir.path().join("missing.wit"))
            .assert()
            .failure()
            .stderr(predicate::str::contains("failed to read input file"));
    }
}
