//! The `make`, `gen` and `build` steps.
//!
//! Each step returns a [`StepResult`]: the output (kept even when the step
//! fails on diagnostics), the ordered diagnostics, and the failure if any.

use tracing::{debug, info};

use crate::ast::Package;
use crate::diagnostic::{Diagnostic, DiagnosticsExt, STEP_BUILD, STEP_GEN, STEP_MAKE, Severity};
use crate::emitter::emit_with;
use crate::error::CoreError;
use crate::from_ir::convert_from_ir_with;
use crate::ir::ModuleDefinition;
use crate::parser::parse;
use crate::round_trip::validate_round_trip;
use crate::to_ir::convert_to_ir_with;
use crate::typemap::Registry;
use crate::wit_defaults::default_wit_registry;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MakeOptions {
    /// Flags and resources become errors and their definitions are dropped.
    pub strict_mode: bool,
    /// Fail the step if any diagnostic is a warning or worse.
    pub warnings_as_errors: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormatOptions {
    pub indent_size: usize,
    pub include_comments: bool,
}

impl Default for FormatOptions {
    fn default() -> FormatOptions {
        FormatOptions {
            indent_size: 4,
            include_comments: true,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GenOptions {
    pub warnings_as_errors: bool,
    pub format: FormatOptions,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BuildOptions {
    pub make: MakeOptions,
    pub gen_options: GenOptions,
}

#[derive(Debug)]
pub struct StepResult<T> {
    pub output: Option<T>,
    pub diagnostics: Vec<Diagnostic>,
    pub error: Option<CoreError>,
}

impl<T> StepResult<T> {
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }

    /// The output if the step succeeded, else its error.
    pub fn into_result(self) -> Result<T, CoreError> {
        match (self.error, self.output) {
            (Some(err), _) => Err(err),
            (None, Some(output)) => Ok(output),
            (None, None) => Err(CoreError::StepFailed {
                step: "unknown",
                message: "step produced no output".to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MakeOutput {
    pub module: ModuleDefinition,
    pub source_package: Package,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenOutput {
    pub package: Package,
    pub source: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildOutput {
    pub make: Option<MakeOutput>,
    pub gen_output: Option<GenOutput>,
    pub round_trip_valid: bool,
}

/// WIT source → IR with the default WIT registry.
pub fn make(source: &str, options: &MakeOptions) -> StepResult<MakeOutput> {
    make_with(source, options, &default_wit_registry())
}

pub fn make_with(source: &str, options: &MakeOptions, registry: &Registry) -> StepResult<MakeOutput> {
    let package = match parse(source) {
        Ok(package) => package,
        Err(err) => {
            let mut diagnostic = Diagnostic::parse_error(&source_message(&err), STEP_MAKE);
            if let Some(position) = err.position() {
                diagnostic = diagnostic.with_location(position);
            }
            return StepResult {
                output: None,
                diagnostics: vec![diagnostic],
                error: Some(err),
            };
        }
    };

    let (module, diagnostics) = convert_to_ir_with(&package, options, registry);
    let error = step_failure(STEP_MAKE, &diagnostics, options.warnings_as_errors);
    info!(
        types = module.types.len(),
        values = module.values.len(),
        ok = error.is_none(),
        "make finished"
    );
    StepResult {
        output: Some(MakeOutput {
            module,
            source_package: package,
        }),
        diagnostics,
        error,
    }
}

/// IR → WIT package and source text with the default WIT registry.
pub fn gen_wit(module: &ModuleDefinition, options: &GenOptions) -> StepResult<GenOutput> {
    gen_wit_with(module, options, &default_wit_registry())
}

pub fn gen_wit_with(
    module: &ModuleDefinition,
    options: &GenOptions,
    registry: &Registry,
) -> StepResult<GenOutput> {
    let (package, diagnostics) = convert_from_ir_with(module, options, registry);
    let source = emit_with(&package, &options.format);
    let error = step_failure(STEP_GEN, &diagnostics, options.warnings_as_errors);
    info!(bytes = source.len(), ok = error.is_none(), "gen finished");
    StepResult {
        output: Some(GenOutput { package, source }),
        diagnostics,
        error,
    }
}

/// `make` then `gen`, then a round-trip check of the two packages.
pub fn build(source: &str, options: &BuildOptions) -> StepResult<BuildOutput> {
    build_with(source, options, &default_wit_registry())
}

pub fn build_with(source: &str, options: &BuildOptions, registry: &Registry) -> StepResult<BuildOutput> {
    let made = make_with(source, &options.make, registry);
    let mut diagnostics = made.diagnostics;
    let mut output = BuildOutput {
        make: made.output,
        gen_output: None,
        round_trip_valid: false,
    };
    if made.error.is_some() {
        return StepResult {
            output: Some(output),
            diagnostics,
            error: made.error,
        };
    }
    let Some(make_output) = &output.make else {
        return StepResult {
            output: Some(output),
            diagnostics,
            error: Some(CoreError::StepFailed {
                step: STEP_BUILD,
                message: "make produced no output".to_string(),
            }),
        };
    };

    let generated = gen_wit_with(&make_output.module, &options.gen_options, registry);
    diagnostics.extend(generated.diagnostics);
    if let Some(gen_output) = &generated.output {
        output.round_trip_valid =
            validate_round_trip(&make_output.source_package, &gen_output.package);
        if !output.round_trip_valid {
            diagnostics.push(Diagnostic::round_trip_mismatch(STEP_BUILD));
        }
    }
    debug!(round_trip_valid = output.round_trip_valid, "build finished");
    output.gen_output = generated.output;
    StepResult {
        output: Some(output),
        diagnostics,
        error: generated.error,
    }
}

fn source_message(err: &CoreError) -> String {
    match err {
        CoreError::Lex { message, .. } | CoreError::Parse { message, .. } => message.clone(),
        other => other.to_string(),
    }
}

fn step_failure(
    step: &'static str,
    diagnostics: &[Diagnostic],
    warnings_as_errors: bool,
) -> Option<CoreError> {
    let errors = diagnostics.filter_by_severity(Severity::Error).len();
    let warnings = diagnostics.filter_by_severity(Severity::Warn).len();
    if errors > 0 {
        return Some(CoreError::StepFailed {
            step,
            message: format!("{errors} error diagnostic(s)"),
        });
    }
    if warnings_as_errors && diagnostics.has_warnings() {
        return Some(CoreError::StepFailed {
            step,
            message: format!("{warnings} warning(s) treated as errors"),
        });
    }
    None
}
