//! Core of the WIT ↔ Morphir IR toolchain.
//!
//! The pipeline is roughly:
//!
//!   WIT source
//!     -> lexer      (tokens)
//!     -> parser     (domain model `ast::Package`)
//!     -> to_ir      (`make`: IR `ModuleDefinition` + diagnostics)
//!     -> from_ir    (`gen`: synthetic `ast::Package` + diagnostics)
//!     -> emitter    (WIT source)
//!
//! `round_trip` compares the first and last package. Type mappings between
//! WIT and the IR live in a `typemap::Registry`, built once per binding.
//!
//! Higher-level tools (the CLI, pipeline harnesses) should depend on this
//! crate rather than reimplementing the pipeline.

// ---------------------------------------------------------------------
// Error handling and diagnostics
// ---------------------------------------------------------------------

pub mod span;
pub mod diagnostic;
pub mod error;

// ---------------------------------------------------------------------
// Front-end: lexing, parsing and the domain model
// ---------------------------------------------------------------------

pub mod lexer;
pub mod names;
pub mod ast;
pub mod traverse;
pub mod parser;

// ---------------------------------------------------------------------
// Type mappings and the IR
// ---------------------------------------------------------------------

pub mod ir;
pub mod typemap;
pub mod wit_defaults;

// ---------------------------------------------------------------------
// Converters, validation, emission and step orchestration
// ---------------------------------------------------------------------

pub mod to_ir;
pub mod from_ir;
pub mod round_trip;
pub mod emitter;
pub mod compiler;

// ---------------------------------------------------------------------
// Public API re-exports
// ---------------------------------------------------------------------

pub use compiler::{
    BuildOptions, BuildOutput, FormatOptions, GenOptions, GenOutput, MakeOptions, MakeOutput,
    StepResult, build, gen_wit, make,
};
pub use diagnostic::{Diagnostic, DiagnosticCode, DiagnosticsExt, Severity};
pub use emitter::emit;
pub use error::CoreError;
pub use parser::parse;
pub use round_trip::validate_round_trip;
