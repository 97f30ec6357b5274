//! Soft diagnostics for the WIT pipeline.
//!
//! Diagnostics never abort a conversion. They accumulate in order next to
//! a best-effort result so that callers can decide what to do with lossy
//! or unsupported constructs.

use std::fmt;

use serde::Serialize;

use crate::span::Position;

pub const STEP_MAKE: &str = "wit-make";
pub const STEP_GEN: &str = "wit-gen";
pub const STEP_BUILD: &str = "wit-build";

/// Severity level of a diagnostic message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warn,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Severity::Info => "info",
            Severity::Warn => "warning",
            Severity::Error => "error",
        };
        f.write_str(text)
    }
}

/// Stable diagnostic codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum DiagnosticCode {
    /// Integer size or signedness lost (u8..s64 to Int).
    IntPrecisionLost,
    /// f32 precision hint lost.
    FloatPrecisionLost,
    FlagsUnsupported,
    /// Resources and own/borrow handles.
    ResourceUnsupported,
    RoundTripMismatch,
    UnknownType,
    ParseError,
    ConversionError,
    /// A world refers to an interface defined elsewhere.
    ExternalRef,
}

impl DiagnosticCode {
    pub fn as_str(self) -> &'static str {
        match self {
            DiagnosticCode::IntPrecisionLost => "WIT001",
            DiagnosticCode::FloatPrecisionLost => "WIT002",
            DiagnosticCode::FlagsUnsupported => "WIT003",
            DiagnosticCode::ResourceUnsupported => "WIT004",
            DiagnosticCode::RoundTripMismatch => "WIT005",
            DiagnosticCode::UnknownType => "WIT006",
            DiagnosticCode::ParseError => "WIT007",
            DiagnosticCode::ConversionError => "WIT008",
            DiagnosticCode::ExternalRef => "WIT_EXTERNAL_REF",
        }
    }
}

impl fmt::Display for DiagnosticCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single diagnostic produced by a pipeline step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub code: DiagnosticCode,
    pub message: String,
    pub step: &'static str,
    pub location: Option<Position>,
}

impl Diagnostic {
    pub fn new(
        severity: Severity,
        code: DiagnosticCode,
        message: impl Into<String>,
        step: &'static str,
    ) -> Diagnostic {
        Diagnostic {
            severity,
            code,
            message: message.into(),
            step,
            location: None,
        }
    }

    pub fn info(code: DiagnosticCode, message: impl Into<String>, step: &'static str) -> Diagnostic {
        Diagnostic::new(Severity::Info, code, message, step)
    }

    pub fn warn(code: DiagnosticCode, message: impl Into<String>, step: &'static str) -> Diagnostic {
        Diagnostic::new(Severity::Warn, code, message, step)
    }

    pub fn error(code: DiagnosticCode, message: impl Into<String>, step: &'static str) -> Diagnostic {
        Diagnostic::new(Severity::Error, code, message, step)
    }

    /// Attach a source location to this diagnostic.
    pub fn with_location(mut self, position: Position) -> Diagnostic {
        self.location = Some(position);
        self
    }

    pub fn int_precision_lost(wit_type: &str, step: &'static str) -> Diagnostic {
        Diagnostic::warn(
            DiagnosticCode::IntPrecisionLost,
            format!("integer size/signedness lost: {wit_type} → Int"),
            step,
        )
    }

    pub fn float_precision_lost(wit_type: &str, step: &'static str) -> Diagnostic {
        Diagnostic::warn(
            DiagnosticCode::FloatPrecisionLost,
            format!("float precision hint lost: {wit_type} → Float"),
            step,
        )
    }

    pub fn flags_unsupported(name: &str, step: &'static str, strict: bool) -> Diagnostic {
        Diagnostic::new(
            strict_severity(strict),
            DiagnosticCode::FlagsUnsupported,
            format!("flags type not supported: {name}"),
            step,
        )
    }

    pub fn resource_unsupported(name: &str, step: &'static str, strict: bool) -> Diagnostic {
        Diagnostic::new(
            strict_severity(strict),
            DiagnosticCode::ResourceUnsupported,
            format!("resource type not supported: {name}"),
            step,
        )
    }

    pub fn round_trip_mismatch(step: &'static str) -> Diagnostic {
        Diagnostic::warn(
            DiagnosticCode::RoundTripMismatch,
            "round-trip WIT→IR→WIT produced semantically different output",
            step,
        )
    }

    pub fn unknown_type(type_name: &str, step: &'static str) -> Diagnostic {
        Diagnostic::error(
            DiagnosticCode::UnknownType,
            format!("unknown type: {type_name}"),
            step,
        )
    }

    pub fn parse_error(message: &str, step: &'static str) -> Diagnostic {
        Diagnostic::error(
            DiagnosticCode::ParseError,
            format!("parse error: {message}"),
            step,
        )
    }

    pub fn conversion_error(message: &str, step: &'static str) -> Diagnostic {
        Diagnostic::error(
            DiagnosticCode::ConversionError,
            format!("conversion error: {message}"),
            step,
        )
    }
}

fn strict_severity(strict: bool) -> Severity {
    if strict { Severity::Error } else { Severity::Warn }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[{}]: {}", self.severity, self.code, self.message)?;
        if let Some(location) = self.location {
            write!(f, " (at {location})")?;
        }
        Ok(())
    }
}

/// Queries over an ordered diagnostic list.
pub trait DiagnosticsExt {
    fn has_warnings(&self) -> bool;
    fn has_errors(&self) -> bool;
    fn filter_by_severity(&self, severity: Severity) -> Vec<Diagnostic>;
}

impl DiagnosticsExt for [Diagnostic] {
    fn has_warnings(&self) -> bool {
        self.iter().any(|d| d.severity == Severity::Warn)
    }

    fn has_errors(&self) -> bool {
        self.iter().any(|d| d.severity == Severity::Error)
    }

    fn filter_by_severity(&self, severity: Severity) -> Vec<Diagnostic> {
        self.iter()
            .filter(|d| d.severity == severity)
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strict_mode_promotes_flags_to_error() {
        let lenient = Diagnostic::flags_unsupported("perms", STEP_MAKE, false);
        let strict = Diagnostic::flags_unsupported("perms", STEP_MAKE, true);
        assert_eq!(lenient.severity, Severity::Warn);
        assert_eq!(strict.severity, Severity::Error);
        assert_eq!(strict.code.as_str(), "WIT003");
    }

    #[test]
    fn renders_code_and_location() {
        let diag = Diagnostic::parse_error("expected '}'", STEP_MAKE)
            .with_location(Position::new(10, 2, 5));
        assert_eq!(
            diag.to_string(),
            "error[WIT007]: parse error: expected '}' (at 2:5)"
        );
    }

    #[test]
    fn filters_by_severity() {
        let diags = vec![
            Diagnostic::int_precision_lost("u8", STEP_MAKE),
            Diagnostic::info(DiagnosticCode::IntPrecisionLost, "note", STEP_GEN),
            Diagnostic::unknown_type("x", STEP_GEN),
        ];
        assert!(diags.has_warnings());
        assert!(diags.has_errors());
        assert_eq!(diags.filter_by_severity(Severity::Info).len(), 1);
        assert!(!diags[1..2].has_warnings());
    }
}
