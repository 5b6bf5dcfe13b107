use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{
    token::{Span, Spanned},
    util::{
        fmt::Show,
        intern::Interner,
    },
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
    Info,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Severity::Error => "error",
            Severity::Warning => "warning",
            Severity::Info => "info",
        })
    }
}

/// Stable diagnostic codes. Tools match on the serialized spelling, so
/// variants must never be renamed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Code {
    EmptySource,
    EmptyTokens,
    LexError,
    ParseError,
    SemanticError,
    SemanticWarning,
    UnsupportedTarget,
    InvalidOptions,
    GenerationFailed,
    GeneratorPanicked,
    UnsupportedNode,
    Cancelled,
    OutputFailed,
    NoTargets,
}

impl Code {
    pub const fn as_str(self) -> &'static str {
        match self {
            Code::EmptySource => "EMPTY_SOURCE",
            Code::EmptyTokens => "EMPTY_TOKENS",
            Code::LexError => "LEX_ERROR",
            Code::ParseError => "PARSE_ERROR",
            Code::SemanticError => "SEMANTIC_ERROR",
            Code::SemanticWarning => "SEMANTIC_WARNING",
            Code::UnsupportedTarget => "UNSUPPORTED_TARGET",
            Code::InvalidOptions => "INVALID_OPTIONS",
            Code::GenerationFailed => "GENERATION_FAILED",
            Code::GeneratorPanicked => "GENERATOR_PANICKED",
            Code::UnsupportedNode => "UNSUPPORTED_NODE",
            Code::Cancelled => "CANCELLED",
            Code::OutputFailed => "OUTPUT_FAILED",
            Code::NoTargets => "NO_TARGETS",
        }
    }
}

impl fmt::Display for Code {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub severity: Severity,
    pub message: String,
    pub code: Code,
    pub span: Option<Span>,
}

impl Diagnostic {
    pub fn new(severity: Severity, code: Code, message: impl Into<String>) -> Diagnostic {
        Diagnostic {
            severity,
            message: message.into(),
            code,
            span: None,
        }
    }

    pub fn error(code: Code, message: impl Into<String>) -> Diagnostic {
        Diagnostic::new(Severity::Error, code, message)
    }

    pub fn warning(code: Code, message: impl Into<String>) -> Diagnostic {
        Diagnostic::new(Severity::Warning, code, message)
    }

    pub fn info(code: Code, message: impl Into<String>) -> Diagnostic {
        Diagnostic::new(Severity::Info, code, message)
    }

    pub fn with_span(mut self, span: Span) -> Diagnostic {
        self.span = Some(span);
        self
    }

    /// Renders a stage error through its [`Show`] implementation.
    pub fn from_spanned<E>(
        severity: Severity,
        code: Code,
        error: &Spanned<E>,
        interner: &Interner,
    ) -> Diagnostic
    where
        Spanned<E>: Show,
    {
        let message = error.message(interner);
        Diagnostic::new(severity, code, message).with_span(error.span)
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }

    pub fn to_wire(&self) -> WireDiagnostic {
        WireDiagnostic::from(self)
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[{}]", self.severity, self.code)?;
        if let Some(span) = self.span {
            write!(f, " {}:{}", span.start.line, span.start.column)?;
        }
        write!(f, ": {}", self.message)
    }
}

/// The serialized diagnostic shape. Positions are 1-based.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireDiagnostic {
    pub severity: Severity,
    pub message: String,
    pub code: Code,
    pub line: u32,
    pub column: u32,
    pub end_line: u32,
    pub end_column: u32,
}

impl From<&Diagnostic> for WireDiagnostic {
    fn from(diagnostic: &Diagnostic) -> Self {
        let (line, column, end_line, end_column) = match diagnostic.span {
            Some(span) if span.end > span.start => (
                span.start.line,
                span.start.column,
                span.end.line,
                span.end.column,
            ),
            Some(span) => (
                span.start.line,
                span.start.column,
                span.start.line,
                span.start.column + 1,
            ),
            None => (1, 1, 1, 2),
        };
        WireDiagnostic {
            severity: diagnostic.severity,
            message: diagnostic.message.clone(),
            code: diagnostic.code,
            line,
            column,
            end_line,
            end_column,
        }
    }
}

#[cfg(test)]
mod tests {
    use indoc::indoc;
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::token::Position;

    #[test]
    fn wire_shape() {
        let span = Span::new(Position::new(2, 5, 12), Position::new(2, 9, 16));
        let diagnostic = Diagnostic::error(Code::ParseError, "expected a type").with_span(span);
        let json = serde_json::to_string_pretty(&diagnostic.to_wire()).unwrap();
        assert_eq!(
            json,
            indoc! {r#"
                {
                  "severity": "error",
                  "message": "expected a type",
                  "code": "PARSE_ERROR",
                  "line": 2,
                  "column": 5,
                  "endLine": 2,
                  "endColumn": 9
                }"#}
        );
    }

    #[test]
    fn wire_end_defaults_to_next_column() {
        let at = Position::new(3, 7, 20);
        let wire = Diagnostic::warning(Code::UnsupportedNode, "skipped")
            .with_span(Span::empty_at(at))
            .to_wire();
        assert_eq!((wire.end_line, wire.end_column), (3, 8));

        let wire = Diagnostic::info(Code::NoTargets, "nothing").to_wire();
        assert_eq!((wire.line, wire.column, wire.end_column), (1, 1, 2));
    }

    #[test]
    fn codes_serialize_to_stable_spelling() {
        for code in [Code::EmptyTokens, Code::GeneratorPanicked, Code::OutputFailed] {
            let json = serde_json::to_string(&code).unwrap();
            assert_eq!(json, format!("\"{}\"", code.as_str()));
        }
    }

    #[test]
    fn display() {
        let span = Span::new(Position::new(1, 3, 2), Position::new(1, 4, 3));
        let diagnostic = Diagnostic::error(Code::SemanticError, "undefined identifier `x`")
            .with_span(span);
        assert_eq!(
            diagnostic.to_string(),
            "error[SEMANTIC_ERROR] 1:3: undefined identifier `x`"
        );
    }
}
