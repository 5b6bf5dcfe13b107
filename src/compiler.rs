//! One-call entry points over the pipeline and the front end.

use std::path::PathBuf;

use crate::{
    analyzer::Analyzer,
    artifacts::Metadata,
    ast::Program,
    codegen::{GenerationOptions, Target},
    diagnostic::{Code, Diagnostic, Severity},
    lexer::{self, LexerOptions},
    parser,
    pipeline::{CompileRequest, CompileResult, Pipeline},
    token::Token,
    util::intern::Interner,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileOptions {
    pub filename: String,
    pub targets: Vec<Target>,
    pub generation: GenerationOptions,
    pub strict_lexing: bool,
    pub metadata: Metadata,
    /// Artifacts are only written to disk when set.
    pub output_dir: Option<PathBuf>,
}

impl Default for CompileOptions {
    fn default() -> Self {
        CompileOptions {
            filename: "main.wc".to_owned(),
            targets: vec![Target::TypeScript],
            generation: GenerationOptions::default(),
            strict_lexing: false,
            metadata: Metadata::default(),
            output_dir: None,
        }
    }
}

impl CompileOptions {
    pub fn request(&self, source: &str) -> CompileRequest {
        CompileRequest {
            source: source.to_owned(),
            filename: self.filename.clone(),
            targets: self.targets.iter().map(|t| t.id().to_owned()).collect(),
            options: self.generation.clone(),
            strict_lexing: self.strict_lexing,
            metadata: self.metadata.clone(),
            output_dir: self.output_dir.clone(),
        }
    }
}

/// Compiles `source` on a fresh pipeline.
pub fn compile(source: &str, options: &CompileOptions) -> CompileResult {
    // A pipeline owned by this call cannot already be running.
    match Pipeline::new().compile(&options.request(source)) {
        Ok(result) => result,
        Err(error) => {
            let mut result = CompileResult::default();
            result
                .diagnostics
                .push(Diagnostic::error(Code::GenerationFailed, error.to_string()));
            result
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Validation {
    pub valid: bool,
    pub error_count: usize,
    pub warning_count: usize,
    pub diagnostics: Vec<Diagnostic>,
}

/// Runs the front end without generating code. Unlike [`compile`], every
/// semantic error is reported on its own.
pub fn validate(source: &str) -> Validation {
    let mut diagnostics = Vec::new();
    if source.trim().is_empty() {
        diagnostics.push(Diagnostic::warning(Code::EmptySource, "the source is empty"));
    }
    let mut interner = Interner::with_capacity(256);
    if let Some(program) = front(source, &mut interner, &mut diagnostics) {
        let analysis = Analyzer::new(&mut interner).analyze(&program);
        for error in &analysis.errors {
            diagnostics.push(Diagnostic::from_spanned(
                Severity::Error,
                Code::SemanticError,
                error,
                &interner,
            ));
        }
        for warning in &analysis.warnings {
            diagnostics.push(Diagnostic::from_spanned(
                Severity::Warning,
                Code::SemanticWarning,
                warning,
                &interner,
            ));
        }
    }

    let error_count = diagnostics.iter().filter(|d| d.is_error()).count();
    let warning_count = diagnostics
        .iter()
        .filter(|d| d.severity == Severity::Warning)
        .count();
    Validation {
        valid: error_count == 0,
        error_count,
        warning_count,
        diagnostics,
    }
}

#[derive(Debug)]
pub struct ParsedAst {
    pub success: bool,
    /// Everything that parsed, even when there were errors.
    pub program: Program,
    pub interner: Interner,
    pub errors: Vec<Diagnostic>,
}

pub fn parse_ast(source: &str) -> ParsedAst {
    let mut interner = Interner::with_capacity(256);
    let tokens = match lex(source) {
        Ok(tokens) => tokens,
        Err(error) => {
            return ParsedAst {
                success: false,
                program: Program::default(),
                interner,
                errors: vec![error],
            }
        }
    };
    let (program, errors) = match parser::parse(source, &tokens, &mut interner) {
        Ok(program) => (program, Vec::new()),
        Err((program, errors)) => (program, errors),
    };
    let errors: Vec<Diagnostic> = errors
        .iter()
        .map(|error| Diagnostic::from_spanned(Severity::Error, Code::ParseError, error, &interner))
        .collect();
    ParsedAst {
        success: errors.is_empty(),
        program,
        interner,
        errors,
    }
}

fn lex(source: &str) -> Result<Vec<Token>, Diagnostic> {
    lexer::tokenize(source, &LexerOptions::default()).map_err(|error| {
        Diagnostic::from_spanned(
            Severity::Error,
            Code::LexError,
            &error,
            &Interner::with_capacity(0),
        )
    })
}

/// Lexes and parses, pushing every problem into `diagnostics`.
fn front(
    source: &str,
    interner: &mut Interner,
    diagnostics: &mut Vec<Diagnostic>,
) -> Option<Program> {
    let tokens = match lex(source) {
        Ok(tokens) => tokens,
        Err(error) => {
            diagnostics.push(error);
            return None;
        }
    };
    if tokens.iter().all(Token::is_eof) {
        diagnostics.push(Diagnostic::error(Code::EmptyTokens, "the source contains no tokens"));
        return None;
    }
    match parser::parse(source, &tokens, interner) {
        Ok(program) => Some(program),
        Err((_, errors)) => {
            diagnostics.extend(errors.iter().map(|error| {
                Diagnostic::from_spanned(Severity::Error, Code::ParseError, error, interner)
            }));
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::ast::DeclarationKind;

    #[test]
    fn compile_to_assemblyscript() {
        let options = CompileOptions {
            targets: vec![Target::AssemblyScript],
            ..CompileOptions::default()
        };
        let result = compile("int x = 1.5;", &options);
        assert!(result.success);
        let code = &result.targets[&Target::AssemblyScript].code;
        assert!(code.contains("let x: i32 = <i32>1.5;"));
    }

    #[test]
    fn compile_empty_source() {
        let result = compile("", &CompileOptions::default());
        assert!(!result.success);
        assert!(result.has_code(Code::EmptyTokens));
    }

    #[test]
    fn validate_reports_each_error() {
        let validation = validate("int f() { return y + z; }");
        assert!(!validation.valid);
        assert_eq!(validation.error_count, 2);
        let messages: Vec<&str> = validation
            .diagnostics
            .iter()
            .map(|d| d.message.as_str())
            .collect();
        assert_eq!(
            messages,
            ["undefined identifier `y`", "undefined identifier `z`"]
        );

        let validation = validate("int x = 1;");
        assert!(validation.valid);
        assert_eq!(validation.diagnostics, []);
    }

    #[test]
    fn validate_syntax_errors() {
        let validation = validate("int = ;");
        assert!(!validation.valid);
        assert!(validation.diagnostics.iter().all(|d| d.code == Code::ParseError));
    }

    #[test]
    fn parse_ast_keeps_partial_programs() {
        let parsed = parse_ast("int add(int a, int b) { return a + b; }");
        assert!(parsed.success);
        assert_eq!(parsed.program.declarations.len(), 1);
        let DeclarationKind::Function(function) = &parsed.program.declarations[0].kind else {
            panic!("expected a function");
        };
        assert_eq!(parsed.interner.get(function.name.name), "add");

        let parsed = parse_ast("int = ; int y;");
        assert!(!parsed.success);
        assert!(!parsed.errors.is_empty());
    }
}
