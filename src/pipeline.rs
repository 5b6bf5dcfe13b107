//! Staged orchestration of a compilation.
//!
//! A [`Pipeline`] runs the stages in order, each to completion, collecting
//! diagnostics as it goes. Only missing structural output (no tokens, no AST)
//! stops it early; generation failures are confined to their target.

use std::{
    any::Any,
    collections::BTreeMap,
    fmt,
    panic::{self, AssertUnwindSafe},
    path::PathBuf,
    sync::atomic::{AtomicBool, Ordering},
    time::{Duration, Instant},
};

use serde::{Deserialize, Serialize};

use crate::{
    analyzer::Analyzer,
    artifacts::{self, ArtifactInput, Metadata},
    ast::Program,
    cancel::CancellationToken,
    codegen::{
        self, file_stem, GenerationContext, GenerationError, GenerationOptions, Generator, Target,
    },
    diagnostic::{Code, Diagnostic, Severity},
    fs::{FileSystem, NativeFileSystem},
    lexer::{self, LexerOptions},
    parser,
    token::Token,
    util::intern::Interner,
};

#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Initialization,
    Lexing,
    Parsing,
    SemanticAnalysis,
    CodeGeneration,
    Output,
    Complete,
}

impl Stage {
    pub const fn name(self) -> &'static str {
        match self {
            Stage::Initialization => "initialization",
            Stage::Lexing => "lexing",
            Stage::Parsing => "parsing",
            Stage::SemanticAnalysis => "semantic analysis",
            Stage::CodeGeneration => "code generation",
            Stage::Output => "output",
            Stage::Complete => "complete",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileRequest {
    pub source: String,
    pub filename: String,
    /// Target ids, short or long. Unknown ids become diagnostics.
    pub targets: Vec<String>,
    pub options: GenerationOptions,
    /// Rejects malformed numeric literals while lexing.
    pub strict_lexing: bool,
    pub metadata: Metadata,
    pub output_dir: Option<PathBuf>,
}

impl CompileRequest {
    pub fn new(source: impl Into<String>) -> CompileRequest {
        CompileRequest {
            source: source.into(),
            ..CompileRequest::default()
        }
    }
}

impl Default for CompileRequest {
    fn default() -> Self {
        CompileRequest {
            source: String::new(),
            filename: "main.wc".to_owned(),
            targets: vec![Target::TypeScript.id().to_owned()],
            options: GenerationOptions::default(),
            strict_lexing: false,
            metadata: Metadata::default(),
            output_dir: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TargetResult {
    pub success: bool,
    pub code: String,
    pub source_map: Option<String>,
    pub declarations: Option<String>,
    pub diagnostics: Vec<Diagnostic>,
    pub warnings: Vec<Diagnostic>,
    /// Files produced by this target, keyed by artifact path.
    pub artifacts: BTreeMap<String, String>,
}

impl TargetResult {
    fn failed(diagnostic: Diagnostic) -> TargetResult {
        TargetResult {
            diagnostics: vec![diagnostic],
            ..TargetResult::default()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StageTiming {
    pub stage: Stage,
    pub elapsed: Duration,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Timings {
    pub stages: Vec<StageTiming>,
    pub targets: BTreeMap<Target, Duration>,
    pub total: Duration,
}

impl Timings {
    pub fn stage(&self, stage: Stage) -> Option<Duration> {
        self.stages
            .iter()
            .find(|timing| timing.stage == stage)
            .map(|timing| timing.elapsed)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileResult {
    /// At least one target produced code.
    pub success: bool,
    pub targets: BTreeMap<Target, TargetResult>,
    /// Errors and notes, in the order they were reported.
    pub diagnostics: Vec<Diagnostic>,
    pub warnings: Vec<Diagnostic>,
    pub artifacts: BTreeMap<String, String>,
    pub output_files: BTreeMap<Target, Vec<String>>,
    pub timings: Timings,
    /// The last stage that ran.
    pub stage: Stage,
}

impl Default for CompileResult {
    fn default() -> Self {
        CompileResult {
            success: false,
            targets: BTreeMap::new(),
            diagnostics: Vec::new(),
            warnings: Vec::new(),
            artifacts: BTreeMap::new(),
            output_files: BTreeMap::new(),
            timings: Timings::default(),
            stage: Stage::Initialization,
        }
    }
}

impl CompileResult {
    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(Diagnostic::is_error)
    }

    pub fn error_count(&self) -> usize {
        self.diagnostics.iter().filter(|d| d.is_error()).count()
    }

    pub fn has_code(&self, code: Code) -> bool {
        self.all_diagnostics().any(|d| d.code == code)
    }

    /// Every diagnostic, warnings last.
    pub fn all_diagnostics(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter().chain(&self.warnings)
    }

    fn report(&mut self, diagnostic: Diagnostic) {
        if diagnostic.severity == Severity::Warning {
            self.warnings.push(diagnostic);
        } else {
            self.diagnostics.push(diagnostic);
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum PipelineError {
    #[error("a compilation is already running on this pipeline")]
    AlreadyRunning,
}

/// Marks the pipeline busy for as long as it lives.
struct RunGuard<'a>(&'a AtomicBool);

impl<'a> RunGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Result<RunGuard<'a>, PipelineError> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| PipelineError::AlreadyRunning)?;
        Ok(RunGuard(flag))
    }
}

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

pub struct Pipeline {
    fs: Box<dyn FileSystem>,
    generators: Vec<Box<dyn Generator>>,
    cancel: CancellationToken,
    running: AtomicBool,
}

impl Default for Pipeline {
    fn default() -> Self {
        Pipeline::new()
    }
}

impl Pipeline {
    /// A pipeline writing to the real disk.
    pub fn new() -> Pipeline {
        Pipeline::with_file_system(NativeFileSystem)
    }

    pub fn with_file_system(fs: impl FileSystem + 'static) -> Pipeline {
        Pipeline {
            fs: Box::new(fs),
            generators: Target::ALL.iter().map(|&t| codegen::generator_for(t)).collect(),
            cancel: CancellationToken::new(),
            running: AtomicBool::new(false),
        }
    }

    /// Replaces the generator of `generator.target()`.
    #[must_use]
    pub fn with_generator(mut self, generator: Box<dyn Generator>) -> Pipeline {
        let target = generator.target();
        self.generators.retain(|g| g.target() != target);
        self.generators.push(generator);
        self
    }

    /// A token cancelling whatever this pipeline is running. A cancellation
    /// issued while idle applies to the next run; every run clears it when it
    /// ends.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    pub fn compile(&self, request: &CompileRequest) -> Result<CompileResult, PipelineError> {
        let _guard = RunGuard::acquire(&self.running)?;
        let started = Instant::now();
        let mut run = Run {
            pipeline: self,
            request,
            result: CompileResult::default(),
        };
        run.run();
        self.cancel.reset();
        run.result.timings.total = started.elapsed();
        tracing::info!(
            "compiled {} in {:?} (success: {}, {} errors, {} warnings)",
            request.filename,
            run.result.timings.total,
            run.result.success,
            run.result.error_count(),
            run.result.warnings.len(),
        );
        Ok(run.result)
    }

    fn generator(&self, target: Target) -> Option<&dyn Generator> {
        self.generators
            .iter()
            .find(|g| g.target() == target)
            .map(AsRef::as_ref)
    }
}

/// State of a single compilation.
struct Run<'p> {
    pipeline: &'p Pipeline,
    request: &'p CompileRequest,
    result: CompileResult,
}

impl Run<'_> {
    fn run(&mut self) {
        let Some(targets) = self.stage(Stage::Initialization, Run::initialize) else {
            return;
        };
        let Some(tokens) = self.stage(Stage::Lexing, Run::lex) else {
            return;
        };
        let mut interner = Interner::with_capacity(256);
        let Some(program) = self.stage(Stage::Parsing, |run| run.parse(&tokens, &mut interner))
        else {
            return;
        };
        if self
            .stage(Stage::SemanticAnalysis, |run| run.analyze(&program, &mut interner))
            .is_none()
        {
            return;
        }
        self.stage(Stage::CodeGeneration, |run| {
            run.generate(&program, &interner, &targets);
            Some(())
        });
        if self.result.success {
            self.stage(Stage::Output, |run| {
                run.output();
                Some(())
            });
        }
        self.result.stage = Stage::Complete;
    }

    /// Runs a stage, timing it. `None` halts the pipeline.
    fn stage<T>(&mut self, stage: Stage, f: impl FnOnce(&mut Self) -> Option<T>) -> Option<T> {
        if self.pipeline.cancel.is_cancelled() {
            self.cancelled(stage);
            return None;
        }
        self.result.stage = stage;
        let started = Instant::now();
        let value = f(self);
        let elapsed = started.elapsed();
        self.result.timings.stages.push(StageTiming { stage, elapsed });
        tracing::debug!("{stage} finished in {elapsed:?}");
        value
    }

    fn cancelled(&mut self, stage: Stage) {
        tracing::debug!("cancelled before {stage}");
        self.result.report(Diagnostic::error(
            Code::Cancelled,
            format!("compilation cancelled during {stage}"),
        ));
    }

    fn initialize(&mut self) -> Option<Vec<Target>> {
        let mut targets = Vec::with_capacity(self.request.targets.len());
        for id in &self.request.targets {
            match id.parse::<Target>() {
                Ok(target) if !targets.contains(&target) => targets.push(target),
                Ok(_) => {}
                Err(error) => {
                    self.result
                        .report(Diagnostic::error(Code::UnsupportedTarget, error.to_string()));
                }
            }
        }
        if targets.is_empty() {
            self.result
                .report(Diagnostic::error(Code::NoTargets, "no valid target was requested"));
        }
        if self.request.source.trim().is_empty() {
            self.result
                .report(Diagnostic::warning(Code::EmptySource, "the source is empty"));
        }
        Some(targets)
    }

    fn lex(&mut self) -> Option<Vec<Token>> {
        let options = LexerOptions {
            strict: self.request.strict_lexing,
            ..LexerOptions::default()
        };
        let tokens = match lexer::tokenize(&self.request.source, &options) {
            Ok(tokens) => tokens,
            Err(error) => {
                let interner = Interner::with_capacity(0);
                self.result.report(Diagnostic::from_spanned(
                    Severity::Error,
                    Code::LexError,
                    &error,
                    &interner,
                ));
                return None;
            }
        };
        if tokens.iter().all(Token::is_eof) {
            self.result
                .report(Diagnostic::error(Code::EmptyTokens, "the source contains no tokens"));
            return None;
        }
        tracing::debug!("lexed {} tokens", tokens.len());
        Some(tokens)
    }

    fn parse(&mut self, tokens: &[Token], interner: &mut Interner) -> Option<Program> {
        let cancel = &self.pipeline.cancel;
        match parser::parse_cancellable(&self.request.source, tokens, interner, cancel) {
            Ok(program) => {
                tracing::debug!("parsed {} declarations", program.declarations.len());
                Some(program)
            }
            Err((_, errors)) => {
                for error in &errors {
                    let code = if error.inner == parser::Error::Cancelled {
                        Code::Cancelled
                    } else {
                        Code::ParseError
                    };
                    self.result.report(Diagnostic::from_spanned(
                        Severity::Error,
                        code,
                        error,
                        interner,
                    ));
                }
                None
            }
        }
    }

    fn analyze(&mut self, program: &Program, interner: &mut Interner) -> Option<()> {
        let analysis = Analyzer::new(interner).analyze(program);
        for warning in &analysis.warnings {
            self.result.report(Diagnostic::from_spanned(
                Severity::Warning,
                Code::SemanticWarning,
                warning,
                interner,
            ));
        }
        let Some(first) = analysis.errors.first() else {
            return Some(());
        };

        let messages: Vec<String> = analysis
            .errors
            .iter()
            .map(|error| {
                let d = Diagnostic::from_spanned(Severity::Error, Code::SemanticError, error, interner);
                let start = error.span.start;
                format!("{}:{}: {}", start.line, start.column, d.message)
            })
            .collect();
        let message = format!(
            "semantic analysis failed with {} error{}: {}",
            messages.len(),
            if messages.len() == 1 { "" } else { "s" },
            messages.join("; "),
        );
        self.result
            .report(Diagnostic::error(Code::SemanticError, message).with_span(first.span));
        None
    }

    fn generate(&mut self, program: &Program, interner: &Interner, targets: &[Target]) {
        let request = self.request;
        let stem = file_stem(&request.filename);
        for &target in targets {
            let started = Instant::now();
            let result = self.generate_target(program, interner, target, stem);
            self.result.timings.targets.insert(target, started.elapsed());

            for diagnostic in result.diagnostics.iter().chain(&result.warnings) {
                self.result.report(diagnostic.clone());
            }
            if result.success {
                self.result.success = true;
                self.result
                    .output_files
                    .insert(target, result.artifacts.keys().cloned().collect());
                self.result.artifacts.extend(result.artifacts.clone());
            }
            self.result.targets.insert(target, result);
        }

        if self.result.success {
            self.synthesize_artifacts(stem);
        }
    }

    fn generate_target(
        &self,
        program: &Program,
        interner: &Interner,
        target: Target,
        stem: &str,
    ) -> TargetResult {
        let Some(generator) = self.pipeline.generator(target) else {
            return TargetResult::failed(Diagnostic::error(
                Code::UnsupportedTarget,
                format!("no generator is registered for {target}"),
            ));
        };
        if let Err(error) = generator.validate_options(&self.request.options) {
            return TargetResult::failed(Diagnostic::error(Code::InvalidOptions, error.to_string()));
        }

        let ctx = GenerationContext {
            interner,
            options: &self.request.options,
            filename: &self.request.filename,
            source: &self.request.source,
            cancel: &self.pipeline.cancel,
        };
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| generator.generate(program, &ctx)));
        let output = match outcome {
            Ok(Ok(output)) => output,
            Ok(Err(error)) => {
                tracing::warn!("{target} generation failed: {error}");
                let code = match error {
                    GenerationError::Cancelled => Code::Cancelled,
                    GenerationError::InvalidOptions { .. } => Code::InvalidOptions,
                    GenerationError::Failed(_) => Code::GenerationFailed,
                };
                return TargetResult::failed(Diagnostic::error(code, format!("{target}: {error}")));
            }
            Err(payload) => {
                let message = panic_message(payload.as_ref());
                tracing::warn!("{target} generator panicked: {message}");
                return TargetResult::failed(Diagnostic::error(
                    Code::GeneratorPanicked,
                    format!("{target} generator panicked: {message}"),
                ));
            }
        };

        let warnings = output
            .warnings
            .iter()
            .map(|warning| {
                let diagnostic = Diagnostic::warning(Code::UnsupportedNode, warning.message.clone());
                match warning.span {
                    Some(span) => diagnostic.with_span(span),
                    None => diagnostic,
                }
            })
            .collect();

        let code_path = target.output_path(stem);
        let mut artifacts = BTreeMap::new();
        if let Some(map) = &output.source_map {
            artifacts.insert(format!("{code_path}.map"), map.clone());
        }
        if let Some(declarations) = &output.declarations {
            artifacts.insert(format!("{stem}.d.ts"), declarations.clone());
        }
        artifacts.insert(code_path, output.code.clone());

        TargetResult {
            success: true,
            code: output.code,
            source_map: output.source_map,
            declarations: output.declarations,
            diagnostics: Vec::new(),
            warnings,
            artifacts,
        }
    }

    fn synthesize_artifacts(&mut self, stem: &str) {
        let input = ArtifactInput {
            filename: &self.request.filename,
            stem,
            metadata: &self.request.metadata,
            generation: &self.request.options,
            outputs: &self.result.output_files,
        };
        match artifacts::synthesize(&input) {
            Ok(artifacts) => self.result.artifacts.extend(artifacts),
            Err(error) => self.result.report(Diagnostic::warning(
                Code::OutputFailed,
                format!("failed to build project files: {error}"),
            )),
        }
    }

    /// Writes every artifact under the requested output directory.
    fn output(&mut self) {
        let Some(dir) = &self.request.output_dir else {
            return;
        };
        let fs = self.pipeline.fs.as_ref();
        let mut failures = Vec::new();
        for (key, contents) in &self.result.artifacts {
            let path = fs.join(dir, key);
            let written = match path.parent() {
                Some(parent) => fs.create_directory(parent),
                None => Ok(()),
            }
            .and_then(|()| fs.write_file(&path, contents));
            match written {
                Ok(()) => tracing::debug!("wrote {}", path.display()),
                Err(error) => failures.push(Diagnostic::warning(
                    Code::OutputFailed,
                    format!("failed to write {key}: {error}"),
                )),
            }
        }
        for failure in failures {
            self.result.report(failure);
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.as_str()
    } else {
        "unknown panic payload"
    }
}

#[cfg(test)]
mod tests {
    use std::{
        path::Path,
        sync::{Arc, Barrier},
    };

    use pretty_assertions::assert_eq;

    use super::*;
    use crate::{
        codegen::{Feature, GenerationOutput},
        fs::MemoryFileSystem,
    };

    fn request(source: &str, targets: &[&str]) -> CompileRequest {
        CompileRequest {
            source: source.to_owned(),
            targets: targets.iter().map(|&t| t.to_owned()).collect(),
            ..CompileRequest::default()
        }
    }

    fn codes(result: &CompileResult) -> Vec<Code> {
        result.all_diagnostics().map(|d| d.code).collect()
    }

    /// An AssemblyScript generator that always panics.
    struct Exploding;

    impl Generator for Exploding {
        fn target(&self) -> Target {
            Target::AssemblyScript
        }

        fn supports_feature(&self, _: Feature) -> bool {
            true
        }

        fn validate_options(&self, _: &GenerationOptions) -> Result<(), GenerationError> {
            Ok(())
        }

        fn generate(
            &self,
            _: &Program,
            _: &GenerationContext<'_>,
        ) -> Result<GenerationOutput, GenerationError> {
            panic!("boom")
        }
    }

    #[test]
    fn compiles_to_every_target() {
        let pipeline = Pipeline::with_file_system(MemoryFileSystem::new());
        let result = pipeline
            .compile(&request("int x = 1.5;", &["ts", "as"]))
            .unwrap();
        assert!(result.success);
        assert_eq!(result.stage, Stage::Complete);
        assert_eq!(codes(&result), []);
        assert!(result.targets[&Target::AssemblyScript].code.contains("<i32>1.5"));
        assert!(result.targets[&Target::TypeScript].code.contains("Math.trunc(1.5)"));

        let keys: Vec<&str> = result.artifacts.keys().map(String::as_str).collect();
        assert_eq!(
            keys,
            [
                "README.md",
                "asconfig.json",
                "assembly/main.ts",
                "main.ts",
                "package.json",
                "tsconfig.json",
                "worldc.manifest.json",
            ]
        );
        assert_eq!(result.output_files[&Target::TypeScript], ["main.ts"]);
        assert!(result.timings.stage(Stage::Parsing).is_some());
        assert_eq!(result.timings.targets.len(), 2);
    }

    #[test]
    fn empty_source_has_no_tokens() {
        let result = Pipeline::new().compile(&request("", &["ts"])).unwrap();
        assert!(!result.success);
        assert_eq!(result.stage, Stage::Lexing);
        assert_eq!(codes(&result), [Code::EmptyTokens, Code::EmptySource]);
    }

    #[test]
    fn failing_target_does_not_affect_others() {
        let pipeline = Pipeline::with_file_system(MemoryFileSystem::new())
            .with_generator(Box::new(Exploding));
        let result = pipeline
            .compile(&request("int add(int a, int b) { return a + b; }", &["ts", "as"]))
            .unwrap();
        assert!(result.success);
        assert!(result.targets[&Target::TypeScript].success);
        assert!(!result.targets[&Target::AssemblyScript].success);
        assert_eq!(codes(&result), [Code::GeneratorPanicked]);
        assert_eq!(
            result.diagnostics[0].message,
            "assemblyscript generator panicked: boom"
        );
        assert!(!result.artifacts.contains_key("asconfig.json"));
    }

    #[test]
    fn unknown_targets_are_reported() {
        let result = Pipeline::new()
            .compile(&request("int x;", &["wasm", "ts", "typescript"]))
            .unwrap();
        assert!(result.success);
        assert_eq!(result.targets.len(), 1);
        assert_eq!(codes(&result), [Code::UnsupportedTarget]);

        let result = Pipeline::new().compile(&request("int x;", &[])).unwrap();
        assert!(!result.success);
        assert_eq!(codes(&result), [Code::NoTargets]);
    }

    #[test]
    fn syntax_and_semantic_errors_stop_generation() {
        let result = Pipeline::new().compile(&request("int = ;", &["ts"])).unwrap();
        assert_eq!(result.stage, Stage::Parsing);
        assert!(result.has_code(Code::ParseError));
        assert!(result.targets.is_empty());

        let result = Pipeline::new()
            .compile(&request("int f() { return y + z; }", &["ts"]))
            .unwrap();
        assert_eq!(result.stage, Stage::SemanticAnalysis);
        assert_eq!(codes(&result), [Code::SemanticError]);
        assert_eq!(
            result.diagnostics[0].message,
            "semantic analysis failed with 2 errors: 1:18: undefined identifier `y`; \
             1:22: undefined identifier `z`"
        );
    }

    #[test]
    fn invalid_options_fail_only_their_target() {
        let mut request = request("int x;", &["ts", "as"]);
        request.options.declarations = true;
        let result = Pipeline::new().compile(&request).unwrap();
        assert!(result.success);
        assert_eq!(codes(&result), [Code::InvalidOptions]);
        assert!(result.artifacts.contains_key("main.d.ts"));
    }

    #[test]
    fn writes_artifacts_through_the_file_system() {
        let fs = Arc::new(MemoryFileSystem::new());
        let pipeline = Pipeline::with_file_system(SharedFs(Arc::clone(&fs)));
        let mut request = request("int x = 1;", &["as"]);
        request.output_dir = Some(PathBuf::from("out"));
        request.options.source_map = true;
        let result = pipeline.compile(&request).unwrap();
        assert!(result.success);
        assert_eq!(
            result.output_files[&Target::AssemblyScript],
            ["assembly/main.ts", "assembly/main.ts.map"]
        );

        let code = fs.read_file(&Path::new("out").join("assembly").join("main.ts"));
        assert!(code.unwrap().ends_with("//# sourceMappingURL=main.ts.map\n"));
        assert!(fs.exists(&Path::new("out").join("asconfig.json")));
    }

    #[test]
    fn write_failures_become_warnings() {
        let pipeline = Pipeline::with_file_system(MemoryFileSystem::read_only());
        let mut request = request("int x;", &["ts"]);
        request.output_dir = Some(PathBuf::from("out"));
        let result = pipeline.compile(&request).unwrap();
        assert!(result.success);
        assert_eq!(result.stage, Stage::Complete);
        assert!(!result.warnings.is_empty());
        assert!(result.warnings.iter().all(|w| w.code == Code::OutputFailed));
    }

    #[test]
    fn cancelled_before_start() {
        let pipeline = Pipeline::new();
        pipeline.cancellation_token().cancel();
        let result = pipeline.compile(&request("int x;", &["ts"])).unwrap();
        assert!(!result.success);
        assert_eq!(codes(&result), [Code::Cancelled]);

        let result = pipeline.compile(&request("int x;", &["ts"])).unwrap();
        assert!(result.success);
        assert_eq!(codes(&result), []);
    }

    #[test]
    fn demo_program_compiles_to_every_target() {
        let pipeline = Pipeline::with_file_system(MemoryFileSystem::new());
        let result = pipeline
            .compile(&request(include_str!("../demos/world.wc"), &["ts", "as"]))
            .unwrap();
        assert!(result.success);
        assert_eq!(result.stage, Stage::Complete);
        assert!(!codes(&result).contains(&Code::UnsupportedNode));
        for target in [Target::TypeScript, Target::AssemblyScript] {
            let output = &result.targets[&target];
            assert!(output.success, "{target} failed");
            assert!(output.code.contains("super(name, "), "{target}");
            assert!(output.code.contains("this.weight = weight;"), "{target}");
            assert!(!output.code.contains("undefined"), "{target}");
        }
    }

    /// Blocks inside generation until released.
    struct Blocking {
        entered: Arc<Barrier>,
        release: Arc<Barrier>,
    }

    impl Generator for Blocking {
        fn target(&self) -> Target {
            Target::TypeScript
        }

        fn supports_feature(&self, _: Feature) -> bool {
            true
        }

        fn validate_options(&self, _: &GenerationOptions) -> Result<(), GenerationError> {
            Ok(())
        }

        fn generate(
            &self,
            _: &Program,
            _: &GenerationContext<'_>,
        ) -> Result<GenerationOutput, GenerationError> {
            self.entered.wait();
            self.release.wait();
            Ok(GenerationOutput::default())
        }
    }

    #[test]
    fn rejects_reentrant_compilation() {
        let entered = Arc::new(Barrier::new(2));
        let release = Arc::new(Barrier::new(2));
        let pipeline = Pipeline::with_file_system(MemoryFileSystem::new()).with_generator(
            Box::new(Blocking {
                entered: Arc::clone(&entered),
                release: Arc::clone(&release),
            }),
        );
        let request = request("int x;", &["ts"]);

        std::thread::scope(|scope| {
            let first = scope.spawn(|| pipeline.compile(&request));
            entered.wait();
            assert!(pipeline.is_running());
            assert_eq!(pipeline.compile(&request), Err(PipelineError::AlreadyRunning));
            release.wait();
            assert!(first.join().unwrap().is_ok());
        });
        assert!(!pipeline.is_running());
    }

    /// Lets a test keep a handle on the file system the pipeline owns.
    struct SharedFs(Arc<MemoryFileSystem>);

    impl FileSystem for SharedFs {
        fn exists(&self, path: &Path) -> bool {
            self.0.exists(path)
        }

        fn create_directory(&self, path: &Path) -> Result<(), crate::fs::FsError> {
            self.0.create_directory(path)
        }

        fn write_file(&self, path: &Path, contents: &str) -> Result<(), crate::fs::FsError> {
            self.0.write_file(path, contents)
        }

        fn read_file(&self, path: &Path) -> Result<String, crate::fs::FsError> {
            self.0.read_file(path)
        }
    }
}
