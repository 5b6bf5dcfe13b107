//! WORLDC compiler CLI

use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing_subscriber::EnvFilter;
use worldc::{
    artifacts::Metadata,
    codegen::{file_stem, GenerationOptions},
    compiler::{self, CompileOptions},
    diagnostic::{Code, Diagnostic, Severity, WireDiagnostic},
    lexer::{self, LexerOptions},
    util::{fmt::tree, intern::Interner},
};

mod target;

#[derive(Parser)]
#[command(name = "worldc")]
#[command(version, about = "WORLDC to TypeScript and AssemblyScript compiler", long_about = None)]
struct Cli {
    /// Log every pipeline stage to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile a source file
    Compile {
        file: PathBuf,

        /// Target to generate, may be repeated
        #[arg(short, long = "target", value_enum, default_values_t = [target::Target::TypeScript])]
        targets: Vec<target::Target>,

        /// Write every artifact under this directory instead of printing the code
        #[arg(short, long)]
        out_dir: Option<PathBuf>,

        /// Emit source maps
        #[arg(long)]
        source_map: bool,

        /// Emit a `.d.ts` file (TypeScript only)
        #[arg(long)]
        declarations: bool,

        /// Give uninitialized bindings their zero value
        #[arg(long)]
        initialize_defaults: bool,

        /// Use strict equality in the generated TypeScript
        #[arg(long)]
        strict: bool,

        /// Spaces per indentation level
        #[arg(long, default_value_t = 2)]
        indent: usize,

        /// Wrap declarations in a named module
        #[arg(long)]
        module_name: Option<String>,

        /// Package name used by the generated project files
        #[arg(long)]
        name: Option<String>,

        /// Print diagnostics as JSON
        #[arg(long)]
        json: bool,
    },

    /// Check a source file for errors
    Check {
        file: PathBuf,

        /// Print diagnostics as JSON
        #[arg(long)]
        json: bool,
    },

    /// Parse and dump the AST
    Ast { file: PathBuf },

    /// Dump the token stream
    Tokens {
        file: PathBuf,

        /// Keep whitespace, newlines and comments
        #[arg(long)]
        trivia: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Compile {
            file,
            targets,
            out_dir,
            source_map,
            declarations,
            initialize_defaults,
            strict,
            indent,
            module_name,
            name,
            json,
        } => {
            let options = CompileOptions {
                filename: file_name(&file),
                targets: targets.into_iter().map(Into::into).collect(),
                generation: GenerationOptions {
                    source_map,
                    declarations,
                    initialize_defaults,
                    strict,
                    indent,
                    module_name,
                    ..GenerationOptions::default()
                },
                metadata: Metadata {
                    name,
                    ..Metadata::default()
                },
                output_dir: out_dir,
                ..CompileOptions::default()
            };
            compile(&file, &options, json)
        }
        Commands::Check { file, json } => check(&file, json),
        Commands::Ast { file } => dump_ast(&file),
        Commands::Tokens { file, trivia } => dump_tokens(&file, trivia),
    }
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();
}

fn read(file: &Path) -> Result<String> {
    let source = fs::read_to_string(file)
        .with_context(|| format!("Failed to read file: {}", file.display()))?;
    tracing::debug!("read {} ({} bytes)", file.display(), source.len());
    Ok(source)
}

fn file_name(file: &Path) -> String {
    file.file_name()
        .and_then(|name| name.to_str())
        .unwrap_or("main.wc")
        .to_owned()
}

#[derive(Serialize)]
struct Report {
    success: bool,
    diagnostics: Vec<WireDiagnostic>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    files: Vec<String>,
}

fn print_diagnostics<'d>(file: &Path, diagnostics: impl IntoIterator<Item = &'d Diagnostic>) {
    for d in diagnostics {
        match d.span {
            Some(span) => eprintln!(
                "{}:{}: {}[{}]: {}",
                file.display(),
                span.start,
                d.severity,
                d.code,
                d.message
            ),
            None => eprintln!("{}: {}[{}]: {}", file.display(), d.severity, d.code, d.message),
        }
    }
}

fn print_report<'d>(
    success: bool,
    diagnostics: impl IntoIterator<Item = &'d Diagnostic>,
    files: &[String],
) -> Result<()> {
    let report = Report {
        success,
        diagnostics: diagnostics.into_iter().map(Diagnostic::to_wire).collect(),
        files: files.to_vec(),
    };
    let json = serde_json::to_string_pretty(&report).context("Failed to serialize diagnostics")?;
    println!("{json}");
    Ok(())
}

fn compile(file: &Path, options: &CompileOptions, json: bool) -> Result<()> {
    let source = read(file)?;
    let targets: Vec<String> = options.targets.iter().map(ToString::to_string).collect();
    tracing::debug!("compiling {} to {}", options.filename, targets.join(", "));
    let result = compiler::compile(&source, options);
    let files: Vec<String> = result.artifacts.keys().cloned().collect();

    if json {
        print_report(result.success, result.all_diagnostics(), &files)?;
    } else {
        print_diagnostics(file, result.all_diagnostics());
        if result.success {
            if let Some(dir) = &options.output_dir {
                for key in &files {
                    println!("{}", dir.join(key).display());
                }
            } else {
                let stem = file_stem(&options.filename);
                let printed: Vec<_> = result.targets.iter().filter(|(_, t)| t.success).collect();
                for (target, output) in &printed {
                    if printed.len() > 1 {
                        println!("// ==> {}", target.output_path(stem));
                    }
                    print!("{}", output.code);
                }
            }
        }
    }

    if !result.success {
        bail!("Compilation failed with {} error(s)", result.error_count());
    }
    Ok(())
}

fn check(file: &Path, json: bool) -> Result<()> {
    let source = read(file)?;
    let validation = compiler::validate(&source);
    tracing::debug!(
        "checked {}: {} error(s), {} warning(s)",
        file.display(),
        validation.error_count,
        validation.warning_count
    );
    if json {
        print_report(validation.valid, &validation.diagnostics, &[])?;
    } else {
        print_diagnostics(file, &validation.diagnostics);
        if validation.valid {
            println!(
                "{}: ok ({} warning(s))",
                file.display(),
                validation.warning_count
            );
        }
    }
    if !validation.valid {
        bail!("Found {} error(s)", validation.error_count);
    }
    Ok(())
}

fn dump_ast(file: &Path) -> Result<()> {
    let source = read(file)?;
    let parsed = compiler::parse_ast(&source);
    tracing::debug!("parsed {} declaration(s)", parsed.program.declarations.len());
    print_diagnostics(file, &parsed.errors);
    if !parsed.success {
        bail!("Failed to parse");
    }
    print!("{}", tree::print_program_string(&parsed.interner, &parsed.program));
    Ok(())
}

fn dump_tokens(file: &Path, trivia: bool) -> Result<()> {
    let source = read(file)?;
    let options = if trivia {
        LexerOptions::LOSSLESS
    } else {
        LexerOptions::default()
    };
    let tokens = lexer::tokenize(&source, &options).map_err(|error| {
        let d = Diagnostic::from_spanned(
            Severity::Error,
            Code::LexError,
            &error,
            &Interner::with_capacity(0),
        );
        print_diagnostics(file, [&d]);
        anyhow::anyhow!("Failed to tokenize")
    })?;
    tracing::debug!("lexed {} token(s)", tokens.len());
    for token in tokens {
        println!("{}\t{:?}\t{:?}", token.span.start, token.kind, token.text(&source));
    }
    Ok(())
}
