use std::{fmt, path::Path, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::{ast::Program, token::Span, util::intern::Interner};

pub use crate::cancel::CancellationToken;

pub mod assemblyscript;
mod emit;
pub mod infer;
pub mod source_map;
pub mod typescript;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Target {
    TypeScript,
    AssemblyScript,
}

impl Target {
    pub const ALL: &[Target] = &[Target::TypeScript, Target::AssemblyScript];

    pub const fn id(self) -> &'static str {
        match self {
            Target::TypeScript => "typescript",
            Target::AssemblyScript => "assemblyscript",
        }
    }

    pub const fn short_id(self) -> &'static str {
        match self {
            Target::TypeScript => "ts",
            Target::AssemblyScript => "as",
        }
    }

    pub const fn display_name(self) -> &'static str {
        match self {
            Target::TypeScript => "TypeScript",
            Target::AssemblyScript => "AssemblyScript",
        }
    }

    /// Accepts both the short and the long id.
    pub fn from_id(id: &str) -> Option<Target> {
        Target::ALL
            .iter()
            .copied()
            .find(|target| target.id() == id || target.short_id() == id)
    }

    /// Artifact key of the generated code for a source with the provided
    /// file stem.
    pub fn output_path(self, stem: &str) -> String {
        match self {
            Target::TypeScript => format!("{stem}.ts"),
            Target::AssemblyScript => format!("assembly/{stem}.ts"),
        }
    }

    pub const fn config_file(self) -> &'static str {
        match self {
            Target::TypeScript => "tsconfig.json",
            Target::AssemblyScript => "asconfig.json",
        }
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown target `{0}`, expected one of ts, typescript, as, assemblyscript")]
pub struct UnknownTarget(pub String);

impl FromStr for Target {
    type Err = UnknownTarget;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Target::from_id(&s.to_ascii_lowercase()).ok_or_else(|| UnknownTarget(s.to_owned()))
    }
}

/// Language features a generator may or may not express.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Feature {
    Async,
    Classes,
    Generics,
    Exceptions,
    Closures,
    SourceMaps,
    Declarations,
    RawMemory,
    BigInt,
}

impl Feature {
    pub const ALL: &[Feature] = &[
        Feature::Async,
        Feature::Classes,
        Feature::Generics,
        Feature::Exceptions,
        Feature::Closures,
        Feature::SourceMaps,
        Feature::Declarations,
        Feature::RawMemory,
        Feature::BigInt,
    ];
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationOptions {
    pub source_map: bool,
    /// Emit a `.d.ts` file next to the code.
    pub declarations: bool,
    /// The program relies on `async`/`await`.
    pub async_support: bool,
    /// Give uninitialized non-constant bindings their type's zero value even
    /// where the target does not require it.
    pub initialize_defaults: bool,
    /// Prefer strict comparisons (`===`) where the target distinguishes them.
    pub strict: bool,
    /// Spaces per indentation level.
    pub indent: usize,
    pub module_name: Option<String>,
}

impl Default for GenerationOptions {
    fn default() -> Self {
        GenerationOptions {
            source_map: false,
            declarations: false,
            async_support: false,
            initialize_defaults: false,
            strict: false,
            indent: 2,
            module_name: None,
        }
    }
}

pub struct GenerationContext<'a> {
    pub interner: &'a Interner,
    pub options: &'a GenerationOptions,
    /// Name of the source file, used for output naming and source maps.
    pub filename: &'a str,
    pub source: &'a str,
    pub cancel: &'a CancellationToken,
}

impl GenerationContext<'_> {
    pub fn check_cancelled(&self) -> Result<(), GenerationError> {
        if self.cancel.is_cancelled() {
            Err(GenerationError::Cancelled)
        } else {
            Ok(())
        }
    }

    pub fn stem(&self) -> &str {
        file_stem(self.filename)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationWarning {
    pub message: String,
    pub span: Option<Span>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct GenerationOutput {
    pub code: String,
    pub source_map: Option<String>,
    pub declarations: Option<String>,
    pub warnings: Vec<GenerationWarning>,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GenerationError {
    #[error("generation cancelled")]
    Cancelled,
    #[error("invalid options for {target}: {message}")]
    InvalidOptions { target: Target, message: String },
    #[error("{0}")]
    Failed(String),
}

pub trait Generator: Send + Sync {
    fn target(&self) -> Target;

    fn supports_feature(&self, feature: Feature) -> bool;

    fn validate_options(&self, options: &GenerationOptions) -> Result<(), GenerationError>;

    fn generate(
        &self,
        program: &Program,
        ctx: &GenerationContext<'_>,
    ) -> Result<GenerationOutput, GenerationError>;
}

pub fn generator_for(target: Target) -> Box<dyn Generator> {
    match target {
        Target::TypeScript => Box::new(typescript::TypeScriptGenerator),
        Target::AssemblyScript => Box::new(assemblyscript::AssemblyScriptGenerator),
    }
}

/// Option checks shared by every target.
fn validate_common(target: Target, options: &GenerationOptions) -> Result<(), GenerationError> {
    if !(1..=8).contains(&options.indent) {
        return Err(GenerationError::InvalidOptions {
            target,
            message: format!("indent must be between 1 and 8 spaces, got {}", options.indent),
        });
    }
    if let Some(name) = &options.module_name {
        if name.trim().is_empty() {
            return Err(GenerationError::InvalidOptions {
                target,
                message: "module name must not be empty".into(),
            });
        }
    }
    Ok(())
}

/// Returns the file name without directories and extension, `main` when
/// there is none.
pub fn file_stem(filename: &str) -> &str {
    Path::new(filename)
        .file_stem()
        .and_then(|stem| stem.to_str())
        .filter(|stem| !stem.is_empty())
        .unwrap_or("main")
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn target_ids() {
        assert_eq!(Target::from_id("ts"), Some(Target::TypeScript));
        assert_eq!(Target::from_id("assemblyscript"), Some(Target::AssemblyScript));
        assert_eq!("AS".parse::<Target>(), Ok(Target::AssemblyScript));
        assert_eq!(
            "wasm".parse::<Target>().unwrap_err().to_string(),
            "unknown target `wasm`, expected one of ts, typescript, as, assemblyscript"
        );
        assert_eq!(Target::AssemblyScript.output_path("main"), "assembly/main.ts");
    }

    #[test]
    fn stems() {
        assert_eq!(file_stem("src/game.wc"), "game");
        assert_eq!(file_stem("game"), "game");
        assert_eq!(file_stem(""), "main");
    }

    #[test]
    fn feature_matrix() {
        let ts = generator_for(Target::TypeScript);
        let as_ = generator_for(Target::AssemblyScript);
        assert!(ts.supports_feature(Feature::Async));
        assert!(!ts.supports_feature(Feature::RawMemory));
        assert!(as_.supports_feature(Feature::RawMemory));
        assert!(!as_.supports_feature(Feature::Exceptions));
        for &feature in Feature::ALL {
            assert!(ts.supports_feature(feature) || as_.supports_feature(feature));
        }
    }

    #[test]
    fn option_validation() {
        let options = GenerationOptions {
            indent: 0,
            ..GenerationOptions::default()
        };
        let error = generator_for(Target::TypeScript).validate_options(&options).unwrap_err();
        assert_eq!(
            error.to_string(),
            "invalid options for typescript: indent must be between 1 and 8 spaces, got 0"
        );

        let options = GenerationOptions {
            async_support: true,
            ..GenerationOptions::default()
        };
        assert!(generator_for(Target::TypeScript).validate_options(&options).is_ok());
        assert!(generator_for(Target::AssemblyScript).validate_options(&options).is_err());
    }
}
