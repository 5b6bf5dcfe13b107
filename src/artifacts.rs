//! Project files packaged next to the generated code.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::codegen::Target;

pub const MANIFEST_FILE: &str = "worldc.manifest.json";
pub const README_FILE: &str = "README.md";
pub const PACKAGE_FILE: &str = "package.json";

/// User-provided package information. Missing fields fall back to values
/// derived from the source file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metadata {
    pub name: Option<String>,
    pub version: Option<String>,
    pub description: Option<String>,
    pub author: Option<String>,
}

pub struct ArtifactInput<'a> {
    pub filename: &'a str,
    pub stem: &'a str,
    pub metadata: &'a Metadata,
    pub generation: &'a crate::codegen::GenerationOptions,
    /// Targets that produced code, with the artifact keys of their files.
    pub outputs: &'a BTreeMap<Target, Vec<String>>,
}

impl ArtifactInput<'_> {
    fn package_name(&self) -> String {
        let name = self.metadata.name.as_deref().unwrap_or(self.stem);
        let name: String = name
            .chars()
            .map(|ch| match ch {
                'a'..='z' | '0'..='9' | '-' | '_' | '.' => ch,
                'A'..='Z' => ch.to_ascii_lowercase(),
                _ => '-',
            })
            .collect();
        let name = name.trim_matches(['-', '.', '_']);
        if name.is_empty() {
            "worldc-output".to_owned()
        } else {
            name.to_owned()
        }
    }

    fn version(&self) -> &str {
        self.metadata.version.as_deref().unwrap_or("0.1.0")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Manifest {
    pub compiler: String,
    pub compiler_version: String,
    pub source: String,
    pub name: String,
    pub version: String,
    pub targets: Vec<ManifestTarget>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestTarget {
    pub target: Target,
    pub files: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Package {
    name: String,
    version: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    author: Option<String>,
    private: bool,
    scripts: BTreeMap<String, String>,
    dev_dependencies: BTreeMap<String, String>,
}

/// Builds the manifest, README, `package.json` and the build config of
/// every target in `input.outputs`, keyed by file name.
pub fn synthesize(input: &ArtifactInput<'_>) -> serde_json::Result<BTreeMap<String, String>> {
    let mut artifacts = BTreeMap::new();
    artifacts.insert(MANIFEST_FILE.to_owned(), manifest(input)?);
    artifacts.insert(README_FILE.to_owned(), readme(input));
    artifacts.insert(PACKAGE_FILE.to_owned(), package(input)?);
    for &target in input.outputs.keys() {
        let config = match target {
            Target::TypeScript => tsconfig(input),
            Target::AssemblyScript => asconfig(input),
        };
        artifacts.insert(target.config_file().to_owned(), pretty(&config)?);
    }
    Ok(artifacts)
}

fn pretty<T: Serialize>(value: &T) -> serde_json::Result<String> {
    let mut out = serde_json::to_string_pretty(value)?;
    out.push('\n');
    Ok(out)
}

fn manifest(input: &ArtifactInput<'_>) -> serde_json::Result<String> {
    let manifest = Manifest {
        compiler: "worldc".to_owned(),
        compiler_version: env!("CARGO_PKG_VERSION").to_owned(),
        source: input.filename.to_owned(),
        name: input.package_name(),
        version: input.version().to_owned(),
        targets: input
            .outputs
            .iter()
            .map(|(&target, files)| ManifestTarget {
                target,
                files: files.clone(),
            })
            .collect(),
    };
    pretty(&manifest)
}

fn package(input: &ArtifactInput<'_>) -> serde_json::Result<String> {
    let mut scripts = BTreeMap::new();
    let mut dev_dependencies = BTreeMap::new();
    let stem = input.stem;
    for target in input.outputs.keys() {
        match target {
            Target::TypeScript => {
                scripts.insert("build:ts".to_owned(), "tsc -p tsconfig.json".to_owned());
                dev_dependencies.insert("typescript".to_owned(), "^5.4.0".to_owned());
            }
            Target::AssemblyScript => {
                scripts.insert(
                    "build:as".to_owned(),
                    format!("asc assembly/{stem}.ts --config asconfig.json --target release"),
                );
                dev_dependencies.insert("assemblyscript".to_owned(), "^0.27.0".to_owned());
            }
        }
    }
    let package = Package {
        name: input.package_name(),
        version: input.version().to_owned(),
        description: input.metadata.description.clone(),
        author: input.metadata.author.clone(),
        private: true,
        scripts,
        dev_dependencies,
    };
    pretty(&package)
}

fn tsconfig(input: &ArtifactInput<'_>) -> serde_json::Value {
    json!({
        "compilerOptions": {
            "target": "ES2020",
            "module": "ESNext",
            "strict": true,
            "declaration": input.generation.declarations,
            "sourceMap": input.generation.source_map,
            "outDir": "dist",
        },
        "files": [Target::TypeScript.output_path(input.stem)],
    })
}

fn asconfig(input: &ArtifactInput<'_>) -> serde_json::Value {
    json!({
        "entries": [Target::AssemblyScript.output_path(input.stem)],
        "targets": {
            "debug": {
                "outFile": "build/debug.wasm",
                "textFile": "build/debug.wat",
                "sourceMap": true,
                "debug": true,
            },
            "release": {
                "outFile": "build/release.wasm",
                "textFile": "build/release.wat",
                "sourceMap": input.generation.source_map,
                "optimizeLevel": 3,
                "shrinkLevel": 0,
            },
        },
        "options": {
            "bindings": "esm",
        },
    })
}

fn readme(input: &ArtifactInput<'_>) -> String {
    let mut out = format!("# {}\n\n", input.package_name());
    if let Some(description) = &input.metadata.description {
        out.push_str(description);
        out.push_str("\n\n");
    }
    out.push_str(&format!(
        "Generated by worldc {} from `{}`.\n\n## Targets\n\n",
        env!("CARGO_PKG_VERSION"),
        input.filename,
    ));
    for (target, files) in input.outputs {
        out.push_str(&format!("- {}: ", target.display_name()));
        let files: Vec<String> = files.iter().map(|file| format!("`{file}`")).collect();
        out.push_str(&files.join(", "));
        out.push('\n');
    }
    out.push_str("\n## Building\n\n```sh\nnpm install\n");
    for target in input.outputs.keys() {
        match target {
            Target::TypeScript => out.push_str("npm run build:ts\n"),
            Target::AssemblyScript => out.push_str("npm run build:as\n"),
        }
    }
    out.push_str("```\n");
    out
}

#[cfg(test)]
mod tests {
    use indoc::indoc;
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::codegen::GenerationOptions;

    fn outputs(targets: &[Target]) -> BTreeMap<Target, Vec<String>> {
        targets
            .iter()
            .map(|&target| (target, vec![target.output_path("game")]))
            .collect()
    }

    #[test]
    fn one_config_per_target() {
        let metadata = Metadata::default();
        let generation = GenerationOptions::default();
        let outputs = outputs(&[Target::AssemblyScript]);
        let input = ArtifactInput {
            filename: "src/game.wc",
            stem: "game",
            metadata: &metadata,
            generation: &generation,
            outputs: &outputs,
        };
        let artifacts = synthesize(&input).unwrap();
        let keys: Vec<&str> = artifacts.keys().map(String::as_str).collect();
        assert_eq!(
            keys,
            ["README.md", "asconfig.json", "package.json", "worldc.manifest.json"]
        );

        let asconfig: serde_json::Value = serde_json::from_str(&artifacts["asconfig.json"]).unwrap();
        assert_eq!(asconfig["entries"][0], "assembly/game.ts");
    }

    #[test]
    fn package_json() {
        let metadata = Metadata {
            name: Some("My Game!".into()),
            description: Some("A tiny world".into()),
            ..Metadata::default()
        };
        let generation = GenerationOptions::default();
        let outputs = outputs(&[Target::TypeScript]);
        let input = ArtifactInput {
            filename: "game.wc",
            stem: "game",
            metadata: &metadata,
            generation: &generation,
            outputs: &outputs,
        };
        assert_eq!(
            package(&input).unwrap(),
            indoc! {r#"
                {
                  "name": "my-game",
                  "version": "0.1.0",
                  "description": "A tiny world",
                  "private": true,
                  "scripts": {
                    "build:ts": "tsc -p tsconfig.json"
                  },
                  "devDependencies": {
                    "typescript": "^5.4.0"
                  }
                }
            "#}
        );
    }

    #[test]
    fn manifest_lists_files() {
        let metadata = Metadata::default();
        let generation = GenerationOptions::default();
        let outputs = outputs(&[Target::TypeScript, Target::AssemblyScript]);
        let input = ArtifactInput {
            filename: "game.wc",
            stem: "game",
            metadata: &metadata,
            generation: &generation,
            outputs: &outputs,
        };
        let manifest: Manifest = serde_json::from_str(&manifest(&input).unwrap()).unwrap();
        assert_eq!(manifest.name, "game");
        assert_eq!(manifest.targets.len(), 2);
        assert_eq!(manifest.targets[1].target, Target::AssemblyScript);
        assert_eq!(manifest.targets[1].files, ["assembly/game.ts"]);
        assert!(readme(&input).contains("- TypeScript: `game.ts`\n"));
    }
}
