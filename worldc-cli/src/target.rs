#[derive(Copy, Clone, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum Target {
    #[value(name = "ts", alias = "typescript")]
    TypeScript,
    #[value(name = "as", alias = "assemblyscript")]
    AssemblyScript,
}

impl std::fmt::Display for Target {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        worldc::codegen::Target::from(*self).fmt(f)
    }
}

impl From<Target> for worldc::codegen::Target {
    fn from(value: Target) -> Self {
        match value {
            Target::TypeScript => worldc::codegen::Target::TypeScript,
            Target::AssemblyScript => worldc::codegen::Target::AssemblyScript,
        }
    }
}
