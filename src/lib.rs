/// The lexer takes the source input, mapping it into a sequence of tokens.
pub mod lexer;

/// The parser takes a sequence of tokens, mapping it into an AST.
pub mod parser;

/// The analyzer walks the AST, building the symbol table and reporting
/// undefined and duplicate names.
pub mod analyzer;

/// The code generators map a checked AST into TypeScript or AssemblyScript.
pub mod codegen;

/// The pipeline runs every stage in order for each requested target.
pub mod pipeline;

pub mod artifacts;
pub mod ast;
pub mod cancel;
pub mod compiler;
pub mod diagnostic;
pub mod fs;
pub mod symbols;
pub mod token;

pub mod util {
    pub mod fmt;
    pub mod intern;
    #[cfg(test)]
    pub(crate) mod test_utils;
}
