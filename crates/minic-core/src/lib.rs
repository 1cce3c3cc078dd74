//! A single-pass compiler from a tiny C-like expression/statement language
//! to GNU-assembler x86-64 text (Intel syntax).
//!
//! # Pipeline
//!
//! 1. **Lexer** — source text to a token stream (`logos`-generated).
//! 2. **Parser** — tokens to an AST, resolving local variables into a
//!    [`symtab::SymbolTable`] and reporting the stack frame size as it goes.
//! 3. **Code generator** — AST plus frame size to assembly text.
//!
//! # Example
//!
//! ```
//! let asm = minic_core::compile("a=3; b=4; a+b;").expect("failed to compile");
//! assert!(asm.starts_with(".intel_syntax noprefix"));
//! ```

pub mod ast;
pub mod codegen;
pub mod error;
pub mod lexer;
pub mod parser;
pub mod symtab;

pub use ast::{BinOp, Node};
pub use error::{CompileError, Result};
pub use lexer::{tokenize, Token};
pub use parser::Parser;
pub use symtab::SymbolTable;

/// Compile `source` end to end, returning the generated assembly text.
///
/// This is the only entry point most callers need; the individual stage
/// functions (`tokenize`, `Parser::parse`, `codegen::generate`) are exposed
/// for embedders that want to inspect intermediate results.
pub fn compile(source: &str) -> Result<String> {
    tracing::debug!(bytes = source.len(), "lexing source");
    let tokens = tokenize(source)?;
    tracing::debug!(tokens = tokens.len(), "lexed");

    let (statements, frame_size) = Parser::parse(tokens)?;
    tracing::debug!(
        statements = statements.len(),
        frame_size,
        "parsed"
    );

    let asm = codegen::generate(&statements, frame_size)?;
    tracing::debug!(bytes = asm.len(), "generated assembly");

    Ok(asm)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compiles_end_to_end() {
        let asm = compile("5+20-4;").unwrap();
        assert!(asm.starts_with(".intel_syntax noprefix"));
        assert!(asm.ends_with("    ret\n"));
    }

    #[test]
    fn lex_error_propagates_through_compile() {
        let err = compile("a & b;").unwrap_err();
        assert!(matches!(err, CompileError::Lex(_)));
    }

    #[test]
    fn parse_error_propagates_through_compile() {
        let err = compile("1+2").unwrap_err();
        assert!(matches!(err, CompileError::Parse(_)));
    }

    #[test]
    fn empty_source_still_produces_a_well_formed_program() {
        let asm = compile("").unwrap();
        assert!(asm.contains("sub rsp, 0"));
    }
}
