pub mod builtins;
pub mod error;
pub mod runtime;
pub mod surface;
pub mod syntax;
pub mod types;

pub use error::{Error, ErrorCode, RuntimeError};
pub use runtime::value::Value;
pub use surface::{Channel, Raster, Surface};
pub use syntax::ast::Program;
pub use syntax::token::{Token, TokenKind};
pub use types::color::Color;
pub use types::geom::{Circle, Line, Point, Rect};
pub use types::kernel::Kernel;

// ─── Public API ───────────────────────────────────────────────────────────────

/// Parse source text into a program ready for execution. The first
/// lex or parse error aborts compilation.
pub fn compile(source: &str) -> Result<Program, Error> {
    let tokens = syntax::lexer::Lexer::new(source).tokenize()?;
    syntax::parser::Parser::new(tokens).parse()
}

/// Run a compiled program against a surface. Returns the lines the
/// script logged.
pub fn execute(program: &Program, surface: &mut dyn Surface) -> Result<Vec<String>, RuntimeError> {
    runtime::interpreter::run(program, surface)
}
