use thiserror::Error;

/// Error codes prefixed by phase: L = lexer, P = parser.
/// Runtime failures carry no code — see [`RuntimeError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    // Lexer
    L001, // unexpected character
    L002, // unterminated string literal
    L003, // invalid escape sequence
    L004, // malformed color literal

    // Parser
    P001, // unexpected token
    P002, // missing expected token
    P003, // assignment to a constant
    P004, // malformed kernel literal
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::L001 => "L001",
            Self::L002 => "L002",
            Self::L003 => "L003",
            Self::L004 => "L004",
            Self::P001 => "P001",
            Self::P002 => "P002",
            Self::P003 => "P003",
            Self::P004 => "P004",
        }
    }
}

/// A compile-time failure. Lexing and parsing are fatal on the first
/// error, so `compile` surfaces exactly one of these.
#[derive(Debug, Clone, Error)]
#[error("[{}] {line}:{column} — {message}", code.as_str())]
pub struct Error {
    pub code: ErrorCode,
    pub line: usize,
    pub column: usize,
    pub message: String,
}

impl Error {
    pub fn new(code: ErrorCode, line: usize, column: usize, message: impl Into<String>) -> Self {
        Self { code, line, column, message: message.into() }
    }
}

// ─────────────────────────────────────────────────────────────────────────────

/// A failure during script execution. The message is written for the
/// script author: it names identifiers, lexemes and value types rather
/// than implementation details.
#[derive(Debug, Clone, Error)]
#[error("[runtime] line {line} — {message}")]
pub struct RuntimeError {
    pub line: usize,
    pub message: String,
}

impl RuntimeError {
    pub fn new(line: usize, message: impl Into<String>) -> Self {
        Self { line, message: message.into() }
    }
}
