#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    // Literals
    Number(f64),
    Bool(bool),
    Ident(String),
    StringLit(String),
    ColorLit(String), // hex digits only — "ff0000" or "ff0000ee"
    Nil,

    // Keywords
    If,
    Else,
    For,
    In,
    While,
    Fn,
    Log,
    Return,
    Yield,
    And,
    Or,
    Not,

    // Operators
    Plus,       // +
    Minus,      // -
    Star,       // *
    Slash,      // /
    Percent,    // %
    Declare,    // :=
    Eq,         // =
    EqEq,       // ==
    BangEq,     // !=
    Lt,         // <
    LtEq,       // <=
    Gt,         // >
    GtEq,       // >=
    ColonColon, // ::
    DotDot,     // ..
    Arrow,      // ->
    At,         // @
    Pipe,       // |
    Question,   // ?

    // Punctuation
    Colon,      // :
    Comma,      // ,
    Semicolon,  // ;
    Dot,        // .
    LParen,     // (
    RParen,     // )
    LBrace,     // {
    RBrace,     // }
    LBracket,   // [
    RBracket,   // ]

    Eof,
}

impl TokenKind {
    /// User-facing spelling, used in parse-error messages.
    pub fn lexeme(&self) -> String {
        match self {
            Self::Number(n)    => format!("{n}"),
            Self::Bool(b)      => format!("{b}"),
            Self::Ident(s)     => s.clone(),
            Self::StringLit(s) => format!("\"{s}\""),
            Self::ColorLit(s)  => format!("#{s}"),
            Self::Nil          => "nil".into(),
            Self::If           => "if".into(),
            Self::Else         => "else".into(),
            Self::For          => "for".into(),
            Self::In           => "in".into(),
            Self::While        => "while".into(),
            Self::Fn           => "fn".into(),
            Self::Log          => "log".into(),
            Self::Return       => "return".into(),
            Self::Yield        => "yield".into(),
            Self::And          => "and".into(),
            Self::Or           => "or".into(),
            Self::Not          => "not".into(),
            Self::Plus         => "+".into(),
            Self::Minus        => "-".into(),
            Self::Star         => "*".into(),
            Self::Slash        => "/".into(),
            Self::Percent      => "%".into(),
            Self::Declare      => ":=".into(),
            Self::Eq           => "=".into(),
            Self::EqEq         => "==".into(),
            Self::BangEq       => "!=".into(),
            Self::Lt           => "<".into(),
            Self::LtEq         => "<=".into(),
            Self::Gt           => ">".into(),
            Self::GtEq         => ">=".into(),
            Self::ColonColon   => "::".into(),
            Self::DotDot       => "..".into(),
            Self::Arrow        => "->".into(),
            Self::At           => "@".into(),
            Self::Pipe         => "|".into(),
            Self::Question     => "?".into(),
            Self::Colon        => ":".into(),
            Self::Comma        => ",".into(),
            Self::Semicolon    => ";".into(),
            Self::Dot          => ".".into(),
            Self::LParen       => "(".into(),
            Self::RParen       => ")".into(),
            Self::LBrace       => "{".into(),
            Self::RBrace       => "}".into(),
            Self::LBracket     => "[".into(),
            Self::RBracket     => "]".into(),
            Self::Eof          => "end of input".into(),
        }
    }
}

/// Maps an identifier string to its keyword token, or returns `Ident`.
pub fn keyword_or_ident(s: String) -> TokenKind {
    match s.as_str() {
        "if"     => TokenKind::If,
        "else"   => TokenKind::Else,
        "for"    => TokenKind::For,
        "in"     => TokenKind::In,
        "while"  => TokenKind::While,
        "fn"     => TokenKind::Fn,
        "log"    => TokenKind::Log,
        "return" => TokenKind::Return,
        "yield"  => TokenKind::Yield,
        "and"    => TokenKind::And,
        "or"     => TokenKind::Or,
        "not"    => TokenKind::Not,
        "true"   => TokenKind::Bool(true),
        "false"  => TokenKind::Bool(false),
        "nil"    => TokenKind::Nil,
        _        => TokenKind::Ident(s),
    }
}

/// Identifiers starting with an uppercase letter name constants.
/// The parser rejects them as plain assignment targets.
pub fn is_constant_name(name: &str) -> bool {
    name.chars().next().is_some_and(|c| c.is_ascii_uppercase())
}

// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct Token {
    pub kind: TokenKind,
    pub line: usize,
    pub column: usize,
}

impl Token {
    pub fn new(kind: TokenKind, line: usize, column: usize) -> Self {
        Self { kind, line, column }
    }
}
