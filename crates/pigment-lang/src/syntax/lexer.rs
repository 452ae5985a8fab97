use crate::error::{Error, ErrorCode};
use crate::syntax::token::{Token, TokenKind, keyword_or_ident};

pub struct Lexer<'a> {
    source: &'a [u8],
    pos: usize,
    line: usize,
    column: usize,
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a str) -> Self {
        Self { source: source.as_bytes(), pos: 0, line: 1, column: 1 }
    }

    /// Tokenize the whole input. Lexing is fatal: the first unmatched
    /// character aborts with a line/column-located error.
    pub fn tokenize(mut self) -> Result<Vec<Token>, Error> {
        let mut tokens = Vec::new();

        loop {
            self.skip_whitespace();

            if self.is_at_end() {
                tokens.push(Token::new(TokenKind::Eof, self.line, self.column));
                return Ok(tokens);
            }

            if let Some(tok) = self.next_token()? {
                tokens.push(tok);
            }
        }
    }

    fn next_token(&mut self) -> Result<Option<Token>, Error> {
        let line = self.line;
        let col = self.column;
        let ch = self.advance();

        let kind = match ch {
            b'+' => TokenKind::Plus,
            b'*' => TokenKind::Star,
            b'%' => TokenKind::Percent,
            b'?' => TokenKind::Question,
            b',' => TokenKind::Comma,
            b';' => TokenKind::Semicolon,
            b'(' => TokenKind::LParen,
            b')' => TokenKind::RParen,
            b'{' => TokenKind::LBrace,
            b'}' => TokenKind::RBrace,
            b'[' => TokenKind::LBracket,
            b']' => TokenKind::RBracket,
            b'@' => TokenKind::At,
            b'|' => TokenKind::Pipe,

            // `$` is the pipeline identifier — an ordinary name to the parser.
            b'$' => TokenKind::Ident("$".into()),

            b'-' => {
                if self.peek() == b'>' { self.advance(); TokenKind::Arrow }
                else { TokenKind::Minus }
            }
            b'/' => {
                if self.peek() == b'/' { self.skip_line(); return Ok(None); }
                else { TokenKind::Slash }
            }
            b':' => {
                if self.peek() == b'=' { self.advance(); TokenKind::Declare }
                else if self.peek() == b':' { self.advance(); TokenKind::ColonColon }
                else { TokenKind::Colon }
            }
            b'.' => {
                if self.peek() == b'.' { self.advance(); TokenKind::DotDot }
                else { TokenKind::Dot }
            }
            b'=' => {
                if self.peek() == b'=' { self.advance(); TokenKind::EqEq }
                else { TokenKind::Eq }
            }
            b'!' => {
                if self.peek() == b'=' { self.advance(); TokenKind::BangEq }
                else {
                    return Err(Error::new(ErrorCode::L001, line, col,
                        "expected `!=`, bare `!` is not valid (use `not`)"));
                }
            }
            b'<' => {
                if self.peek() == b'=' { self.advance(); TokenKind::LtEq }
                else { TokenKind::Lt }
            }
            b'>' => {
                if self.peek() == b'=' { self.advance(); TokenKind::GtEq }
                else { TokenKind::Gt }
            }

            b'#' => TokenKind::ColorLit(self.read_color(line, col)?),
            b'"' => TokenKind::StringLit(self.read_string(line, col)?),
            b'0'..=b'9' => TokenKind::Number(self.read_number(ch)),
            b'a'..=b'z' | b'A'..=b'Z' | b'_' => keyword_or_ident(self.read_ident(ch)),

            other => {
                return Err(Error::new(ErrorCode::L001, line, col,
                    format!("unexpected character `{}`", other as char)));
            }
        };

        Ok(Some(Token::new(kind, line, col)))
    }

    // ─── Primitives ──────────────────────────────────────────────────────────

    fn advance(&mut self) -> u8 {
        let ch = self.source[self.pos];
        self.pos += 1;
        if ch == b'\n' { self.line += 1; self.column = 1; }
        else { self.column += 1; }
        ch
    }

    fn peek(&self) -> u8 {
        if self.is_at_end() { 0 } else { self.source[self.pos] }
    }

    fn peek_next(&self) -> u8 {
        if self.pos + 1 >= self.source.len() { 0 } else { self.source[self.pos + 1] }
    }

    fn is_at_end(&self) -> bool {
        self.pos >= self.source.len()
    }

    fn skip_whitespace(&mut self) {
        while !self.is_at_end() {
            match self.peek() {
                b' ' | b'\t' | b'\r' | b'\n' => { self.advance(); }
                _ => break,
            }
        }
    }

    fn skip_line(&mut self) {
        while !self.is_at_end() && self.peek() != b'\n' { self.advance(); }
    }

    // ─── Readers ─────────────────────────────────────────────────────────────

    /// `#RRGGBB` with optional `:AA`. The `#` has already been consumed.
    fn read_color(&mut self, line: usize, col: usize) -> Result<String, Error> {
        if self.pos + 6 > self.source.len()
            || !self.source[self.pos..self.pos + 6].iter().all(|b| b.is_ascii_hexdigit())
        {
            return Err(Error::new(ErrorCode::L004, line, col,
                "color literal needs six hex digits: #RRGGBB"));
        }
        let mut s = String::with_capacity(8);
        for _ in 0..6 { s.push(self.advance() as char); }
        // optional `:AA` alpha channel
        if self.peek() == b':'
            && self.pos + 3 <= self.source.len()
            && self.source[self.pos + 1..self.pos + 3].iter().all(|b| b.is_ascii_hexdigit())
        {
            self.advance(); // :
            s.push(self.advance() as char);
            s.push(self.advance() as char);
        }
        Ok(s)
    }

    fn read_string(&mut self, start_line: usize, start_col: usize) -> Result<String, Error> {
        // collected as raw bytes so multi-byte UTF-8 sequences pass
        // through intact, decoded once at the closing quote
        let mut buf = Vec::new();
        loop {
            if self.is_at_end() || self.peek() == b'\n' {
                return Err(Error::new(ErrorCode::L002, start_line, start_col,
                    "unterminated string literal"));
            }
            let ch = self.advance();
            if ch == b'"' { break; }
            if ch == b'\\' {
                if self.is_at_end() {
                    return Err(Error::new(ErrorCode::L002, start_line, start_col,
                        "unterminated string literal"));
                }
                let esc_line = self.line;
                let esc_col  = self.column;
                match self.advance() {
                    b'n'  => buf.push(b'\n'),
                    b't'  => buf.push(b'\t'),
                    b'"'  => buf.push(b'"'),
                    b'\\' => buf.push(b'\\'),
                    other => {
                        return Err(Error::new(ErrorCode::L003, esc_line, esc_col,
                            format!("unknown escape sequence `\\{}`", other as char)));
                    }
                }
            } else {
                buf.push(ch);
            }
        }
        String::from_utf8(buf).map_err(|_| Error::new(ErrorCode::L002, start_line, start_col,
            "malformed UTF-8 in string literal"))
    }

    fn read_number(&mut self, first: u8) -> f64 {
        let mut s = String::new();
        s.push(first as char);
        while !self.is_at_end() && self.peek().is_ascii_digit() {
            s.push(self.advance() as char);
        }
        // consume the decimal point only if followed by a digit — `1..5`
        // must lex as Number DotDot Number, not a malformed float
        if !self.is_at_end() && self.peek() == b'.' && self.peek_next().is_ascii_digit() {
            s.push(self.advance() as char);
            while !self.is_at_end() && self.peek().is_ascii_digit() {
                s.push(self.advance() as char);
            }
        }
        s.parse().unwrap_or(0.0)
    }

    fn read_ident(&mut self, first: u8) -> String {
        let mut s = String::new();
        s.push(first as char);
        while !self.is_at_end() && (self.peek().is_ascii_alphanumeric() || self.peek() == b'_') {
            s.push(self.advance() as char);
        }
        s
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn lex(src: &str) -> Vec<TokenKind> {
        Lexer::new(src).tokenize().unwrap().into_iter().map(|t| t.kind).collect()
    }

    fn lex_err(src: &str) -> Error {
        Lexer::new(src).tokenize().unwrap_err()
    }

    #[test]
    fn empty() {
        assert_eq!(lex(""), vec![TokenKind::Eof]);
    }

    #[test]
    fn integer_becomes_number() {
        assert_eq!(lex("42"), vec![TokenKind::Number(42.0), TokenKind::Eof]);
    }

    #[test]
    fn fractional_number() {
        assert_eq!(lex("3.14"), vec![TokenKind::Number(3.14), TokenKind::Eof]);
    }

    #[test]
    fn range_not_consumed_by_number() {
        assert_eq!(
            lex("1..5"),
            vec![TokenKind::Number(1.0), TokenKind::DotDot, TokenKind::Number(5.0), TokenKind::Eof]
        );
    }

    #[test]
    fn dot_not_consumed_by_number() {
        assert_eq!(
            lex("p.x"),
            vec![TokenKind::Ident("p".into()), TokenKind::Dot, TokenKind::Ident("x".into()), TokenKind::Eof]
        );
    }

    #[test]
    fn keywords() {
        assert_eq!(lex("if"),     vec![TokenKind::If,     TokenKind::Eof]);
        assert_eq!(lex("for"),    vec![TokenKind::For,    TokenKind::Eof]);
        assert_eq!(lex("in"),     vec![TokenKind::In,     TokenKind::Eof]);
        assert_eq!(lex("fn"),     vec![TokenKind::Fn,     TokenKind::Eof]);
        assert_eq!(lex("log"),    vec![TokenKind::Log,    TokenKind::Eof]);
        assert_eq!(lex("yield"),  vec![TokenKind::Yield,  TokenKind::Eof]);
        assert_eq!(lex("nil"),    vec![TokenKind::Nil,    TokenKind::Eof]);
    }

    #[test]
    fn two_char_operators() {
        assert_eq!(lex(":="), vec![TokenKind::Declare,    TokenKind::Eof]);
        assert_eq!(lex("::"), vec![TokenKind::ColonColon, TokenKind::Eof]);
        assert_eq!(lex(".."), vec![TokenKind::DotDot,     TokenKind::Eof]);
        assert_eq!(lex("=="), vec![TokenKind::EqEq,       TokenKind::Eof]);
        assert_eq!(lex("!="), vec![TokenKind::BangEq,     TokenKind::Eof]);
        assert_eq!(lex("<="), vec![TokenKind::LtEq,       TokenKind::Eof]);
        assert_eq!(lex(">="), vec![TokenKind::GtEq,       TokenKind::Eof]);
        assert_eq!(lex("->"), vec![TokenKind::Arrow,      TokenKind::Eof]);
    }

    #[test]
    fn declare_before_colon() {
        assert_eq!(
            lex("x := 1"),
            vec![TokenKind::Ident("x".into()), TokenKind::Declare, TokenKind::Number(1.0), TokenKind::Eof]
        );
    }

    #[test]
    fn pipeline_tokens() {
        assert_eq!(
            lex("1 | $ + 1"),
            vec![
                TokenKind::Number(1.0), TokenKind::Pipe,
                TokenKind::Ident("$".into()), TokenKind::Plus, TokenKind::Number(1.0),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn line_comment_skipped() {
        assert_eq!(lex("// comment\n42"), vec![TokenKind::Number(42.0), TokenKind::Eof]);
    }

    #[test]
    fn color_six_digits() {
        assert_eq!(lex("#ff0000"), vec![TokenKind::ColorLit("ff0000".into()), TokenKind::Eof]);
    }

    #[test]
    fn color_with_alpha() {
        assert_eq!(lex("#ff0000:80"), vec![TokenKind::ColorLit("ff000080".into()), TokenKind::Eof]);
    }

    #[test]
    fn color_too_short_is_error() {
        assert_eq!(lex_err("#ff00").code, ErrorCode::L004);
    }

    #[test]
    fn string_literal() {
        assert_eq!(lex(r#""hello""#), vec![TokenKind::StringLit("hello".into()), TokenKind::Eof]);
    }

    #[test]
    fn string_escape() {
        assert_eq!(lex(r#""a\nb""#), vec![TokenKind::StringLit("a\nb".into()), TokenKind::Eof]);
    }

    #[test]
    fn string_with_multibyte_chars() {
        assert_eq!(
            lex(r#""héllo 画素""#),
            vec![TokenKind::StringLit("héllo 画素".into()), TokenKind::Eof]
        );
    }

    #[test]
    fn unterminated_string_error() {
        assert_eq!(lex_err(r#""oops"#).code, ErrorCode::L002);
    }

    #[test]
    fn invalid_escape_error() {
        assert_eq!(lex_err(r#""\q""#).code, ErrorCode::L003);
    }

    #[test]
    fn bare_bang_error() {
        assert_eq!(lex_err("!").code, ErrorCode::L001);
    }

    #[test]
    fn unexpected_character_error() {
        let e = lex_err("^");
        assert_eq!(e.code, ErrorCode::L001);
        assert!(e.message.contains('^'));
    }

    #[test]
    fn line_and_column_tracking() {
        let tokens = Lexer::new("a\nb").tokenize().unwrap();
        assert_eq!((tokens[0].line, tokens[0].column), (1, 1));
        assert_eq!((tokens[1].line, tokens[1].column), (2, 1));
    }

    #[test]
    fn kernel_literal_tokens() {
        assert_eq!(
            lex("|0 1 0 1|"),
            vec![
                TokenKind::Pipe,
                TokenKind::Number(0.0), TokenKind::Number(1.0),
                TokenKind::Number(0.0), TokenKind::Number(1.0),
                TokenKind::Pipe,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn point_tuple_tokens() {
        assert_eq!(
            lex("100;50"),
            vec![TokenKind::Number(100.0), TokenKind::Semicolon, TokenKind::Number(50.0), TokenKind::Eof]
        );
    }
}
