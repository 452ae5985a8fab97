use crate::error::{Error, ErrorCode};
use crate::syntax::ast::*;
use crate::syntax::token::{Token, TokenKind, is_constant_name};

pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    pub fn new(tokens: Vec<Token>) -> Self {
        Self { tokens, pos: 0 }
    }

    /// Parse a whole script. Parsing is fatal: the first error aborts,
    /// there is no recovery.
    pub fn parse(mut self) -> Result<Program, Error> {
        let mut stmts = Vec::new();
        while !self.is_at_end() {
            stmts.push(self.parse_stmt()?);
        }
        Ok(Program { stmts })
    }

    // ─── Statements ──────────────────────────────────────────────────────────

    fn parse_block(&mut self) -> Result<Vec<Stmt>, Error> {
        self.expect(TokenKind::LBrace)?;
        let mut stmts = Vec::new();
        while !self.check(TokenKind::RBrace) && !self.is_at_end() {
            stmts.push(self.parse_stmt()?);
        }
        self.expect(TokenKind::RBrace)?;
        Ok(stmts)
    }

    fn parse_stmt(&mut self) -> Result<Stmt, Error> {
        match self.peek_kind() {
            TokenKind::If     => self.parse_if(),
            TokenKind::While  => self.parse_while(),
            TokenKind::For    => self.parse_for(),
            TokenKind::Log    => self.parse_log(),
            TokenKind::Return => self.parse_return(),
            TokenKind::Yield  => {
                let span = self.span();
                self.advance();
                Ok(Stmt::Yield(span))
            }
            TokenKind::At => self.parse_pixel_assign(),

            // `ident :=` → declaration; everything else falls through to
            // the expression/assignment path
            TokenKind::Ident(_) if self.peek_next_is(TokenKind::Declare) => self.parse_decl(),

            _ => self.parse_assign_or_invoke(),
        }
    }

    fn parse_decl(&mut self) -> Result<Stmt, Error> {
        let span = self.span();
        let name = self.expect_ident()?;
        self.expect(TokenKind::Declare)?;
        let value = self.parse_expr()?;
        Ok(Stmt::Decl { name, value, span })
    }

    /// Parses an expression, then decides what the statement is by what
    /// follows: `=` turns an ident or index chain into an assignment,
    /// anything else must be an invocation (a call, or a pipeline run
    /// for its effects).
    fn parse_assign_or_invoke(&mut self) -> Result<Stmt, Error> {
        let span = self.span();
        let expr = self.parse_expr()?;

        if !self.matches(TokenKind::Eq) {
            return match expr {
                Expr::Call { .. } | Expr::Pipeline { .. } => Ok(Stmt::Invoke(expr)),
                other => Err(Error::new(ErrorCode::P001, span.line, span.column,
                    format!("{} is not a statement", describe(&other)))),
            };
        }

        let value = self.parse_expr()?;
        match expr {
            Expr::Ident(name, _) => {
                if is_constant_name(&name) {
                    return Err(Error::new(ErrorCode::P003, span.line, span.column,
                        format!("cannot assign to constant `{name}`")));
                }
                Ok(Stmt::Assign { name, value, span })
            }
            Expr::Index { expr, index, .. } => Ok(Stmt::IndexAssign {
                object: *expr,
                index: *index,
                value,
                span,
            }),
            other => Err(Error::new(ErrorCode::P001, span.line, span.column,
                format!("cannot assign to {}", describe(&other)))),
        }
    }

    fn parse_pixel_assign(&mut self) -> Result<Stmt, Error> {
        let span = self.span();
        self.expect(TokenKind::At)?;
        let pos = self.parse_postfix()?;
        self.expect(TokenKind::Eq)?;
        let value = self.parse_expr()?;
        Ok(Stmt::PixelAssign { pos, value, span })
    }

    fn parse_if(&mut self) -> Result<Stmt, Error> {
        let span = self.span();
        self.expect(TokenKind::If)?;
        let condition = self.parse_expr()?;
        let then_block = self.parse_block()?;
        let else_block = if self.matches(TokenKind::Else) {
            if self.check(TokenKind::If) {
                // `else if` chains as a single-statement else block
                Some(vec![self.parse_if()?])
            } else {
                Some(self.parse_block()?)
            }
        } else {
            None
        };
        Ok(Stmt::If(IfStmt { condition, then_block, else_block, span }))
    }

    fn parse_while(&mut self) -> Result<Stmt, Error> {
        let span = self.span();
        self.expect(TokenKind::While)?;
        let condition = self.parse_expr()?;
        let body = self.parse_block()?;
        Ok(Stmt::While(WhileStmt { condition, body, span }))
    }

    /// `for v in iterable { }` — when the iterable is `lo..hi` or
    /// `lo..step..hi`, this is a numeric range loop instead.
    fn parse_for(&mut self) -> Result<Stmt, Error> {
        let span = self.span();
        self.expect(TokenKind::For)?;
        let var = self.expect_ident()?;
        self.expect(TokenKind::In)?;
        let first = self.parse_expr()?;

        if self.matches(TokenKind::DotDot) {
            let second = self.parse_expr()?;
            let (step, upper) = if self.matches(TokenKind::DotDot) {
                (Some(second), self.parse_expr()?)
            } else {
                (None, second)
            };
            let body = self.parse_block()?;
            return Ok(Stmt::ForRange(ForRangeStmt { var, lower: first, step, upper, body, span }));
        }

        let body = self.parse_block()?;
        Ok(Stmt::ForIn(ForInStmt { var, iterable: first, body, span }))
    }

    /// `log(a, b)` or bare `log a, b`. A parenthesized first argument
    /// makes the two forms ambiguous (`log (1;1) in poly`), so the call
    /// form only wins when nothing after its closing paren could
    /// continue an expression; otherwise the cursor rewinds and the
    /// arguments reparse as a bare comma list.
    fn parse_log(&mut self) -> Result<Stmt, Error> {
        let span = self.span();
        self.expect(TokenKind::Log)?;

        if self.check(TokenKind::LParen) {
            let mark = self.pos;
            match self.parse_log_call_args() {
                Ok(args) if !self.continues_expr() => return Ok(Stmt::Log { args, span }),
                _ => self.pos = mark,
            }
        }

        let mut args = vec![self.parse_expr()?];
        while self.matches(TokenKind::Comma) {
            args.push(self.parse_expr()?);
        }
        Ok(Stmt::Log { args, span })
    }

    fn parse_log_call_args(&mut self) -> Result<Vec<Expr>, Error> {
        self.expect(TokenKind::LParen)?;
        let mut args = Vec::new();
        while !self.check(TokenKind::RParen) && !self.is_at_end() {
            args.push(self.parse_expr()?);
            if !self.matches(TokenKind::Comma) { break; }
        }
        self.expect(TokenKind::RParen)?;
        Ok(args)
    }

    /// True when the next token would extend the expression to its
    /// left: a postfix, a binary operator, or a list comma.
    fn continues_expr(&self) -> bool {
        matches!(
            self.peek_kind(),
            TokenKind::Dot | TokenKind::LBracket
                | TokenKind::Plus | TokenKind::Minus
                | TokenKind::Star | TokenKind::Slash | TokenKind::Percent
                | TokenKind::In | TokenKind::And | TokenKind::Or
                | TokenKind::EqEq | TokenKind::BangEq
                | TokenKind::Lt | TokenKind::LtEq | TokenKind::Gt | TokenKind::GtEq
                | TokenKind::ColonColon | TokenKind::Semicolon
                | TokenKind::Question | TokenKind::Pipe | TokenKind::Comma
        )
    }

    fn parse_return(&mut self) -> Result<Stmt, Error> {
        let span = self.span();
        self.expect(TokenKind::Return)?;
        let value = if self.check(TokenKind::RBrace) || self.is_at_end() {
            None
        } else {
            Some(self.parse_expr()?)
        };
        Ok(Stmt::Return(value, span))
    }

    // ─── Expressions (precedence climbing) ───────────────────────────────────

    fn parse_expr(&mut self) -> Result<Expr, Error> {
        self.parse_ternary()
    }

    fn parse_ternary(&mut self) -> Result<Expr, Error> {
        let expr = self.parse_pipeline()?;
        if self.matches(TokenKind::Question) {
            let span = expr.span().clone();
            let then_expr = self.parse_ternary()?;
            self.expect(TokenKind::Colon)?;
            let else_expr = self.parse_ternary()?;
            return Ok(Expr::Ternary {
                condition: Box::new(expr),
                then_expr: Box::new(then_expr),
                else_expr: Box::new(else_expr),
                span,
            });
        }
        Ok(expr)
    }

    fn parse_pipeline(&mut self) -> Result<Expr, Error> {
        let mut left = self.parse_or()?;
        while self.check(TokenKind::Pipe) {
            let span = left.span().clone();
            self.advance();
            let right = self.parse_or()?;
            left = Expr::Pipeline { left: Box::new(left), right: Box::new(right), span };
        }
        Ok(left)
    }

    fn parse_or(&mut self) -> Result<Expr, Error> {
        let mut left = self.parse_and()?;
        while self.check(TokenKind::Or) {
            let span = left.span().clone();
            self.advance();
            let right = self.parse_and()?;
            left = Expr::Binary { op: BinOp::Or, left: Box::new(left), right: Box::new(right), span };
        }
        Ok(left)
    }

    fn parse_and(&mut self) -> Result<Expr, Error> {
        let mut left = self.parse_comparison()?;
        while self.check(TokenKind::And) {
            let span = left.span().clone();
            self.advance();
            let right = self.parse_comparison()?;
            left = Expr::Binary { op: BinOp::And, left: Box::new(left), right: Box::new(right), span };
        }
        Ok(left)
    }

    /// Comparisons do not chain: `a < b < c` parses `a < b` and leaves
    /// the rest for the caller to reject.
    fn parse_comparison(&mut self) -> Result<Expr, Error> {
        let left = self.parse_concat()?;
        let op = match self.peek_kind() {
            TokenKind::EqEq   => BinOp::Eq,
            TokenKind::BangEq => BinOp::NotEq,
            TokenKind::Lt     => BinOp::Lt,
            TokenKind::LtEq   => BinOp::LtEq,
            TokenKind::Gt     => BinOp::Gt,
            TokenKind::GtEq   => BinOp::GtEq,
            _ => return Ok(left),
        };
        let span = left.span().clone();
        self.advance();
        let right = self.parse_concat()?;
        Ok(Expr::Binary { op, left: Box::new(left), right: Box::new(right), span })
    }

    fn parse_concat(&mut self) -> Result<Expr, Error> {
        let mut left = self.parse_tuple()?;
        while self.check(TokenKind::ColonColon) {
            let span = left.span().clone();
            self.advance();
            let right = self.parse_tuple()?;
            left = Expr::Binary { op: BinOp::Concat, left: Box::new(left), right: Box::new(right), span };
        }
        Ok(left)
    }

    /// `x;y` — exactly one pair, no chaining.
    fn parse_tuple(&mut self) -> Result<Expr, Error> {
        let x = self.parse_additive()?;
        if self.check(TokenKind::Semicolon) {
            let span = x.span().clone();
            self.advance();
            let y = self.parse_additive()?;
            return Ok(Expr::Tuple { x: Box::new(x), y: Box::new(y), span });
        }
        Ok(x)
    }

    fn parse_additive(&mut self) -> Result<Expr, Error> {
        let left = self.parse_multiplicative()?;
        let op = match self.peek_kind() {
            TokenKind::Plus  => BinOp::Add,
            TokenKind::Minus => BinOp::Sub,
            TokenKind::In    => BinOp::In,
            _ => return Ok(left),
        };
        let span = left.span().clone();
        self.advance();
        let right = self.parse_additive()?;
        Ok(Expr::Binary { op, left: Box::new(left), right: Box::new(right), span })
    }

    fn parse_multiplicative(&mut self) -> Result<Expr, Error> {
        let left = self.parse_unary()?;
        let op = match self.peek_kind() {
            TokenKind::Star    => BinOp::Mul,
            TokenKind::Slash   => BinOp::Div,
            TokenKind::Percent => BinOp::Mod,
            _ => return Ok(left),
        };
        let span = left.span().clone();
        self.advance();
        let right = self.parse_multiplicative()?;
        Ok(Expr::Binary { op, left: Box::new(left), right: Box::new(right), span })
    }

    fn parse_unary(&mut self) -> Result<Expr, Error> {
        let span = self.span();
        if self.matches(TokenKind::Minus) {
            let operand = self.parse_unary()?;
            return Ok(Expr::Unary { op: UnOp::Neg, operand: Box::new(operand), span });
        }
        if self.matches(TokenKind::Not) {
            let operand = self.parse_unary()?;
            return Ok(Expr::Unary { op: UnOp::Not, operand: Box::new(operand), span });
        }
        if self.matches(TokenKind::At) {
            let pos = self.parse_postfix()?;
            return Ok(Expr::PixelRead { pos: Box::new(pos), span });
        }
        self.parse_postfix()
    }

    fn parse_postfix(&mut self) -> Result<Expr, Error> {
        let mut expr = self.parse_primary()?;

        loop {
            match self.peek_kind() {
                // member access: expr.name
                TokenKind::Dot => {
                    let span = expr.span().clone();
                    self.advance();
                    let member = self.expect_ident()?;
                    expr = Expr::Member { expr: Box::new(expr), member, span };
                }

                // index or index range: expr[i], expr[lo..hi]
                TokenKind::LBracket => {
                    let span = expr.span().clone();
                    self.advance();
                    let index = self.parse_expr()?;
                    if self.matches(TokenKind::DotDot) {
                        let upper = self.parse_expr()?;
                        self.expect(TokenKind::RBracket)?;
                        expr = Expr::IndexRange {
                            expr: Box::new(expr),
                            lower: Box::new(index),
                            upper: Box::new(upper),
                            span,
                        };
                    } else {
                        self.expect(TokenKind::RBracket)?;
                        expr = Expr::Index { expr: Box::new(expr), index: Box::new(index), span };
                    }
                }

                _ => break,
            }
        }

        Ok(expr)
    }

    fn parse_primary(&mut self) -> Result<Expr, Error> {
        let tok = self.peek().clone();
        let span = Span::new(tok.line, tok.column);

        match tok.kind {
            TokenKind::Number(v)    => { self.advance(); Ok(Expr::Number(v, span)) }
            TokenKind::Bool(v)      => { self.advance(); Ok(Expr::Bool(v, span)) }
            TokenKind::StringLit(s) => { self.advance(); Ok(Expr::Str(s, span)) }
            TokenKind::ColorLit(s)  => { self.advance(); Ok(Expr::ColorLit(s, span)) }
            TokenKind::Nil          => { self.advance(); Ok(Expr::Nil(span)) }

            TokenKind::LParen => {
                self.advance();
                let expr = self.parse_expr()?;
                self.expect(TokenKind::RParen)?;
                Ok(expr)
            }

            TokenKind::LBracket => self.parse_list_literal(span),
            TokenKind::LBrace   => self.parse_map_literal(span),
            TokenKind::Pipe     => self.parse_kernel_literal(span),
            TokenKind::Fn       => self.parse_fn_literal(span),

            TokenKind::Ident(_) => self.parse_call_or_ident(),

            _ => Err(self.unexpected("expression")),
        }
    }

    fn parse_call_or_ident(&mut self) -> Result<Expr, Error> {
        let tok = self.advance();
        let span = Span::new(tok.line, tok.column);
        let name = match tok.kind {
            TokenKind::Ident(s) => s,
            _ => return Err(self.unexpected("identifier")),
        };

        if self.check(TokenKind::LParen) {
            self.advance();
            let mut args = Vec::new();
            while !self.check(TokenKind::RParen) && !self.is_at_end() {
                args.push(self.parse_expr()?);
                if !self.matches(TokenKind::Comma) { break; }
            }
            self.expect(TokenKind::RParen)?;
            Ok(Expr::Call { callee: name, args, span })
        } else {
            Ok(Expr::Ident(name, span))
        }
    }

    fn parse_list_literal(&mut self, span: Span) -> Result<Expr, Error> {
        self.expect(TokenKind::LBracket)?;
        let mut items = Vec::new();
        while !self.check(TokenKind::RBracket) && !self.is_at_end() {
            items.push(self.parse_expr()?);
            if !self.matches(TokenKind::Comma) { break; }
        }
        self.expect(TokenKind::RBracket)?;
        Ok(Expr::ListLit(items, span))
    }

    /// `{key: value}` — a bare identifier key is sugar for a string key.
    fn parse_map_literal(&mut self, span: Span) -> Result<Expr, Error> {
        self.expect(TokenKind::LBrace)?;
        let mut entries = Vec::new();
        while !self.check(TokenKind::RBrace) && !self.is_at_end() {
            let key = if let TokenKind::Ident(_) = self.peek_kind() {
                if self.peek_next_is(TokenKind::Colon) {
                    let kspan = self.span();
                    let name = self.expect_ident()?;
                    Expr::Str(name, kspan)
                } else {
                    self.parse_expr()?
                }
            } else {
                self.parse_expr()?
            };
            self.expect(TokenKind::Colon)?;
            let value = self.parse_expr()?;
            entries.push((key, value));
            if !self.matches(TokenKind::Comma) { break; }
        }
        self.expect(TokenKind::RBrace)?;
        Ok(Expr::MapLit(entries, span))
    }

    /// `|0 1 0 1|` — weights are literal numbers (optionally negated)
    /// and their count must be a perfect square.
    fn parse_kernel_literal(&mut self, span: Span) -> Result<Expr, Error> {
        self.expect(TokenKind::Pipe)?;
        let mut values = Vec::new();
        while !self.check(TokenKind::Pipe) {
            let negate = self.matches(TokenKind::Minus);
            let tok = self.advance();
            match tok.kind {
                TokenKind::Number(v) => values.push(if negate { -v } else { v }),
                _ => {
                    return Err(Error::new(ErrorCode::P004, tok.line, tok.column,
                        "kernel weights must be literal numbers"));
                }
            }
        }
        self.expect(TokenKind::Pipe)?;

        let n = values.len();
        let side = (n as f64).sqrt() as usize;
        if n == 0 || side * side != n {
            return Err(Error::new(ErrorCode::P004, span.line, span.column,
                format!("kernel needs a square number of weights, got {n}")));
        }
        Ok(Expr::KernelLit(values, span))
    }

    /// `fn(a, b) { ... }` — the `-> expr` form is sugar for a body that
    /// returns the expression.
    fn parse_fn_literal(&mut self, span: Span) -> Result<Expr, Error> {
        self.expect(TokenKind::Fn)?;
        self.expect(TokenKind::LParen)?;
        let mut params = Vec::new();
        while !self.check(TokenKind::RParen) && !self.is_at_end() {
            params.push(self.expect_ident()?);
            if !self.matches(TokenKind::Comma) { break; }
        }
        self.expect(TokenKind::RParen)?;

        let body = if self.matches(TokenKind::Arrow) {
            let value = self.parse_expr()?;
            vec![Stmt::Return(Some(value), span.clone())]
        } else {
            self.parse_block()?
        };
        Ok(Expr::FnLit { params, body, span })
    }

    // ─── Token primitives ────────────────────────────────────────────────────

    fn peek(&self) -> &Token {
        &self.tokens[self.pos]
    }

    fn peek_kind(&self) -> TokenKind {
        self.tokens[self.pos].kind.clone()
    }

    fn peek_next_is(&self, kind: TokenKind) -> bool {
        self.pos + 1 < self.tokens.len() && self.tokens[self.pos + 1].kind == kind
    }

    fn advance(&mut self) -> Token {
        let tok = self.tokens[self.pos].clone();
        if self.pos + 1 < self.tokens.len() { self.pos += 1; }
        tok
    }

    fn check(&self, kind: TokenKind) -> bool {
        self.peek_kind() == kind
    }

    fn matches(&mut self, kind: TokenKind) -> bool {
        if self.check(kind) { self.advance(); true } else { false }
    }

    fn expect(&mut self, kind: TokenKind) -> Result<Token, Error> {
        if self.check(kind.clone()) {
            Ok(self.advance())
        } else {
            let tok = self.peek();
            Err(Error::new(ErrorCode::P002, tok.line, tok.column,
                format!("expected `{}`, found `{}`", kind.lexeme(), tok.kind.lexeme())))
        }
    }

    fn expect_ident(&mut self) -> Result<String, Error> {
        let tok = self.advance();
        match tok.kind {
            TokenKind::Ident(s) => Ok(s),
            other => Err(Error::new(ErrorCode::P001, tok.line, tok.column,
                format!("expected identifier, found `{}`", other.lexeme()))),
        }
    }

    fn is_at_end(&self) -> bool {
        matches!(self.peek_kind(), TokenKind::Eof)
    }

    fn span(&self) -> Span {
        let tok = self.peek();
        Span::new(tok.line, tok.column)
    }

    fn unexpected(&self, expected: &str) -> Error {
        let tok = self.peek();
        Error::new(ErrorCode::P001, tok.line, tok.column,
            format!("expected {expected}, found `{}`", tok.kind.lexeme()))
    }
}

fn describe(expr: &Expr) -> &'static str {
    match expr {
        Expr::Number(..)     => "a number literal",
        Expr::Member { .. }  => "a member access",
        Expr::Call { .. }    => "a call result",
        Expr::PixelRead { .. } => "a pixel read",
        _ => "this expression",
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::lexer::Lexer;

    fn parse(src: &str) -> Program {
        let tokens = Lexer::new(src).tokenize().expect("lex failed");
        Parser::new(tokens).parse().expect("parse failed")
    }

    fn parse_expr_src(src: &str) -> Expr {
        let tokens = Lexer::new(src).tokenize().expect("lex failed");
        let mut p = Parser::new(tokens);
        p.parse_expr().expect("parse_expr failed")
    }

    fn parse_err(src: &str) -> Error {
        let tokens = Lexer::new(src).tokenize().expect("lex failed");
        Parser::new(tokens).parse().expect_err("expected parse error")
    }

    // ── declarations and assignment ──────────────────────────────────────────

    #[test]
    fn declaration() {
        let p = parse("x := 3.14");
        match &p.stmts[0] {
            Stmt::Decl { name, .. } => assert_eq!(name, "x"),
            _ => panic!("expected Decl"),
        }
    }

    #[test]
    fn assignment() {
        let p = parse("x := 0 x = 1");
        match &p.stmts[1] {
            Stmt::Assign { name, .. } => assert_eq!(name, "x"),
            _ => panic!("expected Assign"),
        }
    }

    #[test]
    fn constant_declaration_allowed() {
        let p = parse("Speed := 4");
        assert!(matches!(&p.stmts[0], Stmt::Decl { .. }));
    }

    #[test]
    fn constant_assignment_rejected() {
        let e = parse_err("Speed = 4");
        assert_eq!(e.code, ErrorCode::P003);
        assert!(e.message.contains("Speed"));
    }

    #[test]
    fn index_assignment() {
        let p = parse("xs[0] = 9");
        match &p.stmts[0] {
            Stmt::IndexAssign { object, .. } => {
                assert!(matches!(object, Expr::Ident(n, _) if n == "xs"));
            }
            _ => panic!("expected IndexAssign"),
        }
    }

    #[test]
    fn nested_index_assignment() {
        let p = parse("grid[1][2] = 0");
        match &p.stmts[0] {
            Stmt::IndexAssign { object, .. } => {
                assert!(matches!(object, Expr::Index { .. }));
            }
            _ => panic!("expected IndexAssign"),
        }
    }

    #[test]
    fn cannot_assign_to_call() {
        let e = parse_err("f() = 1");
        assert_eq!(e.code, ErrorCode::P001);
    }

    // ── pixels ───────────────────────────────────────────────────────────────

    #[test]
    fn pixel_assignment() {
        let p = parse("@p = #ff0000");
        assert!(matches!(&p.stmts[0], Stmt::PixelAssign { .. }));
    }

    #[test]
    fn pixel_read_expr() {
        let expr = parse_expr_src("@p");
        assert!(matches!(expr, Expr::PixelRead { .. }));
    }

    #[test]
    fn pixel_read_binds_postfix() {
        // @ps[0] reads the pixel at ps[0], not (@ps)[0]
        let expr = parse_expr_src("@ps[0]");
        match expr {
            Expr::PixelRead { pos, .. } => assert!(matches!(*pos, Expr::Index { .. })),
            _ => panic!("expected PixelRead"),
        }
    }

    // ── control flow ─────────────────────────────────────────────────────────

    #[test]
    fn if_else() {
        let p = parse("if x > 0 { log x } else { log 0 }");
        match &p.stmts[0] {
            Stmt::If(i) => assert!(i.else_block.is_some()),
            _ => panic!("expected If"),
        }
    }

    #[test]
    fn else_if_chain() {
        let p = parse("if a { log 1 } else if b { log 2 } else { log 3 }");
        match &p.stmts[0] {
            Stmt::If(outer) => {
                let else_block = outer.else_block.as_ref().unwrap();
                assert_eq!(else_block.len(), 1);
                match &else_block[0] {
                    Stmt::If(inner) => assert!(inner.else_block.is_some()),
                    _ => panic!("expected nested If"),
                }
            }
            _ => panic!("expected If"),
        }
    }

    #[test]
    fn while_loop() {
        let p = parse("while i < 10 { i = i + 1 }");
        assert!(matches!(&p.stmts[0], Stmt::While(_)));
    }

    #[test]
    fn for_in_loop() {
        let p = parse("for v in xs { log v }");
        match &p.stmts[0] {
            Stmt::ForIn(f) => assert_eq!(f.var, "v"),
            _ => panic!("expected ForIn"),
        }
    }

    #[test]
    fn for_range_loop() {
        let p = parse("for i in 0..10 { log i }");
        match &p.stmts[0] {
            Stmt::ForRange(f) => {
                assert!(f.step.is_none());
                assert!(matches!(f.upper, Expr::Number(v, _) if v == 10.0));
            }
            _ => panic!("expected ForRange"),
        }
    }

    #[test]
    fn for_range_with_step() {
        let p = parse("for i in 0..2..10 { log i }");
        match &p.stmts[0] {
            Stmt::ForRange(f) => assert!(f.step.is_some()),
            _ => panic!("expected ForRange with step"),
        }
    }

    #[test]
    fn return_with_value() {
        let p = parse("f := fn(x) { return x }");
        match &p.stmts[0] {
            Stmt::Decl { value: Expr::FnLit { body, .. }, .. } => {
                assert!(matches!(body[0], Stmt::Return(Some(_), _)));
            }
            _ => panic!("expected FnLit body"),
        }
    }

    #[test]
    fn return_bare() {
        let p = parse("f := fn() { return }");
        match &p.stmts[0] {
            Stmt::Decl { value: Expr::FnLit { body, .. }, .. } => {
                assert!(matches!(body[0], Stmt::Return(None, _)));
            }
            _ => panic!("expected FnLit body"),
        }
    }

    #[test]
    fn log_multiple_args() {
        let p = parse("log \"x=\", x");
        match &p.stmts[0] {
            Stmt::Log { args, .. } => assert_eq!(args.len(), 2),
            _ => panic!("expected Log"),
        }
    }

    #[test]
    fn log_call_form() {
        let p = parse("log(\"x=\", x)");
        match &p.stmts[0] {
            Stmt::Log { args, .. } => assert_eq!(args.len(), 2),
            _ => panic!("expected Log"),
        }
    }

    #[test]
    fn log_parenthesized_first_arg_stays_bare() {
        // the paren group is an operand here, not the call form
        let p = parse("log (1;1) in r");
        match &p.stmts[0] {
            Stmt::Log { args, .. } => {
                assert_eq!(args.len(), 1);
                assert!(matches!(args[0], Expr::Binary { op: BinOp::In, .. }));
            }
            _ => panic!("expected Log"),
        }
    }

    #[test]
    fn log_parenthesized_arg_with_trailing_list() {
        let p = parse("log (1), 2");
        match &p.stmts[0] {
            Stmt::Log { args, .. } => assert_eq!(args.len(), 2),
            _ => panic!("expected Log"),
        }
    }

    #[test]
    fn yield_parses() {
        let p = parse("yield");
        assert!(matches!(&p.stmts[0], Stmt::Yield(_)));
    }

    // ── precedence ───────────────────────────────────────────────────────────

    #[test]
    fn mul_binds_over_add() {
        let expr = parse_expr_src("a + b * c");
        match expr {
            Expr::Binary { op: BinOp::Add, right, .. } => {
                assert!(matches!(*right, Expr::Binary { op: BinOp::Mul, .. }));
            }
            _ => panic!("expected Add at top"),
        }
    }

    #[test]
    fn additive_is_right_recursive() {
        // a - b - c groups as a - (b - c)
        let expr = parse_expr_src("a - b - c");
        match expr {
            Expr::Binary { op: BinOp::Sub, right, .. } => {
                assert!(matches!(*right, Expr::Binary { op: BinOp::Sub, .. }));
            }
            _ => panic!("expected Sub at top"),
        }
    }

    #[test]
    fn membership_at_additive_level() {
        let expr = parse_expr_src("p in r");
        assert!(matches!(expr, Expr::Binary { op: BinOp::In, .. }));
    }

    #[test]
    fn tuple_below_comparison() {
        // 1;2 == 1;2 compares two points
        let expr = parse_expr_src("1;2 == 1;2");
        match expr {
            Expr::Binary { op: BinOp::Eq, left, right, .. } => {
                assert!(matches!(*left, Expr::Tuple { .. }));
                assert!(matches!(*right, Expr::Tuple { .. }));
            }
            _ => panic!("expected Eq of tuples"),
        }
    }

    #[test]
    fn tuple_of_sums() {
        // x+1;y+1 groups each side as an additive expression
        let expr = parse_expr_src("x + 1; y + 1");
        match expr {
            Expr::Tuple { x, y, .. } => {
                assert!(matches!(*x, Expr::Binary { op: BinOp::Add, .. }));
                assert!(matches!(*y, Expr::Binary { op: BinOp::Add, .. }));
            }
            _ => panic!("expected Tuple"),
        }
    }

    #[test]
    fn concat_is_left_associative() {
        let expr = parse_expr_src("a :: b :: c");
        match expr {
            Expr::Binary { op: BinOp::Concat, left, .. } => {
                assert!(matches!(*left, Expr::Binary { op: BinOp::Concat, .. }));
            }
            _ => panic!("expected Concat at top"),
        }
    }

    #[test]
    fn comparison_does_not_chain() {
        // the trailing `< c` has nowhere to go
        let e = parse_err("x := a < b < c");
        assert_eq!(e.code, ErrorCode::P001);
    }

    #[test]
    fn ternary_is_right_associative() {
        let expr = parse_expr_src("a ? b : c ? d : e");
        match expr {
            Expr::Ternary { else_expr, .. } => {
                assert!(matches!(*else_expr, Expr::Ternary { .. }));
            }
            _ => panic!("expected Ternary"),
        }
    }

    #[test]
    fn pipeline_is_left_associative() {
        let expr = parse_expr_src("1 | $ + 1 | $ + 2");
        match expr {
            Expr::Pipeline { left, .. } => {
                assert!(matches!(*left, Expr::Pipeline { .. }));
            }
            _ => panic!("expected Pipeline at top"),
        }
    }

    #[test]
    fn pipeline_placeholder_is_plain_ident() {
        let expr = parse_expr_src("1 | $ * 2");
        match expr {
            Expr::Pipeline { right, .. } => match *right {
                Expr::Binary { left, .. } => {
                    assert!(matches!(*left, Expr::Ident(ref n, _) if n == "$"));
                }
                _ => panic!("expected Binary on the right"),
            },
            _ => panic!("expected Pipeline"),
        }
    }

    // ── postfix ──────────────────────────────────────────────────────────────

    #[test]
    fn member_access() {
        let expr = parse_expr_src("p.x");
        assert!(matches!(expr, Expr::Member { .. }));
    }

    #[test]
    fn index_range() {
        let expr = parse_expr_src("xs[2..-1]");
        assert!(matches!(expr, Expr::IndexRange { .. }));
    }

    #[test]
    fn chained_postfix() {
        // r.min.x → Member(Member(r, min), x)
        let expr = parse_expr_src("r.min.x");
        match expr {
            Expr::Member { expr, member, .. } => {
                assert_eq!(member, "x");
                assert!(matches!(*expr, Expr::Member { .. }));
            }
            _ => panic!("expected nested Member"),
        }
    }

    // ── literals ─────────────────────────────────────────────────────────────

    #[test]
    fn kernel_literal() {
        let expr = parse_expr_src("|0 1 0 1|");
        match expr {
            Expr::KernelLit(values, _) => assert_eq!(values, vec![0.0, 1.0, 0.0, 1.0]),
            _ => panic!("expected KernelLit"),
        }
    }

    #[test]
    fn kernel_literal_negative_weight() {
        let expr = parse_expr_src("|-1 0 0 -1|");
        match expr {
            Expr::KernelLit(values, _) => assert_eq!(values, vec![-1.0, 0.0, 0.0, -1.0]),
            _ => panic!("expected KernelLit"),
        }
    }

    #[test]
    fn kernel_literal_non_square_rejected() {
        let e = parse_err("k := |1 2 3|");
        assert_eq!(e.code, ErrorCode::P004);
    }

    #[test]
    fn kernel_literal_non_number_rejected() {
        let e = parse_err("k := |a b c d|");
        assert_eq!(e.code, ErrorCode::P004);
    }

    #[test]
    fn list_literal() {
        let expr = parse_expr_src("[1, 2, 3]");
        match expr {
            Expr::ListLit(items, _) => assert_eq!(items.len(), 3),
            _ => panic!("expected ListLit"),
        }
    }

    #[test]
    fn map_literal_ident_key_sugar() {
        let expr = parse_expr_src("{key: 1, val: 2}");
        match expr {
            Expr::MapLit(entries, _) => {
                assert_eq!(entries.len(), 2);
                assert!(matches!(entries[0].0, Expr::Str(ref k, _) if k == "key"));
            }
            _ => panic!("expected MapLit"),
        }
    }

    #[test]
    fn map_literal_expression_key() {
        let expr = parse_expr_src("{\"a\": 1, 2: \"b\"}");
        match expr {
            Expr::MapLit(entries, _) => {
                assert!(matches!(entries[1].0, Expr::Number(v, _) if v == 2.0));
            }
            _ => panic!("expected MapLit"),
        }
    }

    #[test]
    fn fn_literal_block_body() {
        let expr = parse_expr_src("fn(a, b) { return a + b }");
        match expr {
            Expr::FnLit { params, body, .. } => {
                assert_eq!(params, vec!["a", "b"]);
                assert_eq!(body.len(), 1);
            }
            _ => panic!("expected FnLit"),
        }
    }

    #[test]
    fn fn_literal_arrow_sugar() {
        let expr = parse_expr_src("fn(x) -> x * 2");
        match expr {
            Expr::FnLit { body, .. } => {
                assert!(matches!(body[0], Stmt::Return(Some(_), _)));
            }
            _ => panic!("expected FnLit"),
        }
    }

    #[test]
    fn color_literal_expr() {
        let expr = parse_expr_src("#00ff00");
        assert!(matches!(expr, Expr::ColorLit(ref s, _) if s == "00ff00"));
    }

    #[test]
    fn nil_literal() {
        let expr = parse_expr_src("nil");
        assert!(matches!(expr, Expr::Nil(_)));
    }

    // ── statements without separators ────────────────────────────────────────

    #[test]
    fn consecutive_statements() {
        let p = parse("x := 1\ny := 2\nlog x + y");
        assert_eq!(p.stmts.len(), 3);
    }

    #[test]
    fn statements_on_one_line() {
        let p = parse("x := 1 y := 2");
        assert_eq!(p.stmts.len(), 2);
    }

    #[test]
    fn invoke_statement() {
        let p = parse("flip()");
        match &p.stmts[0] {
            Stmt::Invoke(Expr::Call { callee, .. }) => assert_eq!(callee, "flip"),
            _ => panic!("expected Invoke"),
        }
    }

    #[test]
    fn pipeline_invoke_statement() {
        let p = parse("rect(0, 0, 2, 2) | plot($, #ff0000)");
        assert!(matches!(&p.stmts[0], Stmt::Invoke(Expr::Pipeline { .. })));
    }

    #[test]
    fn bare_expression_statement_rejected() {
        let e = parse_err("1 + 2");
        assert_eq!(e.code, ErrorCode::P001);
        assert!(e.message.contains("not a statement"));
    }

    // ── errors ───────────────────────────────────────────────────────────────

    #[test]
    fn missing_brace_is_error() {
        let e = parse_err("if x { log x");
        assert_eq!(e.code, ErrorCode::P002);
    }

    #[test]
    fn missing_expression_is_error() {
        let e = parse_err("x := ");
        assert_eq!(e.code, ErrorCode::P001);
    }

    #[test]
    fn full_program() {
        let src = "
            Blur := |1 2 1 2 4 2 1 2 1|
            for p in Bounds {
                @p = convolute(p, Blur) | clamp($)
            }
            flip()
        ";
        let p = parse(src);
        assert_eq!(p.stmts.len(), 3);
        assert!(matches!(p.stmts[1], Stmt::ForIn(_)));
    }
}
