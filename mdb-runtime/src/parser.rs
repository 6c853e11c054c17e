//! 構文解析器
//!
//! トークン列から文のリストを構築します。エラーが起きた文は読み飛ばし、
//! 次の行から解析を再開します。

use crate::ast::{
    BinaryOp, Block, Expr, FunctionDecl, IncrementOp, Param, PrintItem, Statement, UnaryOp,
};
use crate::error::ParseError;
use crate::lexer::{Keyword, Token, TokenKind};
use crate::{Location, Value, ValueKind};
use std::rc::Rc;

type PResult<T> = std::result::Result<T, ParseError>;

/// 式と文の入れ子の最大深さ
pub const MAX_NESTING_DEPTH: usize = 64;

/// 構文解析の結果
#[derive(Debug, Default)]
pub struct ParseResults {
    pub statements: Vec<Statement>,
    pub errors: Vec<ParseError>,
}

/// ブロックの終端
#[derive(Debug, Clone, Copy)]
enum Terminator {
    Else,
    EndOf(Keyword),
}

/// 構文解析器
#[derive(Default)]
pub struct Parser {
    tokens: Vec<Token>,
    current: usize,
    depth: usize,
}

impl Parser {
    pub fn new() -> Self {
        Self::default()
    }

    /// トークン列を解析する
    pub fn parse(&mut self, tokens: Vec<Token>) -> ParseResults {
        self.tokens = tokens;
        self.current = 0;
        self.depth = 0;
        if !matches!(self.tokens.last().map(|t| &t.kind), Some(TokenKind::Eof)) {
            let location = self
                .tokens
                .last()
                .map(|t| t.location.clone())
                .unwrap_or_default();
            self.tokens.push(Token {
                kind: TokenKind::Eof,
                text: String::new(),
                location,
            });
        }

        let mut results = ParseResults::default();
        loop {
            self.skip_separators();
            if self.is_at_end() {
                break;
            }

            let parsed = self
                .declaration()
                .and_then(|stmt| self.expect_statement_end().map(|_| stmt));
            match parsed {
                Ok(stmt) => results.statements.push(stmt),
                Err(e) => {
                    results.errors.push(e);
                    self.synchronize();
                }
            }
        }
        results
    }

    fn declaration(&mut self) -> PResult<Statement> {
        if self.check_keyword(Keyword::Function) || self.check_keyword(Keyword::Sub) {
            return self.function_declaration();
        }
        self.statement()
    }

    fn function_declaration(&mut self) -> PResult<Statement> {
        let start = self.advance();
        let closing = if start.kind == TokenKind::Keyword(Keyword::Sub) {
            Keyword::Sub
        } else {
            Keyword::Function
        };

        let (name, _) = self.identifier("Expected function name")?;
        self.consume(TokenKind::LeftParen, "Expected '(' after function name")?;

        let mut params = Vec::new();
        if !self.check(&TokenKind::RightParen) {
            loop {
                let (param_name, _) = self.identifier("Expected parameter name")?;
                let kind = if self.match_keyword(Keyword::As) {
                    self.type_name()?
                } else {
                    ValueKind::Dynamic
                };
                params.push(Param {
                    name: param_name,
                    kind,
                });
                if !self.match_kind(&TokenKind::Comma) {
                    break;
                }
            }
        }
        self.consume(TokenKind::RightParen, "Expected ')' after parameters")?;

        let return_kind = if self.match_keyword(Keyword::As) {
            self.type_name()?
        } else if closing == Keyword::Sub {
            ValueKind::Void
        } else {
            ValueKind::Dynamic
        };

        let body = self.block(&[Terminator::EndOf(closing)])?;
        self.consume_keyword(Keyword::End, "Expected 'end'")?;
        let end = self.consume_keyword(closing, "Expected end of function")?;

        Ok(Statement::Function(Rc::new(FunctionDecl {
            name,
            params,
            return_kind,
            body,
            location: start.location.span(&end.location),
        })))
    }

    fn type_name(&mut self) -> PResult<ValueKind> {
        let token = self.advance();
        ValueKind::from_type_name(&token.text).ok_or_else(|| {
            ParseError::new(format!("Unknown type '{}'", token.text), token.location)
        })
    }

    fn block(&mut self, terminators: &[Terminator]) -> PResult<Block> {
        let start = self.peek().location.clone();
        let mut statements = Vec::new();

        loop {
            self.skip_separators();
            if self.is_at_end() {
                return Err(ParseError::new("Unterminated block", start));
            }
            if terminators.iter().any(|t| self.at_terminator(*t)) {
                break;
            }
            let stmt = self.statement()?;
            self.expect_statement_end()?;
            statements.push(stmt);
        }

        let end = self.peek().location.clone();
        Ok(Block {
            statements,
            location: start.span(&end),
        })
    }

    fn statement(&mut self) -> PResult<Statement> {
        self.nested(Self::statement_kind)
    }

    fn statement_kind(&mut self) -> PResult<Statement> {
        match self.peek().kind.clone() {
            TokenKind::Keyword(Keyword::Print) | TokenKind::Question => self.print_statement(),
            TokenKind::Keyword(Keyword::If) => self.if_statement(),
            TokenKind::Keyword(Keyword::While) => self.while_statement(),
            TokenKind::Keyword(Keyword::For) => self.for_each_statement(),
            TokenKind::Keyword(Keyword::Return) => self.return_statement(),
            TokenKind::Keyword(Keyword::Stop) => {
                let token = self.advance();
                Ok(Statement::Stop {
                    location: token.location,
                })
            }
            TokenKind::Keyword(Keyword::Function) | TokenKind::Keyword(Keyword::Sub) => Err(
                ParseError::new("Nested function declarations are not allowed", self.peek().location.clone()),
            ),
            _ => self.simple_statement(),
        }
    }

    fn print_statement(&mut self) -> PResult<Statement> {
        let start = self.advance();
        let mut items = Vec::new();
        let mut end = start.location.clone();

        while !self.at_statement_end() {
            if self.match_kind(&TokenKind::Comma) {
                items.push(PrintItem::Space);
            } else if self.match_kind(&TokenKind::Semicolon) {
                items.push(PrintItem::Join);
            } else {
                let expr = self.expression()?;
                end = expr.location().clone();
                items.push(PrintItem::Expr(expr));
            }
        }

        Ok(Statement::Print {
            items,
            location: start.location.span(&end),
        })
    }

    fn if_statement(&mut self) -> PResult<Statement> {
        let start = self.advance();
        let condition = self.expression()?;
        self.match_keyword(Keyword::Then);

        if self.check(&TokenKind::Newline) || self.check(&TokenKind::Colon) {
            let then_branch = self.block(&[Terminator::Else, Terminator::EndOf(Keyword::If)])?;
            let else_branch = if self.match_keyword(Keyword::Else) {
                Some(self.block(&[Terminator::EndOf(Keyword::If)])?)
            } else {
                None
            };
            self.consume_keyword(Keyword::End, "Expected 'end if'")?;
            let end = self.consume_keyword(Keyword::If, "Expected 'end if'")?;
            return Ok(Statement::If {
                condition,
                then_branch,
                else_branch,
                location: start.location.span(&end.location),
            });
        }

        // 一行形式: if cond then stmt [else stmt]
        let then_stmt = self.statement()?;
        let mut end = then_stmt.location().clone();
        let then_branch = Block {
            location: then_stmt.location().clone(),
            statements: vec![then_stmt],
        };
        let else_branch = if self.match_keyword(Keyword::Else) {
            let else_stmt = self.statement()?;
            end = else_stmt.location().clone();
            Some(Block {
                location: else_stmt.location().clone(),
                statements: vec![else_stmt],
            })
        } else {
            None
        };

        Ok(Statement::If {
            condition,
            then_branch,
            else_branch,
            location: start.location.span(&end),
        })
    }

    fn while_statement(&mut self) -> PResult<Statement> {
        let start = self.advance();
        let condition = self.expression()?;
        let body = self.block(&[Terminator::EndOf(Keyword::While)])?;
        self.consume_keyword(Keyword::End, "Expected 'end while'")?;
        let end = self.consume_keyword(Keyword::While, "Expected 'end while'")?;
        Ok(Statement::While {
            condition,
            body,
            location: start.location.span(&end.location),
        })
    }

    fn for_each_statement(&mut self) -> PResult<Statement> {
        let start = self.advance();
        self.consume_keyword(Keyword::Each, "Expected 'each' after 'for'")?;
        let (item, _) = self.identifier("Expected loop variable name")?;
        self.consume_keyword(Keyword::In, "Expected 'in' after loop variable")?;
        let target = self.expression()?;
        let body = self.block(&[Terminator::EndOf(Keyword::For)])?;
        self.consume_keyword(Keyword::End, "Expected 'end for'")?;
        let end = self.consume_keyword(Keyword::For, "Expected 'end for'")?;
        Ok(Statement::ForEach {
            item,
            target,
            body,
            location: start.location.span(&end.location),
        })
    }

    fn return_statement(&mut self) -> PResult<Statement> {
        let start = self.advance();
        if self.at_statement_end() {
            return Ok(Statement::Return {
                value: None,
                location: start.location,
            });
        }
        let value = self.expression()?;
        let location = start.location.span(value.location());
        Ok(Statement::Return {
            value: Some(value),
            location,
        })
    }

    fn simple_statement(&mut self) -> PResult<Statement> {
        let target = self.postfix()?;

        if self.match_kind(&TokenKind::Equal) {
            let value = self.expression()?;
            let location = target.location().span(value.location());
            return match target {
                Expr::Variable { name, .. } => Ok(Statement::Assignment {
                    name,
                    value,
                    location,
                }),
                Expr::DottedGet { object, name, .. } => Ok(Statement::DottedSet {
                    object: *object,
                    name,
                    value,
                    location,
                }),
                Expr::IndexedGet { object, index, .. } => Ok(Statement::IndexedSet {
                    object: *object,
                    index: *index,
                    value,
                    location,
                }),
                other => Err(ParseError::new(
                    "Invalid assignment target",
                    other.location().clone(),
                )),
            };
        }

        let op = if self.match_kind(&TokenKind::PlusPlus) {
            Some(IncrementOp::Increment)
        } else if self.match_kind(&TokenKind::MinusMinus) {
            Some(IncrementOp::Decrement)
        } else {
            None
        };
        if let Some(op) = op {
            if !matches!(
                target,
                Expr::Variable { .. } | Expr::DottedGet { .. } | Expr::IndexedGet { .. }
            ) {
                return Err(ParseError::new(
                    "Invalid increment target",
                    target.location().clone(),
                ));
            }
            let location = target
                .location()
                .span(&self.previous().location.clone());
            return Ok(Statement::Increment {
                target,
                op,
                location,
            });
        }

        let location = target.location().clone();
        Ok(Statement::Expression {
            expr: target,
            location,
        })
    }

    // ---- 式 ----

    fn expression(&mut self) -> PResult<Expr> {
        self.nested(Self::or)
    }

    fn or(&mut self) -> PResult<Expr> {
        let mut expr = self.and()?;
        while self.match_keyword(Keyword::Or) {
            let right = self.and()?;
            expr = binary(expr, BinaryOp::Or, right);
        }
        Ok(expr)
    }

    fn and(&mut self) -> PResult<Expr> {
        let mut expr = self.not()?;
        while self.match_keyword(Keyword::And) {
            let right = self.not()?;
            expr = binary(expr, BinaryOp::And, right);
        }
        Ok(expr)
    }

    fn not(&mut self) -> PResult<Expr> {
        if self.check_keyword(Keyword::Not) {
            let start = self.advance();
            let operand = self.nested(Self::not)?;
            let location = start.location.span(operand.location());
            return Ok(Expr::Unary {
                op: UnaryOp::Not,
                operand: Box::new(operand),
                location,
            });
        }
        self.comparison()
    }

    fn comparison(&mut self) -> PResult<Expr> {
        let mut expr = self.additive()?;
        loop {
            let op = match self.peek().kind {
                TokenKind::Equal => BinaryOp::Equal,
                TokenKind::NotEqual => BinaryOp::NotEqual,
                TokenKind::Less => BinaryOp::Less,
                TokenKind::LessEqual => BinaryOp::LessEqual,
                TokenKind::Greater => BinaryOp::Greater,
                TokenKind::GreaterEqual => BinaryOp::GreaterEqual,
                _ => break,
            };
            self.advance();
            let right = self.additive()?;
            expr = binary(expr, op, right);
        }
        Ok(expr)
    }

    fn additive(&mut self) -> PResult<Expr> {
        let mut expr = self.multiplicative()?;
        loop {
            let op = match self.peek().kind {
                TokenKind::Plus => BinaryOp::Add,
                TokenKind::Minus => BinaryOp::Subtract,
                _ => break,
            };
            self.advance();
            let right = self.multiplicative()?;
            expr = binary(expr, op, right);
        }
        Ok(expr)
    }

    fn multiplicative(&mut self) -> PResult<Expr> {
        let mut expr = self.unary()?;
        loop {
            let op = match self.peek().kind {
                TokenKind::Star => BinaryOp::Multiply,
                TokenKind::Slash => BinaryOp::Divide,
                TokenKind::Keyword(Keyword::Mod) => BinaryOp::Modulo,
                _ => break,
            };
            self.advance();
            let right = self.unary()?;
            expr = binary(expr, op, right);
        }
        Ok(expr)
    }

    fn unary(&mut self) -> PResult<Expr> {
        if self.check(&TokenKind::Minus) {
            let start = self.advance();
            let operand = self.nested(Self::unary)?;
            let location = start.location.span(operand.location());
            return Ok(Expr::Unary {
                op: UnaryOp::Negate,
                operand: Box::new(operand),
                location,
            });
        }
        self.postfix()
    }

    fn postfix(&mut self) -> PResult<Expr> {
        let mut expr = self.primary()?;
        loop {
            if self.match_kind(&TokenKind::Dot) {
                let token = self.advance();
                let name = match &token.kind {
                    TokenKind::Identifier(name) => name.clone(),
                    TokenKind::Keyword(_) => token.text.to_ascii_lowercase(),
                    _ => {
                        return Err(ParseError::new(
                            "Expected member name after '.'",
                            token.location,
                        ))
                    }
                };
                let location = expr.location().span(&token.location);
                expr = Expr::DottedGet {
                    object: Box::new(expr),
                    name,
                    location,
                };
            } else if self.match_kind(&TokenKind::LeftSquare) {
                let index = self.expression()?;
                let close = self.consume(TokenKind::RightSquare, "Expected ']' after index")?;
                let location = expr.location().span(&close.location);
                expr = Expr::IndexedGet {
                    object: Box::new(expr),
                    index: Box::new(index),
                    location,
                };
            } else if self.match_kind(&TokenKind::LeftParen) {
                let mut args = Vec::new();
                if !self.check(&TokenKind::RightParen) {
                    loop {
                        args.push(self.expression()?);
                        if !self.match_kind(&TokenKind::Comma) {
                            break;
                        }
                    }
                }
                let close = self.consume(TokenKind::RightParen, "Expected ')' after arguments")?;
                let location = expr.location().span(&close.location);
                expr = Expr::Call {
                    callee: Box::new(expr),
                    args,
                    location,
                };
            } else {
                break;
            }
        }
        Ok(expr)
    }

    fn primary(&mut self) -> PResult<Expr> {
        let token = self.peek().clone();
        let location = token.location.clone();

        let literal = match &token.kind {
            TokenKind::Integer(n) => Some(Value::Integer(*n)),
            TokenKind::Float(x) => Some(Value::Float(*x)),
            TokenKind::Str(s) => Some(Value::Str(s.clone())),
            TokenKind::Keyword(Keyword::True) => Some(Value::Boolean(true)),
            TokenKind::Keyword(Keyword::False) => Some(Value::Boolean(false)),
            TokenKind::Keyword(Keyword::Invalid) => Some(Value::Invalid),
            _ => None,
        };
        if let Some(value) = literal {
            self.advance();
            return Ok(Expr::Literal { value, location });
        }

        // エラー時はトークンを消費しない（同期処理で行末まで読み飛ばす）
        if !matches!(
            token.kind,
            TokenKind::Identifier(_)
                | TokenKind::LeftParen
                | TokenKind::LeftSquare
                | TokenKind::LeftBrace
        ) {
            return Err(ParseError::new(
                format!("Unexpected token '{}'", token.text.trim()),
                location,
            ));
        }
        self.advance();

        match token.kind {
            TokenKind::Identifier(name) => Ok(Expr::Variable { name, location }),
            TokenKind::LeftParen => {
                let expr = self.expression()?;
                self.consume(TokenKind::RightParen, "Expected ')' after expression")?;
                Ok(expr)
            }
            TokenKind::LeftSquare => {
                let mut elements = Vec::new();
                loop {
                    self.skip_newlines();
                    if self.check(&TokenKind::RightSquare) {
                        break;
                    }
                    elements.push(self.expression()?);
                    self.skip_newlines();
                    if !self.match_kind(&TokenKind::Comma) {
                        break;
                    }
                }
                self.skip_newlines();
                let close = self.consume(TokenKind::RightSquare, "Expected ']' after array elements")?;
                Ok(Expr::ArrayLiteral {
                    elements,
                    location: location.span(&close.location),
                })
            }
            TokenKind::LeftBrace => {
                let mut entries = Vec::new();
                loop {
                    self.skip_newlines();
                    if self.check(&TokenKind::RightBrace) {
                        break;
                    }
                    let key_token = self.advance();
                    let key = match &key_token.kind {
                        TokenKind::Identifier(name) => name.clone(),
                        TokenKind::Str(s) => s.clone(),
                        TokenKind::Keyword(_) => key_token.text.to_ascii_lowercase(),
                        _ => {
                            return Err(ParseError::new(
                                "Expected key in associative array literal",
                                key_token.location,
                            ))
                        }
                    };
                    self.consume(TokenKind::Colon, "Expected ':' after key")?;
                    entries.push((key, self.expression()?));
                    self.skip_newlines();
                    if !self.match_kind(&TokenKind::Comma) {
                        break;
                    }
                }
                self.skip_newlines();
                let close = self.consume(TokenKind::RightBrace, "Expected '}' after entries")?;
                Ok(Expr::AssocArrayLiteral {
                    entries,
                    location: location.span(&close.location),
                })
            }
            _ => Err(ParseError::new("Unexpected token", location)),
        }
    }

    // ---- ユーティリティ ----

    /// 入れ子を1段深くして解析する
    fn nested<T>(&mut self, parse: impl FnOnce(&mut Self) -> PResult<T>) -> PResult<T> {
        if self.depth >= MAX_NESTING_DEPTH {
            return Err(ParseError::new("Nesting too deep", self.peek().location.clone()));
        }
        self.depth += 1;
        let result = parse(self);
        self.depth -= 1;
        result
    }

    fn peek(&self) -> &Token {
        &self.tokens[self.current]
    }

    fn peek_next(&self) -> Option<&Token> {
        self.tokens.get(self.current + 1)
    }

    fn previous(&self) -> &Token {
        &self.tokens[self.current.saturating_sub(1)]
    }

    fn is_at_end(&self) -> bool {
        self.peek().kind == TokenKind::Eof
    }

    fn advance(&mut self) -> Token {
        let token = self.peek().clone();
        if !self.is_at_end() {
            self.current += 1;
        }
        token
    }

    fn check(&self, kind: &TokenKind) -> bool {
        self.peek().kind == *kind
    }

    fn check_keyword(&self, keyword: Keyword) -> bool {
        self.check(&TokenKind::Keyword(keyword))
    }

    fn match_kind(&mut self, kind: &TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            return true;
        }
        false
    }

    fn match_keyword(&mut self, keyword: Keyword) -> bool {
        self.match_kind(&TokenKind::Keyword(keyword))
    }

    fn consume(&mut self, kind: TokenKind, message: &str) -> PResult<Token> {
        if self.check(&kind) {
            return Ok(self.advance());
        }
        Err(ParseError::new(message, self.peek().location.clone()))
    }

    fn consume_keyword(&mut self, keyword: Keyword, message: &str) -> PResult<Token> {
        self.consume(TokenKind::Keyword(keyword), message)
    }

    fn identifier(&mut self, message: &str) -> PResult<(String, Location)> {
        match &self.peek().kind {
            TokenKind::Identifier(name) => {
                let name = name.clone();
                let token = self.advance();
                Ok((name, token.location))
            }
            _ => Err(ParseError::new(message, self.peek().location.clone())),
        }
    }

    fn at_terminator(&self, terminator: Terminator) -> bool {
        match terminator {
            Terminator::Else => self.check_keyword(Keyword::Else),
            Terminator::EndOf(keyword) => {
                self.check_keyword(Keyword::End)
                    && self
                        .peek_next()
                        .is_some_and(|t| t.kind == TokenKind::Keyword(keyword))
            }
        }
    }

    fn at_statement_end(&self) -> bool {
        matches!(
            self.peek().kind,
            TokenKind::Newline | TokenKind::Colon | TokenKind::Eof | TokenKind::Keyword(Keyword::Else)
        )
    }

    fn expect_statement_end(&self) -> PResult<()> {
        if self.at_statement_end() {
            return Ok(());
        }
        Err(ParseError::new(
            format!("Expected end of statement, found '{}'", self.peek().text),
            self.peek().location.clone(),
        ))
    }

    fn skip_separators(&mut self) {
        while self.check(&TokenKind::Newline) || self.check(&TokenKind::Colon) {
            self.advance();
        }
    }

    fn skip_newlines(&mut self) {
        while self.check(&TokenKind::Newline) {
            self.advance();
        }
    }

    /// 次の行の先頭まで読み飛ばす
    fn synchronize(&mut self) {
        while !self.is_at_end() && !self.check(&TokenKind::Newline) {
            self.advance();
        }
    }
}

fn binary(left: Expr, op: BinaryOp, right: Expr) -> Expr {
    let location = left.location().span(right.location());
    Expr::Binary {
        left: Box::new(left),
        op,
        right: Box::new(right),
        location,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Lexer;

    fn parse(source: &str) -> ParseResults {
        let lexer = Lexer::new().unwrap();
        let scan = lexer.scan(source, "test.brs");
        Parser::new().parse(scan.tokens)
    }

    #[test]
    fn test_parse_assignment_kinds() {
        let results = parse("x = 1\na.b = 2\na[0] = 3\nx++\nfoo(1)\nprint x; y");
        assert!(results.errors.is_empty(), "{:?}", results.errors);
        let kinds: Vec<_> = results.statements.iter().map(|s| s.kind_name()).collect();
        assert_eq!(
            kinds,
            vec!["assignment", "dotted-set", "indexed-set", "increment", "expression", "print"]
        );
    }

    #[test]
    fn test_parse_function_declaration() {
        let source = "function add(a as integer, b as integer) as integer\n    return a + b\nend function\n";
        let results = parse(source);
        assert!(results.errors.is_empty(), "{:?}", results.errors);
        match &results.statements[0] {
            Statement::Function(decl) => {
                assert_eq!(decl.name, "add");
                assert_eq!(decl.params.len(), 2);
                assert_eq!(decl.params[0].kind, ValueKind::Integer);
                assert_eq!(decl.return_kind, ValueKind::Integer);
                assert_eq!(decl.location.start.line, 1);
                assert_eq!(decl.location.end.line, 3);
            }
            other => panic!("Expected function, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_sub_returns_void() {
        let results = parse("sub main()\nend sub");
        match &results.statements[0] {
            Statement::Function(decl) => assert_eq!(decl.return_kind, ValueKind::Void),
            other => panic!("Expected function, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_single_line_if() {
        let results = parse("if x > 1 then y = 2 else y = 3");
        assert!(results.errors.is_empty(), "{:?}", results.errors);
        match &results.statements[0] {
            Statement::If { else_branch, .. } => assert!(else_branch.is_some()),
            other => panic!("Expected if, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_block_statements() {
        let source = "for each v in [1, 2]\n  if v = 1\n    print v\n  else\n    print 0\n  end if\nend for\nwhile false\nend while";
        let results = parse(source);
        assert!(results.errors.is_empty(), "{:?}", results.errors);
        assert_eq!(results.statements.len(), 2);
        assert_eq!(results.statements[0].kind_name(), "for-each");
        assert_eq!(results.statements[1].kind_name(), "while");
    }

    #[test]
    fn test_parse_literals() {
        let results = parse("x = {name: \"a\", list: [1, 2.5, true, invalid]}");
        assert!(results.errors.is_empty(), "{:?}", results.errors);
    }

    #[test]
    fn test_parse_error_recovers() {
        let results = parse("x = \ny = 2");
        assert_eq!(results.errors.len(), 1);
        assert_eq!(results.statements.len(), 1);
    }

    #[test]
    fn test_parse_nesting_limit() {
        let within = format!(
            "print {}1{}",
            "(".repeat(MAX_NESTING_DEPTH - 2),
            ")".repeat(MAX_NESTING_DEPTH - 2)
        );
        let results = parse(&within);
        assert!(results.errors.is_empty(), "{:?}", results.errors);
        assert_eq!(results.statements.len(), 1);

        let deep = format!("print {}1{}", "(".repeat(900), ")".repeat(900));
        let results = parse(&deep);
        assert!(results.statements.is_empty());
        assert_eq!(results.errors[0].message, "Nesting too deep");

        let negations = format!("x = {}1", "- ".repeat(900));
        assert!(parse(&negations).statements.is_empty());
    }

    #[test]
    fn test_parse_garbage_yields_no_statements() {
        let results = parse("= = =");
        assert!(results.statements.is_empty());
        assert!(!results.errors.is_empty());
    }
}
