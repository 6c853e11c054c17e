//! 字句解析器
//!
//! 任意の文字列を単独のソース単位としてトークン列に変換します。
//! 通常のスクリプト読み込みと、デバッガのライブ評価の双方から使われます。

use crate::error::ParseError;
use crate::{Location, Position, Result};
use regex::Regex;

/// 予約語
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Keyword {
    Function,
    Sub,
    End,
    As,
    If,
    Then,
    Else,
    While,
    For,
    Each,
    In,
    Return,
    Stop,
    Print,
    True,
    False,
    Invalid,
    And,
    Or,
    Not,
    Mod,
}

impl Keyword {
    fn lookup(word: &str) -> Option<Self> {
        let keyword = match word {
            "function" => Keyword::Function,
            "sub" => Keyword::Sub,
            "end" => Keyword::End,
            "as" => Keyword::As,
            "if" => Keyword::If,
            "then" => Keyword::Then,
            "else" => Keyword::Else,
            "while" => Keyword::While,
            "for" => Keyword::For,
            "each" => Keyword::Each,
            "in" => Keyword::In,
            "return" => Keyword::Return,
            "stop" => Keyword::Stop,
            "print" => Keyword::Print,
            "true" => Keyword::True,
            "false" => Keyword::False,
            "invalid" => Keyword::Invalid,
            "and" => Keyword::And,
            "or" => Keyword::Or,
            "not" => Keyword::Not,
            "mod" => Keyword::Mod,
            _ => return None,
        };
        Some(keyword)
    }
}

/// トークン種別
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    /// 識別子（小文字に正規化済み）
    Identifier(String),
    Keyword(Keyword),
    Integer(i32),
    Float(f64),
    Str(String),
    LeftParen,
    RightParen,
    LeftSquare,
    RightSquare,
    LeftBrace,
    RightBrace,
    Comma,
    Semicolon,
    Dot,
    Colon,
    Equal,
    NotEqual,
    Less,
    Greater,
    LessEqual,
    GreaterEqual,
    Plus,
    Minus,
    Star,
    Slash,
    PlusPlus,
    MinusMinus,
    Question,
    Newline,
    Eof,
}

/// トークン
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    pub location: Location,
}

/// 字句解析の結果
#[derive(Debug, Default)]
pub struct ScanResults {
    pub tokens: Vec<Token>,
    pub errors: Vec<ParseError>,
}

/// 字句解析器
pub struct Lexer {
    pattern: Regex,
}

impl Lexer {
    /// 字句解析器を作成する
    pub fn new() -> Result<Self> {
        let pattern = Regex::new(
            r#"^(?:(?P<ws>[ \t\r]+)|(?P<comment>'.*)|(?P<float>\d+\.\d+(?:[eE][+-]?\d+)?|\.\d+)|(?P<int>\d+)|(?P<string>"(?:[^"]|"")*")|(?P<ident>[A-Za-z_][A-Za-z0-9_]*[$%!#&]?)|(?P<op>\+\+|--|<>|<=|>=|[-+*/=<>()\[\]{},;.:?]))"#,
        )?;
        Ok(Self { pattern })
    }

    /// ソース文字列をトークン列に変換する
    ///
    /// # Arguments
    /// * `source` - ソーステキスト
    /// * `file` - 位置情報に記録するファイル識別子
    pub fn scan(&self, source: &str, file: &str) -> ScanResults {
        let mut results = ScanResults::default();

        for (index, line) in source.split('\n').enumerate() {
            let line_no = index + 1;
            let mut pos = 0;

            while pos < line.len() {
                let rest = &line[pos..];
                let start = pos;
                let location = |len: usize| {
                    Location::new(
                        file,
                        Position::new(line_no, start + 1),
                        Position::new(line_no, start + len),
                    )
                };

                let Some(caps) = self.pattern.captures(rest) else {
                    let ch = rest.chars().next().unwrap_or(' ');
                    results.errors.push(ParseError::new(
                        format!("Unexpected character '{}'", ch),
                        location(ch.len_utf8()),
                    ));
                    pos += ch.len_utf8();
                    continue;
                };

                let text = &caps[0];
                let len = text.len();

                if caps.name("ws").is_some() || caps.name("comment").is_some() {
                    pos += len;
                    continue;
                }

                let kind = if caps.name("float").is_some() {
                    match text.parse::<f64>() {
                        Ok(x) => TokenKind::Float(x),
                        Err(_) => {
                            results.errors.push(ParseError::new(
                                format!("Invalid float literal '{}'", text),
                                location(len),
                            ));
                            pos += len;
                            continue;
                        }
                    }
                } else if caps.name("int").is_some() {
                    match text.parse::<i32>() {
                        Ok(n) => TokenKind::Integer(n),
                        Err(_) => {
                            results.errors.push(ParseError::new(
                                format!("Integer literal '{}' out of range", text),
                                location(len),
                            ));
                            pos += len;
                            continue;
                        }
                    }
                } else if caps.name("string").is_some() {
                    TokenKind::Str(text[1..len - 1].replace("\"\"", "\""))
                } else if caps.name("ident").is_some() {
                    let word = text.to_ascii_lowercase();
                    if word == "rem" {
                        // 行末までコメント
                        break;
                    }
                    match Keyword::lookup(&word) {
                        Some(keyword) => TokenKind::Keyword(keyword),
                        None => TokenKind::Identifier(word),
                    }
                } else {
                    operator_kind(text)
                };

                results.tokens.push(Token {
                    kind,
                    text: text.to_string(),
                    location: location(len),
                });
                pos += len;
            }

            results.tokens.push(Token {
                kind: TokenKind::Newline,
                text: "\n".to_string(),
                location: Location::new(
                    file,
                    Position::new(line_no, line.len() + 1),
                    Position::new(line_no, line.len() + 1),
                ),
            });
        }

        let last_line = results
            .tokens
            .last()
            .map(|t| t.location.end)
            .unwrap_or_default();
        results.tokens.push(Token {
            kind: TokenKind::Eof,
            text: String::new(),
            location: Location::new(file, last_line, last_line),
        });

        results
    }
}

fn operator_kind(text: &str) -> TokenKind {
    match text {
        "++" => TokenKind::PlusPlus,
        "--" => TokenKind::MinusMinus,
        "<>" => TokenKind::NotEqual,
        "<=" => TokenKind::LessEqual,
        ">=" => TokenKind::GreaterEqual,
        "-" => TokenKind::Minus,
        "+" => TokenKind::Plus,
        "*" => TokenKind::Star,
        "/" => TokenKind::Slash,
        "=" => TokenKind::Equal,
        "<" => TokenKind::Less,
        ">" => TokenKind::Greater,
        "(" => TokenKind::LeftParen,
        ")" => TokenKind::RightParen,
        "[" => TokenKind::LeftSquare,
        "]" => TokenKind::RightSquare,
        "{" => TokenKind::LeftBrace,
        "}" => TokenKind::RightBrace,
        "," => TokenKind::Comma,
        ";" => TokenKind::Semicolon,
        "." => TokenKind::Dot,
        ":" => TokenKind::Colon,
        _ => TokenKind::Question,
    }
}
