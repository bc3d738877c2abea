//! Single-pass, character-at-a-time lexer (SPEC_FULL §4.2).

use crate::diagnostics::SyntaxError;
use crate::token::{Token, TokenKind};
use crate::types::{BigDecimal, Integer, LiteralValue};

pub struct Lexer {
    source: Vec<char>,
    start: usize,
    current: usize,
    line: u32,
    column: u32,
    start_line: u32,
    start_column: u32,
    tokens: Vec<Token>,
    errors: Vec<SyntaxError>,
}

impl Lexer {
    pub fn new(source: &str) -> Self {
        Lexer {
            source: source.chars().collect(),
            start: 0,
            current: 0,
            line: 1,
            column: 1,
            start_line: 1,
            start_column: 1,
            tokens: Vec::new(),
            errors: Vec::new(),
        }
    }

    pub fn scan_tokens(mut self) -> (Vec<Token>, Vec<SyntaxError>) {
        while !self.is_at_end() {
            self.start = self.current;
            self.start_line = self.line;
            self.start_column = self.column;
            self.scan_token();
        }
        self.tokens
            .push(Token::new(TokenKind::Eof, "", self.line, self.column));
        (self.tokens, self.errors)
    }

    fn is_at_end(&self) -> bool {
        self.current >= self.source.len()
    }

    fn advance(&mut self) -> char {
        let c = self.source[self.current];
        self.current += 1;
        if c == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        c
    }

    fn peek(&self) -> char {
        self.source.get(self.current).copied().unwrap_or('\0')
    }

    fn peek_next(&self) -> char {
        self.source.get(self.current + 1).copied().unwrap_or('\0')
    }

    fn matches(&mut self, expected: char) -> bool {
        if self.is_at_end() || self.source[self.current] != expected {
            return false;
        }
        self.advance();
        true
    }

    fn lexeme(&self) -> String {
        self.source[self.start..self.current].iter().collect()
    }

    fn add(&mut self, kind: TokenKind) {
        let lexeme = self.lexeme();
        self.tokens
            .push(Token::new(kind, lexeme, self.start_line, self.start_column));
    }

    fn add_literal(&mut self, kind: TokenKind, literal: LiteralValue) {
        let lexeme = self.lexeme();
        self.tokens.push(
            Token::new(kind, lexeme, self.start_line, self.start_column).with_literal(literal),
        );
    }

    fn error(&mut self, message: impl Into<String>) {
        self.errors.push(SyntaxError {
            line: self.start_line,
            column: self.start_column,
            message: message.into(),
        });
    }

    fn scan_token(&mut self) {
        let c = self.advance();
        match c {
            '(' => self.add(TokenKind::LeftParen),
            ')' => self.add(TokenKind::RightParen),
            '{' => self.add(TokenKind::LeftBrace),
            '}' => self.add(TokenKind::RightBrace),
            ',' => self.add(TokenKind::Comma),
            '.' => self.add(TokenKind::Dot),
            ';' => self.add(TokenKind::Semicolon),
            ':' => self.add(TokenKind::Colon),
            '+' => {
                if self.matches('+') {
                    self.add(TokenKind::PlusPlus);
                } else if self.matches('=') {
                    self.add(TokenKind::PlusEqual);
                } else {
                    self.add(TokenKind::Plus);
                }
            }
            '-' => {
                if self.matches('-') {
                    self.add(TokenKind::MinusMinus);
                } else if self.matches('=') {
                    self.add(TokenKind::MinusEqual);
                } else if self.matches('>') {
                    self.add(TokenKind::Arrow);
                } else {
                    self.add(TokenKind::Minus);
                }
            }
            '*' => {
                if self.matches('=') {
                    self.add(TokenKind::StarEqual);
                } else {
                    self.add(TokenKind::Star);
                }
            }
            '/' => {
                if self.matches('/') {
                    while self.peek() != '\n' && !self.is_at_end() {
                        self.advance();
                    }
                } else if self.matches('=') {
                    self.add(TokenKind::SlashEqual);
                } else {
                    self.add(TokenKind::Slash);
                }
            }
            '%' => {
                if self.matches('=') {
                    self.add(TokenKind::PercentEqual);
                } else {
                    self.add(TokenKind::Percent);
                }
            }
            // Lexed as `BANG`/`BANG_EQUAL`, not the source's apparent
            // copy-paste bug of routing a bare `!` to `EQUAL` — see
            // DESIGN.md, Open Question 6.
            '!' => {
                if self.matches('=') {
                    self.add(TokenKind::BangEqual);
                } else {
                    self.add(TokenKind::Bang);
                }
            }
            '=' => {
                if self.matches('=') {
                    self.add(TokenKind::EqualEqual);
                } else {
                    self.add(TokenKind::Equal);
                }
            }
            '>' => {
                if self.matches('=') {
                    self.add(TokenKind::GreaterEqual);
                } else {
                    self.add(TokenKind::Greater);
                }
            }
            '<' => {
                if self.matches('=') {
                    self.add(TokenKind::LessEqual);
                } else {
                    self.add(TokenKind::Less);
                }
            }
            '&' => {
                if self.matches('&') {
                    self.add(TokenKind::AmpAmp);
                } else {
                    self.add(TokenKind::Amp);
                }
            }
            '|' => {
                if self.matches('|') {
                    self.add(TokenKind::PipePipe);
                } else {
                    self.add(TokenKind::Pipe);
                }
            }
            ' ' | '\r' | '\t' | '\n' => {}
            '\'' | '"' => self.string(c),
            c if c.is_ascii_digit() => self.number(),
            c if c.is_alphabetic() || c == '_' => self.identifier(),
            other => self.error(format!("Unexpected character '{other}'.")),
        }
    }

    fn string(&mut self, quote: char) {
        while self.peek() != quote && !self.is_at_end() {
            self.advance();
        }
        if self.is_at_end() {
            self.error("Unterminated string.");
            return;
        }
        self.advance(); // closing quote
        let content: String = self.source[self.start + 1..self.current - 1]
            .iter()
            .collect();
        self.add_literal(TokenKind::Variable, LiteralValue::Str(content));
    }

    fn number(&mut self) {
        while self.peek().is_ascii_digit() {
            self.advance();
        }
        let mut is_fractional = false;
        if self.peek() == '.' && self.peek_next().is_ascii_digit() {
            is_fractional = true;
            self.advance();
            while self.peek().is_ascii_digit() {
                self.advance();
            }
        }
        let text = self.lexeme();
        if !is_fractional {
            let value = Integer::parse(&text).unwrap_or_else(Integer::zero);
            self.add_literal(TokenKind::Variable, LiteralValue::Integer(value));
            return;
        }
        match text.parse::<f64>() {
            Ok(v) if v.is_finite() => {
                self.add_literal(TokenKind::Variable, LiteralValue::Decimal(v));
            }
            _ => {
                let value = BigDecimal::parse(&text).unwrap_or_else(BigDecimal::zero);
                self.add_literal(TokenKind::Variable, LiteralValue::BigDecimal(value));
            }
        }
    }

    fn identifier(&mut self) {
        while self.peek().is_alphanumeric() || self.peek() == '_' {
            self.advance();
        }
        let text = self.lexeme();
        match keyword(&text) {
            Some(Keyword::Type) => self.add(TokenKind::Type),
            Some(Keyword::True) => self.add_literal(TokenKind::True, LiteralValue::Boolean(true)),
            Some(Keyword::False) => {
                self.add_literal(TokenKind::False, LiteralValue::Boolean(false));
            }
            Some(Keyword::Nil) => self.add_literal(TokenKind::Nil, LiteralValue::Nil),
            Some(Keyword::Plain(kind)) => self.add(kind),
            None => self.add(TokenKind::Identifier),
        }
    }
}

enum Keyword {
    Type,
    True,
    False,
    Nil,
    Plain(TokenKind),
}

fn keyword(text: &str) -> Option<Keyword> {
    use TokenKind::*;
    Some(match text {
        "var" | "int" | "integer" | "decimal" | "BigDecimal" | "string" | "boolean" => {
            Keyword::Type
        }
        "true" => Keyword::True,
        "false" => Keyword::False,
        "nil" => Keyword::Nil,
        "and" => Keyword::Plain(And),
        "or" => Keyword::Plain(Or),
        "if" => Keyword::Plain(If),
        "elif" => Keyword::Plain(Elif),
        "else" => Keyword::Plain(Else),
        "for" => Keyword::Plain(For),
        "while" => Keyword::Plain(While),
        "fun" => Keyword::Plain(Fun),
        "return" => Keyword::Plain(Return),
        "class" => Keyword::Plain(Class),
        "extends" => Keyword::Plain(Extends),
        "this" => Keyword::Plain(This),
        "print" => Keyword::Plain(Print),
        "break" => Keyword::Plain(Break),
        "continue" => Keyword::Plain(Continue),
        "loop" => Keyword::Plain(Loop),
        "match" => Keyword::Plain(Match),
        "case" => Keyword::Plain(Case),
        "default" => Keyword::Plain(Default),
        "import" => Keyword::Plain(Import),
        "from" => Keyword::Plain(From),
        "as" => Keyword::Plain(As),
        "use" => Keyword::Plain(Use),
        "module" => Keyword::Plain(Module),
        "export" => Keyword::Plain(Export),
        "async" => Keyword::Plain(Async),
        "await" => Keyword::Plain(Await),
        "meditate" => Keyword::Plain(Meditate),
        "invoke" => Keyword::Plain(Invoke),
        "yield" => Keyword::Plain(Yield),
        "sutra" => Keyword::Plain(Sutra),
        _ => return None,
    })
}
