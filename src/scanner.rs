use sqlparser::keywords::{ALL_KEYWORDS, ALL_KEYWORDS_INDEX};

use crate::ast::{BUILTIN_TYPES, Keyword, Token, TokenType};

/// Lossless SQL lexer: every input character ends up in exactly one token,
/// whitespace and comments included.
pub struct Scanner {
    source_chars: Vec<char>,
    tokens: Vec<Token>,
    start: usize,
    current: usize,
    line: u32,
    col: u32,
    start_line: u32,
    start_col: u32,
}

impl Scanner {
    pub fn new(source: &str) -> Self {
        Self {
            source_chars: source.chars().collect(),
            tokens: vec![],
            start: 0,
            current: 0,
            line: 1,
            col: 1,
            start_line: 1,
            start_col: 1,
        }
    }

    pub fn tokens(&self) -> &Vec<Token> {
        &self.tokens
    }

    fn advance(&mut self) -> char {
        let c = self.source_chars[self.current];
        self.current += 1;
        if c == '\n' {
            self.line += 1;
            self.col = 1;
        } else {
            self.col += 1;
        }
        c
    }

    fn is_at_end(&self) -> bool {
        self.current >= self.source_chars.len()
    }

    fn peek(&self) -> char {
        self.peek_next_i(0)
    }

    fn peek_next_i(&self, i: usize) -> char {
        if self.current + i >= self.source_chars.len() {
            '\0'
        } else {
            self.source_chars[self.current + i]
        }
    }

    fn match_char(&mut self, expected: char) -> bool {
        if self.is_at_end() || self.peek() != expected {
            return false;
        };
        self.advance();
        true
    }

    fn advance_while(&mut self, pred: impl Fn(char) -> bool) {
        while !self.is_at_end() && pred(self.peek()) {
            self.advance();
        }
    }

    fn current_source_str(&self) -> String {
        self.source_chars[self.start..self.current].iter().collect()
    }

    fn add_token(&mut self, token_type: TokenType) {
        self.tokens.push(Token {
            kind: token_type,
            lexeme: self.current_source_str(),
            line: self.start_line,
            col: self.start_col,
        });
    }

    fn add_error_token(&mut self, error: &str) {
        log::warn!("{}", self.error_str(error));
        self.add_token(TokenType::Error);
    }

    fn reset(&mut self) {
        self.tokens.clear();
        self.start = 0;
        self.current = 0;
        self.line = 1;
        self.col = 1;
    }

    /// Scans the whole source. Malformed input never fails: what cannot be
    /// classified is kept as [`TokenType::Error`] tokens.
    pub fn scan(&mut self) {
        self.reset();
        while !self.is_at_end() {
            self.start = self.current;
            self.start_line = self.line;
            self.start_col = self.col;
            self.scan_token();
        }
    }

    /// Consumes up to and including the closing `delimiter`.
    /// Returns `false` if the input ends first.
    fn scan_delimited(&mut self, delimiter: char) -> bool {
        let doubled_escape = delimiter != ']';
        let backslash_escape = delimiter == '\'' || delimiter == '"';
        loop {
            if self.is_at_end() {
                return false;
            }
            let c = self.advance();
            if backslash_escape && c == '\\' {
                if !self.is_at_end() {
                    self.advance();
                }
                continue;
            }
            if c == delimiter {
                if doubled_escape && self.match_char(delimiter) {
                    continue;
                }
                return true;
            }
        }
    }

    fn match_delimited(&mut self, delimiter: char, token_type: TokenType) {
        if self.scan_delimited(delimiter) {
            self.add_token(token_type);
        } else {
            let opening = self.source_chars[self.start];
            self.add_error_token(&format!("Found unterminated {}...{}", opening, delimiter));
        }
    }

    fn match_block_comment(&mut self) {
        loop {
            if self.is_at_end() {
                self.add_error_token("Found unterminated comment");
                return;
            }
            if self.advance() == '*' && self.match_char('/') {
                break;
            }
        }
        self.add_token(TokenType::Comment);
    }

    fn match_line_comment(&mut self) {
        self.advance_while(|c| c != '\n');
        self.add_token(TokenType::Comment);
    }

    fn match_number(&mut self) {
        let mut found_dot = self.source_chars[self.start] == '.';
        let mut found_e = false;
        loop {
            let peek_char = self.peek();
            if peek_char.is_ascii_digit() {
                self.advance();
            } else if peek_char == '.' && !found_dot && !found_e {
                found_dot = true;
                self.advance();
            } else if (peek_char == 'e' || peek_char == 'E') && !found_e {
                let peek_next_char = self.peek_next_i(1);
                if peek_next_char.is_ascii_digit() {
                    self.advance();
                } else if (peek_next_char == '+' || peek_next_char == '-')
                    && self.peek_next_i(2).is_ascii_digit()
                {
                    self.advance();
                    self.advance();
                } else {
                    break;
                }
                found_e = true;
            } else {
                break;
            }
        }
        self.add_token(TokenType::Number);
    }

    fn match_keyword_or_name(&mut self) {
        self.advance_while(|c| c.is_alphanumeric() || c == '_' || c == '$');
        let word = self.current_source_str();

        // A word next to a dot is always part of a qualified name, even when it
        // spells a keyword (`user.order`).
        let after_dot = self
            .tokens
            .last()
            .is_some_and(|tok| tok.is_punctuation("."));
        if after_dot || self.peek() == '.' {
            self.add_token(TokenType::Name);
            return;
        }

        if BUILTIN_TYPES.contains(&word.to_lowercase().as_str()) {
            self.add_token(TokenType::Builtin);
        } else if let Some(keyword) = lookup_keyword(&word) {
            self.add_token(TokenType::Keyword(keyword));
        } else {
            self.add_token(TokenType::Name);
        }
    }

    fn scan_token(&mut self) {
        let curr_char = self.advance();
        match curr_char {
            '(' | ')' | ',' | ';' => self.add_token(TokenType::Punctuation),
            '.' => {
                if self.peek().is_ascii_digit() {
                    self.match_number();
                } else {
                    self.add_token(TokenType::Punctuation);
                }
            }
            '*' => self.add_token(TokenType::Wildcard),
            '+' | '%' | '&' | '^' | '~' => self.add_token(TokenType::Operator),
            '|' => {
                self.match_char('|');
                self.add_token(TokenType::Operator);
            }
            '-' => {
                if self.match_char('-') {
                    self.match_line_comment();
                } else {
                    self.add_token(TokenType::Operator);
                }
            }
            '/' => {
                if self.match_char('*') {
                    self.match_block_comment();
                } else {
                    self.add_token(TokenType::Operator);
                }
            }
            '#' => self.match_line_comment(),
            ':' => {
                if self.match_char(':') {
                    self.add_token(TokenType::Operator);
                } else if self.peek().is_alphabetic() || self.peek() == '_' {
                    self.advance_while(|c| c.is_alphanumeric() || c == '_');
                    self.add_token(TokenType::Placeholder);
                } else {
                    self.add_token(TokenType::Punctuation);
                }
            }
            '?' => self.add_token(TokenType::Placeholder),
            '$' if self.peek().is_ascii_digit() => {
                self.advance_while(|c| c.is_ascii_digit());
                self.add_token(TokenType::Placeholder);
            }
            '@' if self.peek().is_alphanumeric() || self.peek() == '_' => {
                self.advance_while(|c| c.is_alphanumeric() || c == '_');
                self.add_token(TokenType::Placeholder);
            }
            '=' => self.add_token(TokenType::Comparison),
            '<' => {
                if !self.match_char('>') {
                    self.match_char('=');
                }
                self.add_token(TokenType::Comparison);
            }
            '>' => {
                self.match_char('=');
                self.add_token(TokenType::Comparison);
            }
            '!' => {
                if self.match_char('=') {
                    self.add_token(TokenType::Comparison);
                } else {
                    self.add_error_token("Found unexpected character while scanning: !");
                }
            }
            '\n' => self.add_token(TokenType::Newline),
            c if c == ' ' || c == '\t' || c == '\r' => {
                self.advance_while(|c| c == ' ' || c == '\t' || c == '\r');
                self.add_token(TokenType::Whitespace);
            }

            // literals and quoted names
            '\'' => self.match_delimited('\'', TokenType::String),
            '"' => self.match_delimited('"', TokenType::QuotedName),
            '`' => self.match_delimited('`', TokenType::QuotedName),
            '[' => self.match_delimited(']', TokenType::QuotedName),

            c if c.is_ascii_digit() => self.match_number(),

            // keywords and names
            c if c.is_alphabetic() || c == '_' => self.match_keyword_or_name(),

            _ => self.add_error_token(&format!(
                "Found unexpected character while scanning: {}",
                curr_char
            )),
        }
    }

    fn error_str(&self, error: &str) -> String {
        format!(
            "[line: {}, col: {}] Scanner error: {}",
            self.start_line, self.start_col, error
        )
    }
}

/// Case-insensitive lookup in the `sqlparser` keyword table (kept sorted).
fn lookup_keyword(word: &str) -> Option<Keyword> {
    let word_uppercase = word.to_uppercase();
    ALL_KEYWORDS
        .binary_search(&word_uppercase.as_str())
        .ok()
        .and_then(|idx| ALL_KEYWORDS_INDEX.get(idx).copied())
}

pub fn scan_sql(sql: &str) -> Vec<Token> {
    let mut scanner = Scanner::new(sql);
    scanner.scan();
    scanner.tokens
}
