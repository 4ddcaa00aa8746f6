//! Indentation-sensitive lexer for the adder language
//!
//! The lexer produces one token per `advance` call and keeps the last
//! produced token available through `current`. Layout is significant:
//! after every `Newline` the lexer measures the leading whitespace of
//! the next non-blank, non-comment line and synthesizes `Indent` and
//! `Dedent` tokens for the change, one level per token. One indent
//! level is exactly two spaces; an odd number of leading spaces is a
//! lexical error.

use std::iter::Peekable;
use std::str::Chars;

use crate::error::LexicalError;
use crate::token::Token;

/// Punctuation characters emitted as `Token::Char`
const SPECIAL: &[char] = &['+', '-', '*', '/', '(', ')', ',', '.', ':'];

/// Characters that may start a two-character comparison operator
const COMPARE_STARTERS: &[char] = &['=', '!', '<', '>'];

pub struct Lexer<'a> {
    input: Peekable<Chars<'a>>,
    current: Token,
    /// Indent depth of the line being tokenized, in units of two spaces
    current_indent: i64,
    /// Levels still owed to the token stream: positive emits `Indent`,
    /// negative emits `Dedent`, one level per `advance`
    pending_indent: i64,
    line: usize,
}

impl<'a> Lexer<'a> {
    /// Create a lexer and produce the first real token, skipping any
    /// leading blank and comment lines.
    pub fn new(input: &'a str) -> Result<Self, LexicalError> {
        let mut lexer = Self {
            input: input.chars().peekable(),
            // A virtual newline in front of the source routes the first
            // line through layout resolution like any other line.
            current: Token::Newline,
            current_indent: 0,
            pending_indent: 0,
            line: 1,
        };
        lexer.advance()?;
        Ok(lexer)
    }

    /// The last token produced by `advance`
    pub fn current(&self) -> &Token {
        &self.current
    }

    /// Line number of the position being tokenized, starting at 1
    pub fn line(&self) -> usize {
        self.line
    }

    /// Produce and return the next token
    pub fn advance(&mut self) -> Result<Token, LexicalError> {
        let token = self.next_token()?;
        self.current = token.clone();
        Ok(token)
    }

    fn next_token(&mut self) -> Result<Token, LexicalError> {
        if self.current == Token::Eof {
            return Ok(Token::Eof);
        }
        if self.current == Token::Newline {
            self.resolve_layout()?;
        }
        if self.pending_indent > 0 {
            self.pending_indent -= 1;
            return Ok(Token::Indent);
        }
        if self.pending_indent < 0 {
            self.pending_indent += 1;
            return Ok(Token::Dedent);
        }

        self.skip_spaces();

        match self.input.peek().copied() {
            None => Ok(self.at_end()),
            Some(c) if c.is_ascii_digit() => self.lex_number(),
            Some(c @ ('\'' | '"')) => {
                self.bump();
                self.lex_string(c)
            }
            Some(c) if c.is_ascii_alphabetic() || c == '_' => Ok(self.lex_name()),
            Some('\n') => {
                self.bump();
                Ok(Token::Newline)
            }
            Some('#') => {
                // A trailing comment swallows the rest of the line and
                // behaves exactly like the newline that ends it.
                if self.skip_comment() {
                    Ok(Token::Newline)
                } else {
                    Ok(self.at_end())
                }
            }
            Some(c) if COMPARE_STARTERS.contains(&c) => self.lex_comparison(c),
            Some(c) if SPECIAL.contains(&c) => {
                self.bump();
                Ok(Token::Char(c))
            }
            Some(c) => Err(self.error(format!("unexpected character {c:?}"))),
        }
    }

    /// End-of-input rule: a `Newline` is owed first unless the last
    /// token already was a layout token.
    fn at_end(&self) -> Token {
        match self.current {
            Token::Newline | Token::Indent | Token::Dedent => Token::Eof,
            _ => Token::Newline,
        }
    }

    /// Skip blank and comment-only lines, then derive the indentation
    /// delta of the next logical line. Runs only when the last token
    /// was a `Newline`.
    fn resolve_layout(&mut self) -> Result<(), LexicalError> {
        loop {
            let mut spaces = 0usize;
            while self.input.peek() == Some(&' ') {
                self.bump();
                spaces += 1;
            }
            match self.input.peek().copied() {
                Some('\n') => {
                    self.bump();
                }
                Some('#') => {
                    self.skip_comment();
                }
                None => {
                    // End of input closes every open block
                    self.pending_indent = -self.current_indent;
                    self.current_indent = 0;
                    return Ok(());
                }
                Some(_) => {
                    if spaces % 2 == 1 {
                        return Err(self.error("invalid indent"));
                    }
                    let new_indent = (spaces / 2) as i64;
                    self.pending_indent = new_indent - self.current_indent;
                    self.current_indent = new_indent;
                    return Ok(());
                }
            }
        }
    }

    fn lex_number(&mut self) -> Result<Token, LexicalError> {
        let mut digits = String::new();
        while let Some(c) = self.input.peek().copied() {
            if !c.is_ascii_digit() {
                break;
            }
            digits.push(c);
            self.bump();
        }
        match self.input.peek().copied() {
            None | Some(' ') | Some('\n') => {}
            Some(c) if SPECIAL.contains(&c) => {}
            Some(c) => {
                return Err(self.error(format!("unexpected character {c:?} after a number")));
            }
        }
        let value = digits
            .parse::<i64>()
            .map_err(|_| self.error("number literal out of range"))?;
        Ok(Token::Number(value))
    }

    fn lex_string(&mut self, quote: char) -> Result<Token, LexicalError> {
        let mut text = String::new();
        loop {
            match self.bump() {
                None => return Err(self.error("expected closing quote")),
                Some(c) if c == quote => break,
                Some('\\') => match self.bump() {
                    Some('n') => text.push('\n'),
                    Some('t') => text.push('\t'),
                    Some(other) => text.push(other),
                    None => return Err(self.error("expected closing quote")),
                },
                Some(c) => text.push(c),
            }
        }
        Ok(Token::String(text))
    }

    fn lex_name(&mut self) -> Token {
        let mut name = String::new();
        while let Some(c) = self.input.peek().copied() {
            if c.is_ascii_alphanumeric() || c == '_' {
                name.push(c);
                self.bump();
            } else {
                break;
            }
        }
        match name.as_str() {
            "class" => Token::Class,
            "return" => Token::Return,
            "if" => Token::If,
            "else" => Token::Else,
            "def" => Token::Def,
            "print" => Token::Print,
            "and" => Token::And,
            "or" => Token::Or,
            "not" => Token::Not,
            "None" => Token::None,
            "True" => Token::True,
            "False" => Token::False,
            _ => Token::Id(name),
        }
    }

    fn lex_comparison(&mut self, first: char) -> Result<Token, LexicalError> {
        self.bump();
        let followed_by_eq = self.input.peek() == Some(&'=');
        match (first, followed_by_eq) {
            ('=', true) => {
                self.bump();
                Ok(Token::Eq)
            }
            ('!', true) => {
                self.bump();
                Ok(Token::NotEq)
            }
            ('<', true) => {
                self.bump();
                Ok(Token::LessOrEq)
            }
            ('>', true) => {
                self.bump();
                Ok(Token::GreaterOrEq)
            }
            ('=', false) => Ok(Token::Char('=')),
            ('<', false) => Ok(Token::Char('<')),
            ('>', false) => Ok(Token::Char('>')),
            _ => Err(self.error("expected '=' after '!'")),
        }
    }

    /// Consume a `#` comment through its terminating newline. Returns
    /// false when the input ends inside the comment.
    fn skip_comment(&mut self) -> bool {
        while let Some(c) = self.bump() {
            if c == '\n' {
                return true;
            }
        }
        false
    }

    fn skip_spaces(&mut self) {
        while self.input.peek() == Some(&' ') {
            self.bump();
        }
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.input.next();
        if c == Some('\n') {
            self.line += 1;
        }
        c
    }

    fn error(&self, message: impl Into<String>) -> LexicalError {
        LexicalError(format!("line {}: {}", self.line, message.into()))
    }
}
