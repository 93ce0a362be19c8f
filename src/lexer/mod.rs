//! Pull-based lexer: source bytes to a token stream with line/column info.
//!
//! Classification is by finite lookahead, not by a regex table: the
//! `'`-vs-quote and hex/bin/oct-prefix decisions need more lookahead than a
//! longest-match table naturally expresses, so this scanner is hand-written
//! instead of derived from a grammar/regex engine.

pub mod token;

use token::{Span, Token, TokenKind};

use crate::diagnostics::CompileError;

fn is_digit(c: u8) -> bool {
    c.is_ascii_digit()
}

fn is_hex_digit(c: u8) -> bool {
    c.is_ascii_hexdigit()
}

fn is_symbol_char(c: u8) -> bool {
    c.is_ascii_alphanumeric()
        || matches!(
            c,
            b'-' | b'+' | b'*' | b'/' | b'<' | b'>' | b'=' | b'!' | b'?' | b'_' | b':'
        )
}

pub struct Lexer<'a> {
    source: &'a [u8],
    pos: usize,
    line: usize,
    column: usize,
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a str) -> Self {
        Self {
            source: source.as_bytes(),
            pos: 0,
            line: 1,
            column: 1,
        }
    }

    fn peek(&self) -> Option<u8> {
        self.source.get(self.pos).copied()
    }

    fn peek_ahead(&self, offset: usize) -> Option<u8> {
        self.source.get(self.pos + offset).copied()
    }

    fn advance(&mut self) -> Option<u8> {
        let c = self.peek()?;
        self.pos += 1;
        if c == b'\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(c)
    }

    fn skip_whitespace(&mut self) {
        while matches!(self.peek(), Some(b' ' | b'\t' | b'\n' | b'\r')) {
            self.advance();
        }
    }

    fn skip_line_comment(&mut self) {
        while !matches!(self.peek(), Some(b'\n') | None) {
            self.advance();
        }
    }

    fn skip_trivia(&mut self) {
        self.skip_whitespace();
        while self.peek() == Some(b';') {
            self.skip_line_comment();
            self.skip_whitespace();
        }
    }

    /// Lex the whole source into a token stream, EOF included as the final
    /// token.
    pub fn lex(mut self) -> Result<Vec<Token>, CompileError> {
        let mut tokens = Vec::new();
        loop {
            let tok = self.next_token()?;
            let is_eof = tok.is_eof();
            tokens.push(tok);
            if is_eof {
                break;
            }
        }
        Ok(tokens)
    }

    fn next_token(&mut self) -> Result<Token, CompileError> {
        self.skip_trivia();

        let start_line = self.line;
        let start_column = self.column;

        let Some(c) = self.peek() else {
            return Ok(Token::new(TokenKind::Eof, Span::point(start_line, start_column)));
        };

        // Arrow `->`
        if c == b'-' && self.peek_ahead(1) == Some(b'>') {
            self.advance();
            self.advance();
            return Ok(Token::new(
                TokenKind::Arrow,
                Span::new(start_line, start_column, start_column + 2),
            ));
        }

        if let Some(kind) = match c {
            b'(' => Some(TokenKind::LParen),
            b')' => Some(TokenKind::RParen),
            b'[' => Some(TokenKind::LBracket),
            b']' => Some(TokenKind::RBracket),
            _ => None,
        } {
            self.advance();
            return Ok(Token::new(
                kind,
                Span::new(start_line, start_column, start_column + 1),
            ));
        }

        // Character literal or bare quote.
        if c == b'\'' {
            if let Some(next) = self.peek_ahead(1) {
                if next == b'\\' {
                    if let Some(b'\'') = self.peek_ahead(3) {
                        self.advance(); // '
                        self.advance(); // backslash
                        let escaped = self.advance().unwrap();
                        let decoded = match escaped {
                            b'n' => b'\n',
                            b't' => b'\t',
                            b'r' => b'\r',
                            b'\\' => b'\\',
                            b'\'' => b'\'',
                            b'0' => 0,
                            other => other,
                        };
                        if self.peek() != Some(b'\'') {
                            return Err(CompileError::lexical(
                                Span::point(self.line, self.column),
                                "unterminated char literal",
                            ));
                        }
                        self.advance();
                        return Ok(Token::new(
                            TokenKind::Char(decoded),
                            Span::new(start_line, start_column, self.column),
                        ));
                    }
                } else if next != b'\'' {
                    if let Some(b'\'') = self.peek_ahead(2) {
                        self.advance(); // '
                        let literal = self.advance().unwrap();
                        self.advance(); // closing '
                        return Ok(Token::new(
                            TokenKind::Char(literal),
                            Span::new(start_line, start_column, self.column),
                        ));
                    }
                }
            }
            self.advance();
            return Ok(Token::new(
                TokenKind::Quote,
                Span::new(start_line, start_column, start_column + 1),
            ));
        }

        // String literal: raw contents, `\` only skips the next char.
        if c == b'"' {
            self.advance();
            let start = self.pos;
            while !matches!(self.peek(), Some(b'"') | None) {
                if self.peek() == Some(b'\\') {
                    self.advance();
                }
                self.advance();
            }
            if self.peek() != Some(b'"') {
                return Err(CompileError::lexical(
                    Span::point(start_line, start_column),
                    "unterminated string literal",
                ));
            }
            let text = String::from_utf8_lossy(&self.source[start..self.pos]).into_owned();
            self.advance();
            return Ok(Token::new(
                TokenKind::Str(text),
                Span::new(start_line, start_column, self.column),
            ));
        }

        // Hex / binary / octal, lexeme retained whole for base inference.
        if c == b'0' && matches!(self.peek_ahead(1), Some(b'x' | b'X')) {
            let start = self.pos;
            self.advance();
            self.advance();
            while self.peek().is_some_and(is_hex_digit) {
                self.advance();
            }
            return Ok(self.number_token(start, start_line, start_column));
        }
        if c == b'0' && matches!(self.peek_ahead(1), Some(b'b' | b'B')) {
            let start = self.pos;
            self.advance();
            self.advance();
            while matches!(self.peek(), Some(b'0' | b'1')) {
                self.advance();
            }
            return Ok(self.number_token(start, start_line, start_column));
        }
        if c == b'0' && matches!(self.peek_ahead(1), Some(b'o' | b'O')) {
            let start = self.pos;
            self.advance();
            self.advance();
            while matches!(self.peek(), Some(b'0'..=b'7')) {
                self.advance();
            }
            return Ok(self.number_token(start, start_line, start_column));
        }

        // Negative number (a lone `-` falls through to the symbol case).
        if c == b'-' && self.peek_ahead(1).is_some_and(is_digit) {
            let start = self.pos;
            self.advance();
            while self.peek().is_some_and(|c| is_digit(c) || c == b'.') {
                self.advance();
            }
            return Ok(self.number_token(start, start_line, start_column));
        }

        // Decimal number.
        if is_digit(c) {
            let start = self.pos;
            while self.peek().is_some_and(|c| is_digit(c) || c == b'.') {
                self.advance();
            }
            return Ok(self.number_token(start, start_line, start_column));
        }

        // Symbol: any run of symbol-chars, operators included.
        if is_symbol_char(c) {
            let start = self.pos;
            while self.peek().is_some_and(is_symbol_char) {
                self.advance();
            }
            let text = String::from_utf8_lossy(&self.source[start..self.pos]).into_owned();
            return Ok(Token::new(
                TokenKind::Symbol(text),
                Span::new(start_line, start_column, self.column),
            ));
        }

        Err(CompileError::lexical(
            Span::point(start_line, start_column),
            format!("unexpected character '{}'", c as char),
        ))
    }

    fn number_token(&self, start: usize, line: usize, column: usize) -> Token {
        let text = String::from_utf8_lossy(&self.source[start..self.pos]).into_owned();
        Token::new(TokenKind::Number(text), Span::new(line, column, self.column))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(src: &str) -> Vec<TokenKind> {
        Lexer::new(src)
            .lex()
            .unwrap()
            .into_iter()
            .map(|t| t.kind)
            .collect()
    }

    #[test]
    fn lexes_arrow_and_brackets() {
        let k = kinds("[a :: Int] -> Float");
        assert_eq!(
            k,
            vec![
                TokenKind::LBracket,
                TokenKind::Symbol("a".into()),
                TokenKind::Symbol("::".into()),
                TokenKind::Symbol("Int".into()),
                TokenKind::RBracket,
                TokenKind::Arrow,
                TokenKind::Symbol("Float".into()),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn hex_bin_oct_lexemes_are_preserved() {
        let k = kinds("0xFF 0b1010 0o17");
        assert_eq!(
            k,
            vec![
                TokenKind::Number("0xFF".into()),
                TokenKind::Number("0b1010".into()),
                TokenKind::Number("0o17".into()),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn char_vs_quote_disambiguation() {
        let k = kinds("'a' '\\n' 'x");
        assert_eq!(
            k,
            vec![
                TokenKind::Char(b'a'),
                TokenKind::Char(b'\n'),
                TokenKind::Quote,
                TokenKind::Symbol("x".into()),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn string_escapes_are_not_decoded() {
        let k = kinds(r#""a\nb""#);
        assert_eq!(k, vec![TokenKind::Str("a\\nb".into()), TokenKind::Eof]);
    }

    #[test]
    fn negative_number_vs_bare_minus() {
        let k = kinds("-5 (- 1 2)");
        assert_eq!(
            k,
            vec![
                TokenKind::Number("-5".into()),
                TokenKind::LParen,
                TokenKind::Symbol("-".into()),
                TokenKind::Number("1".into()),
                TokenKind::Number("2".into()),
                TokenKind::RParen,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn line_comments_are_skipped() {
        let k = kinds("; comment\n42");
        assert_eq!(k, vec![TokenKind::Number("42".into()), TokenKind::Eof]);
    }

    #[test]
    fn unterminated_string_is_an_error() {
        let result = Lexer::new("\"abc").lex();
        assert!(result.is_err());
    }
}
