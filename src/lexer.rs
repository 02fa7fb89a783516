use logos::Logos;

use crate::token::{Position, Token, TokenKind};

/// Lazily turns source text into tokens. The sequence always ends with a
/// single [TokenKind::Eof] token, after which the iterator is exhausted.
///
/// Characters that do not start any token are not an error here, they come
/// out as [TokenKind::Illegal] and the parser reports them.
pub struct Lexer<'a> {
    source: &'a str,
    inner: logos::Lexer<'a, TokenKind>,
    // Byte offset up to which line/column bookkeeping has been done
    scanned: usize,
    line: usize,
    line_start: usize,
    finished: bool,
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a str) -> Self {
        Self {
            source,
            inner: TokenKind::lexer(source),
            scanned: 0,
            line: 1,
            line_start: 0,
            finished: false,
        }
    }

    fn position_of(&mut self, offset: usize) -> Position {
        for (index, byte) in self.source.as_bytes()[self.scanned..offset].iter().enumerate() {
            if *byte == b'\n' {
                self.line += 1;
                self.line_start = self.scanned + index + 1;
            }
        }
        self.scanned = offset;

        Position {
            line: self.line,
            column: self.source[self.line_start..offset].chars().count() + 1,
        }
    }
}

impl<'a> Iterator for Lexer<'a> {
    type Item = Token<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished { return None }

        match self.inner.next() {
            Some(result) => {
                let span = self.inner.span();
                let position = self.position_of(span.start);
                let kind = result.unwrap_or(TokenKind::Illegal);
                let source = self.source;
                let literal = match kind {
                    // The quotes are not part of the string's value
                    TokenKind::String => &source[span.start + 1..span.end - 1],
                    _ => self.inner.slice(),
                };
                Some(Token::new(kind, literal, position))
            }
            None => {
                self.finished = true;
                let position = self.position_of(self.source.len());
                Some(Token::new(TokenKind::Eof, "", position))
            }
        }
    }
}
