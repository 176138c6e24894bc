use crate::error::{ParseResult, SyntaxError};
use crate::keyword::Keyword;
use crate::token::{Token, TokenKind};

/// Streaming tokenizer over one statement buffer. Whitespace and all three
/// comment forms are consumed silently; every token carries its 1-based
/// source position.
#[derive(Debug)]
pub struct Lexer<'a> {
    input: &'a str,
    pos: usize,
    line: u32,
    column: u32,
    peeked: Option<Token>,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Lexer {
            input,
            pos: 0,
            line: 1,
            column: 1,
            peeked: None,
        }
    }

    pub fn next_token(&mut self) -> ParseResult<Token> {
        if let Some(token) = self.peeked.take() {
            return Ok(token);
        }
        self.scan_token()
    }

    pub fn peek(&mut self) -> ParseResult<&Token> {
        if self.peeked.is_none() {
            self.peeked = Some(self.scan_token()?);
        }
        Ok(self.peeked.as_ref().unwrap())
    }

    fn scan_token(&mut self) -> ParseResult<Token> {
        self.skip_trivia()?;

        let offset = self.pos;
        let line = self.line;
        let column = self.column;

        let token = |kind, lexeme: &str| Token {
            kind,
            lexeme: lexeme.to_string(),
            offset,
            line,
            column,
        };

        let c = match self.current_char() {
            None => return Ok(token(TokenKind::Eof, "")),
            Some(c) => c,
        };

        if c.is_ascii_digit() {
            return self.scan_number(offset, line, column);
        }
        if c == '\'' || c == '"' {
            return self.scan_string(c, offset, line, column);
        }
        if c == '`' {
            return self.scan_quoted_identifier(offset, line, column);
        }
        if c.is_alphabetic() || c == '_' {
            return Ok(self.scan_identifier(offset, line, column));
        }

        self.advance();
        let kind = match c {
            ',' => TokenKind::Comma,
            '(' => TokenKind::LParen,
            ')' => TokenKind::RParen,
            ';' => TokenKind::Semicolon,
            ':' => TokenKind::Colon,
            '.' => TokenKind::Dot,
            '+' => TokenKind::Plus,
            '*' => TokenKind::Star,
            '/' => TokenKind::Slash,
            '%' => TokenKind::Percent,
            '=' => TokenKind::Eq,
            '-' => {
                // greedy: -> and ->> before plain minus
                if self.current_char() == Some('>') {
                    self.advance();
                    if self.current_char() == Some('>') {
                        self.advance();
                        return Ok(token(TokenKind::JsonUnquote, "->>"));
                    }
                    return Ok(token(TokenKind::JsonExtract, "->"));
                }
                TokenKind::Minus
            }
            '<' => match self.current_char() {
                Some('=') => {
                    self.advance();
                    return Ok(token(TokenKind::LtEq, "<="));
                }
                Some('>') => {
                    self.advance();
                    return Ok(token(TokenKind::NotEq, "<>"));
                }
                _ => TokenKind::Lt,
            },
            '>' => {
                if self.current_char() == Some('=') {
                    self.advance();
                    return Ok(token(TokenKind::GtEq, ">="));
                }
                TokenKind::Gt
            }
            '!' => {
                if self.current_char() == Some('=') {
                    self.advance();
                    return Ok(token(TokenKind::NotEq, "!="));
                }
                return Err(SyntaxError::new("Unexpected character: !", offset, line, column));
            }
            '@' => {
                if self.current_char() == Some('@') {
                    self.advance();
                    return Ok(token(TokenKind::AtAt, "@@"));
                }
                return Err(SyntaxError::new("Unexpected character: @", offset, line, column));
            }
            _ => {
                return Err(SyntaxError::new(
                    format!("Unexpected character: {}", c),
                    offset,
                    line,
                    column,
                ))
            }
        };

        Ok(token(kind, &self.input[offset..self.pos]))
    }

    fn skip_trivia(&mut self) -> ParseResult<()> {
        loop {
            match self.current_char() {
                Some(c) if c.is_whitespace() => {
                    self.advance();
                }
                Some('#') => self.skip_line_comment(),
                Some('-') if self.lookahead(1) == Some('-') => {
                    self.skip_line_comment();
                }
                Some('/') if self.lookahead(1) == Some('*') => {
                    self.skip_block_comment()?;
                }
                _ => return Ok(()),
            }
        }
    }

    fn skip_line_comment(&mut self) {
        while let Some(c) = self.current_char() {
            self.advance();
            if c == '\n' {
                break;
            }
        }
    }

    fn skip_block_comment(&mut self) -> ParseResult<()> {
        let offset = self.pos;
        let line = self.line;
        let column = self.column;

        self.advance(); // '/'
        self.advance(); // '*'
        while let Some(c) = self.current_char() {
            if c == '*' && self.lookahead(1) == Some('/') {
                self.advance();
                self.advance();
                return Ok(());
            }
            self.advance();
        }
        Err(SyntaxError::new("Unterminated comment", offset, line, column))
    }

    fn scan_number(&mut self, offset: usize, line: u32, column: u32) -> ParseResult<Token> {
        while matches!(self.current_char(), Some(c) if c.is_ascii_digit()) {
            self.advance();
        }

        let mut kind = TokenKind::Integer;
        // a dot promotes to float only when a digit follows
        if self.current_char() == Some('.')
            && matches!(self.lookahead(1), Some(c) if c.is_ascii_digit())
        {
            self.advance();
            while matches!(self.current_char(), Some(c) if c.is_ascii_digit()) {
                self.advance();
            }
            kind = TokenKind::Float;
        }

        Ok(Token {
            kind,
            lexeme: self.input[offset..self.pos].to_string(),
            offset,
            line,
            column,
        })
    }

    fn scan_string(
        &mut self,
        delimiter: char,
        offset: usize,
        line: u32,
        column: u32,
    ) -> ParseResult<Token> {
        self.advance(); // opening quote
        let mut value = String::new();

        loop {
            match self.current_char() {
                None => {
                    return Err(SyntaxError::new(
                        "Unterminated string literal",
                        offset,
                        line,
                        column,
                    ))
                }
                Some(c) if c == delimiter => {
                    self.advance();
                    // doubled delimiter is a literal delimiter
                    if self.current_char() == Some(delimiter) {
                        self.advance();
                        value.push(delimiter);
                        continue;
                    }
                    break;
                }
                Some('\\') => {
                    self.advance();
                    let escaped = match self.current_char() {
                        None => {
                            return Err(SyntaxError::new(
                                "Unterminated string literal",
                                offset,
                                line,
                                column,
                            ))
                        }
                        Some('n') => '\n',
                        Some('r') => '\r',
                        Some('t') => '\t',
                        Some('0') => '\0',
                        // \\ \' \" and any other byte map to themselves
                        Some(other) => other,
                    };
                    self.advance();
                    value.push(escaped);
                }
                Some(c) => {
                    self.advance();
                    value.push(c);
                }
            }
        }

        Ok(Token {
            kind: TokenKind::StringLit,
            lexeme: value,
            offset,
            line,
            column,
        })
    }

    fn scan_quoted_identifier(
        &mut self,
        offset: usize,
        line: u32,
        column: u32,
    ) -> ParseResult<Token> {
        self.advance(); // opening backtick
        let mut value = String::new();

        loop {
            match self.current_char() {
                None => {
                    return Err(SyntaxError::new(
                        "Unterminated quoted identifier",
                        offset,
                        line,
                        column,
                    ))
                }
                Some('`') => {
                    self.advance();
                    if self.current_char() == Some('`') {
                        self.advance();
                        value.push('`');
                        continue;
                    }
                    break;
                }
                Some(c) => {
                    self.advance();
                    value.push(c);
                }
            }
        }

        // no keyword lookup for backtick identifiers
        Ok(Token {
            kind: TokenKind::QuotedIdentifier,
            lexeme: value,
            offset,
            line,
            column,
        })
    }

    fn scan_identifier(&mut self, offset: usize, line: u32, column: u32) -> Token {
        while matches!(self.current_char(), Some(c) if c.is_alphanumeric() || c == '_' || c == '$')
        {
            self.advance();
        }

        let lexeme = &self.input[offset..self.pos];
        let kind = match Keyword::from_ident(lexeme) {
            Some(keyword) => TokenKind::Keyword(keyword),
            None => TokenKind::Identifier,
        };

        Token {
            kind,
            lexeme: lexeme.to_string(),
            offset,
            line,
            column,
        }
    }

    fn current_char(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    fn lookahead(&self, n: usize) -> Option<char> {
        self.input[self.pos..].chars().nth(n)
    }

    fn advance(&mut self) {
        if let Some(c) = self.current_char() {
            self.pos += c.len_utf8();
            if c == '\n' {
                self.line += 1;
                self.column = 1;
            } else {
                self.column += 1;
            }
        }
    }
}

#[cfg(test)]
mod test {
    use crate::keyword::Keyword;
    use crate::token::TokenKind;

    use super::Lexer;

    fn kinds(input: &str) -> Vec<TokenKind> {
        let mut lexer = Lexer::new(input);
        let mut out = Vec::new();
        loop {
            let token = lexer.next_token().unwrap();
            if token.kind == TokenKind::Eof {
                return out;
            }
            out.push(token.kind);
        }
    }

    #[test]
    fn test_keywords_and_identifiers() {
        assert_eq!(
            vec![
                TokenKind::Keyword(Keyword::SELECT),
                TokenKind::Identifier,
                TokenKind::Keyword(Keyword::FROM),
                TokenKind::Identifier,
            ],
            kinds("select foo FROM bar")
        );
    }

    #[test]
    fn test_comments_skipped() {
        assert_eq!(
            vec![TokenKind::Integer, TokenKind::Integer],
            kinds("1 -- line\n# hash\n/* block\nspans */ 2")
        );
    }

    #[test]
    fn test_numbers() {
        assert_eq!(vec![TokenKind::Integer], kinds("123"));
        assert_eq!(vec![TokenKind::Float], kinds("12.5"));
        // dot not followed by a digit stays a punctuator
        assert_eq!(
            vec![TokenKind::Identifier, TokenKind::Dot, TokenKind::Identifier],
            kinds("t.c")
        );
        assert_eq!(
            vec![TokenKind::Integer, TokenKind::Dot, TokenKind::Identifier],
            kinds("1.e")
        );
    }

    #[test]
    fn test_string_escapes() {
        let mut lexer = Lexer::new(r"'a\nb'");
        assert_eq!("a\nb", lexer.next_token().unwrap().lexeme);

        let mut lexer = Lexer::new("'it''s'");
        assert_eq!("it's", lexer.next_token().unwrap().lexeme);

        let mut lexer = Lexer::new(r"'\x'");
        assert_eq!("x", lexer.next_token().unwrap().lexeme);

        let mut lexer = Lexer::new("\"dq\"");
        let token = lexer.next_token().unwrap();
        assert_eq!(TokenKind::StringLit, token.kind);
        assert_eq!("dq", token.lexeme);
    }

    #[test]
    fn test_unterminated_string() {
        let mut lexer = Lexer::new("'oops");
        let err = lexer.next_token().unwrap_err();
        assert_eq!(1, err.line);
        assert_eq!(1, err.column);
    }

    #[test]
    fn test_backtick_identifier_no_keyword_lookup() {
        let mut lexer = Lexer::new("`select`");
        let token = lexer.next_token().unwrap();
        assert_eq!(TokenKind::QuotedIdentifier, token.kind);
        assert_eq!("select", token.lexeme);
    }

    #[test]
    fn test_operators_greedy() {
        assert_eq!(
            vec![
                TokenKind::LtEq,
                TokenKind::GtEq,
                TokenKind::NotEq,
                TokenKind::NotEq,
                TokenKind::JsonUnquote,
                TokenKind::JsonExtract,
                TokenKind::AtAt,
            ],
            kinds("<= >= <> != ->> -> @@")
        );
    }

    #[test]
    fn test_bare_at_is_invalid() {
        let mut lexer = Lexer::new("@");
        assert!(lexer.next_token().is_err());
    }

    #[test]
    fn test_positions() {
        let mut lexer = Lexer::new("select\n  id");
        let select = lexer.next_token().unwrap();
        assert_eq!((1, 1, 0), (select.line, select.column, select.offset));
        let id = lexer.next_token().unwrap();
        assert_eq!((2, 3, 9), (id.line, id.column, id.offset));
    }

    #[test]
    fn test_peek_does_not_consume() {
        let mut lexer = Lexer::new("select 1");
        assert_eq!(
            TokenKind::Keyword(Keyword::SELECT),
            lexer.peek().unwrap().kind
        );
        assert_eq!(
            TokenKind::Keyword(Keyword::SELECT),
            lexer.next_token().unwrap().kind
        );
    }
}
