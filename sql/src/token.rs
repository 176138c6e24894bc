use crate::keyword::Keyword;

/// Source location of a token, 1-based line and column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Pos {
    pub offset: usize,
    pub line: u32,
    pub column: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Integer,
    Float,
    StringLit,
    Identifier,
    QuotedIdentifier,
    Keyword(Keyword),

    Comma,
    LParen,
    RParen,
    Semicolon,
    Colon,
    Dot,
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Eq,
    /// `<>` and `!=`
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
    /// `->`
    JsonExtract,
    /// `->>`
    JsonUnquote,
    /// `@@`
    AtAt,

    Eof,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub lexeme: String,
    pub offset: usize,
    pub line: u32,
    pub column: u32,
}

impl Token {
    pub fn pos(&self) -> Pos {
        Pos {
            offset: self.offset,
            line: self.line,
            column: self.column,
        }
    }

    pub fn is_keyword(&self, keyword: Keyword) -> bool {
        self.kind == TokenKind::Keyword(keyword)
    }

    pub fn keyword(&self) -> Option<Keyword> {
        match self.kind {
            TokenKind::Keyword(k) => Some(k),
            _ => None,
        }
    }

    /// True where the grammar admits a name: plain identifiers, quoted
    /// identifiers, and non-reserved keywords.
    pub fn is_identifier_like(&self) -> bool {
        match self.kind {
            TokenKind::Identifier | TokenKind::QuotedIdentifier => true,
            TokenKind::Keyword(k) => !k.reserved(),
            _ => false,
        }
    }

    /// Human-readable form for error messages.
    pub fn describe(&self) -> String {
        match self.kind {
            TokenKind::Eof => "end of input".to_string(),
            TokenKind::StringLit => format!("'{}'", self.lexeme),
            _ => self.lexeme.clone(),
        }
    }
}
