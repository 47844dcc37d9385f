//! Lexer (tokenizer) for HostLang source code
//!
//! Converts raw source text into a flat [`Token`] stream consumed by the parser.
//! `of` is not a keyword here; the parser recognises it contextually.

use super::ast::SourceLocation;
use std::fmt;
use thiserror::Error;

/// All token variants produced by the lexer.
///
/// Every variant carries a [`SourceLocation`] so that parse errors can report
/// an accurate line and column without a separate token→location table.
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    // Literals
    Number(f64, SourceLocation),
    BigInt(String, SourceLocation),
    StringLiteral(String, SourceLocation),

    // Identifiers
    Ident(String, SourceLocation),

    // Keywords
    Let(SourceLocation),
    Const(SourceLocation),
    Var(SourceLocation),
    Function(SourceLocation),
    Async(SourceLocation),
    Await(SourceLocation),
    Return(SourceLocation),
    If(SourceLocation),
    Else(SourceLocation),
    While(SourceLocation),
    Do(SourceLocation),
    For(SourceLocation),
    Break(SourceLocation),
    Continue(SourceLocation),
    Throw(SourceLocation),
    New(SourceLocation),
    Typeof(SourceLocation),
    True(SourceLocation),
    False(SourceLocation),
    Null(SourceLocation),

    // Arithmetic
    Plus(SourceLocation),     // +
    Minus(SourceLocation),    // -
    Star(SourceLocation),     // *
    StarStar(SourceLocation), // **
    Slash(SourceLocation),    // /
    Percent(SourceLocation),  // %

    // Comparison
    EqEq(SourceLocation),     // ==
    NotEq(SourceLocation),    // !=
    EqEqEq(SourceLocation),   // ===
    NotEqEq(SourceLocation),  // !==
    Lt(SourceLocation),       // <
    Le(SourceLocation),       // <=
    Gt(SourceLocation),       // >
    Ge(SourceLocation),       // >=

    // Logical
    AndAnd(SourceLocation),           // &&
    OrOr(SourceLocation),             // ||
    QuestionQuestion(SourceLocation), // ??
    Bang(SourceLocation),             // !

    // Bitwise
    Amp(SourceLocation),   // &
    Pipe(SourceLocation),  // |
    Caret(SourceLocation), // ^
    Tilde(SourceLocation), // ~
    LtLt(SourceLocation),  // <<
    GtGt(SourceLocation),  // >>

    // Assignment
    Eq(SourceLocation),        // =
    PlusEq(SourceLocation),    // +=
    MinusEq(SourceLocation),   // -=
    StarEq(SourceLocation),    // *=
    SlashEq(SourceLocation),   // /=
    PercentEq(SourceLocation), // %=

    // Increment/Decrement
    PlusPlus(SourceLocation),   // ++
    MinusMinus(SourceLocation), // --

    // Member access and functions
    Dot(SourceLocation),      // .
    Ellipsis(SourceLocation), // ...
    FatArrow(SourceLocation), // =>

    // Ternary
    Question(SourceLocation), // ?
    Colon(SourceLocation),    // :

    // Punctuation
    LParen(SourceLocation),    // (
    RParen(SourceLocation),    // )
    LBrace(SourceLocation),    // {
    RBrace(SourceLocation),    // }
    LBracket(SourceLocation),  // [
    RBracket(SourceLocation),  // ]
    Semicolon(SourceLocation), // ;
    Comma(SourceLocation),     // ,

    // End of file
    Eof(SourceLocation),
}

impl Token {
    /// Returns the source location where this token appears.
    pub fn location(&self) -> SourceLocation {
        match self {
            Token::Number(_, loc)
            | Token::BigInt(_, loc)
            | Token::StringLiteral(_, loc)
            | Token::Ident(_, loc)
            | Token::Let(loc)
            | Token::Const(loc)
            | Token::Var(loc)
            | Token::Function(loc)
            | Token::Async(loc)
            | Token::Await(loc)
            | Token::Return(loc)
            | Token::If(loc)
            | Token::Else(loc)
            | Token::While(loc)
            | Token::Do(loc)
            | Token::For(loc)
            | Token::Break(loc)
            | Token::Continue(loc)
            | Token::Throw(loc)
            | Token::New(loc)
            | Token::Typeof(loc)
            | Token::True(loc)
            | Token::False(loc)
            | Token::Null(loc)
            | Token::Plus(loc)
            | Token::Minus(loc)
            | Token::Star(loc)
            | Token::StarStar(loc)
            | Token::Slash(loc)
            | Token::Percent(loc)
            | Token::EqEq(loc)
            | Token::NotEq(loc)
            | Token::EqEqEq(loc)
            | Token::NotEqEq(loc)
            | Token::Lt(loc)
            | Token::Le(loc)
            | Token::Gt(loc)
            | Token::Ge(loc)
            | Token::AndAnd(loc)
            | Token::OrOr(loc)
            | Token::QuestionQuestion(loc)
            | Token::Bang(loc)
            | Token::Amp(loc)
            | Token::Pipe(loc)
            | Token::Caret(loc)
            | Token::Tilde(loc)
            | Token::LtLt(loc)
            | Token::GtGt(loc)
            | Token::Eq(loc)
            | Token::PlusEq(loc)
            | Token::MinusEq(loc)
            | Token::StarEq(loc)
            | Token::SlashEq(loc)
            | Token::PercentEq(loc)
            | Token::PlusPlus(loc)
            | Token::MinusMinus(loc)
            | Token::Dot(loc)
            | Token::Ellipsis(loc)
            | Token::FatArrow(loc)
            | Token::Question(loc)
            | Token::Colon(loc)
            | Token::LParen(loc)
            | Token::RParen(loc)
            | Token::LBrace(loc)
            | Token::RBrace(loc)
            | Token::LBracket(loc)
            | Token::RBracket(loc)
            | Token::Semicolon(loc)
            | Token::Comma(loc)
            | Token::Eof(loc) => *loc,
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Number(n, _) => write!(f, "number {}", n),
            Token::BigInt(digits, _) => write!(f, "bigint {}n", digits),
            Token::StringLiteral(s, _) => write!(f, "string \"{}\"", s),
            Token::Ident(s, _) => write!(f, "identifier '{}'", s),
            Token::Let(_) => write!(f, "'let'"),
            Token::Const(_) => write!(f, "'const'"),
            Token::Var(_) => write!(f, "'var'"),
            Token::Function(_) => write!(f, "'function'"),
            Token::Async(_) => write!(f, "'async'"),
            Token::Await(_) => write!(f, "'await'"),
            Token::Return(_) => write!(f, "'return'"),
            Token::If(_) => write!(f, "'if'"),
            Token::Else(_) => write!(f, "'else'"),
            Token::While(_) => write!(f, "'while'"),
            Token::Do(_) => write!(f, "'do'"),
            Token::For(_) => write!(f, "'for'"),
            Token::Break(_) => write!(f, "'break'"),
            Token::Continue(_) => write!(f, "'continue'"),
            Token::Throw(_) => write!(f, "'throw'"),
            Token::New(_) => write!(f, "'new'"),
            Token::Typeof(_) => write!(f, "'typeof'"),
            Token::True(_) => write!(f, "'true'"),
            Token::False(_) => write!(f, "'false'"),
            Token::Null(_) => write!(f, "'null'"),
            Token::Plus(_) => write!(f, "'+'"),
            Token::Minus(_) => write!(f, "'-'"),
            Token::Star(_) => write!(f, "'*'"),
            Token::StarStar(_) => write!(f, "'**'"),
            Token::Slash(_) => write!(f, "'/'"),
            Token::Percent(_) => write!(f, "'%'"),
            Token::EqEq(_) => write!(f, "'=='"),
            Token::NotEq(_) => write!(f, "'!='"),
            Token::EqEqEq(_) => write!(f, "'==='"),
            Token::NotEqEq(_) => write!(f, "'!=='"),
            Token::Lt(_) => write!(f, "'<'"),
            Token::Le(_) => write!(f, "'<='"),
            Token::Gt(_) => write!(f, "'>'"),
            Token::Ge(_) => write!(f, "'>='"),
            Token::AndAnd(_) => write!(f, "'&&'"),
            Token::OrOr(_) => write!(f, "'||'"),
            Token::QuestionQuestion(_) => write!(f, "'??'"),
            Token::Bang(_) => write!(f, "'!'"),
            Token::Amp(_) => write!(f, "'&'"),
            Token::Pipe(_) => write!(f, "'|'"),
            Token::Caret(_) => write!(f, "'^'"),
            Token::Tilde(_) => write!(f, "'~'"),
            Token::LtLt(_) => write!(f, "'<<'"),
            Token::GtGt(_) => write!(f, "'>>'"),
            Token::Eq(_) => write!(f, "'='"),
            Token::PlusEq(_) => write!(f, "'+='"),
            Token::MinusEq(_) => write!(f, "'-='"),
            Token::StarEq(_) => write!(f, "'*='"),
            Token::SlashEq(_) => write!(f, "'/='"),
            Token::PercentEq(_) => write!(f, "'%='"),
            Token::PlusPlus(_) => write!(f, "'++'"),
            Token::MinusMinus(_) => write!(f, "'--'"),
            Token::Dot(_) => write!(f, "'.'"),
            Token::Ellipsis(_) => write!(f, "'...'"),
            Token::FatArrow(_) => write!(f, "'=>'"),
            Token::Question(_) => write!(f, "'?'"),
            Token::Colon(_) => write!(f, "':'"),
            Token::LParen(_) => write!(f, "'('"),
            Token::RParen(_) => write!(f, "')'"),
            Token::LBrace(_) => write!(f, "'{{'"),
            Token::RBrace(_) => write!(f, "'}}'"),
            Token::LBracket(_) => write!(f, "'['"),
            Token::RBracket(_) => write!(f, "']'"),
            Token::Semicolon(_) => write!(f, "';'"),
            Token::Comma(_) => write!(f, "','"),
            Token::Eof(_) => write!(f, "end of input"),
        }
    }
}

/// Lexer error type
#[derive(Debug, Clone, Error)]
#[error("line {}, column {}: {message}", .location.line, .location.column)]
pub struct LexError {
    pub message: String,
    pub location: SourceLocation,
}

/// Lexer for HostLang source code
pub struct Lexer {
    input: Vec<char>,
    position: usize,
    line: usize,
    column: usize,
}

impl Lexer {
    /// Create a new lexer for the given source string.
    pub fn new(input: &str) -> Self {
        Self {
            input: input.chars().collect(),
            position: 0,
            line: 1,
            column: 1,
        }
    }

    /// Tokenize the entire input
    pub fn tokenize(&mut self) -> Result<Vec<Token>, LexError> {
        let mut tokens = Vec::new();

        loop {
            self.skip_whitespace_and_comments()?;

            if self.is_at_end() {
                tokens.push(Token::Eof(self.current_location()));
                break;
            }

            tokens.push(self.next_token()?);
        }

        Ok(tokens)
    }

    /// Get next token
    fn next_token(&mut self) -> Result<Token, LexError> {
        let loc = self.current_location();
        let ch = self.advance().ok_or_else(|| LexError {
            message: "Unexpected end of input".to_string(),
            location: loc,
        })?;

        match ch {
            '"' | '\'' => self.string_literal(ch, loc),
            '0'..='9' => self.number_literal(ch, loc),
            '.' if self.peek().is_some_and(|c| c.is_ascii_digit()) => {
                self.number_literal(ch, loc)
            }
            'a'..='z' | 'A'..='Z' | '_' | '$' => Ok(self.identifier_or_keyword(ch, loc)),

            '+' => Ok(self.pick(loc, &[('+', Token::PlusPlus), ('=', Token::PlusEq)], Token::Plus)),
            '-' => Ok(self.pick(
                loc,
                &[('-', Token::MinusMinus), ('=', Token::MinusEq)],
                Token::Minus,
            )),
            '*' => {
                if self.peek() == Some('*') {
                    self.advance();
                    Ok(Token::StarStar(loc))
                } else {
                    Ok(self.pick(loc, &[('=', Token::StarEq)], Token::Star))
                }
            }
            '/' => Ok(self.pick(loc, &[('=', Token::SlashEq)], Token::Slash)),
            '%' => Ok(self.pick(loc, &[('=', Token::PercentEq)], Token::Percent)),
            '=' => {
                if self.peek() == Some('=') {
                    self.advance();
                    Ok(self.pick(loc, &[('=', Token::EqEqEq)], Token::EqEq))
                } else {
                    Ok(self.pick(loc, &[('>', Token::FatArrow)], Token::Eq))
                }
            }
            '!' => {
                if self.peek() == Some('=') {
                    self.advance();
                    Ok(self.pick(loc, &[('=', Token::NotEqEq)], Token::NotEq))
                } else {
                    Ok(Token::Bang(loc))
                }
            }
            '<' => Ok(self.pick(loc, &[('=', Token::Le), ('<', Token::LtLt)], Token::Lt)),
            '>' => Ok(self.pick(loc, &[('=', Token::Ge), ('>', Token::GtGt)], Token::Gt)),
            '&' => Ok(self.pick(loc, &[('&', Token::AndAnd)], Token::Amp)),
            '|' => Ok(self.pick(loc, &[('|', Token::OrOr)], Token::Pipe)),
            '?' => Ok(self.pick(loc, &[('?', Token::QuestionQuestion)], Token::Question)),
            '.' => {
                if self.peek() == Some('.') && self.peek_ahead(1) == Some('.') {
                    self.advance();
                    self.advance();
                    Ok(Token::Ellipsis(loc))
                } else {
                    Ok(Token::Dot(loc))
                }
            }
            '^' => Ok(Token::Caret(loc)),
            '~' => Ok(Token::Tilde(loc)),
            ':' => Ok(Token::Colon(loc)),
            '(' => Ok(Token::LParen(loc)),
            ')' => Ok(Token::RParen(loc)),
            '{' => Ok(Token::LBrace(loc)),
            '}' => Ok(Token::RBrace(loc)),
            '[' => Ok(Token::LBracket(loc)),
            ']' => Ok(Token::RBracket(loc)),
            ';' => Ok(Token::Semicolon(loc)),
            ',' => Ok(Token::Comma(loc)),

            _ => Err(LexError {
                message: format!("Invalid or unexpected token '{}'", ch),
                location: loc,
            }),
        }
    }

    /// Consume the first matching follow-up character, or fall back to `single`.
    fn pick(
        &mut self,
        loc: SourceLocation,
        pairs: &[(char, fn(SourceLocation) -> Token)],
        single: fn(SourceLocation) -> Token,
    ) -> Token {
        for (next, make) in pairs {
            if self.peek() == Some(*next) {
                self.advance();
                return make(loc);
            }
        }
        single(loc)
    }

    /// Parse a string literal delimited by `quote`
    fn string_literal(&mut self, quote: char, loc: SourceLocation) -> Result<Token, LexError> {
        let mut string = String::new();

        while let Some(ch) = self.peek() {
            if ch == quote {
                self.advance();
                return Ok(Token::StringLiteral(string, loc));
            }
            if ch == '\n' {
                break;
            }

            if ch == '\\' {
                self.advance();
                let escaped = self.advance().ok_or_else(|| LexError {
                    message: "Unterminated string literal".to_string(),
                    location: loc,
                })?;

                let unescaped = match escaped {
                    'n' => '\n',
                    't' => '\t',
                    'r' => '\r',
                    '0' => '\0',
                    // \\ \' \" and any other escaped character stand for themselves
                    other => other,
                };
                string.push(unescaped);
            } else {
                string.push(ch);
                self.advance();
            }
        }

        Err(LexError {
            message: "Unterminated string literal".to_string(),
            location: loc,
        })
    }

    /// Parse numeric literal: decimal, fractional, exponent, hex, or BigInt (`12n`)
    fn number_literal(&mut self, first: char, loc: SourceLocation) -> Result<Token, LexError> {
        if first == '0' && matches!(self.peek(), Some('x' | 'X')) {
            self.advance();
            let digits = self.take_while(|c| c.is_ascii_hexdigit() || c == '_');
            let digits = digits.replace('_', "");
            let value = u64::from_str_radix(&digits, 16).map_err(|_| LexError {
                message: format!("Invalid hexadecimal literal 0x{}", digits),
                location: loc,
            })?;
            return Ok(Token::Number(value as f64, loc));
        }

        let mut text = String::new();
        text.push(first);
        text.push_str(&self.take_while(|c| c.is_ascii_digit() || c == '_'));

        if self.peek() == Some('n') && first != '.' {
            self.advance();
            return Ok(Token::BigInt(text.replace('_', ""), loc));
        }

        if first != '.' && self.peek() == Some('.') && self.peek_ahead(1) != Some('.') {
            self.advance();
            text.push('.');
            text.push_str(&self.take_while(|c| c.is_ascii_digit()));
        }
        if matches!(self.peek(), Some('e' | 'E')) {
            let sign = self.peek_ahead(1);
            let digit_at = if matches!(sign, Some('+' | '-')) { 2 } else { 1 };
            if self.peek_ahead(digit_at).is_some_and(|c| c.is_ascii_digit()) {
                for _ in 0..digit_at {
                    if let Some(c) = self.advance() {
                        text.push(c);
                    }
                }
                text.push_str(&self.take_while(|c| c.is_ascii_digit()));
            }
        }

        let value = text.replace('_', "").parse::<f64>().map_err(|_| LexError {
            message: format!("Invalid number literal {}", text),
            location: loc,
        })?;
        Ok(Token::Number(value, loc))
    }

    /// Parse identifier or keyword
    fn identifier_or_keyword(&mut self, first: char, loc: SourceLocation) -> Token {
        let mut ident = String::new();
        ident.push(first);
        ident.push_str(&self.take_while(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$'));

        match ident.as_str() {
            "let" => Token::Let(loc),
            "const" => Token::Const(loc),
            "var" => Token::Var(loc),
            "function" => Token::Function(loc),
            "async" => Token::Async(loc),
            "await" => Token::Await(loc),
            "return" => Token::Return(loc),
            "if" => Token::If(loc),
            "else" => Token::Else(loc),
            "while" => Token::While(loc),
            "do" => Token::Do(loc),
            "for" => Token::For(loc),
            "break" => Token::Break(loc),
            "continue" => Token::Continue(loc),
            "throw" => Token::Throw(loc),
            "new" => Token::New(loc),
            "typeof" => Token::Typeof(loc),
            "true" => Token::True(loc),
            "false" => Token::False(loc),
            "null" => Token::Null(loc),
            _ => Token::Ident(ident, loc),
        }
    }

    fn take_while(&mut self, pred: impl Fn(char) -> bool) -> String {
        let mut out = String::new();
        while let Some(ch) = self.peek() {
            if !pred(ch) {
                break;
            }
            out.push(ch);
            self.advance();
        }
        out
    }

    /// Skip whitespace and comments
    fn skip_whitespace_and_comments(&mut self) -> Result<(), LexError> {
        loop {
            match self.peek() {
                Some(c) if c.is_whitespace() => {
                    self.advance();
                }
                Some('/') => {
                    if self.peek_ahead(1) == Some('/') {
                        self.skip_line_comment();
                    } else if self.peek_ahead(1) == Some('*') {
                        self.skip_block_comment()?;
                    } else {
                        break;
                    }
                }
                _ => break,
            }
        }
        Ok(())
    }

    /// Skip single-line comment (// ...)
    fn skip_line_comment(&mut self) {
        while let Some(ch) = self.peek() {
            if ch == '\n' {
                break;
            }
            self.advance();
        }
    }

    /// Skip multi-line comment (/* ... */)
    fn skip_block_comment(&mut self) -> Result<(), LexError> {
        let start_loc = self.current_location();
        self.advance(); // skip '/'
        self.advance(); // skip '*'

        while !self.is_at_end() {
            if self.peek() == Some('*') && self.peek_ahead(1) == Some('/') {
                self.advance();
                self.advance();
                return Ok(());
            }
            self.advance();
        }

        Err(LexError {
            message: "Unterminated block comment".to_string(),
            location: start_loc,
        })
    }

    /// Peek at current character without consuming
    fn peek(&self) -> Option<char> {
        self.input.get(self.position).copied()
    }

    /// Peek ahead n characters
    fn peek_ahead(&self, n: usize) -> Option<char> {
        self.input.get(self.position + n).copied()
    }

    /// Advance to next character
    fn advance(&mut self) -> Option<char> {
        let ch = *self.input.get(self.position)?;
        self.position += 1;

        if ch == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }

        Some(ch)
    }

    /// Check if at end of input
    fn is_at_end(&self) -> bool {
        self.position >= self.input.len()
    }

    /// Get current source location
    fn current_location(&self) -> SourceLocation {
        SourceLocation::new(self.line, self.column)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_tokens() {
        let mut lexer = Lexer::new("let x = 1;");
        let tokens = lexer.tokenize().unwrap();

        assert!(matches!(tokens[0], Token::Let(_)));
        assert!(matches!(tokens[1], Token::Ident(ref s, _) if s == "x"));
        assert!(matches!(tokens[2], Token::Eq(_)));
        assert!(matches!(tokens[3], Token::Number(n, _) if n == 1.0));
        assert!(matches!(tokens[4], Token::Semicolon(_)));
        assert!(matches!(tokens[5], Token::Eof(_)));
    }

    #[test]
    fn test_operators() {
        let mut lexer = Lexer::new("++ -- += === !== => ** ?? ... <<");
        let tokens = lexer.tokenize().unwrap();

        assert!(matches!(tokens[0], Token::PlusPlus(_)));
        assert!(matches!(tokens[1], Token::MinusMinus(_)));
        assert!(matches!(tokens[2], Token::PlusEq(_)));
        assert!(matches!(tokens[3], Token::EqEqEq(_)));
        assert!(matches!(tokens[4], Token::NotEqEq(_)));
        assert!(matches!(tokens[5], Token::FatArrow(_)));
        assert!(matches!(tokens[6], Token::StarStar(_)));
        assert!(matches!(tokens[7], Token::QuestionQuestion(_)));
        assert!(matches!(tokens[8], Token::Ellipsis(_)));
        assert!(matches!(tokens[9], Token::LtLt(_)));
    }

    #[test]
    fn test_comments_and_locations() {
        let mut lexer = Lexer::new("a; // comment\n/* block\ncomment */ b;");
        let tokens = lexer.tokenize().unwrap();

        assert!(matches!(tokens[0], Token::Ident(ref s, _) if s == "a"));
        assert!(matches!(tokens[2], Token::Ident(ref s, _) if s == "b"));
        assert_eq!(tokens[2].location(), SourceLocation::new(3, 12));
    }

    #[test]
    fn test_number_forms() {
        let mut lexer = Lexer::new("3.5 1e3 0xff 12n .5");
        let tokens = lexer.tokenize().unwrap();

        assert!(matches!(tokens[0], Token::Number(n, _) if n == 3.5));
        assert!(matches!(tokens[1], Token::Number(n, _) if n == 1000.0));
        assert!(matches!(tokens[2], Token::Number(n, _) if n == 255.0));
        assert!(matches!(tokens[3], Token::BigInt(ref d, _) if d == "12"));
        assert!(matches!(tokens[4], Token::Number(n, _) if n == 0.5));
    }

    #[test]
    fn test_string_literals() {
        let mut lexer = Lexer::new(r#""a\nb" 'it\'s'"#);
        let tokens = lexer.tokenize().unwrap();

        assert!(matches!(tokens[0], Token::StringLiteral(ref s, _) if s == "a\nb"));
        assert!(matches!(tokens[1], Token::StringLiteral(ref s, _) if s == "it's"));
    }

    #[test]
    fn test_unterminated_string() {
        let mut lexer = Lexer::new("let s = \"oops;\nx");
        assert!(lexer.tokenize().is_err());
    }
}
