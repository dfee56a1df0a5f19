use std::fmt;

use crate::ast::Token;

/// Character offset into the source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Position(pub usize);

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "position {}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LexError {
    #[error("unexpected character '{ch}' at {position}")]
    UnexpectedChar { ch: char, position: Position },

    #[error("unexpected '{found}' at {position} (did you mean '{expected}'?)")]
    Incomplete {
        found: char,
        expected: &'static str,
        position: Position,
    },

    #[error("invalid escape sequence '\\{ch}' at {position}")]
    InvalidEscape { ch: char, position: Position },

    #[error("unterminated string starting at {0}")]
    UnterminatedString(Position),

    #[error("invalid number literal '{text}' at {position}")]
    InvalidNumber { text: String, position: Position },
}

pub struct Lexer {
    input: Vec<char>,
    position: usize,
    token_start: usize,
}

impl Lexer {
    pub fn new(input: &str) -> Self {
        Lexer {
            input: input.chars().collect(),
            position: 0,
            token_start: 0,
        }
    }

    fn position(&self) -> Position {
        Position(self.position)
    }

    /// Offset of the first character of the most recently returned token.
    pub fn token_start(&self) -> Position {
        Position(self.token_start)
    }

    fn current_char(&self) -> Option<char> {
        self.input.get(self.position).copied()
    }

    fn peek_char(&self, offset: usize) -> Option<char> {
        self.input.get(self.position + offset).copied()
    }

    fn advance(&mut self) {
        self.position += 1;
    }

    fn skip_whitespace(&mut self) {
        while let Some(ch) = self.current_char() {
            if ch.is_whitespace() {
                self.advance();
            } else {
                break;
            }
        }
    }

    fn read_identifier(&mut self) -> String {
        let mut result = String::new();
        while let Some(ch) = self.current_char() {
            if ch.is_alphanumeric() || ch == '_' {
                result.push(ch);
                self.advance();
            } else {
                break;
            }
        }
        result
    }

    fn read_string(&mut self, quote: char) -> Result<String, LexError> {
        let start = self.position();
        let mut result = String::new();
        self.advance(); // opening quote

        while let Some(ch) = self.current_char() {
            match ch {
                c if c == quote => {
                    self.advance();
                    return Ok(result);
                }
                '\\' => {
                    self.advance();
                    match self.current_char() {
                        Some('n') => result.push('\n'),
                        Some('t') => result.push('\t'),
                        Some('r') => result.push('\r'),
                        Some('"') => result.push('"'),
                        Some('\'') => result.push('\''),
                        Some('\\') => result.push('\\'),
                        Some(ch) => {
                            return Err(LexError::InvalidEscape {
                                ch,
                                position: self.position(),
                            });
                        }
                        None => return Err(LexError::UnterminatedString(start)),
                    }
                    self.advance();
                }
                _ => {
                    result.push(ch);
                    self.advance();
                }
            }
        }

        Err(LexError::UnterminatedString(start))
    }

    fn read_number(&mut self) -> Result<Token, LexError> {
        let start = self.position();
        let mut number = String::new();
        let mut is_float = false;

        while let Some(ch) = self.current_char() {
            if ch.is_ascii_digit() {
                number.push(ch);
                self.advance();
            } else if ch == '.'
                && !is_float
                && self.peek_char(1).is_some_and(|c| c.is_ascii_digit())
            {
                is_float = true;
                number.push(ch);
                self.advance();
            } else {
                break;
            }
        }

        let invalid = |text: String| LexError::InvalidNumber {
            text,
            position: start,
        };
        if is_float {
            number
                .parse::<f64>()
                .map(Token::Float)
                .map_err(|_| invalid(number))
        } else {
            number
                .parse::<i64>()
                .map(Token::Integer)
                .map_err(|_| invalid(number))
        }
    }

    /// Consumes `len` characters and yields `token`.
    fn single(&mut self, len: usize, token: Token) -> Result<Token, LexError> {
        self.position += len;
        Ok(token)
    }

    pub fn next_token(&mut self) -> Result<Token, LexError> {
        self.skip_whitespace();
        self.token_start = self.position;

        let next = self.peek_char(1);
        match self.current_char() {
            None => Ok(Token::Eof),
            Some('.') => self.single(1, Token::Dot),
            Some(',') => self.single(1, Token::Comma),
            Some('(') => self.single(1, Token::LParen),
            Some(')') => self.single(1, Token::RParen),
            Some('[') => self.single(1, Token::LBracket),
            Some(']') => self.single(1, Token::RBracket),
            Some('+') => self.single(1, Token::Plus),
            Some('-') => self.single(1, Token::Minus),
            Some('*') => self.single(1, Token::Star),
            Some('/') => self.single(1, Token::Slash),
            Some('%') => self.single(1, Token::Percent),
            Some('=') => match next {
                Some('=') => self.single(2, Token::EqEq),
                Some('>') => self.single(2, Token::Arrow),
                _ => Err(LexError::Incomplete {
                    found: '=',
                    expected: "==' or '=>",
                    position: self.position(),
                }),
            },
            Some('!') => match next {
                Some('=') => self.single(2, Token::NotEq),
                _ => self.single(1, Token::Bang),
            },
            Some('<') => match next {
                Some('=') => self.single(2, Token::LtEq),
                _ => self.single(1, Token::Lt),
            },
            Some('>') => match next {
                Some('=') => self.single(2, Token::GtEq),
                _ => self.single(1, Token::Gt),
            },
            Some('&') => match next {
                Some('&') => self.single(2, Token::AndAnd),
                _ => Err(LexError::Incomplete {
                    found: '&',
                    expected: "&&",
                    position: self.position(),
                }),
            },
            Some('|') => match next {
                Some('|') => self.single(2, Token::OrOr),
                _ => Err(LexError::Incomplete {
                    found: '|',
                    expected: "||",
                    position: self.position(),
                }),
            },
            Some('"') => self.read_string('"').map(Token::String),
            Some('\'') => self.read_string('\'').map(Token::String),
            Some(ch) if ch.is_alphabetic() || ch == '_' => {
                let ident = self.read_identifier();

                Ok(match ident.as_str() {
                    "true" => Token::Boolean(true),
                    "false" => Token::Boolean(false),
                    "null" => Token::Null,
                    _ => Token::Identifier(ident),
                })
            }
            Some(ch) if ch.is_ascii_digit() => self.read_number(),
            Some(ch) => Err(LexError::UnexpectedChar {
                ch,
                position: self.position(),
            }),
        }
    }
}

#[test]
fn test_keywords() {
    let mut lexer = Lexer::new("true false null");
    assert_eq!(lexer.next_token(), Ok(Token::Boolean(true)));
    assert_eq!(lexer.next_token(), Ok(Token::Boolean(false)));
    assert_eq!(lexer.next_token(), Ok(Token::Null));
    assert_eq!(lexer.next_token(), Ok(Token::Eof));
}

#[test]
fn test_include_call() {
    let mut lexer = Lexer::new("a => Include(a.Lists, b => b)");
    assert_eq!(lexer.next_token(), Ok(Token::Identifier("a".to_string())));
    assert_eq!(lexer.next_token(), Ok(Token::Arrow));
    assert_eq!(lexer.next_token(), Ok(Token::Identifier("Include".to_string())));
    assert_eq!(lexer.next_token(), Ok(Token::LParen));
    assert_eq!(lexer.next_token(), Ok(Token::Identifier("a".to_string())));
    assert_eq!(lexer.next_token(), Ok(Token::Dot));
    assert_eq!(lexer.next_token(), Ok(Token::Identifier("Lists".to_string())));
    assert_eq!(lexer.next_token(), Ok(Token::Comma));
    assert_eq!(lexer.next_token(), Ok(Token::Identifier("b".to_string())));
    assert_eq!(lexer.next_token(), Ok(Token::Arrow));
    assert_eq!(lexer.next_token(), Ok(Token::Identifier("b".to_string())));
    assert_eq!(lexer.next_token(), Ok(Token::RParen));
    assert_eq!(lexer.next_token(), Ok(Token::Eof));
}
