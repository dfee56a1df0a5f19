use std::mem;

use crate::{
    ast::{BinOp, Expr, Lambda, Token},
    lexer::{LexError, Lexer, Position},
};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ParseError {
    #[error(transparent)]
    Lex(#[from] LexError),

    #[error("expected {expected}, got {found:?} at {position}")]
    Unexpected {
        expected: &'static str,
        found: Token,
        position: Position,
    },

    #[error("expression nests more than {limit} levels deep")]
    TooDeep { limit: usize },
}

/// Deepest expression tree the parser accepts.
///
/// Checking, rendering and evaluating recurse once per level.
pub const MAX_DEPTH: usize = 256;

/// Names of the static query operators recognised in call position.
const INCLUDE: &str = "Include";
const WHERE: &str = "Where";

pub struct Parser {
    lexer: Lexer,
    current_token: Token,
    peek_token: Token,
    /// Start of `current_token`.
    position: Position,
    peek_position: Position,
    /// Parameters of the lambdas enclosing the current token.
    params: Vec<String>,
    depth: usize,
}

impl Parser {
    pub fn new(mut lexer: Lexer) -> Result<Self, ParseError> {
        let (current_token, position) = Self::read(&mut lexer)?;
        let (peek_token, peek_position) = Self::read(&mut lexer)?;
        Ok(Parser {
            lexer,
            current_token,
            peek_token,
            position,
            peek_position,
            params: vec![],
            depth: 0,
        })
    }

    /// Parses a complete expression from source text.
    pub fn parse_str(source: &str) -> Result<Expr, ParseError> {
        Parser::new(Lexer::new(source))?.parse()
    }

    fn read(lexer: &mut Lexer) -> Result<(Token, Position), ParseError> {
        let token = lexer.next_token()?;
        Ok((token, lexer.token_start()))
    }

    fn advance(&mut self) -> Result<(), ParseError> {
        let (next, next_position) = Self::read(&mut self.lexer)?;
        self.current_token = mem::replace(&mut self.peek_token, next);
        self.position = mem::replace(&mut self.peek_position, next_position);
        Ok(())
    }

    fn check(&self, token: &Token) -> bool {
        mem::discriminant(&self.current_token) == mem::discriminant(token)
    }

    fn unexpected(&self, expected: &'static str) -> ParseError {
        ParseError::Unexpected {
            expected,
            found: self.current_token.clone(),
            position: self.position,
        }
    }

    fn expect(&mut self, expected: Token, description: &'static str) -> Result<(), ParseError> {
        if !self.check(&expected) {
            return Err(self.unexpected(description));
        }
        self.advance()
    }

    fn expect_identifier(&mut self, description: &'static str) -> Result<String, ParseError> {
        match &self.current_token {
            Token::Identifier(name) => {
                let name = name.clone();
                self.advance()?;
                Ok(name)
            }
            _ => Err(self.unexpected(description)),
        }
    }

    pub fn parse(&mut self) -> Result<Expr, ParseError> {
        let expr = self.parse_expression()?;
        self.expect(Token::Eof, "end of input")?;
        if expr.depth() > MAX_DEPTH {
            return Err(ParseError::TooDeep { limit: MAX_DEPTH });
        }
        Ok(expr)
    }

    /// Lambdas bind loosest: `x => x.A == 1 || x.B` is a single lambda.
    pub fn parse_expression(&mut self) -> Result<Expr, ParseError> {
        self.nested(|parser| {
            if matches!(parser.current_token, Token::Identifier(_))
                && parser.peek_token == Token::Arrow
            {
                return parser.parse_lambda().map(Expr::Lambda);
            }
            parser.parse_binary(1)
        })
    }

    /// Runs `parse` one level deeper, failing once [`MAX_DEPTH`] is reached.
    fn nested<T>(
        &mut self,
        parse: impl FnOnce(&mut Self) -> Result<T, ParseError>,
    ) -> Result<T, ParseError> {
        if self.depth >= MAX_DEPTH {
            return Err(ParseError::TooDeep { limit: MAX_DEPTH });
        }
        self.depth += 1;
        let result = parse(self);
        self.depth -= 1;
        result
    }

    fn parse_lambda(&mut self) -> Result<Lambda, ParseError> {
        let param = self.expect_identifier("lambda parameter")?;
        self.expect(Token::Arrow, "'=>'")?;
        self.params.push(param.clone());
        let body = self.parse_expression();
        self.params.pop();
        Ok(Lambda::new(param, body?))
    }

    fn binary_op(&self) -> Option<BinOp> {
        Some(match self.current_token {
            Token::OrOr => BinOp::Or,
            Token::AndAnd => BinOp::And,
            Token::EqEq => BinOp::Equal,
            Token::NotEq => BinOp::NotEqual,
            Token::Lt => BinOp::LessThan,
            Token::Gt => BinOp::GreaterThan,
            Token::LtEq => BinOp::LessEqual,
            Token::GtEq => BinOp::GreaterEqual,
            Token::Plus => BinOp::Add,
            Token::Minus => BinOp::Subtract,
            Token::Star => BinOp::Multiply,
            Token::Slash => BinOp::Divide,
            Token::Percent => BinOp::Modulo,
            _ => return None,
        })
    }

    /// Precedence climbing over [`BinOp::precedence`]; all operators are left-associative.
    fn parse_binary(&mut self, min_precedence: u8) -> Result<Expr, ParseError> {
        let mut left = self.parse_unary()?;

        while let Some(op) = self.binary_op() {
            let precedence = op.precedence();
            if precedence < min_precedence {
                break;
            }
            self.advance()?;
            let right = self.parse_binary(precedence + 1)?;
            left = Expr::BinaryOp {
                op,
                left: Box::new(left),
                right: Box::new(right),
            };
        }
        Ok(left)
    }

    fn parse_unary(&mut self) -> Result<Expr, ParseError> {
        match self.current_token {
            Token::Bang => {
                self.advance()?;
                Ok(Expr::Not(Box::new(self.nested(Self::parse_unary)?)))
            }
            Token::Minus => {
                self.advance()?;
                Ok(match self.nested(Self::parse_unary)? {
                    Expr::Integer(n) => Expr::Integer(-n),
                    Expr::Float(n) => Expr::Float(-n),
                    operand => Expr::Negate(Box::new(operand)),
                })
            }
            _ => self.parse_postfix(),
        }
    }

    fn parse_postfix(&mut self) -> Result<Expr, ParseError> {
        let mut expr = self.parse_primary()?;

        loop {
            if self.check(&Token::Dot) {
                self.advance()?;
                let name = self.expect_identifier("member name after '.'")?;

                if self.check(&Token::LParen) {
                    let args = self.parse_arguments()?;
                    expr = self.method_call(expr, name, args);
                } else {
                    expr = expr.member(name);
                }
            } else if self.check(&Token::LBracket) {
                self.advance()?;
                let key = self.parse_expression()?;
                self.expect(Token::RBracket, "']'")?;
                expr = Expr::Index {
                    object: Box::new(expr),
                    key: Box::new(key),
                };
            } else {
                break;
            }
        }
        Ok(expr)
    }

    /// Handles both the static form with a namespace qualifier
    /// (`Ns.Type.Include(src, x => ..)`) and the extension form (`src.Include(x => ..)`).
    fn method_call(&self, object: Expr, method: String, mut args: Vec<Expr>) -> Expr {
        if method == INCLUDE || method == WHERE {
            if args.len() == 2 && self.is_qualifier(&object) {
                return free_call(method, args);
            }
            if args.len() == 1
                && matches!(args[0], Expr::Lambda(_))
                && let Some(Expr::Lambda(lambda)) = args.pop()
            {
                return query_operator(&method, object, lambda);
            }
        }
        Expr::MethodCall {
            object: Box::new(object),
            method,
            args,
        }
    }

    /// A dotted name such as `Microsoft.SharePoint.Client.ClientObjectQueryableExtension`.
    /// A chain rooted at a lambda parameter is a value, not a namespace.
    fn is_qualifier(&self, expr: &Expr) -> bool {
        match expr {
            Expr::Param(name) => !self.params.contains(name),
            Expr::Member { object, .. } => self.is_qualifier(object),
            _ => false,
        }
    }

    fn parse_arguments(&mut self) -> Result<Vec<Expr>, ParseError> {
        self.expect(Token::LParen, "'('")?;
        let mut args = vec![];

        while !self.check(&Token::RParen) {
            args.push(self.parse_expression()?);

            if !self.check(&Token::RParen) {
                self.expect(Token::Comma, "',' or ')'")?;
            }
        }

        self.expect(Token::RParen, "')'")?;
        Ok(args)
    }

    fn parse_primary(&mut self) -> Result<Expr, ParseError> {
        match mem::replace(&mut self.current_token, Token::Eof) {
            Token::Float(n) => {
                self.advance()?;
                Ok(Expr::Float(n))
            }
            Token::Integer(n) => {
                self.advance()?;
                Ok(Expr::Integer(n))
            }
            Token::String(s) => {
                self.advance()?;
                Ok(Expr::String(s))
            }
            Token::Boolean(b) => {
                self.advance()?;
                Ok(Expr::Boolean(b))
            }
            Token::Null => {
                self.advance()?;
                Ok(Expr::Null)
            }
            Token::Identifier(name) => {
                self.advance()?;
                if self.check(&Token::LParen) {
                    let args = self.parse_arguments()?;
                    Ok(free_call(name, args))
                } else {
                    Ok(Expr::Param(name))
                }
            }
            Token::LParen => {
                self.advance()?;
                let expr = self.parse_expression()?;
                self.expect(Token::RParen, "')'")?;
                Ok(expr)
            }
            token => {
                self.current_token = token;
                Err(self.unexpected("expression"))
            }
        }
    }
}

/// `Include(src, x => ..)` / `Where(src, x => ..)`, otherwise an opaque call.
fn free_call(function: String, mut args: Vec<Expr>) -> Expr {
    if (function == INCLUDE || function == WHERE)
        && args.len() == 2
        && matches!(args[1], Expr::Lambda(_))
        && let Some(Expr::Lambda(lambda)) = args.pop()
        && let Some(source) = args.pop()
    {
        return query_operator(&function, source, lambda);
    }
    Expr::Call { function, args }
}

fn query_operator(name: &str, source: Expr, lambda: Lambda) -> Expr {
    if name == INCLUDE {
        source.include(lambda)
    } else {
        source.filter(lambda)
    }
}

