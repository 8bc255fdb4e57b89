use crate::ast::{Ident, Kind, Term, Type};
use std::iter::Peekable;
use std::rc::Rc;
use std::str::Chars;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ParseError {
    #[error("Unexpected EOF")]
    UnexpectedEof,
    #[error("Expected {0}")]
    Expected(String),
    #[error("Unknown token: {0}")]
    UnknownToken(String),
}

#[derive(Debug, PartialEq, Eq)]
enum Token {
    LParen,
    RParen,
    Symbol(String),
}

struct Lexer<'a> {
    chars: Peekable<Chars<'a>>,
}

impl<'a> Lexer<'a> {
    fn new(input: &'a str) -> Self {
        Lexer {
            chars: input.chars().peekable(),
        }
    }

    fn next_token(&mut self) -> Option<Token> {
        self.skip_whitespace();
        let c = self.chars.next()?;
        match c {
            '(' => Some(Token::LParen),
            ')' => Some(Token::RParen),
            c => {
                let mut s = String::new();
                s.push(c);
                while let Some(&c) = self.chars.peek() {
                    if !c.is_whitespace() && c != '(' && c != ')' {
                        s.push(self.chars.next().unwrap());
                    } else {
                        break;
                    }
                }
                Some(Token::Symbol(s))
            }
        }
    }

    fn skip_whitespace(&mut self) {
        while let Some(&c) = self.chars.peek() {
            if c.is_whitespace() {
                self.chars.next();
            } else {
                break;
            }
        }
    }
}

/// S-expression reader for building syntax in tests, one entry point per
/// sort. Bare symbols are variables; `*` is the star kind; compound forms
/// are `(lam x <ty> <tm>)`, `(tlam X <k> <tm>)`, `(app ..)`, `(tapp ..)`
/// for terms, `(pi x <ty> <ty>)`, `(all X <k> <ty>)`, `(app ..)`,
/// `(tapp ..)`, `(iota x <ty>)` for types, and `(pi x <ty> <k>)`,
/// `(all X <k> <k>)` for kinds.
pub struct Parser<'a> {
    lexer: Lexer<'a>,
}

impl<'a> Parser<'a> {
    pub fn new(input: &'a str) -> Self {
        Parser {
            lexer: Lexer::new(input),
        }
    }

    pub fn parse_term(&mut self) -> Result<Rc<Term>, ParseError> {
        match self.lexer.next_token() {
            Some(Token::Symbol(s)) => Ok(Term::var(Ident::new(s))),
            Some(Token::LParen) => {
                let head = self.expect_symbol()?;
                let term = match head.as_str() {
                    "lam" => {
                        let x = self.expect_symbol()?;
                        let ty = self.parse_type()?;
                        let body = self.parse_term()?;
                        Term::lam(Ident::new(x), ty, body)
                    }
                    "tlam" => {
                        let x = self.expect_symbol()?;
                        let kind = self.parse_kind()?;
                        let body = self.parse_term()?;
                        Term::tylam(Ident::new(x), kind, body)
                    }
                    "app" => {
                        let f = self.parse_term()?;
                        let a = self.parse_term()?;
                        Term::app(f, a)
                    }
                    "tapp" => {
                        let f = self.parse_term()?;
                        let ty = self.parse_type()?;
                        Term::tyapp(f, ty)
                    }
                    _ => return Err(ParseError::UnknownToken(head)),
                };
                self.expect_rparen()?;
                Ok(term)
            }
            Some(Token::RParen) => Err(ParseError::Expected("term".to_string())),
            None => Err(ParseError::UnexpectedEof),
        }
    }

    pub fn parse_type(&mut self) -> Result<Rc<Type>, ParseError> {
        match self.lexer.next_token() {
            Some(Token::Symbol(s)) => Ok(Type::var(Ident::new(s))),
            Some(Token::LParen) => {
                let head = self.expect_symbol()?;
                let ty = match head.as_str() {
                    "pi" => {
                        let x = self.expect_symbol()?;
                        let dom = self.parse_type()?;
                        let body = self.parse_type()?;
                        Type::pi(Ident::new(x), dom, body)
                    }
                    "all" => {
                        let x = self.expect_symbol()?;
                        let dom = self.parse_kind()?;
                        let body = self.parse_type()?;
                        Type::all(Ident::new(x), dom, body)
                    }
                    "app" => {
                        let f = self.parse_type()?;
                        let a = self.parse_term()?;
                        Type::app(f, a)
                    }
                    "tapp" => {
                        let f = self.parse_type()?;
                        let a = self.parse_type()?;
                        Type::tyapp(f, a)
                    }
                    "iota" => {
                        let x = self.expect_symbol()?;
                        let body = self.parse_type()?;
                        Type::iota(Ident::new(x), body)
                    }
                    _ => return Err(ParseError::UnknownToken(head)),
                };
                self.expect_rparen()?;
                Ok(ty)
            }
            Some(Token::RParen) => Err(ParseError::Expected("type".to_string())),
            None => Err(ParseError::UnexpectedEof),
        }
    }

    pub fn parse_kind(&mut self) -> Result<Rc<Kind>, ParseError> {
        match self.lexer.next_token() {
            Some(Token::Symbol(s)) if s == "*" => Ok(Kind::star()),
            Some(Token::Symbol(s)) => Err(ParseError::UnknownToken(s)),
            Some(Token::LParen) => {
                let head = self.expect_symbol()?;
                let kind = match head.as_str() {
                    "pi" => {
                        let x = self.expect_symbol()?;
                        let dom = self.parse_type()?;
                        let body = self.parse_kind()?;
                        Kind::pi(Ident::new(x), dom, body)
                    }
                    "all" => {
                        let x = self.expect_symbol()?;
                        let dom = self.parse_kind()?;
                        let body = self.parse_kind()?;
                        Kind::all(Ident::new(x), dom, body)
                    }
                    _ => return Err(ParseError::UnknownToken(head)),
                };
                self.expect_rparen()?;
                Ok(kind)
            }
            Some(Token::RParen) => Err(ParseError::Expected("kind".to_string())),
            None => Err(ParseError::UnexpectedEof),
        }
    }

    fn expect_symbol(&mut self) -> Result<String, ParseError> {
        match self.lexer.next_token() {
            Some(Token::Symbol(s)) => Ok(s),
            _ => Err(ParseError::Expected("symbol".to_string())),
        }
    }

    fn expect_rparen(&mut self) -> Result<(), ParseError> {
        match self.lexer.next_token() {
            Some(Token::RParen) => Ok(()),
            _ => Err(ParseError::Expected(")".to_string())),
        }
    }
}
