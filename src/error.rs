use itertools::Itertools;
use thiserror::Error;

use crate::{ast::{InfixOperator, PrefixOperator}, object::ObjectType, token::{Position, TokenKind}};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseErrorKind {
    #[error("expected next token to be {expected}, got {got} instead")]
    UnexpectedToken { expected: TokenKind, got: TokenKind },
    #[error("no prefix parse rule for {0}")]
    NoPrefixRule(TokenKind),
    #[error("could not parse {0:?} as integer")]
    InvalidInteger(String),
    #[error("expression nested deeper than {0} levels")]
    NestingTooDeep(usize),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{position}: {kind}")]
pub struct ParseError {
    pub kind: ParseErrorKind,
    pub position: Position,
}

/// Every error the parser collected. Never empty.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{}", .0.iter().join("\n"))]
pub struct ParseErrors(pub Vec<ParseError>);

impl ParseErrors {
    pub fn iter(&self) -> impl Iterator<Item = &ParseError> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RuntimeError {
    #[error("identifier not found: {0}")]
    IdentifierNotFound(String),
    #[error("type mismatch: {left} {operator} {right}")]
    TypeMismatch { left: ObjectType, operator: InfixOperator, right: ObjectType },
    #[error("unknown operator: {operator}{right}")]
    UnknownPrefixOperator { operator: PrefixOperator, right: ObjectType },
    #[error("unknown operator: {left} {operator} {right}")]
    UnknownInfixOperator { left: ObjectType, operator: InfixOperator, right: ObjectType },
    #[error("not a function: {0}")]
    NotAFunction(ObjectType),
    #[error("wrong number of arguments: expected {expected}, got {got}")]
    WrongArgumentCount { expected: usize, got: usize },
    #[error("division by zero")]
    DivisionByZero,
    #[error("integer overflow")]
    IntegerOverflow,
    #[error("maximum call depth of {0} exceeded")]
    CallDepthExceeded(usize),
    #[error("could not write output: {0}")]
    Output(String),
}

/// Outcome of running source text that did not produce a value.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MonkeyError {
    #[error("{0}")]
    Parse(#[from] ParseErrors),
    #[error("{0}")]
    Runtime(#[from] RuntimeError),
}
