mod ast;
mod builtin;
mod config;
mod context;
mod environment;
mod error;
mod interpreter;
mod lexer;
mod object;
mod parser;
mod stack;
mod token;

#[cfg(test)]
mod test_utils;

use std::io::Write;

pub use ast::{BlockStatement, Expression, InfixOperator, PrefixOperator, Program, Statement};
pub use builtin::{BuiltinFunction, Builtins};
pub use config::InterpreterConfig;
pub use context::EvaluationContext;
pub use environment::Environment;
pub use error::{MonkeyError, ParseError, ParseErrorKind, ParseErrors, RuntimeError};
pub use interpreter::Interpreter;
pub use lexer::Lexer;
pub use object::{Function, Object, ObjectType};
pub use parser::{parse, Parser, MAX_NESTING_DEPTH};
pub use token::{Position, Token, TokenKind};

/// Runs a whole source text in a fresh environment, writing `puts` output to `output`.
pub fn evaluate<W: Write>(source: &str, output: W) -> Result<Object, MonkeyError> {
    EvaluationContext::with_output(output).evaluate_str(source)
}
