use core::fmt;
use std::rc::Rc;

use itertools::Itertools;

use crate::{ast::BlockStatement, builtin::BuiltinFunction, environment::Environment, error::RuntimeError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectType {
    Integer,
    Boolean,
    String,
    Null,
    ReturnValue,
    Error,
    Function,
    Builtin,
}

impl fmt::Display for ObjectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Integer => "INTEGER",
            Self::Boolean => "BOOLEAN",
            Self::String => "STRING",
            Self::Null => "NULL",
            Self::ReturnValue => "RETURN_VALUE",
            Self::Error => "ERROR",
            Self::Function => "FUNCTION",
            Self::Builtin => "BUILTIN",
        })
    }
}

/// Runtime values.
///
/// [Object::ReturnValue] only exists while a `return` travels up to the
/// function call (or program) that catches it; callers of the interpreter
/// never see one.
#[derive(Debug, Clone)]
pub enum Object {
    Integer(i64),
    Boolean(bool),
    String(Rc<str>),
    Null,
    ReturnValue(Box<Object>),
    Error(RuntimeError),
    Function(Function),
    Builtin(BuiltinFunction),
}

impl Object {
    /// Only `false` and `null` are falsy.
    pub fn is_truthy(&self) -> bool {
        !matches!(self, Self::Null | Self::Boolean(false))
    }

    pub fn object_type(&self) -> ObjectType {
        match self {
            Self::Integer(_) => ObjectType::Integer,
            Self::Boolean(_) => ObjectType::Boolean,
            Self::String(_) => ObjectType::String,
            Self::Null => ObjectType::Null,
            Self::ReturnValue(_) => ObjectType::ReturnValue,
            Self::Error(_) => ObjectType::Error,
            Self::Function(_) => ObjectType::Function,
            Self::Builtin(_) => ObjectType::Builtin,
        }
    }
}

impl PartialEq for Object {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Integer(a), Self::Integer(b)) => a == b,
            (Self::Boolean(a), Self::Boolean(b)) => a == b,
            (Self::String(a), Self::String(b)) => a == b,
            (Self::Null, Self::Null) => true,
            (Self::ReturnValue(a), Self::ReturnValue(b)) => a == b,
            (Self::Error(a), Self::Error(b)) => a == b,
            (Self::Function(a), Self::Function(b)) => a == b,
            (Self::Builtin(a), Self::Builtin(b)) => a == b,
            _ => false,
        }
    }
}

impl fmt::Display for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Integer(value) => write!(f, "{}", value),
            Self::Boolean(value) => write!(f, "{}", value),
            Self::String(value) => f.write_str(value),
            Self::Null => f.write_str("null"),
            Self::ReturnValue(value) => write!(f, "{}", value),
            Self::Error(error) => write!(f, "ERROR: {}", error),
            Self::Function(_) => f.write_str("FUNCTION"),
            Self::Builtin(_) => f.write_str("BUILTIN"),
        }
    }
}

/// A user defined function together with the scope it was defined in.
#[derive(Clone)]
pub struct Function {
    pub parameters: Rc<[String]>,
    pub body: Rc<BlockStatement>,
    pub environment: Environment,
}

// Two function values are the same function only if they came from the same
// literal evaluated in the same scope
impl PartialEq for Function {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.body, &other.body) && self.environment.ptr_eq(&other.environment)
    }
}

impl fmt::Debug for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // The captured environment usually contains this very function
        write!(f, "Function(fn({}))", self.parameters.iter().join(", "))
    }
}
