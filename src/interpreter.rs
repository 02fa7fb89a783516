use std::{io::Write, rc::Rc};

use tracing::{debug, trace, trace_span};

use crate::{
    ast::{BlockStatement, Expression, InfixOperator, PrefixOperator, Program, Statement},
    builtin::Builtins,
    config::InterpreterConfig,
    environment::Environment,
    error::RuntimeError,
    object::{Function, Object},
    stack::ensure_sufficient_stack,
};

pub(crate) type EvaluationResult = Result<Object, RuntimeError>;

/// Walks a parsed program against an environment.
///
/// Runtime errors travel back up as `Err` values and `return` travels up as
/// [Object::ReturnValue], both are checked for after every statement. Nothing
/// here unwinds.
pub struct Interpreter<'o> {
    builtins: &'o Builtins,
    output: &'o mut dyn Write,
    max_call_depth: usize,
    depth: usize,
}

impl<'o> Interpreter<'o> {
    pub fn new(builtins: &'o Builtins, output: &'o mut dyn Write, config: &InterpreterConfig) -> Self {
        Self {
            builtins,
            output,
            max_call_depth: config.max_call_depth,
            depth: 0,
        }
    }

    /// Evaluates every statement of the program and gives the value of the
    /// last one, or of the first top level `return`. A runtime error comes
    /// back as [Object::Error].
    pub fn eval_program(&mut self, program: &Program, environment: &Environment) -> Object {
        match self.evaluate_program(program, environment) {
            Ok(value) => value,
            Err(error) => {
                debug!(%error, "evaluation failed");
                Object::Error(error)
            }
        }
    }

    fn evaluate_program(&mut self, program: &Program, environment: &Environment) -> EvaluationResult {
        let mut result = Object::Null;

        for statement in &program.statements {
            match self.evaluate_statement(statement, environment)? {
                Object::ReturnValue(value) => return Ok(*value),
                value => result = value,
            }
        }

        Ok(result)
    }

    // Unlike a program, a block leaves the return value wrapped so that it
    // keeps short-circuiting the blocks around it up to the function call
    fn evaluate_block(&mut self, block: &BlockStatement, environment: &Environment) -> EvaluationResult {
        let mut result = Object::Null;

        for statement in &block.statements {
            result = self.evaluate_statement(statement, environment)?;
            if matches!(result, Object::ReturnValue(_)) {
                return Ok(result)
            }
        }

        Ok(result)
    }

    fn evaluate_statement(&mut self, statement: &Statement, environment: &Environment) -> EvaluationResult {
        match statement {
            Statement::Let { name, value } => {
                let value = self.evaluate_expression(value, environment)?;
                trace!(name = name.as_str(), kind = %value.object_type(), "let");
                environment.set(name.as_str(), value);
                Ok(Object::Null)
            }
            Statement::Return(value) => {
                let value = self.evaluate_expression(value, environment)?;
                Ok(Object::ReturnValue(Box::new(value)))
            }
            Statement::Expression(expression) => self.evaluate_expression(expression, environment),
        }
    }

    // Every level of script recursion passes through here
    fn evaluate_expression(&mut self, expression: &Expression, environment: &Environment) -> EvaluationResult {
        ensure_sufficient_stack(|| self.evaluate_expression_inner(expression, environment))
    }

    fn evaluate_expression_inner(&mut self, expression: &Expression, environment: &Environment) -> EvaluationResult {
        match expression {
            Expression::Identifier(name) => self.evaluate_identifier(name, environment),
            Expression::IntegerLiteral(value) => Ok(Object::Integer(*value)),
            Expression::Boolean(value) => Ok(Object::Boolean(*value)),
            Expression::StringLiteral(value) => Ok(Object::String(Rc::from(value.as_str()))),
            Expression::Prefix { operator, right } => {
                let right = self.evaluate_expression(right, environment)?;
                evaluate_prefix(*operator, right)
            }
            Expression::Infix { operator, left, right } => {
                let left = self.evaluate_expression(left, environment)?;
                let right = self.evaluate_expression(right, environment)?;
                evaluate_infix(*operator, left, right)
            }
            Expression::If { condition, consequence, alternative } => {
                if self.evaluate_expression(condition, environment)?.is_truthy() {
                    self.evaluate_block(consequence, environment)
                } else if let Some(alternative) = alternative {
                    self.evaluate_block(alternative, environment)
                } else {
                    Ok(Object::Null)
                }
            }
            Expression::FunctionLiteral { parameters, body } => Ok(Object::Function(Function {
                parameters: parameters.clone(),
                body: body.clone(),
                environment: environment.clone(),
            })),
            Expression::Call { function, arguments } => {
                let function = self.evaluate_expression(function, environment)?;
                let arguments = self.evaluate_expressions(arguments, environment)?;
                self.apply_function(function, arguments)
            }
        }
    }

    fn evaluate_identifier(&self, name: &str, environment: &Environment) -> EvaluationResult {
        if let Some(value) = environment.get(name) {
            return Ok(value)
        }
        self.builtins.get(name)
            .map(Object::Builtin)
            .ok_or_else(|| RuntimeError::IdentifierNotFound(name.to_owned()))
    }

    fn evaluate_expressions(&mut self, expressions: &[Expression], environment: &Environment) -> Result<Vec<Object>, RuntimeError> {
        expressions.iter()
            .map(|expression| self.evaluate_expression(expression, environment))
            .collect()
    }

    fn apply_function(&mut self, function: Object, arguments: Vec<Object>) -> EvaluationResult {
        match function {
            Object::Function(function) => {
                if arguments.len() != function.parameters.len() {
                    return Err(RuntimeError::WrongArgumentCount {
                        expected: function.parameters.len(),
                        got: arguments.len(),
                    })
                }
                if self.depth >= self.max_call_depth {
                    return Err(RuntimeError::CallDepthExceeded(self.max_call_depth))
                }

                let _span = trace_span!("call", arity = arguments.len(), depth = self.depth).entered();
                let environment = Environment::new_enclosed(&function.environment);
                for (parameter, argument) in function.parameters.iter().zip(arguments) {
                    environment.set(parameter.as_str(), argument);
                }

                self.depth += 1;
                let result = self.evaluate_block(&function.body, &environment);
                self.depth -= 1;

                match result? {
                    Object::ReturnValue(value) => Ok(*value),
                    value => Ok(value),
                }
            }
            Object::Builtin(builtin) => {
                trace!(name = builtin.name(), arity = arguments.len(), "builtin call");
                builtin.call(&arguments, &mut *self.output)
            }
            other => Err(RuntimeError::NotAFunction(other.object_type())),
        }
    }
}

fn evaluate_prefix(operator: PrefixOperator, right: Object) -> EvaluationResult {
    match (operator, right) {
        (PrefixOperator::Bang, right) => Ok(Object::Boolean(!right.is_truthy())),
        (PrefixOperator::Minus, Object::Integer(value)) => value.checked_neg()
            .map(Object::Integer)
            .ok_or(RuntimeError::IntegerOverflow),
        (PrefixOperator::Minus, right) => Err(RuntimeError::UnknownPrefixOperator {
            operator,
            right: right.object_type(),
        }),
    }
}

fn evaluate_integer_infix(operator: InfixOperator, left: i64, right: i64) -> EvaluationResult {
    let arithmetic = |value: Option<i64>| value.map(Object::Integer).ok_or(RuntimeError::IntegerOverflow);

    match operator {
        InfixOperator::Plus => arithmetic(left.checked_add(right)),
        InfixOperator::Minus => arithmetic(left.checked_sub(right)),
        InfixOperator::Asterisk => arithmetic(left.checked_mul(right)),
        InfixOperator::Slash if right == 0 => Err(RuntimeError::DivisionByZero),
        InfixOperator::Slash => arithmetic(left.checked_div(right)),
        InfixOperator::Equal => Ok(Object::Boolean(left == right)),
        InfixOperator::NotEqual => Ok(Object::Boolean(left != right)),
        InfixOperator::Less => Ok(Object::Boolean(left < right)),
        InfixOperator::Greater => Ok(Object::Boolean(left > right)),
    }
}

fn evaluate_infix(operator: InfixOperator, left: Object, right: Object) -> EvaluationResult {
    match (&left, &right) {
        (Object::Integer(left), Object::Integer(right)) => evaluate_integer_infix(operator, *left, *right),
        (Object::Boolean(left), Object::Boolean(right)) if operator == InfixOperator::Equal => Ok(Object::Boolean(left == right)),
        (Object::Boolean(left), Object::Boolean(right)) if operator == InfixOperator::NotEqual => Ok(Object::Boolean(left != right)),
        _ if left.object_type() != right.object_type() => Err(RuntimeError::TypeMismatch {
            left: left.object_type(),
            operator,
            right: right.object_type(),
        }),
        _ => Err(RuntimeError::UnknownInfixOperator {
            left: left.object_type(),
            operator,
            right: right.object_type(),
        }),
    }
}
