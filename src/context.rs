use std::io::{self, Write};

use crate::{
    ast::Program,
    builtin::Builtins,
    config::InterpreterConfig,
    environment::Environment,
    error::MonkeyError,
    interpreter::Interpreter,
    object::Object,
    parser::parse,
};

/// Runs source texts one after another against a shared root environment,
/// so later inputs see the bindings made by earlier ones.
///
/// Output of `puts` goes to the sink the context was created with.
pub struct EvaluationContext<W: Write = io::Stdout> {
    environment: Environment,
    builtins: &'static Builtins,
    config: InterpreterConfig,
    output: W,
}

impl EvaluationContext<io::Stdout> {
    pub fn new() -> Self {
        Self::with_output(io::stdout())
    }
}

impl Default for EvaluationContext<io::Stdout> {
    fn default() -> Self {
        Self::new()
    }
}

impl<W: Write> EvaluationContext<W> {
    pub fn with_output(output: W) -> Self {
        Self {
            environment: Environment::new(),
            builtins: Builtins::global(),
            config: InterpreterConfig::default(),
            output,
        }
    }

    pub fn with_config(mut self, config: InterpreterConfig) -> Self {
        self.config = config;
        self
    }

    pub fn evaluate_str(&mut self, input: &str) -> Result<Object, MonkeyError> {
        let program = parse(input)?;
        self.evaluate_program(&program)
    }

    pub fn evaluate_program(&mut self, program: &Program) -> Result<Object, MonkeyError> {
        let mut interpreter = Interpreter::new(self.builtins, &mut self.output, &self.config);
        match interpreter.eval_program(program, &self.environment) {
            Object::Error(error) => Err(error.into()),
            value => Ok(value),
        }
    }

    pub fn environment(&self) -> &Environment {
        &self.environment
    }

    pub fn output(&self) -> &W {
        &self.output
    }
}

impl<W: Write> Drop for EvaluationContext<W> {
    fn drop(&mut self) {
        // Recursive functions hold on to the root scope they are bound in
        self.environment.clear();
    }
}
