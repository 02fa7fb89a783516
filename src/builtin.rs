use core::fmt;
use std::{collections::HashMap, io::Write, sync::OnceLock};

use itertools::Itertools;

use crate::{error::RuntimeError, interpreter::EvaluationResult, object::Object};

type BuiltinFn = fn(&[Object], &mut dyn Write) -> EvaluationResult;

/// A host function callable from scripts, resolved by name when no binding
/// of that name is in scope.
#[derive(Clone, Copy)]
pub struct BuiltinFunction {
    name: &'static str,
    function: BuiltinFn,
}

impl BuiltinFunction {
    pub fn name(&self) -> &'static str {
        self.name
    }

    pub(crate) fn call(&self, arguments: &[Object], output: &mut dyn Write) -> EvaluationResult {
        (self.function)(arguments, output)
    }
}

impl PartialEq for BuiltinFunction {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl fmt::Debug for BuiltinFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Builtin({})", self.name)
    }
}

fn builtin_puts(arguments: &[Object], output: &mut dyn Write) -> EvaluationResult {
    let line = arguments.iter().join(" ");
    writeln!(output, "{}", line).map_err(|error| RuntimeError::Output(error.to_string()))?;
    Ok(Object::Null)
}

/// The fixed table of builtins. Read-only once built.
#[derive(Debug)]
pub struct Builtins {
    table: HashMap<&'static str, BuiltinFunction>,
}

impl Builtins {
    fn standard() -> Self {
        let functions = [
            BuiltinFunction { name: "puts", function: builtin_puts },
        ];

        Self {
            table: functions.into_iter().map(|builtin| (builtin.name, builtin)).collect(),
        }
    }

    /// The standard table, built on first use and shared afterwards.
    pub fn global() -> &'static Builtins {
        static BUILTINS: OnceLock<Builtins> = OnceLock::new();
        BUILTINS.get_or_init(Self::standard)
    }

    pub fn get(&self, name: &str) -> Option<BuiltinFunction> {
        self.table.get(name).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn puts_joins_arguments_with_spaces() -> anyhow::Result<()> {
        let puts = Builtins::global().get("puts").ok_or_else(|| anyhow::anyhow!("puts missing"))?;
        let mut output = Vec::new();

        let result = puts.call(
            &[Object::Integer(1), Object::Boolean(true), Object::Null, Object::String("hi".into())],
            &mut output,
        )?;

        assert_eq!(result, Object::Null);
        assert_eq!(String::from_utf8(output)?, "1 true null hi\n");
        Ok(())
    }

    #[test]
    fn puts_without_arguments_writes_empty_line() -> anyhow::Result<()> {
        let puts = Builtins::global().get("puts").ok_or_else(|| anyhow::anyhow!("puts missing"))?;
        let mut output = Vec::new();

        puts.call(&[], &mut output)?;

        assert_eq!(output, b"\n");
        Ok(())
    }

    #[test]
    fn unknown_names_are_absent() {
        assert!(Builtins::global().get("print").is_none());
    }
}
