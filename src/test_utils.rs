use std::{io::BufRead, path::{Path, PathBuf}};

use anyhow::bail;
use itertools::Itertools;
use serde::{de::{Error, Visitor}, Deserialize, Deserializer};

use crate::error::{MonkeyError, RuntimeError};

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum TestOutput {
    Integer(i64),
    Boolean(bool),
    Text(String), // Compared against the displayed value
    Null,
}

#[derive(Debug, Clone)]
pub struct EvaluationResult(Result<TestOutput, String>);

impl From<EvaluationResult> for Result<TestOutput, String> {
    fn from(value: EvaluationResult) -> Self {
        value.0
    }
}

/// Name used for an error in the expected output files.
pub fn error_kind(error: &MonkeyError) -> &'static str {
    match error {
        MonkeyError::Parse(_) => "SyntaxError",
        MonkeyError::Runtime(error) => match error {
            RuntimeError::IdentifierNotFound(_) => "IdentifierNotFound",
            RuntimeError::TypeMismatch { .. } => "TypeMismatch",
            RuntimeError::UnknownPrefixOperator { .. } | RuntimeError::UnknownInfixOperator { .. } => "UnknownOperator",
            RuntimeError::NotAFunction(_) => "NotAFunction",
            RuntimeError::WrongArgumentCount { .. } => "WrongArgumentCount",
            RuntimeError::DivisionByZero => "DivisionByZero",
            RuntimeError::IntegerOverflow => "IntegerOverflow",
            RuntimeError::CallDepthExceeded(_) => "CallDepthExceeded",
            RuntimeError::Output(_) => "Output",
        },
    }
}

struct EvaluationResultVisitor;

impl<'de> Deserialize<'de> for EvaluationResult {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
        where
            D: Deserializer<'de> {

        deserializer.deserialize_map(EvaluationResultVisitor)
    }
}

impl<'de> Visitor<'de> for EvaluationResultVisitor {
    type Value = EvaluationResult;

    fn expecting(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(formatter, "A structure containing the boolean key 'ok'. If it's okay, contains the key 'output', otherwise the key 'type'")
    }

    fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
        where
            A: serde::de::MapAccess<'de>, {

        if map.next_key::<String>()?.as_deref() != Some("ok") {
            return Err(A::Error::custom("First key should be 'ok'"))
        }

        let ok: bool = map.next_value()?;
        let second = map.next_key::<String>()?
            .ok_or_else(|| A::Error::custom("Must have two keys"))?;

        let result = match (ok, second.as_str()) {
            (true, "output") => EvaluationResult(Ok(map.next_value()?)),
            (false, "type") => EvaluationResult(Err(map.next_value()?)),
            (true, other) => return Err(A::Error::custom(format!("Second key should be 'output', got '{}'", other))),
            (false, other) => return Err(A::Error::custom(format!("Second key should be 'type', got '{}'", other))),
        };

        if map.next_key::<String>()?.is_some() {
            return Err(A::Error::custom("Only two keys should be present"));
        }

        Ok(result)
    }
}

fn load_input_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Vec<String>> {
    let source = std::fs::read(path)?;
    Ok(source.lines().collect::<Result<Vec<String>, _>>()?)
}

fn load_output_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Vec<EvaluationResult>> {
    let source = std::fs::read(path)?;
    Ok(serde_json::from_slice(&source)?)
}

/// Each line of `test_inputs/<n>.mky` is one input to a shared context,
/// paired with the matching entry of `test_outputs/<n>.json`.
pub fn load_test_pair(testcase: usize) -> anyhow::Result<Vec<(String, EvaluationResult)>> {
    let base_path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    let input = load_input_file(base_path.join("test_inputs").join(format!("{}.mky", testcase)))?;
    let output = load_output_file(base_path.join("test_outputs").join(format!("{}.json", testcase)))?;

    if input.len() != output.len() { bail!("Input and output of testcase {} does not match", testcase); }
    Ok(input.into_iter().zip(output).collect_vec())
}

pub fn all_testcases() -> impl Iterator<Item = usize> {
    1..=8
}
