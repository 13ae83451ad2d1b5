use std::path::{Path, PathBuf};

use anyhow::bail;
use itertools::Itertools;
use serde::{de::{Visitor, Error}, Deserialize};

use crate::error::SnekError;

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum TestOutput {
    Something(String), // Names a kind of value; only "function" is used
    Number(f64),
}

#[derive(Debug, Clone)]
pub struct ExpectedResult(Result<TestOutput, SnekError>);

impl ExpectedResult {
    pub fn into_result(self) -> Result<TestOutput, SnekError> {
        self.0
    }
}

struct ExpectedResultVisitor {}

impl<'de> Deserialize<'de> for ExpectedResult {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
        where
            D: serde::Deserializer<'de> {

        deserializer.deserialize_map(ExpectedResultVisitor {})
    }
}

impl<'de> Visitor<'de> for ExpectedResultVisitor {
    type Value = ExpectedResult;

    fn expecting(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(formatter, "A structure containing the boolean key 'ok'. If it's okay, contains the key 'output', otherwise the key 'type'")
    }

    fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
        where
            A: serde::de::MapAccess<'de>, {

        if map.next_key::<String>()? != Some("ok".to_owned()) {
            return Err(A::Error::custom("First key should be 'ok'"))
        }

        let ok: bool = map.next_value()?;
        let result = if ok {
            if map.next_key::<String>()?.as_ref()
                .ok_or(A::Error::custom("Must have two keys"))? != "output"
            {
                return Err(A::Error::custom("Second ok key should be 'output'"))
            }

            let value: TestOutput = map.next_value()?;
            Ok(ExpectedResult(Ok(value)))
        } else {
            if map.next_key::<String>()?.as_ref()
                .ok_or(A::Error::custom("Must have two keys"))? != "type"
            {
                return Err(A::Error::custom("Second ok key should be 'type'"))
            }

            let error = match map.next_value::<String>()?.as_ref() {
                "SnekEvaluationError" => SnekError::SnekEvaluationError,
                "SnekSyntaxError" => SnekError::SnekSyntaxError,
                "SnekNameError" => SnekError::SnekNameError,
                other => return Err(A::Error::custom(format!("Unrecognized snek error: {}", other)))
            };
            Ok(ExpectedResult(Err(error)))
        };

        if map.next_key::<String>()? != None {
            return Err(A::Error::custom("Only two keys should be present"));
        }

        result
    }
}

fn load_input_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Vec<String>> {
    let source = std::fs::read_to_string(path)?;
    Ok(source.lines().map(str::to_owned).collect_vec())
}

fn load_output_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Vec<ExpectedResult>> {
    let source = std::fs::read(path)?;
    let result: Vec<ExpectedResult> = serde_json::from_slice(&source)?;
    Ok(result)
}

fn base_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
}

/// Loads `test_inputs/<name>.snek`, one form per line, next to the expected
/// result of each line from `test_outputs/<name>.json`.
pub fn load_test_pair(testcase: &str) -> anyhow::Result<Vec<(String, ExpectedResult)>> {
    let input = load_input_file(base_path().join("test_inputs").join(format!("{}.snek", testcase)))?;
    let output = load_output_file(base_path().join("test_outputs").join(format!("{}.json", testcase)))?;

    if input.len() != output.len() { bail!("Input and output of testcase {} does not match", testcase); }
    Ok(input.into_iter().zip(output.into_iter()).collect_vec())
}

pub fn all_testcases() -> anyhow::Result<Vec<String>> {
    let mut testcases = vec![];
    for entry in std::fs::read_dir(base_path().join("test_inputs"))? {
        let path = entry?.path();
        if path.extension().is_some_and(|extension| extension == "snek") {
            if let Some(stem) = path.file_stem().and_then(|stem| stem.to_str()) {
                testcases.push(stem.to_owned());
            }
        }
    }

    if testcases.is_empty() { bail!("No testcases found"); }
    Ok(testcases.into_iter().sorted().collect_vec())
}
