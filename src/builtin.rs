use std::collections::HashMap;

use tracing::debug;

use crate::{
    error::SnekError,
    interpreter::{Builtin, EvaluationResult, SnekValue},
    number::Number,
};

fn snek_value_list_to_numbers(values: Vec<SnekValue>) -> Result<Vec<Number>, SnekError> {
    values.into_iter()
        .map(|value| match value {
            SnekValue::Number(number) => Ok(number),
            other => {
                debug!(%other, "arithmetic on a non-number");
                Err(SnekError::SnekEvaluationError)
            }
        }).collect()
}

fn builtin_add(values: Vec<SnekValue>) -> EvaluationResult {
    let values = snek_value_list_to_numbers(values)?;
    Ok(SnekValue::Number(values.into_iter().sum()))
}

fn builtin_sub(values: Vec<SnekValue>) -> EvaluationResult {
    let values = snek_value_list_to_numbers(values)?;
    match values.split_first() {
        None => Err(SnekError::SnekEvaluationError),
        Some((first, [])) => Ok(SnekValue::Number(-*first)),
        Some((first, rest)) => Ok(SnekValue::Number(*first - rest.iter().copied().sum::<Number>())),
    }
}

fn builtin_mul(values: Vec<SnekValue>) -> EvaluationResult {
    let values = snek_value_list_to_numbers(values)?;
    Ok(SnekValue::Number(values.into_iter().product()))
}

fn builtin_div(values: Vec<SnekValue>) -> EvaluationResult {
    let values = snek_value_list_to_numbers(values)?;
    let (first, rest) = values.split_first().ok_or(SnekError::SnekEvaluationError)?;

    let divisor: Number = rest.iter().copied().product();
    match first.checked_div(divisor) {
        Some(quotient) => Ok(SnekValue::Number(quotient)),
        None => {
            debug!(%first, "division by zero");
            Err(SnekError::SnekEvaluationError)
        }
    }
}

const BUILTINS: [Builtin; 4] = [
    Builtin::new("+", builtin_add),
    Builtin::new("-", builtin_sub),
    Builtin::new("*", builtin_mul),
    Builtin::new("/", builtin_div),
];

/// The bindings every global environment starts with.
pub(crate) fn builtins() -> HashMap<String, SnekValue> {
    BUILTINS.iter()
        .map(|builtin| (builtin.name().to_owned(), SnekValue::Builtin(*builtin)))
        .collect()
}
