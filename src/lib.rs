
mod builtin;
mod context;
mod environment;
mod error;
mod interpreter;
mod number;
mod parser;
mod stack;

#[cfg(test)]
mod test_utils;

pub use error::SnekError;
pub use context::{result_and_env, EvaluationConfig, EvaluationContext};
pub use environment::Environment;
pub use interpreter::{apply, evaluate, evaluate_with, Builtin, CallStack, Closure, EvaluationResult, SnekValue};
pub use number::Number;
pub use parser::{find_matching_paren, number_or_symbol, parse, parse_program, tokenize, Sexp};
