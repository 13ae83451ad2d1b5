use std::rc::Rc;

use tracing::debug;

use crate::{
    environment::Environment,
    error::SnekError,
    interpreter::{evaluate, evaluate_with, CallStack, EvaluationResult, SnekValue},
    parser::{parse, parse_program, tokenize, Sexp},
};

/// Settings for an [`EvaluationContext`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EvaluationConfig {
    /// Deepest nesting of evaluation allowed before giving up with
    /// [`SnekError::SnekEvaluationError`]. `None` means no limit.
    pub max_depth: Option<usize>,
}

/// A session: one global environment that successive inputs evaluate in,
/// so bindings made by `define` persist from one input to the next.
#[derive(Debug)]
pub struct EvaluationContext {
    environment: Rc<Environment>,
    config: EvaluationConfig,
}

impl EvaluationContext {
    pub fn new() -> Self {
        Self::with_config(EvaluationConfig::default())
    }

    pub fn with_config(config: EvaluationConfig) -> Self {
        Self {
            environment: Environment::global(),
            config,
        }
    }

    pub fn environment(&self) -> &Rc<Environment> {
        &self.environment
    }

    pub fn evaluate_sexp(&mut self, sexp: &Sexp) -> EvaluationResult {
        let mut stack = CallStack::new(self.config.max_depth);
        evaluate_with(sexp, &self.environment, &mut stack)
    }

    /// Evaluates a single top-level form.
    pub fn evaluate_str(&mut self, source: &str) -> EvaluationResult {
        let tokens = tokenize(source);
        let sexp = parse(&tokens)?;
        self.evaluate_sexp(&sexp)
    }

    /// Evaluates every top-level form in `source`, in order. The run stops at
    /// the first failure; definitions made before it are kept.
    pub fn evaluate_program(&mut self, source: &str) -> Result<Vec<SnekValue>, SnekError> {
        let tokens = tokenize(source);
        let sexps = parse_program(&tokens)?;
        debug!(forms = sexps.len(), "evaluating program");

        sexps.iter()
            .map(|sexp| self.evaluate_sexp(sexp))
            .collect()
    }
}

impl Default for EvaluationContext {
    fn default() -> Self {
        Self::new()
    }
}

/// Evaluates `sexp` and hands back the environment it ran in along with the
/// result. Without an environment, a fresh global one is created.
pub fn result_and_env(sexp: &Sexp, environment: Option<Rc<Environment>>) -> Result<(SnekValue, Rc<Environment>), SnekError> {
    let environment = environment.unwrap_or_else(Environment::global);
    let value = evaluate(sexp, &environment)?;
    Ok((value, environment))
}
