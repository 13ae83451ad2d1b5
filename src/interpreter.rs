use core::fmt;
use std::rc::Rc;

use itertools::Itertools;
use tracing::{debug, trace};

use crate::{
    environment::Environment,
    error::SnekError,
    number::Number,
    parser::{desugar_define, lambda_parts, Sexp},
    stack::ensure_sufficient_stack,
};

pub type EvaluationResult = Result<SnekValue, SnekError>;

/// A value produced by evaluating an expression.
#[derive(Debug, Clone)]
pub enum SnekValue {
    Number(Number),
    Builtin(Builtin),
    Closure(Rc<Closure>),
}

// Functions compare by identity.
impl PartialEq for SnekValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Number(a), Self::Number(b)) => a == b,
            (Self::Builtin(a), Self::Builtin(b)) => a.name == b.name,
            (Self::Closure(a), Self::Closure(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl fmt::Display for SnekValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(number) => write!(f, "{}", number),
            Self::Builtin(builtin) => write!(f, "<builtin {}>", builtin.name),
            Self::Closure(closure) => write!(f, "<function ({})>", closure.parameters.iter().join(" ")),
        }
    }
}

/// A primitive operation supplied by the runtime.
#[derive(Clone, Copy)]
pub struct Builtin {
    name: &'static str,
    function: fn(Vec<SnekValue>) -> EvaluationResult,
}

impl Builtin {
    pub const fn new(name: &'static str, function: fn(Vec<SnekValue>) -> EvaluationResult) -> Self {
        Self { name, function }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    fn call(&self, arguments: Vec<SnekValue>) -> EvaluationResult {
        (self.function)(arguments)
    }
}

impl fmt::Debug for Builtin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Builtin({})", self.name)
    }
}

/// A user-defined function together with the environment it was created in.
pub struct Closure {
    parameters: Vec<String>,
    body: Sexp,
    environment: Rc<Environment>,
}

impl Closure {
    pub fn environment(&self) -> &Rc<Environment> {
        &self.environment
    }

    fn call(&self, arguments: Vec<SnekValue>, stack: &mut CallStack) -> EvaluationResult {
        // To evaluate a closure, it must receive exactly one argument per parameter
        if arguments.len() != self.parameters.len() {
            debug!(expected = self.parameters.len(), got = arguments.len(), "arity mismatch");
            return Err(SnekError::SnekEvaluationError);
        }

        // The new frame hangs off the defining environment, not the caller's
        let frame = Environment::enclosed(&self.environment);
        for (parameter, value) in self.parameters.iter().zip(arguments) {
            frame.define(parameter.as_str(), value);
        }

        trace!(depth = stack.depth(), body = %self.body, "applying closure");
        evaluate_with(&self.body, &frame, stack)
    }
}

impl fmt::Debug for Closure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Closure")
            .field("parameters", &self.parameters)
            .field("body", &self.body)
            .finish_non_exhaustive()
    }
}

/// Tracks how deeply evaluation is nested, and the limit on that depth.
#[derive(Debug, Clone, Default)]
pub struct CallStack {
    depth: usize,
    limit: Option<usize>,
}

impl CallStack {
    pub fn new(limit: Option<usize>) -> Self {
        Self { depth: 0, limit }
    }

    pub fn unbounded() -> Self {
        Self::new(None)
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    fn enter(&mut self) -> Result<(), SnekError> {
        if self.limit.is_some_and(|limit| self.depth >= limit) {
            debug!(depth = self.depth, "maximum evaluation depth exceeded");
            return Err(SnekError::SnekEvaluationError);
        }
        self.depth += 1;
        Ok(())
    }

    fn exit(&mut self) {
        self.depth -= 1;
    }
}

/// Calls `function` with already evaluated arguments.
pub fn apply(function: &SnekValue, arguments: Vec<SnekValue>, stack: &mut CallStack) -> EvaluationResult {
    match function {
        SnekValue::Builtin(builtin) => builtin.call(arguments),
        SnekValue::Closure(closure) => closure.call(arguments, stack),
        SnekValue::Number(number) => {
            debug!(%number, "not callable");
            Err(SnekError::SnekEvaluationError)
        }
    }
}

fn evaluate_define(list: &[Sexp], environment: &Rc<Environment>, stack: &mut CallStack) -> EvaluationResult {
    // Either `(define name expr)` or the shorthand `(define (name params...) body)`,
    // which is evaluated as `(define name (lambda (params...) body))`
    let (name, value_expression) = desugar_define(list)?;

    let value = evaluate_with(&value_expression, environment, stack)?;
    debug!(name, %value, "define");
    environment.define(name, value.clone());
    Ok(value)
}

fn evaluate_lambda(list: &[Sexp], environment: &Rc<Environment>) -> EvaluationResult {
    let (parameters, body) = lambda_parts(list)?;

    Ok(SnekValue::Closure(Rc::new(Closure {
        parameters,
        body: body.clone(),
        environment: Rc::clone(environment),
    })))
}

fn evaluate_list(list: &[Sexp], environment: &Rc<Environment>, stack: &mut CallStack) -> EvaluationResult {
    let (operator, operands) = match list.split_first() {
        Some(split) => split,
        None => {
            debug!("cannot evaluate an empty list");
            return Err(SnekError::SnekEvaluationError);
        }
    };

    match operator.as_symbol() {
        Some("define") => return evaluate_define(operands, environment, stack),
        Some("lambda") => return evaluate_lambda(operands, environment),
        _ => {}
    }

    // Operator first, then operands left to right, all in the current environment
    let function = evaluate_with(operator, environment, stack)?;
    let arguments = operands
        .iter()
        .map(|sexp| evaluate_with(sexp, environment, stack))
        .collect::<Result<Vec<_>, _>>()?;

    apply(&function, arguments, stack)
}

/// Evaluates `sexp` in `environment`, counting nesting against `stack`.
pub fn evaluate_with(sexp: &Sexp, environment: &Rc<Environment>, stack: &mut CallStack) -> EvaluationResult {
    stack.enter()?;
    let result = ensure_sufficient_stack(|| match sexp {
        Sexp::Number(number) => Ok(SnekValue::Number(*number)),
        Sexp::Symbol(name) => environment.lookup(name),
        Sexp::List(list) => evaluate_list(list, environment, stack),
    });
    stack.exit();
    result
}

/// Evaluates `sexp` in `environment` with no depth limit. `define` mutates
/// `environment` in place.
pub fn evaluate(sexp: &Sexp, environment: &Rc<Environment>) -> EvaluationResult {
    evaluate_with(sexp, environment, &mut CallStack::unbounded())
}
