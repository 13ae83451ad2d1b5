use thiserror::Error;

/// The three kinds of failure a snek program can produce.
///
/// Callers branch on the kind, so a failure is never recast into
/// a different variant on its way up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SnekError {
    /// Malformed token stream: unbalanced parens, a badly shaped
    /// `define`/`lambda`, or stray tokens at the top level.
    #[error("SnekSyntaxError")]
    SnekSyntaxError,
    /// A symbol was not bound anywhere in the environment chain.
    #[error("SnekNameError")]
    SnekNameError,
    /// Any other failure while evaluating a well-formed expression.
    #[error("SnekEvaluationError")]
    SnekEvaluationError,
}
