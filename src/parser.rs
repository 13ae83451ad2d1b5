use core::fmt;
use std::{borrow::Cow, mem};

use itertools::Itertools;
use logos::Logos;
use tracing::debug;

use crate::{error::SnekError, number::Number, stack::ensure_sufficient_stack};

#[derive(Debug, Clone, Copy, PartialEq, Logos)]
#[logos(skip r"\s+")]
#[logos(skip r";[^\n]*")]
enum Token {
    #[token("(")]
    LeftParen,

    #[token(")")]
    RightParen,

    #[regex(r"[^\s();]+")]
    Atom,
}

// Sexps are the basic building blocks of snek
#[derive(Debug, Clone, PartialEq)]
pub enum Sexp {
    Number(Number),
    Symbol(String),
    List(Vec<Self>),
}

impl Sexp {
    pub fn symbol(name: impl Into<String>) -> Self {
        Self::Symbol(name.into())
    }

    pub fn as_symbol(&self) -> Option<&str> {
        match self {
            Self::Symbol(name) => Some(name),
            _ => None,
        }
    }
}

impl fmt::Display for Sexp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(number) => write!(f, "{}", number),
            Self::Symbol(name) => f.write_str(name),
            Self::List(list) => write!(f, "({})", list.iter().join(" ")),
        }
    }
}

// Deep trees are freed with a worklist instead of recursing once per level.
impl Drop for Sexp {
    fn drop(&mut self) {
        let mut pending = match self {
            Self::List(list) if list.iter().any(|sexp| matches!(sexp, Self::List(_))) => mem::take(list),
            _ => return,
        };

        while let Some(mut sexp) = pending.pop() {
            if let Self::List(list) = &mut sexp {
                pending.append(list);
            }
        }
    }
}

type ParseResult<O> = Result<O, SnekError>;

/// Splits source text into `(`, `)` and atom tokens. A `;` starts a comment
/// that runs to the end of the line; nothing inside it becomes a token.
///
/// Every character is either whitespace, a comment, a paren or part of an
/// atom, so tokenizing cannot fail.
pub fn tokenize(source: &str) -> Vec<&str> {
    Token::lexer(source)
        .spanned()
        .map(|(_, span)| &source[span])
        .collect()
}

/// Integer if possible, otherwise float, otherwise a symbol.
pub fn number_or_symbol(token: &str) -> Sexp {
    match Number::from_literal(token) {
        Some(number) => Sexp::Number(number),
        None => Sexp::symbol(token),
    }
}

/// Given the index of a `(`, returns the index of the `)` closing it.
pub fn find_matching_paren(tokens: &[&str], open: usize) -> ParseResult<usize> {
    if tokens.get(open) != Some(&"(") {
        return Err(SnekError::SnekSyntaxError);
    }

    let mut depth = 0usize;
    for (index, token) in tokens.iter().enumerate().skip(open) {
        match *token {
            "(" => depth += 1,
            ")" => depth -= 1,
            _ => {}
        }
        if depth == 0 {
            return Ok(index);
        }
    }

    debug!(open, "unbalanced parentheses");
    Err(SnekError::SnekSyntaxError)
}

/// The same pairing as [`find_matching_paren`], computed for every `(` in
/// one pass: `closes[i]` is the index closing the paren opened at `i`.
fn closing_parens(tokens: &[&str]) -> ParseResult<Vec<usize>> {
    let mut closes = vec![0; tokens.len()];
    let mut open = vec![];

    for (index, token) in tokens.iter().enumerate() {
        match *token {
            "(" => open.push(index),
            ")" => match open.pop() {
                Some(start) => closes[start] = index,
                None => {
                    debug!(index, "unmatched closing parenthesis");
                    return Err(SnekError::SnekSyntaxError);
                }
            },
            _ => {}
        }
    }

    if let Some(start) = open.pop() {
        debug!(open = start, "unbalanced parentheses");
        return Err(SnekError::SnekSyntaxError);
    }
    Ok(closes)
}

fn parse_sequence(tokens: &[&str], closes: &[usize], mut index: usize, end: usize) -> Vec<Sexp> {
    let mut sexps = vec![];

    while index < end {
        if tokens[index] == "(" {
            let close = closes[index];
            sexps.push(Sexp::List(ensure_sufficient_stack(|| parse_sequence(tokens, closes, index + 1, close))));
            index = close + 1;
        } else {
            sexps.push(number_or_symbol(tokens[index]));
            index += 1;
        }
    }

    sexps
}

fn parse_forms(tokens: &[&str]) -> ParseResult<Vec<Sexp>> {
    let closes = closing_parens(tokens)?;
    Ok(parse_sequence(tokens, &closes, 0, tokens.len()))
}

/// Parses exactly one top-level form. Empty input and leftover tokens after
/// the first complete form are both syntax errors.
pub fn parse(tokens: &[&str]) -> ParseResult<Sexp> {
    let mut sexps = parse_forms(tokens)?;
    if sexps.len() != 1 {
        debug!(forms = sexps.len(), "expected exactly one top-level form");
        return Err(SnekError::SnekSyntaxError);
    }

    let sexp = sexps.remove(0);
    semantic_checker(&sexp)?;
    Ok(sexp)
}

/// Parses any number of consecutive top-level forms.
pub fn parse_program(tokens: &[&str]) -> ParseResult<Vec<Sexp>> {
    let sexps = parse_forms(tokens)?;
    sexps.iter().try_for_each(semantic_checker)?;
    Ok(sexps)
}

pub(crate) fn parameter_names(list: &[Sexp]) -> ParseResult<Vec<String>> {
    list.iter()
        .map(|sexp| match sexp {
            Sexp::Symbol(name) => Ok(name.clone()),
            _ => Err(SnekError::SnekSyntaxError),
        })
        .collect()
}

/// Splits the operands of a `define` into the bound name and the expression
/// producing its value. The function shorthand `(define (f a b) body)` is
/// rewritten to `(define f (lambda (a b) body))`.
pub(crate) fn desugar_define(list: &[Sexp]) -> ParseResult<(&str, Cow<'_, Sexp>)> {
    match list {
        [Sexp::Symbol(name), value] => Ok((name.as_str(), Cow::Borrowed(value))),
        [Sexp::List(signature), body] => match signature.split_first() {
            Some((Sexp::Symbol(name), parameters)) => {
                let lambda = Sexp::List(vec![
                    Sexp::symbol("lambda"),
                    Sexp::List(parameters.to_vec()),
                    body.clone(),
                ]);
                Ok((name.as_str(), Cow::Owned(lambda)))
            }
            _ => Err(SnekError::SnekSyntaxError),
        },
        _ => Err(SnekError::SnekSyntaxError),
    }
}

/// Splits the operands of a `lambda` into its parameter names and body.
pub(crate) fn lambda_parts(list: &[Sexp]) -> ParseResult<(Vec<String>, &Sexp)> {
    match list {
        [Sexp::List(parameters), body] => Ok((parameter_names(parameters)?, body)),
        _ => Err(SnekError::SnekSyntaxError),
    }
}

fn semantic_checker(sexp: &Sexp) -> ParseResult<()> {
    let list = match sexp {
        Sexp::List(list) => list,
        _ => return Ok(()),
    };

    match list.first().and_then(Sexp::as_symbol) {
        Some("define") => {
            let (_, value) = desugar_define(&list[1..])?;
            // The shorthand form desugars into a lambda, which checks its
            // parameter list below.
            return ensure_sufficient_stack(|| semantic_checker(&value));
        }
        Some("lambda") => {
            lambda_parts(&list[1..])?;
        }
        _ => {}
    }

    list.iter()
        .try_for_each(|sexp| ensure_sufficient_stack(|| semantic_checker(sexp)))
}

#[cfg(test)]
mod tests {
    use anyhow::bail;

    use crate::test_utils::{all_testcases, load_test_pair};

    use super::*;

    fn parse_str(source: &str) -> ParseResult<Sexp> {
        parse(&tokenize(source))
    }

    fn int(value: i64) -> Sexp {
        Sexp::Number(Number::Integer(value))
    }

    #[test]
    fn tokenize_nested() -> anyhow::Result<()> {
        assert_eq!(
            tokenize("(+ 2 (- 5 3))"),
            vec!["(", "+", "2", "(", "-", "5", "3", ")", ")"]
        );
        Ok(())
    }

    #[test]
    fn tokenize_strips_comments() -> anyhow::Result<()> {
        assert_eq!(
            tokenize("(+ 1 2) ; comment (with parens)\n(+ 3 4)"),
            vec!["(", "+", "1", "2", ")", "(", "+", "3", "4", ")"]
        );
        assert_eq!(tokenize("x;trailing"), vec!["x"]);
        assert!(tokenize("   ; only a comment").is_empty());
        Ok(())
    }

    #[test]
    fn tokenize_splits_parens_without_whitespace() -> anyhow::Result<()> {
        assert_eq!(tokenize("(f(g x))"), vec!["(", "f", "(", "g", "x", ")", ")"]);
        Ok(())
    }

    #[test]
    fn parse_nested() -> anyhow::Result<()> {
        let tokens = tokenize("(+ 2 (- 5 3))");
        assert_eq!(
            parse(&tokens)?,
            Sexp::List(vec![
                Sexp::symbol("+"),
                int(2),
                Sexp::List(vec![Sexp::symbol("-"), int(5), int(3)]),
            ])
        );
        Ok(())
    }

    #[test]
    fn atoms() -> anyhow::Result<()> {
        assert_eq!(parse_str("8")?, int(8));
        assert_eq!(parse_str("-5.32")?, Sexp::Number(Number::Float(-5.32)));
        assert_eq!(parse_str("1.2.3.4")?, Sexp::symbol("1.2.3.4"));
        assert_eq!(parse_str("x")?, Sexp::symbol("x"));
        assert_eq!(parse_str("()")?, Sexp::List(vec![]));
        Ok(())
    }

    #[test]
    fn paren_matching() {
        let tokens = ["(", "a", "(", "b", ")", ")", "c"];
        assert_eq!(find_matching_paren(&tokens, 0), Ok(5));
        assert_eq!(find_matching_paren(&tokens, 2), Ok(4));
        assert_eq!(find_matching_paren(&tokens, 1), Err(SnekError::SnekSyntaxError));
        assert_eq!(find_matching_paren(&["(", "("], 0), Err(SnekError::SnekSyntaxError));
    }

    #[test]
    fn malformed_structure() {
        for source in ["(+ 2 3", ")", "(+ 2 3))", "1 2", "(a) (b)", "", "; nothing"] {
            assert_eq!(parse_str(source), Err(SnekError::SnekSyntaxError), "{:?}", source);
        }
    }

    #[test]
    fn define_shapes() {
        assert!(parse_str("(define x 5)").is_ok());
        assert!(parse_str("(define (f a b) (+ a b))").is_ok());
        assert!(parse_str("(define (f) 1)").is_ok());

        for source in [
            "(define)",
            "(define x)",
            "(define x 1 2)",
            "(define 5 1)",
            "(define () 1)",
            "(define (f 1) 1)",
            "(define (5 a) 1)",
            "(+ 1 (define x))",
        ] {
            assert_eq!(parse_str(source), Err(SnekError::SnekSyntaxError), "{:?}", source);
        }
    }

    #[test]
    fn lambda_shapes() {
        assert!(parse_str("(lambda (x y) (+ x y))").is_ok());
        assert!(parse_str("(lambda () 4)").is_ok());

        for source in [
            "(lambda)",
            "(lambda x x)",
            "(lambda (x))",
            "(lambda (x) x x)",
            "(lambda (x 2) x)",
            "(define f (lambda (1) 1))",
            "((lambda (x (y)) x) 1)",
        ] {
            assert_eq!(parse_str(source), Err(SnekError::SnekSyntaxError), "{:?}", source);
        }
    }

    #[test]
    fn program_accepts_many_forms() -> anyhow::Result<()> {
        let tokens = tokenize("(define x 1)\n(+ x 2) ; done\n7");
        let forms = parse_program(&tokens)?;
        assert_eq!(forms.len(), 3);
        assert_eq!(forms[2], int(7));

        assert!(parse_program(&[])?.is_empty());
        assert_eq!(parse_program(&tokenize("(lambda x 1)")), Err(SnekError::SnekSyntaxError));
        Ok(())
    }

    #[test]
    fn deep_nesting() -> anyhow::Result<()> {
        let depth = 2000;
        let source = format!("{}0{}", "(- ".repeat(depth), ")".repeat(depth));
        assert!(matches!(parse_str(&source)?, Sexp::List(_)));
        Ok(())
    }

    #[test]
    fn very_deep_forms_parse_and_drop() -> anyhow::Result<()> {
        let depth = 50_000;
        let source = format!("{}0{}", "(+ 1 ".repeat(depth), ")".repeat(depth));
        let sexp = parse_str(&source)?;
        assert!(matches!(&sexp, Sexp::List(list) if list.len() == 3));
        drop(sexp);

        let forms = parse_program(&tokenize(&source))?;
        assert_eq!(forms.len(), 1);
        Ok(())
    }

    #[test]
    fn stray_parens_in_any_position() {
        for source in ["(a))(", "((a)", "(a) )", ")(a)"] {
            assert_eq!(parse_program(&tokenize(source)), Err(SnekError::SnekSyntaxError), "{:?}", source);
        }
    }

    #[test]
    fn display_round_trips_structure() -> anyhow::Result<()> {
        let sexp = parse_str("(define (f x)   (* x 2.5))")?;
        assert_eq!(sexp.to_string(), "(define (f x) (* x 2.5))");
        Ok(())
    }

    fn assert_can_parse(testcase: &str, lineno: usize, input: &str, expected: Result<(), SnekError>) -> anyhow::Result<()> {
        let parse_result = parse(&tokenize(input));
        match (parse_result, expected) {
            (Ok(result), Err(SnekError::SnekSyntaxError))
                => bail!("Testcase {}:{} - Expected a syntax error but got {}", testcase, lineno, result),
            (Err(result), Ok(()))
                => bail!("Testcase {}:{} - Expected a form but got {:?}", testcase, lineno, result),
            (Err(result), Err(SnekError::SnekSyntaxError)) if result != SnekError::SnekSyntaxError
                => bail!("Testcase {}:{} - Expected a syntax error but got {:?}", testcase, lineno, result),
            _ => Ok(())
        }
    }

    #[test]
    fn parse_testcases() -> anyhow::Result<()> {
        for testcase in all_testcases()? {
            println!("Running testcase {}", testcase);
            let entries = load_test_pair(&testcase)?;

            for (lineno, (input, expected)) in entries.into_iter().enumerate() {
                // Only syntax errors are visible to the parser
                let expected = match expected.into_result() {
                    Err(SnekError::SnekSyntaxError) => Err(SnekError::SnekSyntaxError),
                    _ => Ok(()),
                };
                assert_can_parse(&testcase, lineno, &input, expected)?;
            }
        }

        Ok(())
    }
}
