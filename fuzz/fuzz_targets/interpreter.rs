#![no_main]

use core::fmt;

use itertools::Itertools;
use libfuzzer_sys::{arbitrary::Arbitrary, fuzz_target};
use snek::{EvaluationConfig, EvaluationContext};

// Builtins and load from variables
#[derive(Arbitrary, Debug)]
enum SnekAtom {
    Add, Sub, Mul, Div,
    Identifier(String),
    Integer(i64),
    Float(f64),
}

impl fmt::Display for SnekAtom {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", match self {
            SnekAtom::Add => "+",
            SnekAtom::Sub => "-",
            SnekAtom::Mul => "*",
            SnekAtom::Div => "/",
            SnekAtom::Identifier(identifier) => identifier,
            SnekAtom::Integer(value) => return write!(f, "{}", value),
            SnekAtom::Float(value) => return write!(f, "{:?}", value),
        })
    }
}

#[derive(Arbitrary, Debug)]
enum SnekCommand {
    Lambda(Vec<SnekCommand>),
    Define(Vec<SnekCommand>),
    Call(Vec<SnekCommand>),

    Atom(SnekAtom),
}

fn stringify_arguments(values: &[SnekCommand]) -> String {
    values.iter()
        .map(SnekCommand::to_string)
        .join(" ")
}

impl fmt::Display for SnekCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SnekCommand::Atom(atom) => atom.fmt(f),
            SnekCommand::Lambda(args) => write!(f, "(lambda {})", stringify_arguments(args)),
            SnekCommand::Define(args) => write!(f, "(define {})", stringify_arguments(args)),
            SnekCommand::Call(args) => write!(f, "({})", stringify_arguments(args)),
        }
    }
}

fuzz_target!(|commands: Vec<SnekCommand>| {
    let mut context = EvaluationContext::with_config(EvaluationConfig { max_depth: Some(512) });

    for command in commands {
        let _ = context.evaluate_str(&command.to_string());
    }
});
