#![no_main]

use libfuzzer_sys::fuzz_target;
use snek::{parse, parse_program, tokenize, SnekError};

fuzz_target!(|source: &str| {
    let tokens = tokenize(source);

    // A single form is also a one-form program
    match parse(&tokens) {
        Ok(sexp) => assert_eq!(parse_program(&tokens).ok(), Some(vec![sexp])),
        Err(err) => assert_eq!(err, SnekError::SnekSyntaxError),
    }
});
