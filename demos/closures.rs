use snek::{parse, result_and_env, tokenize, Environment, SnekError};

fn main() -> Result<(), SnekError> {
    let program = vec![
        "(define (make-adder n) (lambda (x) (+ x n)))",
        "(define add5 (make-adder 5))",
        "(add5 10)",
        "n",
        "(define (spam) (* eggs 3))",
        "(spam)",
        "(define eggs 20)",
        "(spam)",
    ];

    let mut environment = Environment::global();
    for source in program {
        let tokens = tokenize(source);
        let sexp = parse(&tokens)?;

        match result_and_env(&sexp, Some(environment.clone())) {
            Ok((value, env)) => {
                println!("{}: {}", source, value);
                environment = env;
            }
            Err(err) => println!("{}: {}", source, err),
        }
    }

    Ok(())
}
