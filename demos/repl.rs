use tokio::io::{self, AsyncBufReadExt, AsyncWriteExt};
use snek::EvaluationContext;

async fn query(stdout: &mut io::Stdout, lines: &mut io::Lines<io::BufReader<io::Stdin>>) -> io::Result<Option<String>> {
    stdout.write_all("> ".as_bytes()).await?;
    stdout.flush().await?;
    lines.next_line().await
}

#[tokio::main]
async fn main() {
    let mut context = EvaluationContext::new();
    let mut lines = io::BufReader::new(io::stdin()).lines();
    let mut stdout = io::stdout();

    while let Ok(Some(line)) = query(&mut stdout, &mut lines).await {
        if line.trim() == "QUIT" { break; }

        match context.evaluate_str(&line) {
            Ok(value) => println!("{}", value),
            Err(err) => println!("Error: {}", err),
        }
    }

    // Everything bound during the session
    let mut names: Vec<_> = context.environment().keys().into_iter().collect();
    names.sort();
    println!("{}", names.join(" "));
}
