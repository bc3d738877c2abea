use std::io::{self, BufRead, Write};
use std::path::Path;
use std::process::ExitCode;
use std::{env, fs};

use dharma::{run_source, Config, Repl};

fn main() -> ExitCode {
    let args: Vec<String> = env::args().skip(1).collect();
    match args.as_slice() {
        [] => run_repl(),
        [path] => run_file(path),
        _ => {
            eprintln!("usage: karma [script]");
            ExitCode::FAILURE
        }
    }
}

fn run_file(path: &str) -> ExitCode {
    if Path::new(path).extension().and_then(|ext| ext.to_str()) != Some("dh") {
        eprintln!("error: '{path}' is not a '.dh' script.");
        return ExitCode::FAILURE;
    }

    let source = match fs::read_to_string(path) {
        Ok(source) => source,
        Err(err) => {
            eprintln!("error: could not read '{path}': {err}");
            return ExitCode::FAILURE;
        }
    };

    let outcome = run_source(&source, Config::default(), Box::new(io::stdout()));
    for rendered in &outcome.rendered {
        eprint!("{rendered}");
    }
    if outcome.ok {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

fn run_repl() -> ExitCode {
    println!("dharma {} — karma interactive shell", env!("CARGO_PKG_VERSION"));
    println!("type an empty line to exit");

    let mut repl = Repl::new(Config::default(), Box::new(io::stdout()));
    let stdin = io::stdin();
    let mut line = String::new();

    loop {
        print!("> ");
        io::stdout().flush().ok();
        line.clear();
        match stdin.lock().read_line(&mut line) {
            Ok(0) | Err(_) => break,
            Ok(_) => {}
        }
        if line.trim().is_empty() {
            break;
        }
        let outcome = repl.feed(&line);
        for rendered in &outcome.rendered {
            eprint!("{rendered}");
        }
    }

    println!("Thank You! May Your soul find the right path!");
    ExitCode::SUCCESS
}
