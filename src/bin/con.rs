use std::io::{BufRead, IsTerminal, Write};

use con::{interpreter::Interpreter, options};
use termcolor::{ColorChoice, StandardStream};

fn main() {
    env_logger::init();

    let options = match options::parse() {
        Ok(options) => options,
        Err(err) => {
            eprintln!("con: {err}");
            eprintln!("{}", options::USAGE);
            std::process::exit(2);
        }
    };
    if options.help {
        println!("{}", options::USAGE);
        return;
    }

    let mut interp = match Interpreter::with_config(options.heap) {
        Ok(interp) => interp,
        Err(err) => {
            eprintln!("con: failed to initialize runtime: {err}");
            std::process::exit(1);
        }
    };
    let mut out = StandardStream::stdout(ColorChoice::Auto);

    let mut ok = true;
    for expr in &options.eval {
        ok &= run(&mut interp, expr, &mut out, true);
    }

    if let Some(path) = &options.filename {
        match std::fs::read_to_string(path) {
            Ok(src) => ok &= run(&mut interp, &src, &mut out, false),
            Err(err) => {
                eprintln!("con: cannot read {}: {err}", path.display());
                ok = false;
            }
        }
    }

    if options.eval.is_empty() && options.filename.is_none() {
        repl(&mut interp, &mut out);
    }

    let stats = interp.runtime().heap().stats();
    log::info!(
        "{} allocations, {} collections, {} arenas",
        stats.allocations,
        stats.collections,
        stats.arenas
    );
    if !ok {
        std::process::exit(1);
    }
}

/// Evaluates `src`, printing the last value when `print` is set. Returns
/// whether evaluation succeeded.
fn run(interp: &mut Interpreter, src: &str, out: &mut StandardStream, print: bool) -> bool {
    match interp.eval_str(src) {
        Ok(value) => {
            if print {
                if let Err(err) = interp.print(value, out) {
                    log::warn!("failed to print result: {}", err);
                }
            }
            true
        }
        Err(err) => {
            eprintln!("error: {err}");
            if !err.is_recoverable() {
                std::process::exit(70);
            }
            false
        }
    }
}

fn repl(interp: &mut Interpreter, out: &mut StandardStream) {
    let stdin = std::io::stdin();
    let interactive = stdin.is_terminal();
    if interactive {
        println!("con version {}", env!("CARGO_PKG_VERSION"));
        println!("Press Ctrl + D to exit.\n");
    }

    let mut line = String::new();
    loop {
        if interactive {
            print!("con> ");
            let _ = std::io::stdout().flush();
        }
        line.clear();
        match stdin.lock().read_line(&mut line) {
            Ok(0) => break,
            Ok(_) => {}
            Err(err) => {
                eprintln!("con: {err}");
                break;
            }
        }
        if !line.trim().is_empty() {
            run(interp, &line, out, true);
        }
    }
}
