//! Quill command-line driver.

use quillc::commands::{disasm_file, parse_file, parse_run_options, repl, run_file};
use quillc::SessionConfig;

fn print_usage() {
    eprintln!("Usage: quill <command> [args]");
    eprintln!();
    eprintln!("Commands:");
    eprintln!("  run <file> [options]   Compile and run a script");
    eprintln!("  repl                   Interactive session");
    eprintln!("  disasm <file>          Print the bytecode listing");
    eprintln!("  parse <file>           Print the syntax tree");
    #[cfg(feature = "cache")]
    {
        eprintln!("  compile <file> -o <out> Write a program image");
        eprintln!("  exec <image>           Run a program image");
    }
    eprintln!();
    eprintln!("Run options:");
    eprintln!("  --no-opt               Skip constant folding");
    eprintln!("  --stack=<n>            Evaluation stack size in values");
    eprintln!("  --disasm               Print the listing before running");
}

fn file_arg<'a>(args: &'a [String], usage: &str) -> &'a str {
    match args.get(2) {
        Some(path) if !path.starts_with('-') => path.as_str(),
        _ => {
            eprintln!("Usage: {usage}");
            std::process::exit(1);
        }
    }
}

fn main() {
    quillc::init_tracing();

    let args: Vec<String> = std::env::args().collect();
    if args.len() < 2 {
        print_usage();
        std::process::exit(1);
    }

    match args[1].as_str() {
        "run" => {
            let path = file_arg(&args, "quill run <file> [--no-opt] [--stack=<n>] [--disasm]");
            match parse_run_options(&args[3..]) {
                Ok(options) => run_file(path, &options),
                Err(message) => {
                    eprintln!("error: {message}");
                    std::process::exit(1);
                }
            }
        }
        "repl" => repl(&SessionConfig::default()),
        "disasm" => {
            let path = file_arg(&args, "quill disasm <file>");
            disasm_file(path, &SessionConfig::default());
        }
        "parse" => {
            let path = file_arg(&args, "quill parse <file>");
            parse_file(path);
        }
        #[cfg(feature = "cache")]
        "compile" => {
            let path = file_arg(&args, "quill compile <file> -o <out>");
            let output = match (args.get(3).map(String::as_str), args.get(4)) {
                (Some("-o"), Some(output)) => output,
                _ => {
                    eprintln!("Usage: quill compile <file> -o <out>");
                    std::process::exit(1);
                }
            };
            quillc::commands::compile_image(path, output, &SessionConfig::default());
        }
        #[cfg(feature = "cache")]
        "exec" => {
            let path = file_arg(&args, "quill exec <image>");
            quillc::commands::exec_image(path, &SessionConfig::default());
        }
        "help" | "--help" | "-h" => print_usage(),
        other => {
            eprintln!("error: unknown command `{other}`");
            print_usage();
            std::process::exit(1);
        }
    }
}
