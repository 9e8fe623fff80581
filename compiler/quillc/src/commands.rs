//! Subcommands of the `quill` binary.
//!
//! Each command reports its own errors on stderr and exits with status 1
//! on failure.

use std::io::{self, BufRead, Write};
use std::process;

use quill_syntax::parse;
use quill_value::Variant;
use quill_vm::VmConfig;

use crate::{Session, SessionConfig};

/// Options accepted by `quill run`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RunOptions {
    pub config: SessionConfig,
    /// Print the program listing before running it.
    pub disasm: bool,
}

/// Parse the flags that follow `quill run <file>`.
pub fn parse_run_options(args: &[String]) -> Result<RunOptions, String> {
    let mut options = RunOptions::default();
    for arg in args {
        if arg == "--no-opt" {
            options.config.optimize = false;
        } else if arg == "--disasm" {
            options.disasm = true;
        } else if let Some(value) = arg.strip_prefix("--stack=") {
            let capacity: usize = value
                .parse()
                .map_err(|_| format!("invalid stack size `{value}`"))?;
            if capacity == 0 {
                return Err("stack size must be positive".to_owned());
            }
            options.config.vm = VmConfig {
                stack_capacity: capacity,
            };
        } else {
            return Err(format!("unknown option `{arg}`"));
        }
    }
    Ok(options)
}

fn read_source(path: &str) -> String {
    match std::fs::read_to_string(path) {
        Ok(source) => source,
        Err(e) => {
            eprintln!("error: cannot read {path}: {e}");
            process::exit(1);
        }
    }
}

/// Compile and run a script file. A non-null result is printed.
pub fn run_file(path: &str, options: &RunOptions) {
    let source = read_source(path);
    let mut session = Session::with_config(options.config.clone());
    if let Err(e) = session.compile(&source) {
        eprint!("{}", e.render(path, &source));
        process::exit(1);
    }
    if options.disasm {
        print!("{}", session.disassemble());
    }
    match session.run() {
        Ok(Variant::Null) => {}
        Ok(value) => println!("{}", session.display(&value)),
        Err(e) => {
            eprint!("{}", e.render(path, &source));
            process::exit(1);
        }
    }
}

/// Print the bytecode listing of a script file.
pub fn disasm_file(path: &str, config: &SessionConfig) {
    let source = read_source(path);
    let mut session = Session::with_config(config.clone());
    if let Err(e) = session.compile(&source) {
        eprint!("{}", e.render(path, &source));
        process::exit(1);
    }
    print!("{}", session.disassemble());
}

/// Print the syntax tree of a script file.
pub fn parse_file(path: &str) {
    let source = read_source(path);
    match parse(&source) {
        Ok(script) => println!("{script:#?}"),
        Err(e) => {
            eprint!("{}", crate::diagnostic::render_parse_error(path, &source, &e));
            process::exit(1);
        }
    }
}

/// Write a compiled program image to `output`.
#[cfg(feature = "cache")]
pub fn compile_image(path: &str, output: &str, config: &SessionConfig) {
    let source = read_source(path);
    let mut session = Session::with_config(config.clone());
    if let Err(e) = session.compile(&source) {
        eprint!("{}", e.render(path, &source));
        process::exit(1);
    }
    let written = session
        .program()
        .to_image()
        .map_err(|e| e.to_string())
        .and_then(|bytes| std::fs::write(output, bytes).map_err(|e| e.to_string()));
    if let Err(e) = written {
        eprintln!("error: cannot write {output}: {e}");
        process::exit(1);
    }
}

/// Load and run a program image written by `compile_image`.
#[cfg(feature = "cache")]
pub fn exec_image(path: &str, config: &SessionConfig) {
    let program = std::fs::read(path)
        .map_err(|e| e.to_string())
        .and_then(|bytes| quill_bytecode::Program::from_image(&bytes).map_err(|e| e.to_string()));
    let program = match program {
        Ok(program) => program,
        Err(e) => {
            eprintln!("error: cannot load {path}: {e}");
            process::exit(1);
        }
    };
    let mut session = Session::with_config(config.clone());
    match session.run_image(program) {
        Ok(Variant::Null) => {}
        Ok(value) => println!("{}", session.display(&value)),
        Err(e) => {
            eprintln!("error: {e}");
            process::exit(1);
        }
    }
}

/// Net `{` minus `}` outside string literals.
fn brace_depth(text: &str) -> i64 {
    let mut depth = 0;
    let mut in_string = false;
    let mut escaped = false;
    for c in text.chars() {
        if in_string {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match c {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => depth -= 1,
            _ => {}
        }
    }
    depth
}

/// A REPL entry is complete once its last line ends with `;` or `}` and
/// every brace is closed.
pub fn entry_complete(buffer: &str) -> bool {
    let trimmed = buffer.trim_end();
    (trimmed.ends_with(';') || trimmed.ends_with('}')) && brace_depth(buffer) <= 0
}

enum ReplCommand {
    Collect,
    Objects,
    Globals,
    Quit,
}

fn repl_command(line: &str) -> Option<ReplCommand> {
    match line.trim() {
        ":collect" => Some(ReplCommand::Collect),
        ":objects" => Some(ReplCommand::Objects),
        ":globals" => Some(ReplCommand::Globals),
        ":quit" | ":q" => Some(ReplCommand::Quit),
        _ => None,
    }
}

fn prompt(text: &str) {
    print!("{text}");
    let _ = io::stdout().flush();
}

/// Interactive loop over stdin. Every complete entry is evaluated in one
/// session; the result or error is printed and a host collection runs.
pub fn repl(config: &SessionConfig) {
    let mut session = Session::with_config(config.clone());
    let mut buffer = String::new();
    let stdin = io::stdin();

    println!("Quill {} (:quit to exit)", env!("CARGO_PKG_VERSION"));
    prompt("> ");
    for line in stdin.lock().lines() {
        let Ok(line) = line else { break };

        if buffer.is_empty() {
            if line.trim().is_empty() {
                prompt("> ");
                continue;
            }
            if let Some(command) = repl_command(&line) {
                match command {
                    ReplCommand::Collect => println!("freed {}", session.collect()),
                    ReplCommand::Objects => println!("{} objects", session.object_count()),
                    ReplCommand::Globals => {
                        for name in session.context().global_names() {
                            let value = session.context().lookup(name);
                            println!("{name} = {}", session.display(&value));
                        }
                    }
                    ReplCommand::Quit => return,
                }
                prompt("> ");
                continue;
            }
        }

        buffer.push_str(&line);
        buffer.push('\n');
        if !entry_complete(&buffer) {
            prompt(". ");
            continue;
        }

        let entry = std::mem::take(&mut buffer);
        match session.eval(&entry) {
            Ok(Variant::Null) => {}
            Ok(value) => println!("{}", session.display(&value)),
            Err(e) => eprint!("{}", e.render("<repl>", &entry)),
        }
        let freed = session.collect();
        tracing::debug!(freed, "collected after entry");
        prompt("> ");
    }
}
