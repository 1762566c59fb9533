use clap::{Parser, Subcommand};
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;

use vesper_core::{Value, VesperError};
use vesper_vm::Interpreter;

#[derive(Parser)]
#[command(name = "vesper", about = "Vesper: a small R5RS Scheme interpreter", version)]
#[command(args_conflicts_with_subcommands = true)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// File to execute
    file: Option<String>,

    /// Evaluate an expression and print result (if non-void)
    #[arg(short, long, conflicts_with = "print")]
    eval: Option<String>,

    /// Evaluate an expression and always print result
    #[arg(short, long, conflicts_with = "eval")]
    print: Option<String>,

    /// Load file(s) before executing
    #[arg(short, long = "load", action = clap::ArgAction::Append)]
    load: Vec<String>,

    /// Suppress REPL banner
    #[arg(short, long)]
    quiet: bool,

    /// Enter REPL after running file or eval
    #[arg(short, long)]
    interactive: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse source and display the syntax tree
    Ast {
        /// File to parse
        file: Option<String>,

        /// Expression to parse
        #[arg(short, long)]
        eval: Option<String>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

fn main() {
    let cli = Cli::parse();

    if let Some(Commands::Ast { file, eval, json }) = cli.command {
        run_ast(file, eval, json);
        return;
    }

    let interpreter = Interpreter::new_std();

    for load_file in &cli.load {
        match std::fs::read_to_string(load_file) {
            Ok(content) => {
                if let Err(e) = interpreter.eval_str(&content) {
                    eprint!("Error loading {load_file}: ");
                    print_error(&e);
                    std::process::exit(1);
                }
            }
            Err(e) => {
                eprintln!("Error reading {load_file}: {e}");
                std::process::exit(1);
            }
        }
    }

    if let Some(expr) = &cli.eval {
        match interpreter.eval_str(expr) {
            Ok(val) => {
                if !matches!(val, Value::Void) {
                    println!("{val}");
                }
            }
            Err(e) => {
                print_error(&e);
                std::process::exit(1);
            }
        }
        if cli.interactive {
            repl(interpreter, cli.quiet);
        }
        return;
    }

    if let Some(expr) = &cli.print {
        match interpreter.eval_str(expr) {
            Ok(val) => println!("{val}"),
            Err(e) => {
                print_error(&e);
                std::process::exit(1);
            }
        }
        if cli.interactive {
            repl(interpreter, cli.quiet);
        }
        return;
    }

    if let Some(file) = &cli.file {
        match std::fs::read_to_string(file) {
            Ok(content) => {
                if let Err(e) = interpreter.eval_str(&content) {
                    print_error(&e);
                    std::process::exit(1);
                }
            }
            Err(e) => {
                eprintln!("Error reading {file}: {e}");
                std::process::exit(1);
            }
        }
        if cli.interactive {
            repl(interpreter, cli.quiet);
        }
        return;
    }

    repl(interpreter, cli.quiet);
}

fn run_ast(file: Option<String>, eval: Option<String>, json: bool) {
    let source = match (&file, &eval) {
        (Some(path), None) => match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) => {
                eprintln!("Error reading {path}: {e}");
                std::process::exit(1);
            }
        },
        (None, Some(expr)) => expr.clone(),
        (Some(_), Some(_)) => {
            eprintln!("Error: cannot specify both a file and --eval");
            std::process::exit(1);
        }
        (None, None) => {
            eprintln!("Error: provide a file or --eval expression");
            std::process::exit(1);
        }
    };

    let exprs = match vesper_reader::read_many(&source) {
        Ok(exprs) => exprs,
        Err(e) => {
            eprintln!("Parse error: {e}");
            std::process::exit(1);
        }
    };

    if json {
        let json_ast: Vec<serde_json::Value> = exprs.iter().map(value_to_ast_json).collect();
        let output = if json_ast.len() == 1 {
            serde_json::to_string_pretty(&json_ast[0]).expect("json encoding")
        } else {
            serde_json::to_string_pretty(&json_ast).expect("json encoding")
        };
        println!("{output}");
    } else {
        for (i, expr) in exprs.iter().enumerate() {
            if i > 0 {
                println!();
            }
            print_ast(expr, 0);
        }
    }
}

fn json_node(kind: &str, value: Option<serde_json::Value>) -> serde_json::Value {
    let mut map = serde_json::Map::new();
    map.insert("type".to_string(), serde_json::Value::String(kind.into()));
    if let Some(value) = value {
        map.insert("value".to_string(), value);
    }
    serde_json::Value::Object(map)
}

fn value_to_ast_json(val: &Value) -> serde_json::Value {
    match val {
        Value::Null => json_node("null", None),
        Value::Bool(b) => json_node("boolean", Some(serde_json::Value::Bool(*b))),
        Value::Char(c) => json_node("character", Some(serde_json::Value::String(c.to_string()))),
        Value::Number(n) => json_node("number", Some(serde_json::Value::String(n.to_string()))),
        Value::Str(s) => json_node("string", Some(serde_json::Value::String(s.to_utf8()))),
        Value::Symbol(s) => json_node("symbol", Some(serde_json::Value::String(s.name()))),
        Value::Pair(p) => {
            let mut map = serde_json::Map::new();
            if let Ok(items) = val.list_to_vec() {
                map.insert("type".to_string(), "list".into());
                map.insert(
                    "children".to_string(),
                    serde_json::Value::Array(items.iter().map(value_to_ast_json).collect()),
                );
            } else {
                map.insert("type".to_string(), "pair".into());
                map.insert("car".to_string(), value_to_ast_json(&p.car.borrow()));
                map.insert("cdr".to_string(), value_to_ast_json(&p.cdr.borrow()));
            }
            serde_json::Value::Object(map)
        }
        Value::Vector(v) => {
            let mut map = serde_json::Map::new();
            map.insert("type".to_string(), "vector".into());
            map.insert(
                "children".to_string(),
                serde_json::Value::Array(
                    v.items.borrow().iter().map(value_to_ast_json).collect(),
                ),
            );
            serde_json::Value::Object(map)
        }
        other => json_node(other.type_name(), None),
    }
}

fn print_ast(val: &Value, indent: usize) {
    let pad = "  ".repeat(indent);
    match val {
        Value::Null => println!("{pad}Null"),
        Value::Bool(b) => println!("{pad}Bool {b}"),
        Value::Char(c) => println!("{pad}Char {c:?}"),
        Value::Number(n) => println!("{pad}Number {n}"),
        Value::Str(s) => println!("{pad}String {:?}", s.to_utf8()),
        Value::Symbol(s) => println!("{pad}Symbol {s}"),
        Value::Pair(p) => {
            if let Ok(items) = val.list_to_vec() {
                println!("{pad}List");
                for item in items {
                    print_ast(&item, indent + 1);
                }
            } else {
                println!("{pad}Pair");
                print_ast(&p.car.borrow(), indent + 1);
                print_ast(&p.cdr.borrow(), indent + 1);
            }
        }
        Value::Vector(v) => {
            println!("{pad}Vector");
            for item in v.items.borrow().iter() {
                print_ast(item, indent + 1);
            }
        }
        other => println!("{pad}{}", other.type_name()),
    }
}

fn print_error(e: &VesperError) {
    eprintln!("Error: {e}");
}

fn repl(interpreter: Interpreter, quiet: bool) {
    let mut rl = DefaultEditor::new().expect("failed to create editor");
    let history_path = dirs_path().join("history.txt");
    let _ = rl.load_history(&history_path);

    if !quiet {
        println!("Vesper v{} — a small R5RS Scheme", env!("CARGO_PKG_VERSION"));
        println!("Type ,help for help, ,quit to exit\n");
    }

    let mut buffer = String::new();
    let mut in_multiline = false;

    loop {
        let prompt = if in_multiline { "  ... " } else { "vesper> " };
        match rl.readline(prompt) {
            Ok(line) => {
                let trimmed = line.trim();

                if !in_multiline {
                    match trimmed {
                        ",quit" | ",exit" | ",q" => break,
                        ",help" | ",h" => {
                            print_help();
                            continue;
                        }
                        ",env" => {
                            print_env(&interpreter);
                            continue;
                        }
                        _ => {}
                    }
                }

                if in_multiline {
                    buffer.push('\n');
                    buffer.push_str(&line);
                } else {
                    buffer = line.clone();
                }

                if !is_balanced(&buffer) {
                    in_multiline = true;
                    continue;
                }

                in_multiline = false;
                let input = buffer.trim().to_string();
                buffer.clear();

                if input.is_empty() {
                    continue;
                }

                let _ = rl.add_history_entry(&input);

                match interpreter.eval_str(&input) {
                    Ok(val) => {
                        if !matches!(val, Value::Void) {
                            println!("{val}");
                        }
                    }
                    Err(e) => {
                        print_error(&e);
                    }
                }
            }
            Err(ReadlineError::Interrupted) => {
                if in_multiline {
                    buffer.clear();
                    in_multiline = false;
                    println!("^C");
                    continue;
                }
                break;
            }
            Err(ReadlineError::Eof) => break,
            Err(e) => {
                eprintln!("Error: {e}");
                break;
            }
        }
    }

    let _ = std::fs::create_dir_all(dirs_path());
    let _ = rl.save_history(&history_path);
    println!("Goodbye!");
}

/// A line is submitted once its parentheses balance outside of strings.
fn is_balanced(input: &str) -> bool {
    let mut depth = 0i32;
    let mut in_string = false;
    let mut escape = false;
    for ch in input.chars() {
        if escape {
            escape = false;
            continue;
        }
        if ch == '\\' && in_string {
            escape = true;
            continue;
        }
        if ch == '"' {
            in_string = !in_string;
            continue;
        }
        if in_string {
            continue;
        }
        match ch {
            '(' => depth += 1,
            ')' => depth -= 1,
            _ => {}
        }
    }
    depth <= 0 && !in_string
}

fn print_help() {
    println!("Vesper REPL Commands:");
    println!("  ,quit / ,q    Exit the REPL");
    println!("  ,help / ,h    Show this help");
    println!("  ,env          Show defined variables");
    println!();
    println!("Core Forms:");
    println!("  define, lambda, if, cond, let, let*, letrec, do, begin");
    println!("  quote, quasiquote, and, or, set!, delay, call/cc");
}

fn print_env(interpreter: &Interpreter) {
    let bindings = interpreter.global_env.bindings.borrow();
    let mut user_bindings: Vec<(String, &Value)> = bindings
        .iter()
        .filter(|(_, v)| !matches!(v, Value::Builtin(_)))
        .map(|(k, v)| (k.name(), v))
        .collect();
    user_bindings.sort_by(|(a, _), (b, _)| a.cmp(b));
    if user_bindings.is_empty() {
        println!("(no user-defined bindings)");
    } else {
        for (name, val) in user_bindings {
            println!("  {name} = {val}");
        }
    }
}

fn dirs_path() -> std::path::PathBuf {
    std::env::var("HOME")
        .map(std::path::PathBuf::from)
        .unwrap_or_else(|_| std::path::PathBuf::from("."))
        .join(".vesper")
}
