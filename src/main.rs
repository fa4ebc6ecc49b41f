use clap::{Parser as ClapParser, Subcommand};
use env_logger::Env;
use graphcalc::cli::{
    self, CheckOptions, CheckResult, CliError, OutputFormat, RenderCommand,
};
use graphcalc::{ImplicitMode, NumberMode, ParenthesisMode};
use std::io::{self, Read};

#[derive(ClapParser)]
#[command(name = "graphcalc")]
#[command(about = "graphcalc - parse, evaluate and typeset mathematical expressions")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Evaluate expressions in one shared scope and print a JSON result per expression
    Eval {
        /// The expressions (read from stdin, one per line, if not provided)
        expressions: Vec<String>,

        /// JSON object whose keys seed the scope
        #[arg(short, long)]
        scope: Option<String>,

        /// Pretty-print the output
        #[arg(short, long)]
        pretty: bool,

        /// Print the scope as JSON after the results
        #[arg(long)]
        show_scope: bool,

        /// Compile numeric literals as arbitrary precision decimals
        #[arg(long)]
        bignumber: bool,

        /// Maximum parse nesting and call depth
        #[arg(long)]
        max_depth: Option<usize>,
    },

    /// Validate the syntax without evaluating and print the errors as JSON
    Check {
        /// The expression (reads from stdin if not provided)
        expression: Option<String>,
    },

    /// Render an expression as text, HTML or LaTeX
    Render {
        /// The expression (reads from stdin if not provided)
        expression: Option<String>,

        /// text, html or latex
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,

        /// keep, auto or all
        #[arg(long, default_value = "keep")]
        parenthesis: ParenthesisMode,

        /// hide or show
        #[arg(long, default_value = "hide")]
        implicit: ImplicitMode,
    },

    /// Rewrite plain expression text into LaTeX without parsing it
    Tex {
        /// The text (reads from stdin if not provided)
        text: Option<String>,
    },
}

fn main() {
    env_logger::Builder::from_env(Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Eval {
            expressions,
            scope,
            pretty,
            show_scope,
            bignumber,
            max_depth,
        } => read_expressions(expressions).and_then(|expressions| {
            let number = if bignumber {
                NumberMode::BigNumber
            } else {
                NumberMode::Number
            };
            run_eval(
                CheckOptions {
                    expressions,
                    scope,
                    number,
                    max_depth,
                    syntax_only: false,
                },
                pretty,
                show_scope,
            )
        }),
        Commands::Check { expression } => read_expression(expression).and_then(run_check),
        Commands::Render {
            expression,
            format,
            parenthesis,
            implicit,
        } => read_expression(expression).and_then(|expression| {
            let command = RenderCommand {
                expression,
                format,
                parenthesis,
                implicit,
            };
            cli::execute_render(&command).map(|out| println!("{}", out))
        }),
        Commands::Tex { text } => read_expression(text).and_then(|text| {
            let command = RenderCommand {
                expression: text,
                format: OutputFormat::Tex,
                ..RenderCommand::default()
            };
            cli::execute_render(&command).map(|out| println!("{}", out))
        }),
    };

    if let Err(e) = result {
        eprintln!("{}", e);
        std::process::exit(1);
    }
}

fn read_stdin() -> Result<String, CliError> {
    if atty::is(atty::Stream::Stdin) {
        return Err(CliError::NoInput);
    }
    let mut buffer = String::new();
    io::stdin().read_to_string(&mut buffer)?;
    Ok(buffer)
}

fn read_expression(expression: Option<String>) -> Result<String, CliError> {
    match expression {
        Some(s) => Ok(s),
        None => Ok(read_stdin()?.trim_end().to_string()),
    }
}

fn read_expressions(expressions: Vec<String>) -> Result<Vec<String>, CliError> {
    if !expressions.is_empty() {
        return Ok(expressions);
    }
    Ok(read_stdin()?
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(str::to_string)
        .collect())
}

fn print_json(value: &serde_json::Value, pretty: bool) -> Result<(), CliError> {
    let json = if pretty {
        serde_json::to_string_pretty(value)
    } else {
        serde_json::to_string(value)
    }?;
    println!("{}", json);
    Ok(())
}

fn run_eval(options: CheckOptions, pretty: bool, show_scope: bool) -> Result<(), CliError> {
    let CheckResult::Success { results, scope } = cli::execute_check(&options)? else {
        return Ok(());
    };
    for result in results {
        print_json(&result, pretty)?;
    }
    if show_scope {
        print_json(&scope, pretty)?;
    }
    Ok(())
}

fn run_check(expression: String) -> Result<(), CliError> {
    let options = CheckOptions {
        expressions: vec![expression],
        syntax_only: true,
        ..CheckOptions::default()
    };
    match cli::execute_check(&options) {
        Ok(_) => print_json(&serde_json::json!([]), false),
        Err(CliError::Parse(errors)) => {
            print_json(&cli::errors_to_json(&errors), false)?;
            std::process::exit(1);
        }
        Err(e) => Err(e),
    }
}
