use clap::{Parser, Subcommand};
use jexl_lang::{
    Jexl,
    cli::{self, CheckOptions, CheckResult, CliError},
    output::{to_json, to_json_pretty},
};
use std::io::{self, Read};

#[derive(Parser)]
#[command(name = "jexl")]
#[command(about = "Jexl - evaluate filter expressions against a JSON context")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate and evaluate an expression
    Check {
        /// The expression to evaluate
        expression: String,

        /// JSON context (reads from stdin if not provided)
        #[arg(short, long)]
        context: Option<String>,

        /// Pretty-print the output
        #[arg(short, long)]
        pretty: bool,

        /// Only validate syntax, don't evaluate
        #[arg(long)]
        syntax_only: bool,
    },

    /// Print the tokens of an expression
    Tokens {
        /// The expression to tokenize
        expression: String,
    },
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();
    let jexl = Jexl::new();

    let result = match cli.command {
        Commands::Check {
            expression,
            context,
            pretty,
            syntax_only,
        } => run_check(&jexl, expression, context, pretty, syntax_only),
        Commands::Tokens { expression } => cli::list_tokens(&jexl, &expression).map(|lines| {
            for line in lines {
                println!("{}", line);
            }
        }),
    };

    if let Err(e) = result {
        eprintln!("{}", e);
        std::process::exit(1);
    }
}

fn run_check(
    jexl: &Jexl,
    expression: String,
    context: Option<String>,
    pretty: bool,
    syntax_only: bool,
) -> Result<(), CliError> {
    let context = match context {
        Some(s) => Some(s),
        None if !syntax_only && !atty::is(atty::Stream::Stdin) => {
            let mut buffer = String::new();
            io::stdin().read_to_string(&mut buffer)?;
            Some(buffer)
        }
        None => None,
    };

    let options = CheckOptions {
        expression,
        context,
        syntax_only,
    };

    match cli::execute_check(jexl, &options)? {
        CheckResult::SyntaxValid => println!("Syntax is valid"),
        CheckResult::Success(value) => {
            let json = if pretty {
                to_json_pretty(&value)
            } else {
                to_json(&value)
            };
            println!("{}", json);
        }
    }
    Ok(())
}
