use clap::{Args, Parser as ClapParser, Subcommand};
use include_path::cli::{self, CliContext, CliError, SessionOptions};
use std::{
    io::{self, Read},
    path::PathBuf,
};

#[derive(ClapParser)]
#[command(name = "include-path")]
#[command(about = "Compile dotted member paths into Include accessor expressions")]
#[command(version)]
struct Cli {
    /// Log filter used when RUST_LOG is not set
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct Session {
    /// Schema JSON file (defaults to the bundled SharePoint schema)
    #[arg(long)]
    schema: Option<PathBuf>,

    /// Compiler config JSON file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Use namespace-qualified Include/Where names
    #[arg(short, long)]
    qualified: bool,
}

impl Session {
    fn options(&self) -> SessionOptions {
        SessionOptions {
            schema: self.schema.clone(),
            config: self.config.clone(),
            qualified: self.qualified,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Print the accessor expression for a member path
    Generate {
        /// Root type name, e.g. Web
        root: String,
        /// Dotted member path, e.g. Lists.Title
        path: String,
        #[command(flatten)]
        session: Session,
    },

    /// Generate and type-check one or more member paths
    Compile {
        root: String,
        #[arg(required = true)]
        paths: Vec<String>,
        /// Print the declaration snippet instead of the bare lambda
        #[arg(short, long)]
        declaration: bool,
        #[command(flatten)]
        session: Session,
    },

    /// Compile a filter lambda over a collection type
    Filter {
        /// Collection type name, e.g. ListCollection
        root: String,
        /// Filter lambda, e.g. "l => l.Hidden == false"
        filter: String,
        #[arg(short, long)]
        declaration: bool,
        #[command(flatten)]
        session: Session,
    },

    /// Evaluate a member path against a JSON instance
    Eval {
        root: String,
        path: String,
        /// JSON input (reads from stdin if not provided)
        #[arg(short, long)]
        input: Option<String>,
        /// Pretty-print the output
        #[arg(short, long)]
        pretty: bool,
        #[command(flatten)]
        session: Session,
    },

    /// List the types of the schema
    Types {
        #[command(flatten)]
        session: Session,
    },
}

fn main() {
    let cli = Cli::parse();
    init_logging(&cli.log_level);

    let result = match cli.command {
        Commands::Generate {
            root,
            path,
            session,
        } => load(&session)
            .and_then(|context| cli::execute_generate(&context, &root, &path))
            .map(|text| println!("{}", text)),
        Commands::Compile {
            root,
            paths,
            declaration,
            session,
        } => run_compile(&session, &root, &paths, declaration),
        Commands::Filter {
            root,
            filter,
            declaration,
            session,
        } => load(&session)
            .and_then(|context| cli::execute_filter(&context, &root, &filter, declaration))
            .map(|text| println!("{}", text)),
        Commands::Eval {
            root,
            path,
            input,
            pretty,
            session,
        } => run_eval(&session, &root, &path, input, pretty),
        Commands::Types { session } => load(&session).map(|context| {
            for line in cli::execute_types(&context) {
                println!("{}", line);
            }
        }),
    };

    if let Err(e) = result {
        eprintln!("{}", e);
        std::process::exit(1);
    }
}

fn init_logging(level: &str) {
    use tracing_subscriber::{EnvFilter, fmt, prelude::*};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(io::stderr))
        .init();
}

fn load(session: &Session) -> Result<CliContext, CliError> {
    CliContext::load(&session.options())
}

fn run_compile(
    session: &Session,
    root: &str,
    paths: &[String],
    declaration: bool,
) -> Result<(), CliError> {
    let context = load(session)?;
    let mut failed = false;
    for result in cli::execute_compile(&context, root, paths, declaration)? {
        match result {
            Ok(text) => println!("{}", text),
            Err(e) => {
                eprintln!("{}", e);
                failed = true;
            }
        }
    }
    if failed {
        std::process::exit(1);
    }
    Ok(())
}

fn run_eval(
    session: &Session,
    root: &str,
    path: &str,
    input: Option<String>,
    pretty: bool,
) -> Result<(), CliError> {
    let input = match input {
        Some(s) => Some(s),
        None if !atty::is(atty::Stream::Stdin) => {
            let mut buffer = String::new();
            io::stdin().read_to_string(&mut buffer)?;
            Some(buffer)
        }
        None => None,
    };

    let context = load(session)?;
    let output = cli::execute_eval(&context, root, path, input.as_deref())?;
    let json = if pretty {
        serde_json::to_string_pretty(&output)
    } else {
        serde_json::to_string(&output)
    }?;
    println!("{}", json);
    Ok(())
}
