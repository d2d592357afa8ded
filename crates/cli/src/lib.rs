mod query;
mod view;

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(
    name = "tracescope",
    version,
    about = "Symbol resolution and call-graph analysis for TypeScript projects",
    long_about = "Tracescope indexes a TypeScript/JavaScript project, locates a symbol by name \
                  and answers structural questions about it: callers and callees, type flow, \
                  references, type hierarchy, narrowing guards, callback usage and dead code. \
                  Every result is printed as a JSON envelope ({\"status\":\"ok\",\"data\":...})."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Render a table instead of JSON where the result has a tabular form
    #[arg(long, global = true)]
    pub table: bool,

    /// Drop any cached index for the root before querying
    #[arg(long, global = true)]
    pub fresh: bool,

    /// Log to stderr as well as to ~/.tracescope/logs
    #[arg(long, global = true)]
    pub verbose: bool,
}

/// Project root and the symbol a query is about.
#[derive(Args, Clone)]
pub struct SymbolArgs {
    /// Path to the project root directory
    #[arg(value_name = "PROJECT_PATH")]
    pub path: PathBuf,

    /// Symbol name; `Class.member` addresses a member
    #[arg(value_name = "NAME")]
    pub name: String,

    /// Root-relative file the symbol is declared in
    #[arg(long)]
    pub file: Option<String>,

    /// 1-indexed line disambiguating same-named declarations in the file
    #[arg(long)]
    pub line: Option<u32>,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum Direction {
    Outgoing,
    Incoming,
    Both,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Locate the declaration of a symbol
    Locate {
        #[command(flatten)]
        symbol: SymbolArgs,
    },
    /// Outgoing and incoming call tree of a callable
    Calls {
        #[command(flatten)]
        symbol: SymbolArgs,
        /// Hop budget: 1 = direct calls only, -1 = unlimited
        #[arg(long, default_value_t = 1, allow_negative_numbers = true)]
        depth: i32,
        #[arg(long, value_enum, default_value_t = Direction::Both)]
        direction: Direction,
    },
    /// User-defined types flowing through parameters and the return value
    TypeFlow {
        #[command(flatten)]
        symbol: SymbolArgs,
    },
    /// Project-wide references, classified by usage
    Refs {
        #[command(flatten)]
        symbol: SymbolArgs,
        /// Skip test files
        #[arg(long)]
        no_tests: bool,
        #[arg(long)]
        timeout_ms: Option<u64>,
    },
    /// Supertypes, subtypes and type parameters of a class or interface
    Hierarchy {
        #[command(flatten)]
        symbol: SymbolArgs,
        #[arg(long)]
        timeout_ms: Option<u64>,
    },
    /// Narrowing guards inside a callable
    Guards {
        #[command(flatten)]
        symbol: SymbolArgs,
    },
    /// Call sites passing a callable as an argument
    Callbacks {
        #[command(flatten)]
        symbol: SymbolArgs,
    },
    /// Confusable and mixed-script identifiers of one file
    Confusables {
        #[arg(value_name = "PROJECT_PATH")]
        path: PathBuf,
        /// Root-relative path of the file to inspect
        #[arg(value_name = "FILE")]
        file: String,
    },
    /// Declarations nothing in the project refers to
    DeadCode {
        #[arg(value_name = "PROJECT_PATH")]
        path: PathBuf,
        /// Also report non-exported top-level declarations
        #[arg(long)]
        inclusive: bool,
        #[arg(long)]
        include_tests: bool,
        /// Restrict to these kinds (function, class, interface, ...)
        #[arg(long = "kind", value_name = "KIND")]
        kinds: Vec<String>,
        /// Only scan files matching these globs
        #[arg(long = "include", value_name = "GLOB")]
        include: Vec<String>,
        #[arg(long = "exclude", value_name = "GLOB")]
        exclude: Vec<String>,
        #[arg(long)]
        max_results: Option<usize>,
        #[arg(long)]
        timeout_ms: Option<u64>,
    },
    /// Members and values of an enum
    Enum {
        #[command(flatten)]
        symbol: SymbolArgs,
    },
    /// Print the JSON schema of a query result
    Schema {
        /// Result name: locate, calls, type-flow, refs, hierarchy, guards,
        /// callbacks, confusables, dead-code, enum
        #[arg(value_name = "RESULT")]
        result: String,
    },
}

pub fn run() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();
    let _guard = tracescope_core::logging::init_logging("cli", cli.verbose);
    query::execute(cli.command, cli.table, cli.fresh)
}
