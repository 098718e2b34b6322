//! OData command-line interface

use clap::{Args, Parser, Subcommand};
use odata::cli::{init_logging, output, query};
use odata::{MetadataLevel, QueryOptions};
use std::path::PathBuf;

/// OData command-line tool
#[derive(Parser)]
#[command(name = "odata")]
#[command(author, version, about = "Query JSON records through an OData v4 schema", long_about = None)]
struct Cli {
    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Pretty-print JSON output
    #[arg(short, long, global = true)]
    pretty: bool,

    /// Output file (default: stdout)
    #[arg(short, long, global = true)]
    output: Option<PathBuf>,

    /// Color output (auto, always, never)
    #[arg(long, default_value = "auto", global = true)]
    color: String,

    #[command(subcommand)]
    command: Commands,
}

/// Schema and data files shared by every command
#[derive(Args)]
struct Files {
    /// Schema document (JSON)
    #[arg(short, long)]
    schema: PathBuf,

    /// Data file mapping entity set names to record arrays (JSON)
    #[arg(short, long)]
    data: PathBuf,

    /// Entity set to read
    entity_set: String,
}

/// Options that shape the response
#[derive(Args)]
struct Shape {
    /// $select: comma separated property names
    #[arg(long)]
    select: Option<String>,

    /// $expand: navigation properties, with nested options in parentheses
    #[arg(long)]
    expand: Option<String>,

    /// Metadata level (none, minimal, full)
    #[arg(short, long, default_value = "minimal")]
    metadata: MetadataLevel,
}

#[derive(Subcommand)]
enum Commands {
    /// Query an entity set
    Query {
        #[command(flatten)]
        files: Files,

        /// $filter expression
        #[arg(short, long)]
        filter: Option<String>,

        /// $search expression
        #[arg(long)]
        search: Option<String>,

        /// $orderby items
        #[arg(long)]
        orderby: Option<String>,

        /// $top: maximum number of entities
        #[arg(long)]
        top: Option<usize>,

        /// $skip: number of entities to skip
        #[arg(long)]
        skip: Option<usize>,

        #[command(flatten)]
        shape: Shape,
    },

    /// Read a single entity by key
    Get {
        #[command(flatten)]
        files: Files,

        /// Key literal, e.g. 7 or 'LHR'
        #[arg(short, long)]
        key: String,

        #[command(flatten)]
        shape: Shape,
    },
}

fn main() {
    human_panic::setup_panic!();

    let cli = Cli::parse();

    output::setup_colors(&cli.color);
    init_logging(cli.verbose);

    let config = match cli.command {
        Commands::Query {
            files,
            filter,
            search,
            orderby,
            top,
            skip,
            shape,
        } => query::QueryConfig {
            schema: files.schema,
            data: files.data,
            entity_set: files.entity_set,
            key: None,
            options: QueryOptions {
                filter,
                search,
                orderby,
                select: shape.select,
                expand: shape.expand,
                top,
                skip,
                metadata: shape.metadata,
            },
            pretty: cli.pretty,
            output_file: cli.output,
        },

        Commands::Get { files, key, shape } => query::QueryConfig {
            schema: files.schema,
            data: files.data,
            entity_set: files.entity_set,
            key: Some(key),
            options: QueryOptions {
                select: shape.select,
                expand: shape.expand,
                metadata: shape.metadata,
                ..QueryOptions::default()
            },
            pretty: cli.pretty,
            output_file: cli.output,
        },
    };

    if let Err(e) = query::query(config) {
        eprintln!("{}", output::format_error(&e));
        std::process::exit(1);
    }
}
