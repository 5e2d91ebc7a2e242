use clap::{ArgAction, Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::convert::CatalogOptions;
use crate::crawl::{DEFAULT_EXECUTABLE, DEFAULT_IMAGE};
use crate::investigator::config::ConnectionSettings;
use crate::investigator::trace::{parse_search_pair, TraceMode};
use crate::render::dbml::DbmlStyle;
use crate::render::dictionary::DictionaryFormat;
use crate::render::ErdFormat;

#[derive(Parser, Debug)]
#[command(
    name = "schemadoc",
    version,
    about = "Document databases from SchemaCrawler exports and trace data across PostgreSQL"
)]
pub struct Cli {
    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Only log warnings and errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run SchemaCrawler against a database
    Crawl(CrawlArgs),
    /// Convert a SchemaCrawler JSON export (or a folder of exports) to DBML
    Dbml(DbmlArgs),
    /// Write a data dictionary from a SchemaCrawler JSON export
    Dictionary(DictionaryArgs),
    /// Render the table relationship graph
    Erd(ErdArgs),
    /// Write an attributes file skeleton for adding remarks
    Annotations(AnnotationsArgs),
    /// Investigate a live PostgreSQL database
    Inspect(InspectArgs),
}

/// Input export plus the optional catalog transformations
#[derive(Args, Debug, Clone)]
pub struct ExportArgs {
    /// SchemaCrawler JSON export
    pub input: PathBuf,

    /// SchemaCrawler attributes file (dictionary.yaml) with remarks and weak associations
    #[arg(long)]
    pub attributes: Option<PathBuf>,

    /// Regular expression of table full names to keep
    #[arg(long)]
    pub include_tables: Option<String>,

    /// Regular expression of table full names to drop
    #[arg(long)]
    pub exclude_tables: Option<String>,
}

impl ExportArgs {
    pub fn catalog_options(&self) -> CatalogOptions {
        CatalogOptions {
            attributes: self.attributes.clone(),
            include_tables: self.include_tables.clone(),
            exclude_tables: self.exclude_tables.clone(),
        }
    }
}

#[derive(Args, Debug)]
pub struct DbmlArgs {
    #[command(flatten)]
    pub export: ExportArgs,

    /// Output file, or output folder when INPUT is a folder (default: stdout / INPUT)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// DBML flavour
    #[arg(long, value_enum, default_value = "columns")]
    pub style: DbmlStyle,
}

#[derive(Args, Debug)]
pub struct DictionaryArgs {
    #[command(flatten)]
    pub export: ExportArgs,

    /// Output format
    #[arg(short, long, value_enum, default_value = "csv")]
    pub format: DictionaryFormat,

    /// Output file (default: data_dictionary.csv for CSV, stdout otherwise)
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

impl DictionaryArgs {
    pub const DEFAULT_CSV: &'static str = "data_dictionary.csv";

    pub fn output_path(&self) -> Option<PathBuf> {
        match (&self.output, self.format) {
            (Some(path), _) => Some(path.clone()),
            (None, DictionaryFormat::Csv) => Some(PathBuf::from(Self::DEFAULT_CSV)),
            (None, _) => None,
        }
    }
}

#[derive(Args, Debug)]
pub struct ErdArgs {
    #[command(flatten)]
    pub export: ExportArgs,

    /// Output format
    #[arg(short, long, value_enum, default_value = "dot")]
    pub format: ErdFormat,

    /// Focus on one table (full or bare name)
    #[arg(short, long)]
    pub table: Option<String>,

    /// Levels of referenced tables to keep around the focus table (default: all)
    #[arg(long, requires = "table")]
    pub parents: Option<usize>,

    /// Levels of referencing tables to keep around the focus table (default: all)
    #[arg(long, requires = "table")]
    pub children: Option<usize>,

    /// Output file (default: stdout)
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct AnnotationsArgs {
    /// SchemaCrawler JSON export
    pub input: PathBuf,

    /// Output file (default: stdout)
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum RunnerKind {
    Docker,
    Native,
}

#[derive(Args, Debug)]
pub struct CrawlArgs {
    /// How to launch SchemaCrawler
    #[arg(long, value_enum, default_value = "docker")]
    pub runner: RunnerKind,

    /// Docker image
    #[arg(long, default_value = DEFAULT_IMAGE)]
    pub image: String,

    /// Host folder mounted as the container share
    #[arg(long, default_value = ".")]
    pub share_dir: PathBuf,

    /// SchemaCrawler launcher for the native runner
    #[arg(long, default_value = DEFAULT_EXECUTABLE)]
    pub executable: String,

    /// Print the command line instead of running it
    #[arg(long)]
    pub dry_run: bool,

    #[arg(long, default_value = "postgresql")]
    pub server: String,

    #[arg(long, env = "DB_HOST")]
    pub host: Option<String>,

    #[arg(long, env = "DB_PORT")]
    pub port: Option<u16>,

    #[arg(long, env = "DB_NAME")]
    pub database: Option<String>,

    #[arg(long, env = "DB_USER")]
    pub user: Option<String>,

    #[arg(long, env = "DB_PASS", hide_env_values = true)]
    pub password: Option<String>,

    /// SchemaCrawler command
    #[arg(long, default_value = "schema")]
    pub command: String,

    #[arg(long, default_value = "standard")]
    pub info_level: String,

    #[arg(long, default_value = "html")]
    pub output_format: String,

    #[arg(long)]
    pub output_file: Option<PathBuf>,

    #[arg(long)]
    pub include_tables: Option<String>,

    #[arg(long)]
    pub exclude_tables: Option<String>,

    #[arg(long)]
    pub title: Option<String>,

    /// SchemaCrawler formatting properties file
    #[arg(long)]
    pub load_config: Option<PathBuf>,

    #[arg(long)]
    pub load_extension: Option<String>,

    /// SchemaCrawler attributes file (dictionary.yaml)
    #[arg(long)]
    pub attributes_file: Option<PathBuf>,
}

/// Connection flags; each falls back to its environment variable
#[derive(Args, Debug, Clone)]
pub struct ConnectionArgs {
    #[arg(long, env = "DB_HOST", global = true)]
    pub host: Option<String>,

    #[arg(long, env = "DB_PORT", global = true)]
    pub port: Option<String>,

    #[arg(long = "database", env = "DB_NAME", global = true)]
    pub database: Option<String>,

    #[arg(long, env = "DB_USER", global = true)]
    pub user: Option<String>,

    #[arg(long, env = "DB_PASS", hide_env_values = true, global = true)]
    pub password: Option<String>,
}

impl From<ConnectionArgs> for ConnectionSettings {
    fn from(args: ConnectionArgs) -> Self {
        ConnectionSettings {
            host: args.host,
            port: args.port,
            database: args.database,
            user: args.user,
            password: args.password,
        }
    }
}

#[derive(Args, Debug)]
pub struct InspectArgs {
    #[command(flatten)]
    pub connection: ConnectionArgs,

    #[command(subcommand)]
    pub command: InspectCommand,
}

#[derive(Subcommand, Debug)]
pub enum InspectCommand {
    /// List the available investigation features
    Features,

    /// List tables
    Tables {
        #[arg(long, default_value = "public")]
        schema: String,

        /// List tables of every schema
        #[arg(long, conflicts_with = "schema")]
        all_schemas: bool,
    },

    /// Show columns and key constraints of a table
    Describe {
        table: String,

        #[arg(long, default_value = "public")]
        schema: String,
    },

    /// Find the tables holding one or more column=value pairs
    Trace {
        /// Search pairs as COLUMN=VALUE
        #[arg(required = true, value_parser = parse_search_pair)]
        pairs: Vec<(String, String)>,

        /// and: one row must match every pair; or: match pairs independently
        #[arg(long, default_value = "or")]
        mode: TraceMode,

        #[arg(long, default_value = "public")]
        schema: String,

        /// Scan every schema
        #[arg(long, conflicts_with = "schema")]
        all_schemas: bool,

        /// Print matching rows
        #[arg(long)]
        show_records: bool,

        /// Rows printed per match with --show-records
        #[arg(long, default_value_t = 5)]
        limit: usize,
    },

    /// Trace every field of a JSON object and infer joins between the tables found
    Origin {
        /// File with one JSON object
        file: PathBuf,
    },

    /// Check whether a column combination is unique
    Unique {
        table: String,

        /// Columns to check together
        #[arg(long, required = true, value_delimiter = ',')]
        columns: Vec<String>,

        #[arg(long, default_value = "public")]
        schema: String,
    },
}
