use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

const HELP_TEMPLATE: &str = "\
{before-help}{name} {version}
{author-with-newline}{about-with-newline}
{usage-heading} {usage}

{all-args}{after-help}
";

#[derive(Parser, Debug)]
#[command(
    author = "The protgraph developers",
    version,
    about = "protgraph CLI - Build annotated residue- and atom-level graphs from protein structures.",
    help_template = HELP_TEMPLATE,
)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity level (-v for INFO, -vv for DEBUG, -vvv for TRACE)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all log output except for errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Write logs to a specified file in addition to the console output
    #[arg(long, global = true, value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    /// Set the number of worker threads.
    /// Defaults to the number of available logical cores.
    #[arg(short = 'j', long, global = true, value_name = "NUM")]
    pub threads: Option<usize>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Build the graph of a single structure.
    Build(BuildArgs),
    /// Build graphs for many structures, isolating per-structure failures.
    Batch(BatchArgs),
}

/// Arguments for the `build` subcommand.
#[derive(Args, Debug)]
pub struct BuildArgs {
    /// Path to the input structure file in PDB format.
    #[arg(short, long, required = true, value_name = "PATH")]
    pub input: PathBuf,

    /// Path for the output graph in JSON format. Writes to stdout when omitted.
    #[arg(short, long, value_name = "PATH")]
    pub output: Option<PathBuf>,

    /// Pretty-print the JSON output.
    #[arg(long)]
    pub pretty: bool,

    /// Also write the chain-level coarse graph to this path.
    #[arg(long, value_name = "PATH")]
    pub chain_graph: Option<PathBuf>,

    /// Also write the secondary-structure coarse graph to this path.
    /// Needs the `secondary_structure` provider.
    #[arg(long, value_name = "PATH")]
    pub ss_graph: Option<PathBuf>,

    #[command(flatten)]
    pub graph: GraphArgs,
}

/// Arguments for the `batch` subcommand.
#[derive(Args, Debug)]
pub struct BatchArgs {
    /// Input structure files in PDB format.
    #[arg(required = true, value_name = "PATH")]
    pub inputs: Vec<PathBuf>,

    /// Directory receiving one `<stem>.json` graph per structure.
    #[arg(short, long, required = true, value_name = "DIR")]
    pub output_dir: PathBuf,

    /// Pretty-print the JSON output.
    #[arg(long)]
    pub pretty: bool,

    #[command(flatten)]
    pub graph: GraphArgs,
}

/// Graph construction options shared by all commands.
#[derive(Args, Debug, Default, Clone)]
pub struct GraphArgs {
    /// Path to a configuration file in TOML format.
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Override the node granularity.
    #[arg(short, long, value_enum, value_name = "LEVEL")]
    pub granularity: Option<GranularityArg>,

    /// Enable an annotation provider. Can be used multiple times and replaces
    /// the providers listed in the config file.
    #[arg(short, long = "provider", value_name = "NAME")]
    pub providers: Vec<String>,

    /// Enable an edge rule with its default parameters. Can be used multiple
    /// times and replaces the rules listed in the config file.
    #[arg(short = 'r', long = "rule", value_name = "NAME")]
    pub rules: Vec<String>,

    /// Override how a failing annotation provider is handled.
    #[arg(long, value_enum, value_name = "POLICY")]
    pub annotation_policy: Option<AnnotationPolicyArg>,

    /// Directory holding DSSP output named `<stem>.dssp`.
    #[arg(long, value_name = "DIR")]
    pub dssp_dir: Option<PathBuf>,

    /// Directory holding tabular BLAST output named `<stem>.blast`.
    #[arg(long, value_name = "DIR")]
    pub blast_dir: Option<PathBuf>,

    /// Sequence cluster table shared by all structures.
    #[arg(long, value_name = "PATH")]
    pub clusters: Option<PathBuf>,

    /// Set a specific configuration value, overriding the config file.
    /// Can be used multiple times. Example: -S processing.keep-insertions=true
    #[arg(short = 'S', long = "set", value_name = "KEY=VALUE", num_args(0..))]
    pub set_values: Vec<String>,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum GranularityArg {
    Residue,
    Atom,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnnotationPolicyArg {
    Abort,
    Continue,
}
