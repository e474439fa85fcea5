use std::path::PathBuf;

/// Civic-data panel loader (argument schema only)
#[derive(clap::Parser, Debug)]
#[command(name = "atxmap", version, about, propagate_version = true)]
pub struct Cli {
    /// Increase output verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Loader config file (JSON); flags below override its values
    #[arg(long, global = true, value_hint = clap::ValueHint::FilePath)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(clap::Subcommand, Debug)]
pub enum Commands {
    /// Load a map panel and report its layers
    Load(LoadArgs),

    /// Sum budget and expenditures by department from a budget CSV
    Budget(CsvArgs),

    /// Sum a value column by month_key from a CSV
    Series(SeriesArgs),

    /// Count CSV rows per year of a date column
    Years(YearsArgs),
}

#[derive(clap::Args, Debug)]
pub struct LoadArgs {
    /// Data root: a directory or an http(s):// base URL serving /data/*
    #[arg(required_unless_present = "list")]
    pub data: Option<String>,

    /// Built-in panel name (see --list)
    #[arg(short, long, default_value = "flood-intersections", conflicts_with = "panel")]
    pub preset: String,

    /// Panel definition file (JSON) instead of a preset
    #[arg(long, value_hint = clap::ValueHint::FilePath)]
    pub panel: Option<PathBuf>,

    /// List built-in panels and exit
    #[arg(long)]
    pub list: bool,

    /// Number of batches per collection
    #[arg(long)]
    pub batches: Option<usize>,

    /// Pause after each batch, in milliseconds
    #[arg(long)]
    pub yield_ms: Option<u64>,

    /// Write every layer as <DIR>/<layer>.geojson
    #[arg(short, long, value_hint = clap::ValueHint::DirPath)]
    pub export: Option<PathBuf>,
}

#[derive(clap::Args, Debug)]
pub struct CsvArgs {
    /// Data root: a directory or an http(s):// base URL
    pub data: String,

    /// CSV path relative to the data root
    #[arg(short, long, default_value = "/data/budget.csv")]
    pub file: String,

    /// Read every column as text
    #[arg(long)]
    pub no_typing: bool,
}

#[derive(clap::Args, Debug)]
pub struct SeriesArgs {
    #[command(flatten)]
    pub csv: CsvArgs,

    /// Column to sum per month
    #[arg(long)]
    pub value: String,
}

#[derive(clap::Args, Debug)]
pub struct YearsArgs {
    #[command(flatten)]
    pub csv: CsvArgs,

    /// Date column whose year is counted
    #[arg(long)]
    pub column: String,
}
