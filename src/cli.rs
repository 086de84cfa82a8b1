use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "agrodash", version, about = "Field spray windows, clusters and growth stages")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Path to config.yaml
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Increase log verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Full dashboard: clusters, spray windows, stages and recommendations
    Report {
        /// Combined-fetch exports (JSON); several partial exports are merged by uuid, later files winning
        #[arg(required = true, num_args = 1..)]
        inputs: Vec<PathBuf>,

        /// Hourly weather export (JSON)
        #[arg(short, long)]
        weather: Option<PathBuf>,

        /// Evaluate recommendations at this instant (RFC 3339 or YYYY-MM-DD); defaults to now
        #[arg(long)]
        as_of: Option<String>,

        #[arg(long)]
        json: bool,
    },
    /// Per-day spray windows for each crop season
    Spray {
        #[arg(required = true, num_args = 1..)]
        inputs: Vec<PathBuf>,

        /// Only show this crop season
        #[arg(long)]
        season: Option<String>,

        #[arg(long)]
        json: bool,
    },
    /// Group fields by proximity
    Clusters {
        #[arg(required = true, num_args = 1..)]
        inputs: Vec<PathBuf>,

        /// Override clustering.radius_km
        #[arg(short, long)]
        radius: Option<f64>,

        #[arg(long)]
        json: bool,
    },
    /// Growth stage bars per crop season
    Timeline {
        #[arg(required = true, num_args = 1..)]
        inputs: Vec<PathBuf>,

        /// Only plot these BBCH indices (repeatable)
        #[arg(short, long = "stage")]
        stages: Vec<String>,

        /// Average stages across clustered fields of the same crop
        #[arg(long)]
        by_cluster: bool,

        #[arg(long)]
        json: bool,
    },
    /// Daily summaries of an hourly weather export
    Weather {
        input: PathBuf,

        #[arg(long)]
        json: bool,
    },
    /// Write the default config file
    Init,
    /// Validate config and print the effective settings
    Check,
}
