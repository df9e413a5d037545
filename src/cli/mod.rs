//! Command-line parsing for the Wikipedia page dashboard.
//!
//! The goal of this module is to keep **argument parsing** and **command dispatch**
//! separate from the fetching/merging/rendering code.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::domain::ChartConfig;

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "wpulse", version, about = "Wikipedia page metadata, activity and traffic at a glance")]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Command,
}

/// Options shared by every subcommand.
///
/// Unset values fall back to `WPULSE_*` environment variables (a `.env` file is
/// honored), then to built-in defaults.
#[derive(Debug, Args, Clone, Default)]
pub struct GlobalArgs {
    /// Wiki host to query, e.g. `de.wikipedia.org` [default: en.wikipedia.org].
    #[arg(long, global = true, value_name = "HOST")]
    pub wiki: Option<String>,

    /// Deadline for one whole aggregation, in seconds [default: 20].
    #[arg(long, global = true, value_name = "SECS")]
    pub timeout_secs: Option<u64>,

    /// Increase log verbosity on stderr (-v info, -vv debug, -vvv trace).
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Aggregate one page, print the report and a terminal chart of daily views.
    Show(ShowArgs),
    /// Aggregate one page (or load an export) and write the view chart as a PNG image.
    Chart(ChartArgs),
    /// Read page titles from stdin, one per line; the latest submission wins.
    Watch(WatchArgs),
}

/// Chart surface geometry.
#[derive(Debug, Args, Clone)]
pub struct SurfaceArgs {
    /// Chart width (logical units / pixels).
    #[arg(long, default_value_t = 800)]
    pub width: u32,

    /// Chart height (logical units / pixels).
    #[arg(long, default_value_t = 200)]
    pub height: u32,

    /// Margin reserved on every side of the plot area.
    #[arg(long, default_value_t = 40)]
    pub margin: u32,
}

impl SurfaceArgs {
    pub fn chart_config(&self) -> ChartConfig {
        ChartConfig {
            width: self.width,
            height: self.height,
            margin: self.margin,
        }
    }
}

/// Terminal chart and report options.
#[derive(Debug, Args, Clone)]
pub struct DisplayArgs {
    /// Disable the terminal chart.
    #[arg(long)]
    pub no_plot: bool,

    /// Terminal chart width (columns).
    #[arg(long, default_value_t = 80)]
    pub cols: usize,

    /// Terminal chart height (rows).
    #[arg(long, default_value_t = 20)]
    pub rows: usize,

    /// Show at most this many links/backlinks.
    #[arg(long, default_value_t = 20)]
    pub max_links: usize,
}

#[derive(Debug, Parser, Clone)]
pub struct ShowArgs {
    /// Page title, e.g. "Rust (programming language)".
    pub title: String,

    #[command(flatten)]
    pub display: DisplayArgs,

    #[command(flatten)]
    pub surface: SurfaceArgs,

    /// Export the merged record to JSON.
    #[arg(long, value_name = "JSON")]
    pub export: Option<PathBuf>,

    /// Also write the view chart as a PNG image.
    #[arg(long, value_name = "PNG")]
    pub chart: Option<PathBuf>,
}

#[derive(Debug, Parser, Clone)]
pub struct ChartArgs {
    /// Page title to aggregate.
    #[arg(required_unless_present = "from", conflicts_with = "from")]
    pub title: Option<String>,

    /// Record JSON produced by `wpulse show --export`, instead of fetching.
    #[arg(long, value_name = "JSON")]
    pub from: Option<PathBuf>,

    /// Output image.
    #[arg(long, value_name = "PNG")]
    pub out: PathBuf,

    #[command(flatten)]
    pub surface: SurfaceArgs,
}

#[derive(Debug, Parser, Clone)]
pub struct WatchArgs {
    #[command(flatten)]
    pub display: DisplayArgs,

    #[command(flatten)]
    pub surface: SurfaceArgs,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn show_parses_flags_and_globals() {
        let cli = Cli::try_parse_from([
            "wpulse", "show", "Rust", "--no-plot", "--cols", "60", "--wiki", "de.wikipedia.org", "-vv",
        ])
        .unwrap();

        assert_eq!(cli.global.wiki.as_deref(), Some("de.wikipedia.org"));
        assert_eq!(cli.global.verbose, 2);
        match cli.command {
            Command::Show(args) => {
                assert_eq!(args.title, "Rust");
                assert!(args.display.no_plot);
                assert_eq!(args.display.cols, 60);
                assert_eq!(args.surface.chart_config(), ChartConfig::default());
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn chart_needs_a_title_or_an_export() {
        assert!(Cli::try_parse_from(["wpulse", "chart", "--out", "x.png"]).is_err());
        assert!(Cli::try_parse_from(["wpulse", "chart", "T", "--from", "r.json", "--out", "x.png"]).is_err());
        assert!(Cli::try_parse_from(["wpulse", "chart", "--from", "r.json", "--out", "x.png"]).is_ok());
        assert!(Cli::try_parse_from(["wpulse", "chart", "T", "--out", "x.png"]).is_ok());
    }
}
