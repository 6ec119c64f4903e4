use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use gridwatch_core::{Axis, TableId};

use crate::config::{AppConfig, DEFAULT_CONFIG_FILE};
use crate::logging::LogDestination;

/// Watch a grid of searches: terms down the side, regions across the top.
#[derive(Debug, Parser)]
#[command(name = "gridwatch", author, version, about, long_about = None)]
pub struct Cli {
    /// RON configuration file.
    #[arg(long, env = "GRIDWATCH_CONFIG", default_value = DEFAULT_CONFIG_FILE)]
    pub config: PathBuf,

    /// JSON file holding the tables. Overrides the config file.
    #[arg(long, env = "GRIDWATCH_DATA")]
    pub data: Option<PathBuf>,

    /// Where log output goes. Overrides the config file.
    #[arg(long, value_enum)]
    pub log: Option<LogDestination>,

    /// Log at debug level.
    #[arg(short, long)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// Applies command-line overrides on top of the file configuration.
    pub fn apply_overrides(&self, mut config: AppConfig) -> AppConfig {
        if let Some(data) = &self.data {
            config.data_file = data.clone();
        }
        if let Some(log) = self.log {
            config.log = log;
        }
        config.verbose |= self.verbose;
        config
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
pub enum Command {
    /// List all tables, marking the active one.
    Tables,
    /// Print a table's grid with the hit count of every cell.
    Show {
        /// Table to print instead of the active one.
        #[arg(long)]
        id: Option<TableId>,
    },
    /// Create a table and make it active.
    NewTable,
    /// Delete the active table.
    DeleteTable,
    /// Make another table active.
    Select { id: TableId },
    /// Rename the active table.
    Rename { name: String },
    /// Set the active table's category. Run `rebuild` to update the URLs.
    Category { name: String },
    /// Append a region column to the active table.
    AddColumn { label: String },
    /// Append a search-terms row to the active table.
    AddRow { label: String },
    /// Remove the last column of the active table.
    RemoveColumn,
    /// Remove the last row of the active table.
    RemoveRow,
    /// Replace one heading of the active table. Resets every cell.
    Edit {
        #[arg(value_enum)]
        axis: AxisArg,
        index: usize,
        label: String,
    },
    /// Regenerate every query URL of the active table. Resets every cell.
    Rebuild,
    /// Fetch every cell and report the new listings.
    Refresh {
        /// Table to refresh instead of the active one.
        #[arg(long)]
        id: Option<TableId>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum AxisArg {
    Row,
    Column,
}

impl From<AxisArg> for Axis {
    fn from(axis: AxisArg) -> Self {
        match axis {
            AxisArg::Row => Axis::Row,
            AxisArg::Column => Axis::Column,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_override_file_config() {
        let cli = Cli::parse_from([
            "gridwatch",
            "--data",
            "other.json",
            "--log",
            "terminal",
            "-v",
            "show",
            "--id",
            "4",
        ]);

        let config = cli.apply_overrides(AppConfig::default());

        assert_eq!(config.data_file, PathBuf::from("other.json"));
        assert_eq!(config.log, LogDestination::Terminal);
        assert!(config.verbose);
        assert_eq!(cli.command, Command::Show { id: Some(4) });
    }

    #[test]
    fn edit_parses_axis_index_and_label() {
        let cli = Cli::parse_from(["gridwatch", "edit", "column", "1", "seattle"]);
        assert_eq!(
            cli.command,
            Command::Edit {
                axis: AxisArg::Column,
                index: 1,
                label: "seattle".to_string(),
            }
        );
    }

    #[test]
    fn cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
