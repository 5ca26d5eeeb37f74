//! CLI argument definitions using clap derive

use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// pipedb - inspect and manage pipeline workflow databases
///
/// Lists the nodes and chunks recorded for a workflow instance, records
/// splits, and manages the run lock.
#[derive(Parser, Debug)]
#[command(name = "pipedb")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity (-v info, -vv debug)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Configuration file path
    #[arg(short, long, global = true, env = "PIPEDB_CONFIG")]
    pub config: Option<PathBuf>,

    /// Workflow directory (defaults to workflow.dir from config)
    #[arg(short = 'w', long, global = true, env = "PIPEDB_WORKFLOW_DIR")]
    pub workflow_dir: Option<PathBuf>,

    /// Instance subdirectory (defaults to workflow.instance from config)
    #[arg(short, long, global = true)]
    pub instance: Option<String>,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List the nodes reached by splitting on the given axes
    Nodes(NodesArgs),

    /// List the chunk tuples reached by splitting on the given axes
    Chunks(NodesArgs),

    /// Record the chunks of a split
    Split(SplitArgs),

    /// Inspect the run lock
    Lock(LockArgs),

    /// Remove a stale run lock
    Unlock,

    /// Show or edit configuration
    Config(ConfigArgs),
}

/// Arguments for the nodes and chunks commands
#[derive(Parser, Debug)]
pub struct NodesArgs {
    /// Axes to walk, outermost first
    #[arg(required = true)]
    pub axes: Vec<String>,

    /// Output format
    #[arg(short, long, default_value = "table")]
    pub format: OutputFormat,
}

/// Arguments for the split command
#[derive(Parser, Debug)]
pub struct SplitArgs {
    /// Axes being split, outermost first
    #[arg(required = true)]
    pub axes: Vec<String>,

    /// Chunk key, one comma-separated value per axis (repeatable)
    #[arg(short = 'k', long = "chunk", required = true, value_parser = parse_chunk_key)]
    pub chunks: Vec<ChunkKeyArg>,

    /// Only record these axis levels (0 = outermost, comma-separated)
    #[arg(long, value_delimiter = ',')]
    pub levels: Option<Vec<usize>>,
}

/// Arguments for the lock command
#[derive(Parser, Debug)]
pub struct LockArgs {
    /// Subcommand for lock
    #[command(subcommand)]
    pub action: Option<LockAction>,
}

/// Lock subcommands
#[derive(Subcommand, Debug)]
pub enum LockAction {
    /// Show whether the instance is locked, and by whom
    Status,
}

/// Arguments for the config command
#[derive(Parser, Debug)]
pub struct ConfigArgs {
    /// Subcommand for config
    #[command(subcommand)]
    pub action: Option<ConfigAction>,
}

/// Config subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Show configuration file path
    Path,

    /// Initialize default configuration
    Init {
        /// Overwrite existing configuration
        #[arg(short, long)]
        force: bool,
    },
}

/// Output format for listing commands
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable table
    Table,
    /// JSON output
    Json,
    /// Simple text (one per line)
    Plain,
}

/// One `--chunk` value: the raw chunk text for each axis
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkKeyArg(pub Vec<String>);

/// Parse a chunk key in `V1,V2,...` format
fn parse_chunk_key(s: &str) -> Result<ChunkKeyArg, String> {
    let values: Vec<String> = s.split(',').map(|v| v.trim().to_string()).collect();
    if values.iter().any(String::is_empty) {
        return Err(format!("invalid chunk key '{s}': empty value"));
    }
    Ok(ChunkKeyArg(values))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_chunk_key_valid() {
        assert_eq!(parse_chunk_key("A").unwrap().0, vec!["A"]);
        assert_eq!(parse_chunk_key("A, 3").unwrap().0, vec!["A", "3"]);
    }

    #[test]
    fn parse_chunk_key_invalid() {
        assert!(parse_chunk_key("A,,B").is_err());
        assert!(parse_chunk_key("").is_err());
    }

    #[test]
    fn cli_parses_nodes() {
        let cli = Cli::parse_from(["pipedb", "nodes", "sample", "region", "--format", "json"]);
        match cli.command {
            Commands::Nodes(args) => {
                assert_eq!(args.axes, vec!["sample", "region"]);
                assert!(matches!(args.format, OutputFormat::Json));
            }
            _ => panic!("expected Nodes command"),
        }
    }

    #[test]
    fn cli_parses_split() {
        let cli = Cli::parse_from([
            "pipedb", "-w", "/work", "split", "sample", "region", "-k", "A,1", "-k", "B,2",
            "--levels", "1",
        ]);
        assert_eq!(cli.workflow_dir, Some(PathBuf::from("/work")));
        match cli.command {
            Commands::Split(args) => {
                let keys: Vec<Vec<String>> = args.chunks.into_iter().map(|k| k.0).collect();
                assert_eq!(keys, vec![vec!["A", "1"], vec!["B", "2"]]);
                assert_eq!(args.levels, Some(vec![1]));
            }
            _ => panic!("expected Split command"),
        }
    }

    #[test]
    fn cli_parses_lock_and_unlock() {
        let cli = Cli::parse_from(["pipedb", "lock", "status", "--instance", "run1"]);
        assert_eq!(cli.instance.as_deref(), Some("run1"));
        assert!(matches!(
            cli.command,
            Commands::Lock(LockArgs {
                action: Some(LockAction::Status)
            })
        ));

        let cli = Cli::parse_from(["pipedb", "unlock"]);
        assert!(matches!(cli.command, Commands::Unlock));
    }

    #[test]
    fn cli_requires_axes() {
        assert!(Cli::try_parse_from(["pipedb", "nodes"]).is_err());
        assert!(Cli::try_parse_from(["pipedb", "split", "sample"]).is_err());
    }
}
