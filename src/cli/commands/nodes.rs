//! Nodes command - list the nodes of a split

use super::{parse_axes, Target};
use crate::address::Node;
use crate::cli::args::{NodesArgs, OutputFormat};
use crate::error::PipedbResult;
use crate::nodes::NodeManager;
use crate::ui::{self, UiContext};
use console::style;
use serde::Serialize;

#[derive(Serialize)]
struct NodeRow {
    node: String,
    path: String,
}

/// Execute the nodes command
///
/// Reads chunk files without taking the run lock, so it can be used while a
/// run is active.
pub fn execute(args: NodesArgs, target: &Target) -> PipedbResult<()> {
    let dirs = target.dirs();
    let manager = NodeManager::new(&dirs.nodes, &dirs.temps);
    let axes = parse_axes(&args.axes);

    let rows: Vec<NodeRow> = manager
        .retrieve_nodes(&axes, &Node::root())
        .to_vec()?
        .into_iter()
        .map(|node| NodeRow {
            node: node.to_string(),
            path: node.subdir().display().to_string(),
        })
        .collect();

    match args.format {
        OutputFormat::Table => print_table(target, &rows),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&rows)?),
        OutputFormat::Plain => {
            for row in &rows {
                println!("{}", row.node);
            }
        }
    }

    Ok(())
}

fn print_table(target: &Target, rows: &[NodeRow]) {
    let ctx = UiContext::detect();
    ui::intro(&ctx, &format!("Nodes in {}", target.label()));

    let width = rows.iter().map(|row| row.node.len()).max().unwrap_or(0).max(4) + 2;
    println!(
        "{:<width$} {}",
        style("NODE").bold(),
        style("PATH").bold(),
        width = width
    );
    for row in rows {
        println!("{:<width$} {}", row.node, row.path, width = width);
    }

    println!();
    println!("{} node(s)", rows.len());
}
