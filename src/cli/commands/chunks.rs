//! Chunks command - list the chunk tuples of a split

use super::{parse_axes, Target};
use crate::address::{Chunk, Node};
use crate::cli::args::{NodesArgs, OutputFormat};
use crate::error::PipedbResult;
use crate::nodes::NodeManager;
use crate::ui::{self, UiContext};
use console::style;

/// Execute the chunks command
pub fn execute(args: NodesArgs, target: &Target) -> PipedbResult<()> {
    let dirs = target.dirs();
    let manager = NodeManager::new(&dirs.nodes, &dirs.temps);
    let axes = parse_axes(&args.axes);

    let tuples = manager.retrieve_chunks(&axes, &Node::root()).to_vec()?;

    match args.format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&tuples)?),
        OutputFormat::Plain => {
            for tuple in &tuples {
                println!("{}", render_tuple(tuple).join(","));
            }
        }
        OutputFormat::Table => {
            let ctx = UiContext::detect();
            ui::intro(&ctx, &format!("Chunks in {}", target.label()));

            let header: Vec<String> = axes
                .iter()
                .map(|axis| format!("{:<12}", style(axis.as_str().to_uppercase()).bold()))
                .collect();
            println!("{}", header.join(" "));
            for tuple in &tuples {
                let cells: Vec<String> = render_tuple(tuple)
                    .into_iter()
                    .map(|cell| format!("{:<12}", cell))
                    .collect();
                println!("{}", cells.join(" "));
            }

            println!();
            println!("{} chunk tuple(s)", tuples.len());
        }
    }

    Ok(())
}

fn render_tuple(tuple: &[Option<Chunk>]) -> Vec<String> {
    tuple
        .iter()
        .map(|chunk| match chunk {
            Some(chunk) => chunk.to_string(),
            None => "_".to_string(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unsplit_axes_render_as_placeholder() {
        let tuple = vec![Some(Chunk::from("A")), None, Some(Chunk::from(3))];
        assert_eq!(render_tuple(&tuple), vec!["A", "_", "3"]);
    }
}
