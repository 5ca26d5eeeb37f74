//! Split command - record the chunks of a split

use super::{parse_axes, Target};
use crate::address::{Chunk, ChunkKey, Node};
use crate::cli::args::SplitArgs;
use crate::error::PipedbResult;
use crate::ui::{self, UiContext};
use crate::workflow::WorkflowDatabaseFactory;
use tracing::debug;

/// Execute the split command
///
/// Holds the instance lock for the duration of the write.
pub fn execute(args: SplitArgs, target: &Target) -> PipedbResult<()> {
    let axes = parse_axes(&args.axes);
    let keys: Vec<ChunkKey> = args
        .chunks
        .iter()
        .map(|key| ChunkKey(key.0.iter().map(|value| Chunk::parse(value)).collect()))
        .collect();
    let count = keys.len();

    let mut factory: WorkflowDatabaseFactory =
        WorkflowDatabaseFactory::new(&target.workflow_dir).with_temps_suffix(&target.temps_suffix);
    let mut db = factory.create(&target.instance)?;
    debug!("Recording {} chunk key(s) in {}", count, target.label());

    db.node_manager
        .store_chunks(&axes, &Node::root(), keys, args.levels.as_deref())?;
    db.close()?;
    factory.teardown();

    let ctx = UiContext::detect();
    let axis_names: Vec<&str> = axes.iter().map(|axis| axis.as_str()).collect();
    ui::step_ok_detail(
        &ctx,
        &format!("Recorded {} chunk key(s) on [{}]", count, axis_names.join(", ")),
        &target.label(),
    );
    Ok(())
}
