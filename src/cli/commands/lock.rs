//! Lock commands - inspect or remove the run lock

use super::Target;
use crate::error::PipedbResult;
use crate::ui::{self, UiContext};
use crate::workflow::{self, LockState};

/// Show whether the instance is locked
pub fn status(target: &Target) -> PipedbResult<()> {
    let ctx = UiContext::detect();
    let path = workflow::lock_path(&target.workflow_dir, &target.instance);

    match workflow::lock_status(&target.workflow_dir, &target.instance)? {
        LockState::Unlocked => {
            ui::key_value_status(&ctx, "lock", "unlocked", true);
        }
        LockState::Locked(owner) => {
            ui::key_value_status(&ctx, "lock", "locked", false);
            ui::key_value(&ctx, "path", &path.display().to_string());
            match owner {
                Some(owner) => {
                    ui::key_value(&ctx, "run", &owner.run_id.to_string());
                    ui::key_value(&ctx, "pid", &owner.pid.to_string());
                    ui::key_value(
                        &ctx,
                        "since",
                        &owner.acquired_at.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
                    );
                }
                None => ui::key_value(&ctx, "owner", "unknown"),
            }
        }
    }

    Ok(())
}

/// Remove the instance lock
pub fn unlock(target: &Target) -> PipedbResult<()> {
    let ctx = UiContext::detect();

    if workflow::force_unlock(&target.workflow_dir, &target.instance)? {
        ui::step_ok(&ctx, &format!("Lock removed from {}", target.label()));
    } else {
        ui::step_info(&ctx, &format!("No lock held on {}", target.label()));
    }

    Ok(())
}
