use super::command_builder::RemuxPlan;
use crate::error::AppError;
use crate::runner::{ToolFailure, ToolRunner, stderr_tail};
use crate::utils::disk_space::has_enough_space;
use crate::utils::format_file_size;
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

/// Run the remux once. No retries: a failed attempt removes the partial output
/// it wrote and the whole pipeline has to be re-invoked.
pub fn execute(
    runner: &dyn ToolRunner,
    plan: &RemuxPlan,
    ffmpeg: &str,
) -> Result<PathBuf, AppError> {
    if let Some(parent) = plan.output.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)?;
        check_space(parent, plan);
    }

    let invocation = plan.invocation(ffmpeg);
    println!("Running ffmpeg command:");
    println!("{}", invocation);
    info!("Remuxing into {}", plan.output.display());

    // A file already at the output path is not ours to remove on failure
    let preexisting = plan.output.exists();

    if let Err(failure) = runner.run(&invocation) {
        error!("Remux failed: {}", failure);
        if !preexisting
            && plan.output.exists()
            && let Err(e) = std::fs::remove_file(&plan.output)
        {
            warn!("Failed to remove partial output {}: {}", plan.output.display(), e);
        }
        return Err(remux_error(failure));
    }

    let size = std::fs::metadata(&plan.output).map(|m| m.len()).ok();
    match size {
        Some(size) => println!(
            "Remuxed file saved to: {} ({})",
            plan.output.display(),
            format_file_size(size)
        ),
        None => println!("Remuxed file saved to: {}", plan.output.display()),
    }

    Ok(plan.output.clone())
}

fn remux_error(failure: ToolFailure) -> AppError {
    match failure {
        ToolFailure::Exited { code, stderr } => AppError::RemuxExecution {
            code,
            stderr: stderr_tail(&stderr, 5),
        },
        other => AppError::RemuxExecution {
            code: None,
            stderr: other.to_string(),
        },
    }
}

/// Stream copy output is roughly the size of its inputs
fn check_space(dir: &Path, plan: &RemuxPlan) {
    let required: u64 = plan
        .inputs
        .iter()
        .filter_map(|input| std::fs::metadata(&input.path).ok())
        .map(|m| m.len())
        .sum();

    if !has_enough_space(dir, required) {
        warn!(
            "{} may not have enough free space for ~{}",
            dir.display(),
            format_file_size(required)
        );
    }
}
