//! Uniform wrapper around external tool invocations.
//!
//! Every ffmpeg/ffprobe call in the crate goes through [`ToolRunner`], so exit
//! status, stderr capture, cancellation and timeouts are handled in one place.
//! Callers map [`ToolFailure`] into the error variant of their own component.

pub mod process;
#[cfg(test)]
pub mod testing;

pub use process::ProcessRunner;

use std::fmt;

/// A program and its arguments, ready to be spawned
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolInvocation {
    pub program: String,
    pub args: Vec<String>,
}

impl ToolInvocation {
    pub fn new<I, S>(program: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }
}

impl fmt::Display for ToolInvocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", shell_quote(&self.program))?;
        for arg in &self.args {
            write!(f, " {}", shell_quote(arg))?;
        }
        Ok(())
    }
}

fn shell_quote(arg: &str) -> String {
    let plain = !arg.is_empty()
        && arg
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "-_./:=,+@%".contains(c));
    if plain {
        arg.to_string()
    } else {
        format!("'{}'", arg.replace('\'', r"'\''"))
    }
}

/// Captured result of a tool that exited successfully
#[derive(Debug, Clone, Default)]
pub struct ToolOutput {
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

/// Why an external tool did not complete successfully
#[derive(Debug)]
pub enum ToolFailure {
    /// The program could not be started at all
    Spawn {
        program: String,
        source: std::io::Error,
    },
    /// The program ran and exited unsuccessfully
    Exited { code: Option<i32>, stderr: String },
    /// The run was cancelled and the child killed
    Cancelled,
    /// The run exceeded its time limit and the child was killed
    TimedOut { secs: u64 },
    /// Waiting on the child failed
    Wait(std::io::Error),
}

impl ToolFailure {
    pub fn exit_code(&self) -> Option<i32> {
        match self {
            ToolFailure::Exited { code, .. } => *code,
            _ => None,
        }
    }
}

impl fmt::Display for ToolFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ToolFailure::Spawn { program, source } => {
                write!(f, "failed to start {}: {}", program, source)
            }
            ToolFailure::Exited { code, stderr } => {
                match code {
                    Some(code) => write!(f, "exited with code {}", code)?,
                    None => write!(f, "terminated by signal")?,
                }
                let tail = stderr_tail(stderr, 5);
                if !tail.is_empty() {
                    write!(f, ": {}", tail)?;
                }
                Ok(())
            }
            ToolFailure::Cancelled => write!(f, "cancelled"),
            ToolFailure::TimedOut { secs } => write!(f, "timed out after {}s", secs),
            ToolFailure::Wait(e) => write!(f, "failed to wait for process: {}", e),
        }
    }
}

impl std::error::Error for ToolFailure {}

/// Last `lines` non-empty lines of a stderr capture, joined with newlines
pub fn stderr_tail(stderr: &str, lines: usize) -> String {
    let mut tail: Vec<&str> = stderr
        .lines()
        .rev()
        .filter(|l| !l.trim().is_empty())
        .take(lines)
        .collect();
    tail.reverse();
    tail.join("\n")
}

/// Runs external tools. Implementations must be shareable across threads
/// because probes may run concurrently.
pub trait ToolRunner: Send + Sync {
    fn run(&self, invocation: &ToolInvocation) -> Result<ToolOutput, ToolFailure>;
}
