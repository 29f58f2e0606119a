use super::{ToolFailure, ToolInvocation, ToolOutput, ToolRunner};
use std::io::Read;
use std::process::{Child, Command, Stdio};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Runs tools as child processes, killing them on cancellation or timeout
#[derive(Debug, Clone)]
pub struct ProcessRunner {
    cancel_flag: Arc<AtomicBool>,
    timeout: Option<Duration>,
}

impl ProcessRunner {
    pub fn new(cancel_flag: Arc<AtomicBool>) -> Self {
        Self {
            cancel_flag,
            timeout: None,
        }
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }
}

impl ToolRunner for ProcessRunner {
    fn run(&self, invocation: &ToolInvocation) -> Result<ToolOutput, ToolFailure> {
        debug!("Spawning: {}", invocation);

        let mut child = Command::new(&invocation.program)
            .args(&invocation.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| ToolFailure::Spawn {
                program: invocation.program.clone(),
                source,
            })?;

        // Drain both pipes on their own threads so a chatty child never blocks
        let stdout = drain(child.stdout.take());
        let stderr = drain(child.stderr.take());

        let started = Instant::now();
        let status = loop {
            if self.cancel_flag.load(Ordering::Relaxed) {
                warn!("Cancelling {}", invocation.program);
                kill_child(&mut child);
                return Err(ToolFailure::Cancelled);
            }

            if let Some(limit) = self.timeout
                && started.elapsed() > limit
            {
                warn!(
                    "{} exceeded {}s, killing it",
                    invocation.program,
                    limit.as_secs()
                );
                kill_child(&mut child);
                return Err(ToolFailure::TimedOut {
                    secs: limit.as_secs(),
                });
            }

            match child.try_wait() {
                Ok(Some(status)) => break status,
                Ok(None) => thread::sleep(POLL_INTERVAL),
                Err(e) => {
                    kill_child(&mut child);
                    return Err(ToolFailure::Wait(e));
                }
            }
        };

        let stdout = collect(stdout);
        let stderr = collect(stderr);
        debug!(
            "{} finished with {} after {:.1}s",
            invocation.program,
            status,
            started.elapsed().as_secs_f64()
        );

        if !status.success() {
            return Err(ToolFailure::Exited {
                code: status.code(),
                stderr,
            });
        }

        Ok(ToolOutput {
            code: status.code(),
            stdout,
            stderr,
        })
    }
}

fn drain<R: Read + Send + 'static>(pipe: Option<R>) -> Option<JoinHandle<String>> {
    pipe.map(|mut pipe| {
        thread::spawn(move || {
            let mut buf = Vec::new();
            let _ = pipe.read_to_end(&mut buf);
            String::from_utf8_lossy(&buf).to_string()
        })
    })
}

fn collect(handle: Option<JoinHandle<String>>) -> String {
    handle.and_then(|h| h.join().ok()).unwrap_or_default()
}

fn kill_child(child: &mut Child) {
    let _ = child.kill();
    let _ = child.wait();
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    fn runner() -> ProcessRunner {
        ProcessRunner::new(Arc::new(AtomicBool::new(false)))
    }

    #[test]
    fn test_captures_stdout_on_success() {
        let inv = ToolInvocation::new("sh", ["-c", "echo hello"]);
        let output = runner().run(&inv).unwrap();
        assert_eq!(output.stdout.trim(), "hello");
        assert_eq!(output.code, Some(0));
    }

    #[test]
    fn test_non_zero_exit_carries_code_and_stderr() {
        let inv = ToolInvocation::new("sh", ["-c", "echo broken >&2; exit 3"]);
        match runner().run(&inv) {
            Err(ToolFailure::Exited { code, stderr }) => {
                assert_eq!(code, Some(3));
                assert_eq!(stderr.trim(), "broken");
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_missing_program_is_spawn_failure() {
        let inv = ToolInvocation::new("definitely-not-a-real-tool-xyz", ["-version"]);
        assert!(matches!(
            runner().run(&inv),
            Err(ToolFailure::Spawn { .. })
        ));
    }

    #[test]
    fn test_raised_flag_kills_child() {
        let flag = Arc::new(AtomicBool::new(true));
        let inv = ToolInvocation::new("sleep", ["5"]);
        let started = Instant::now();
        let result = ProcessRunner::new(flag).run(&inv);
        assert!(matches!(result, Err(ToolFailure::Cancelled)));
        assert!(started.elapsed() < Duration::from_secs(4));
    }

    #[test]
    fn test_timeout_kills_child() {
        let inv = ToolInvocation::new("sleep", ["5"]);
        let result = runner()
            .with_timeout(Some(Duration::from_millis(200)))
            .run(&inv);
        assert!(matches!(result, Err(ToolFailure::TimedOut { .. })));
    }
}
