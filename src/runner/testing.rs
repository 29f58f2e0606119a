//! Scripted [`ToolRunner`] for tests: canned ffprobe output per file, ffmpeg
//! calls recorded, their outputs touched, and optionally failed by output name.

use super::{ToolFailure, ToolInvocation, ToolOutput, ToolRunner};
use std::collections::HashMap;
use std::sync::Mutex;

#[derive(Default)]
pub struct FakeRunner {
    calls: Mutex<Vec<ToolInvocation>>,
    probes: HashMap<String, String>,
    failures: Vec<(String, i32)>,
}

impl FakeRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer ffprobe calls for `path` with `stdout`
    pub fn probe(mut self, path: impl AsRef<std::path::Path>, stdout: impl Into<String>) -> Self {
        self.probes
            .insert(path.as_ref().to_string_lossy().to_string(), stdout.into());
        self
    }

    /// Fail ffmpeg calls whose last argument ends with `suffix`
    pub fn fail_output(mut self, suffix: impl Into<String>, code: i32) -> Self {
        self.failures.push((suffix.into(), code));
        self
    }

    pub fn calls(&self) -> Vec<ToolInvocation> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    pub fn ffmpeg_calls(&self) -> Vec<ToolInvocation> {
        self.calls()
            .into_iter()
            .filter(|c| c.program == "ffmpeg")
            .collect()
    }

    pub fn probe_calls(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| c.program == "ffprobe")
            .count()
    }
}

impl ToolRunner for FakeRunner {
    fn run(&self, invocation: &ToolInvocation) -> Result<ToolOutput, ToolFailure> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(invocation.clone());
        }

        let last = invocation.args.last().cloned().unwrap_or_default();

        if invocation.program == "ffprobe" {
            return match self.probes.get(&last) {
                Some(stdout) => Ok(ToolOutput {
                    code: Some(0),
                    stdout: stdout.clone(),
                    stderr: String::new(),
                }),
                None => Err(ToolFailure::Exited {
                    code: Some(1),
                    stderr: format!("{}: No such file or directory", last),
                }),
            };
        }

        if let Some((_, code)) = self.failures.iter().find(|(s, _)| last.ends_with(s)) {
            return Err(ToolFailure::Exited {
                code: Some(*code),
                stderr: format!("{}: Invalid argument", last),
            });
        }

        // Leave an (empty) output behind like the real tool would
        let output = std::path::Path::new(&last);
        if output.parent().is_some_and(|p| p.is_dir()) {
            let _ = std::fs::write(output, b"");
        }

        Ok(ToolOutput {
            code: Some(0),
            ..ToolOutput::default()
        })
    }
}

/// ffprobe JSON with the given `(codec_type, codec_name, language)` streams,
/// numbered in order
pub fn probe_json(streams: &[(&str, &str, Option<&str>)], duration: Option<f64>) -> String {
    let streams: Vec<serde_json::Value> = streams
        .iter()
        .enumerate()
        .map(|(index, (codec_type, codec_name, language))| {
            let mut stream = serde_json::json!({
                "index": index,
                "codec_type": codec_type,
                "codec_name": codec_name,
            });
            if *codec_type == "audio" {
                stream["channels"] = serde_json::json!(2);
            }
            if let Some(lang) = language {
                stream["tags"] = serde_json::json!({ "language": lang });
            }
            stream
        })
        .collect();

    let mut doc = serde_json::json!({ "streams": streams });
    if let Some(duration) = duration {
        doc["format"] = serde_json::json!({ "duration": format!("{:.6}", duration) });
    }
    doc.to_string()
}
