//! Runner-subprocess model backend.
//!
//! The model library is consumed through a small runner executable rather
//! than linked in. `RunnerBackend` spawns `runner load <repo> --device ..
//! --precision ..` once per load and keeps the child alive as the loaded
//! model: the child prints `progress`/`extracting` lines while it fetches
//! and places weights, then `ready <sample_rate>`. After the handshake each
//! generation request is one JSON line on stdin, answered by `result <n>`
//! plus `n` f32le samples on stdout (or `error <msg>`). Dropping the model
//! kills the child, which is what releases the weights.
//!
//! Loads and generation calls run without a deadline; a cold download of
//! the large variant can take minutes on its own.

use crate::backend::{
    CloneReference, GenerationRequest, ModelBackend, ProgressFn, SpeechModel, Waveform,
};
use crate::device::{Device, Precision};
use crate::error::EngineError;
use std::io::{BufRead, BufReader, Read, Write};
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};
use std::sync::Mutex;
use vox_types::{ModelSpec, ProgressPhase, ProgressState};

/// Backend that wraps the configured runner executable.
#[derive(Debug, Clone)]
pub struct RunnerBackend {
    runner: PathBuf,
}

impl RunnerBackend {
    /// Creates a backend for the given runner executable. The path may be a
    /// bare command name, in which case it is resolved through `PATH` at
    /// spawn time.
    pub fn new(runner: impl AsRef<Path>) -> Self {
        Self {
            runner: runner.as_ref().to_path_buf(),
        }
    }
}

impl ModelBackend for RunnerBackend {
    fn availability(&self) -> Result<(), EngineError> {
        if self.runner.as_os_str().is_empty() {
            return Err(EngineError::Unavailable(
                "model runner is not configured. Set runner in config \
                 or the VOX_RUNNER environment variable."
                    .to_string(),
            ));
        }
        // A bare command name resolves through PATH at spawn time; only an
        // explicit path can be checked up front.
        if self.runner.components().count() > 1 && !self.runner.exists() {
            return Err(EngineError::Unavailable(format!(
                "model runner not found: {:?}",
                self.runner
            )));
        }
        Ok(())
    }

    fn probe_devices(&self) -> Vec<Device> {
        let output = match Command::new(&self.runner).arg("probe").output() {
            Ok(output) => output,
            Err(e) => {
                tracing::warn!("device probe failed to run ({}), assuming cpu", e);
                return vec![Device::Cpu];
            }
        };
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            tracing::warn!(
                "device probe exited with {}: {}, assuming cpu",
                output.status,
                stderr.trim()
            );
            return vec![Device::Cpu];
        }
        let devices: Vec<Device> = String::from_utf8_lossy(&output.stdout)
            .split_whitespace()
            .filter_map(|token| token.parse().ok())
            .collect();
        if devices.is_empty() {
            vec![Device::Cpu]
        } else {
            devices
        }
    }

    fn load(
        &self,
        spec: ModelSpec,
        device: Device,
        precision: Precision,
        on_progress: ProgressFn<'_>,
    ) -> Result<Box<dyn SpeechModel>, EngineError> {
        let repo = spec.repo_id();
        let mut child = Command::new(&self.runner)
            .arg("load")
            .arg(&repo)
            .arg("--device")
            .arg(device.as_str())
            .arg("--precision")
            .arg(precision.as_str())
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| EngineError::Load(format!("failed to spawn runner: {}", e)))?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| EngineError::Load("failed to open runner stdin".to_string()))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| EngineError::Load("failed to open runner stdout".to_string()))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| EngineError::Load("failed to open runner stderr".to_string()))?;

        // Drain stderr on its own thread so the child never stalls on a full
        // pipe while we wait on stdout; runner-side logs land in ours.
        std::thread::spawn(move || {
            for line in BufReader::new(stderr).lines().map_while(Result::ok) {
                tracing::debug!(target: "vox_engine::runner", "{}", line);
            }
        });

        let mut stdout = BufReader::new(stdout);
        let sample_rate = loop {
            let line = match read_reply_line(&mut stdout) {
                Ok(Some(line)) => line,
                Ok(None) => {
                    let _ = child.wait();
                    return Err(EngineError::Load(
                        "runner exited before the model became ready".to_string(),
                    ));
                }
                Err(e) => {
                    let _ = child.kill();
                    let _ = child.wait();
                    return Err(EngineError::Load(format!(
                        "failed to read from runner: {}",
                        e
                    )));
                }
            };

            if let Some(rest) = line.strip_prefix("progress ") {
                let (pct, detail) = split_progress(rest);
                on_progress(ProgressState::new(ProgressPhase::Downloading, pct, detail));
            } else if let Some(rest) = line.strip_prefix("extracting ") {
                let (pct, detail) = split_progress(rest);
                on_progress(ProgressState::new(ProgressPhase::Extracting, pct, detail));
            } else if let Some(rate) = line.strip_prefix("ready ") {
                match rate.trim().parse::<u32>() {
                    Ok(rate) => break rate,
                    Err(_) => {
                        let _ = child.kill();
                        let _ = child.wait();
                        return Err(EngineError::Load(format!(
                            "runner reported an invalid sample rate: {:?}",
                            rate
                        )));
                    }
                }
            } else if let Some(msg) = line.strip_prefix("error ") {
                let _ = child.kill();
                let _ = child.wait();
                return Err(EngineError::Load(msg.trim().to_string()));
            } else {
                // Anything else on stdout is runner noise, not protocol.
                tracing::debug!(target: "vox_engine::runner", "{}", line);
            }
        };

        tracing::info!(model = %repo, %device, %precision, sample_rate, "runner ready");
        Ok(Box::new(WorkerModel {
            pipe: Mutex::new(RunnerPipe {
                child,
                stdin,
                stdout,
            }),
            sample_rate,
        }))
    }
}

/// A loaded model held as a live runner child process.
struct WorkerModel {
    pipe: Mutex<RunnerPipe>,
    sample_rate: u32,
}

struct RunnerPipe {
    child: Child,
    stdin: ChildStdin,
    stdout: BufReader<ChildStdout>,
}

impl Drop for RunnerPipe {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

impl WorkerModel {
    /// Sends one request line and reads back the samples. One request is on
    /// the wire at a time; concurrent callers queue on the pipe lock.
    fn run(&self, request: serde_json::Value) -> Result<Waveform, EngineError> {
        let mut pipe = self.pipe.lock().unwrap_or_else(|e| e.into_inner());

        let mut line = request.to_string();
        line.push('\n');
        pipe.stdin
            .write_all(line.as_bytes())
            .and_then(|_| pipe.stdin.flush())
            .map_err(|e| EngineError::Generate(format!("failed to write to runner: {}", e)))?;

        let reply = read_reply_line(&mut pipe.stdout)
            .map_err(|e| EngineError::Generate(format!("failed to read from runner: {}", e)))?
            .ok_or_else(|| {
                EngineError::Generate("runner exited while generating".to_string())
            })?;

        if let Some(msg) = reply.strip_prefix("error ") {
            return Err(EngineError::Generate(msg.trim().to_string()));
        }
        let count: usize = reply
            .strip_prefix("result ")
            .and_then(|n| n.trim().parse().ok())
            .ok_or_else(|| {
                EngineError::Generate(format!("unexpected reply from runner: {:?}", reply))
            })?;

        let mut raw = vec![0u8; count * 4];
        pipe.stdout
            .read_exact(&mut raw)
            .map_err(|e| EngineError::Generate(format!("failed to read samples: {}", e)))?;
        let samples = raw
            .chunks_exact(4)
            .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
            .collect();

        Ok(Waveform {
            samples,
            sample_rate: self.sample_rate,
        })
    }
}

impl SpeechModel for WorkerModel {
    fn custom_voice(
        &self,
        req: &GenerationRequest,
        speaker: &str,
    ) -> Result<Waveform, EngineError> {
        self.run(serde_json::json!({
            "op": "custom_voice",
            "text": req.text,
            "language": req.language,
            "speaker": speaker,
            "sampling": req.sampling,
        }))
    }

    fn voice_design(
        &self,
        req: &GenerationRequest,
        instruction: &str,
    ) -> Result<Waveform, EngineError> {
        self.run(serde_json::json!({
            "op": "voice_design",
            "text": req.text,
            "language": req.language,
            "instruction": instruction,
            "sampling": req.sampling,
        }))
    }

    fn voice_clone(
        &self,
        req: &GenerationRequest,
        reference: &CloneReference,
    ) -> Result<Waveform, EngineError> {
        self.run(serde_json::json!({
            "op": "voice_clone",
            "text": req.text,
            "language": req.language,
            "ref_audio": reference.audio_path.to_string_lossy(),
            "ref_text": reference.ref_text,
            "sampling": req.sampling,
        }))
    }
}

/// Reads one protocol line; `None` means the runner closed its stdout.
fn read_reply_line(stdout: &mut BufReader<ChildStdout>) -> std::io::Result<Option<String>> {
    let mut line = String::new();
    if stdout.read_line(&mut line)? == 0 {
        return Ok(None);
    }
    Ok(Some(line.trim_end().to_string()))
}

/// Splits `<pct> <detail...>`; a malformed percentage reads as 0.
fn split_progress(rest: &str) -> (f64, String) {
    let mut parts = rest.splitn(2, ' ');
    let pct = parts
        .next()
        .and_then(|p| p.parse::<f64>().ok())
        .filter(|p| p.is_finite())
        .unwrap_or(0.0)
        .clamp(0.0, 100.0);
    let detail = parts.next().unwrap_or("").to_string();
    (pct, detail)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unconfigured_runner_is_unavailable() {
        let backend = RunnerBackend::new("");
        assert!(matches!(
            backend.availability(),
            Err(EngineError::Unavailable(_))
        ));
    }

    #[test]
    fn missing_explicit_path_is_unavailable() {
        let backend = RunnerBackend::new("/nonexistent/vox-runner");
        assert!(matches!(
            backend.availability(),
            Err(EngineError::Unavailable(_))
        ));
    }

    #[test]
    fn bare_command_name_passes_the_static_check() {
        // PATH resolution happens at spawn time, so this cannot fail early.
        let backend = RunnerBackend::new("vox-runner");
        assert!(backend.availability().is_ok());
    }

    #[test]
    fn probe_of_a_missing_runner_degrades_to_cpu() {
        let backend = RunnerBackend::new("/nonexistent/vox-runner");
        assert_eq!(backend.probe_devices(), vec![Device::Cpu]);
    }

    #[test]
    fn progress_lines_split_into_pct_and_detail() {
        let (pct, detail) = split_progress("42.5 Downloading shard 2/4");
        assert_eq!(pct, 42.5);
        assert_eq!(detail, "Downloading shard 2/4");

        let (pct, detail) = split_progress("83");
        assert_eq!(pct, 83.0);
        assert_eq!(detail, "");

        // Garbage percentages degrade instead of failing the load.
        let (pct, _) = split_progress("NaN% almost there");
        assert_eq!(pct, 0.0);
        let (pct, _) = split_progress("250 overshoot");
        assert_eq!(pct, 100.0);
    }
}
