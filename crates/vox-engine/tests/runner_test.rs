#![cfg(unix)]

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use vox_engine::{
    dispatch, select_device, Device, EngineError, GenerationMode, GenerationRequest, ModelBackend,
    Precision, RunnerBackend,
};
use vox_types::{ModelSpec, ProgressPhase, ProgressState, SamplingParams};

fn write_runner(dir: &Path, body: &str) -> PathBuf {
    let path = dir.join("runner.sh");
    fs::write(&path, format!("#!/bin/sh\n{}\n", body)).unwrap();
    fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
    path
}

fn request(text: &str) -> GenerationRequest {
    GenerationRequest {
        text: text.to_string(),
        language: "English".to_string(),
        sampling: SamplingParams::default(),
    }
}

#[test]
fn test_load_handshake_and_generation() {
    let dir = tempfile::tempdir().unwrap();
    // Replies to every request with two samples: 1.0 and 2.0 (f32le).
    let runner = write_runner(
        dir.path(),
        r#"echo "progress 10 Downloading weights"
echo "extracting 80 Unpacking weights"
echo "ready 24000"
while read request; do
  echo "result 2"
  printf '\000\000\200\077\000\000\000\100'
done"#,
    );

    let backend = RunnerBackend::new(&runner);
    backend.availability().unwrap();

    let seen: Mutex<Vec<ProgressState>> = Mutex::new(Vec::new());
    let on_progress = |state: ProgressState| {
        seen.lock().unwrap().push(state);
    };
    let model = backend
        .load(ModelSpec::default(), Device::Cpu, Precision::F32, &on_progress)
        .unwrap();

    let wave = dispatch(
        &*model,
        &request("Hello there."),
        &GenerationMode::CustomVoice {
            speaker: "Vivian".to_string(),
        },
    )
    .unwrap();
    assert_eq!(wave.sample_rate, 24_000);
    assert_eq!(wave.samples, vec![1.0, 2.0]);

    // The child stays up between requests.
    let wave = dispatch(
        &*model,
        &request("Again."),
        &GenerationMode::VoiceDesign {
            instruction: "an old pirate".to_string(),
        },
    )
    .unwrap();
    assert_eq!(wave.samples.len(), 2);

    let seen = seen.into_inner().unwrap();
    assert!(seen
        .iter()
        .any(|s| s.status == ProgressPhase::Downloading && s.progress == 10.0));
    assert!(seen
        .iter()
        .any(|s| s.status == ProgressPhase::Extracting && s.progress == 80.0));
}

#[test]
fn test_runner_error_line_fails_the_load() {
    let dir = tempfile::tempdir().unwrap();
    let runner = write_runner(
        dir.path(),
        r#"echo "progress 5 Downloading weights"
echo "error no space left on device""#,
    );

    let backend = RunnerBackend::new(&runner);
    let on_progress = |_state: ProgressState| {};
    match backend.load(ModelSpec::default(), Device::Cpu, Precision::F32, &on_progress) {
        Err(EngineError::Load(msg)) => assert_eq!(msg, "no space left on device"),
        Err(other) => panic!("expected a load error, got {:?}", other),
        Ok(_) => panic!("expected a load error, got a model"),
    }
}

#[test]
fn test_runner_exit_without_ready_fails_the_load() {
    let dir = tempfile::tempdir().unwrap();
    let runner = write_runner(
        dir.path(),
        r#"echo "progress 5 Downloading weights"
exit 3"#,
    );

    let backend = RunnerBackend::new(&runner);
    let on_progress = |_state: ProgressState| {};
    match backend.load(ModelSpec::default(), Device::Cpu, Precision::F32, &on_progress) {
        Err(EngineError::Load(msg)) => assert!(msg.contains("exited"), "got: {}", msg),
        Err(other) => panic!("expected a load error, got {:?}", other),
        Ok(_) => panic!("expected a load error, got a model"),
    }
}

#[test]
fn test_generation_error_reply() {
    let dir = tempfile::tempdir().unwrap();
    let runner = write_runner(
        dir.path(),
        r#"echo "ready 24000"
while read request; do
  echo "error synthesis backend exploded"
done"#,
    );

    let backend = RunnerBackend::new(&runner);
    let on_progress = |_state: ProgressState| {};
    let model = backend
        .load(ModelSpec::default(), Device::Cpu, Precision::F32, &on_progress)
        .unwrap();

    let result = dispatch(
        &*model,
        &request("Hello."),
        &GenerationMode::CustomVoice {
            speaker: "Vivian".to_string(),
        },
    );
    match result {
        Err(EngineError::Generate(msg)) => assert_eq!(msg, "synthesis backend exploded"),
        Err(other) => panic!("expected a generation error, got {:?}", other),
        Ok(_) => panic!("expected a generation error, got audio"),
    }
}

#[test]
fn test_probe_parses_the_device_list() {
    let dir = tempfile::tempdir().unwrap();
    let runner = write_runner(
        dir.path(),
        r#"if [ "$1" = "probe" ]; then
  echo "cuda cpu"
  exit 0
fi
exit 1"#,
    );

    let backend = RunnerBackend::new(&runner);
    let devices = backend.probe_devices();
    assert_eq!(devices, vec![Device::Cuda, Device::Cpu]);
    assert_eq!(select_device(&devices), (Device::Cuda, Precision::Bf16));
}

#[test]
fn test_probe_failure_degrades_to_cpu() {
    let dir = tempfile::tempdir().unwrap();
    let runner = write_runner(
        dir.path(),
        r#"echo "probe blew up" >&2
exit 1"#,
    );

    let backend = RunnerBackend::new(&runner);
    assert_eq!(backend.probe_devices(), vec![Device::Cpu]);
}
