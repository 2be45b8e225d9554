#![allow(dead_code)]

use serde_json::Value;
use std::cell::RefCell;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use voxmate_core::handlers::entertainment::{AudioBackend, AudioError};
use voxmate_core::platform::http::{HttpFetch, OnlineError};
use voxmate_core::platform::{CommandRunner, CommandSpec, OsKind, PlatformError};
use voxmate_core::{Assistant, AssistantConfig, CapabilitySet};

/// Runner that records every invocation and never spawns anything.
#[derive(Clone, Default)]
pub struct RecordingRunner {
    pub calls: Rc<RefCell<Vec<CommandSpec>>>,
}

impl RecordingRunner {
    pub fn programs(&self) -> Vec<String> {
        self.calls
            .borrow()
            .iter()
            .map(|spec| spec.program.clone())
            .collect()
    }
}

impl CommandRunner for RecordingRunner {
    fn os(&self) -> OsKind {
        OsKind::Linux
    }

    fn has_program(&self, _program: &str) -> bool {
        true
    }

    fn run(&self, spec: &CommandSpec) -> Result<String, PlatformError> {
        self.calls.borrow_mut().push(spec.clone());
        Ok(String::new())
    }

    fn launch(&self, spec: &CommandSpec) -> Result<(), PlatformError> {
        self.calls.borrow_mut().push(spec.clone());
        Ok(())
    }
}

/// Runner whose every call panics.
pub struct PanickingRunner;

impl CommandRunner for PanickingRunner {
    fn os(&self) -> OsKind {
        OsKind::Linux
    }

    fn has_program(&self, _program: &str) -> bool {
        true
    }

    fn run(&self, spec: &CommandSpec) -> Result<String, PlatformError> {
        panic!("unexpected run of {}", spec.program)
    }

    fn launch(&self, spec: &CommandSpec) -> Result<(), PlatformError> {
        panic!("unexpected launch of {}", spec.program)
    }
}

/// HTTP fake answering by URL prefix.
#[derive(Clone, Default)]
pub struct CannedHttp {
    json: Vec<(String, Value)>,
    text: Vec<(String, String)>,
}

impl CannedHttp {
    pub fn with_json(mut self, url_prefix: &str, body: Value) -> Self {
        self.json.push((url_prefix.to_string(), body));
        self
    }

    pub fn with_text(mut self, url_prefix: &str, body: &str) -> Self {
        self.text.push((url_prefix.to_string(), body.to_string()));
        self
    }
}

impl HttpFetch for CannedHttp {
    fn get_json(&self, url: &str, _query: &[(&str, &str)]) -> Result<Value, OnlineError> {
        self.json
            .iter()
            .find(|(prefix, _)| url.starts_with(prefix.as_str()))
            .map(|(_, body)| body.clone())
            .ok_or(OnlineError::Status(404))
    }

    fn get_text(&self, url: &str, _query: &[(&str, &str)]) -> Result<String, OnlineError> {
        self.text
            .iter()
            .find(|(prefix, _)| url.starts_with(prefix.as_str()))
            .map(|(_, body)| body.clone())
            .ok_or(OnlineError::Status(404))
    }
}

/// Audio backend that remembers the last started file and every volume
/// applied to live playback.
#[derive(Clone, Default)]
pub struct SilentAudio {
    pub last_played: Rc<RefCell<Option<PathBuf>>>,
    pub live_volumes: Rc<RefCell<Vec<f32>>>,
}

impl AudioBackend for SilentAudio {
    fn play(&mut self, path: &Path, _volume: f32) -> Result<(), AudioError> {
        *self.last_played.borrow_mut() = Some(path.to_path_buf());
        Ok(())
    }

    fn pause(&mut self) -> Result<(), AudioError> {
        Ok(())
    }

    fn resume(&mut self) -> Result<(), AudioError> {
        Ok(())
    }

    fn stop(&mut self) -> Result<(), AudioError> {
        Ok(())
    }

    fn set_volume(&mut self, volume: f32) -> Result<(), AudioError> {
        self.live_volumes.borrow_mut().push(volume);
        Ok(())
    }
}

pub struct Harness {
    pub assistant: Assistant,
    pub runner: RecordingRunner,
    pub audio: SilentAudio,
    pub root: tempfile::TempDir,
}

pub fn config_in(root: &Path) -> AssistantConfig {
    let config = AssistantConfig::rooted_at(root);
    config.ensure_dirs().unwrap();
    config
}

pub fn harness(capabilities: CapabilitySet, http: CannedHttp) -> Harness {
    harness_with(capabilities, http, |_| {})
}

pub fn harness_with<F>(capabilities: CapabilitySet, http: CannedHttp, adjust: F) -> Harness
where
    F: FnOnce(&mut AssistantConfig),
{
    let root = tempfile::tempdir().unwrap();
    let mut config = config_in(root.path());
    adjust(&mut config);
    let runner = RecordingRunner::default();
    let audio = SilentAudio::default();
    let assistant = Assistant::new(
        config,
        capabilities,
        Box::new(runner.clone()),
        Box::new(http),
        Box::new(audio.clone()),
    )
    .with_seed(7);
    Harness {
        assistant,
        runner,
        audio,
        root,
    }
}
