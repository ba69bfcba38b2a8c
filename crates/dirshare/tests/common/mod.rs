//! Test utilities and common setup.
#![allow(dead_code)]

use std::path::Path;
use std::sync::{Arc, Mutex};

use dirshare::{Notice, ServingInfo, Shell};
use tempfile::TempDir;

/// What a [`RecordingShell`] was told, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Started(ServingInfo),
    Stopped,
    Error(Notice),
    Info(Notice),
}

/// Shell that records every notification and answers prompts from a queue.
#[derive(Default)]
pub struct RecordingShell {
    events: Mutex<Vec<Event>>,
    port_answer: Mutex<Option<String>>,
}

impl RecordingShell {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn answer_port_prompt(&self, answer: &str) {
        *self.port_answer.lock().unwrap() = Some(answer.to_string());
    }

    pub fn events(&self) -> Vec<Event> {
        self.events.lock().unwrap().clone()
    }

    pub fn errors(&self) -> Vec<Notice> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                Event::Error(notice) => Some(notice),
                _ => None,
            })
            .collect()
    }

    pub fn count(&self, wanted: fn(&Event) -> bool) -> usize {
        self.events().iter().filter(|event| wanted(event)).count()
    }

    fn push(&self, event: Event) {
        self.events.lock().unwrap().push(event);
    }
}

impl Shell for RecordingShell {
    fn serving_started(&self, info: &ServingInfo) {
        self.push(Event::Started(info.clone()));
    }

    fn serving_stopped(&self) {
        self.push(Event::Stopped);
    }

    fn error(&self, notice: &Notice) {
        self.push(Event::Error(notice.clone()));
    }

    fn info(&self, notice: &Notice) {
        self.push(Event::Info(notice.clone()));
    }

    fn prompt_for_port(&self, _current: u16) -> Option<String> {
        self.port_answer.lock().unwrap().take()
    }
}

/// A served directory holding `a.txt` and an empty `b/`.
pub fn scenario_dir() -> TempDir {
    let dir = TempDir::new().expect("create temp dir");
    std::fs::write(dir.path().join("a.txt"), b"hello from a").expect("write a.txt");
    std::fs::create_dir(dir.path().join("b")).expect("create b");
    dir
}

/// A nested tree: docs/guide/intro.md and docs/readme.txt.
pub fn nested_dir() -> TempDir {
    let dir = TempDir::new().expect("create temp dir");
    write(dir.path(), "docs/readme.txt", "readme");
    write(dir.path(), "docs/guide/intro.md", "# Intro");
    dir
}

pub fn write(root: &Path, relative: &str, content: &str) {
    let path = root.join(relative);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).expect("create parent dirs");
    }
    std::fs::write(path, content).expect("write file");
}

/// A port that was free a moment ago.
pub fn free_port() -> u16 {
    std::net::TcpListener::bind("127.0.0.1:0")
        .and_then(|listener| listener.local_addr())
        .map(|addr| addr.port())
        .expect("find free port")
}
