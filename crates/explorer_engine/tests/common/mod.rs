#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, Once};
use std::time::Duration;

use bytes::Bytes;
use explorer_core::{Entry, FOLDER_MIME};
use explorer_engine::{
    DriveApi, Explorer, ExplorerError, ExplorerOptions, FailureKind, ListPage, ManualClock,
    Stores,
};

static INIT: Once = Once::new();

pub fn init_logging() {
    INIT.call_once(explorer_logging::initialize_for_tests);
}

/// In-process drive with call counters, scripted failures and an optional
/// per-call delay.
pub struct FakeDrive {
    metadata: Mutex<HashMap<String, Entry>>,
    children: Mutex<HashMap<String, Vec<Entry>>>,
    documents: Mutex<HashMap<String, Vec<u8>>>,
    failures: Mutex<HashMap<String, ExplorerError>>,
    page_size: usize,
    delay: Duration,
    pub metadata_calls: AtomicUsize,
    pub list_calls: AtomicUsize,
    pub fetch_calls: AtomicUsize,
}

impl FakeDrive {
    pub fn new() -> Self {
        Self {
            metadata: Mutex::default(),
            children: Mutex::default(),
            documents: Mutex::default(),
            failures: Mutex::default(),
            page_size: 100,
            delay: Duration::ZERO,
            metadata_calls: AtomicUsize::new(0),
            list_calls: AtomicUsize::new(0),
            fetch_calls: AtomicUsize::new(0),
        }
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size;
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn root(self, id: &str, name: &str) -> Self {
        self.metadata.lock().unwrap().insert(
            id.to_string(),
            Entry {
                id: id.to_string(),
                name: name.to_string(),
                mime_type: Some(FOLDER_MIME.to_string()),
            },
        );
        self.children.lock().unwrap().entry(id.to_string()).or_default();
        self
    }

    pub fn folder(self, parent: &str, id: &str, name: &str) -> Self {
        self.add(parent, id, name, Some(FOLDER_MIME));
        self.children.lock().unwrap().entry(id.to_string()).or_default();
        self
    }

    pub fn file(self, parent: &str, id: &str, name: &str, body: &str) -> Self {
        let mime = if name.ends_with(".json") {
            Some("application/json")
        } else if name.ends_with(".pdf") {
            Some("application/pdf")
        } else {
            None
        };
        self.add(parent, id, name, mime);
        self.documents
            .lock()
            .unwrap()
            .insert(id.to_string(), body.as_bytes().to_vec());
        self
    }

    /// Every call naming `id` fails with `err` until [`FakeDrive::heal`].
    pub fn fail(&self, id: &str, err: ExplorerError) {
        self.failures.lock().unwrap().insert(id.to_string(), err);
    }

    pub fn heal(&self, id: &str) {
        self.failures.lock().unwrap().remove(id);
    }

    pub fn set_document(&self, id: &str, body: &str) {
        self.documents
            .lock()
            .unwrap()
            .insert(id.to_string(), body.as_bytes().to_vec());
    }

    pub fn lists(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    pub fn fetches(&self) -> usize {
        self.fetch_calls.load(Ordering::SeqCst)
    }

    pub fn metadata_lookups(&self) -> usize {
        self.metadata_calls.load(Ordering::SeqCst)
    }

    fn add(&self, parent: &str, id: &str, name: &str, mime: Option<&str>) {
        let entry = Entry {
            id: id.to_string(),
            name: name.to_string(),
            mime_type: mime.map(str::to_string),
        };
        self.metadata
            .lock()
            .unwrap()
            .insert(id.to_string(), entry.clone());
        self.children
            .lock()
            .unwrap()
            .entry(parent.to_string())
            .or_default()
            .push(entry);
    }

    async fn pause_and_check(&self, id: &str) -> Result<(), ExplorerError> {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        match self.failures.lock().unwrap().get(id) {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }
}

#[async_trait::async_trait]
impl DriveApi for FakeDrive {
    async fn metadata(&self, id: &str) -> Result<Entry, ExplorerError> {
        self.metadata_calls.fetch_add(1, Ordering::SeqCst);
        self.pause_and_check(id).await?;
        self.metadata
            .lock()
            .unwrap()
            .get(id)
            .cloned()
            .ok_or_else(|| ExplorerError::new(FailureKind::NotFound, format!("404 {id}")))
    }

    async fn list_page(
        &self,
        parent: &str,
        page_token: Option<&str>,
    ) -> Result<ListPage, ExplorerError> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        self.pause_and_check(parent).await?;
        let all = self
            .children
            .lock()
            .unwrap()
            .get(parent)
            .cloned()
            .ok_or_else(|| ExplorerError::new(FailureKind::NotFound, format!("404 {parent}")))?;
        let start: usize = page_token.map(|t| t.parse().unwrap()).unwrap_or(0);
        let end = (start + self.page_size).min(all.len());
        Ok(ListPage {
            files: all[start..end].to_vec(),
            next_page_token: (end < all.len()).then(|| end.to_string()),
        })
    }

    async fn fetch_document(&self, id: &str) -> Result<Bytes, ExplorerError> {
        self.fetch_calls.fetch_add(1, Ordering::SeqCst);
        self.pause_and_check(id).await?;
        self.documents
            .lock()
            .unwrap()
            .get(id)
            .cloned()
            .map(Bytes::from)
            .ok_or_else(|| ExplorerError::new(FailureKind::NotFound, format!("404 {id}")))
    }
}

pub const QUIZ: &str = r#"{"title":"Basics","questions":[{"q":"1+1"},{"q":"2+2"}],"answerLabels":["A","B"]}"#;
pub const ESCAPE: &str = r#"{"game_type":"Escape Game","sections":[{"id":"s1"}]}"#;

/// root
/// ├── Unit 1/            (unit-1)
/// │   └── quiz.json      (quiz)
/// ├── Unit 2/            (unit-2)
/// ├── escape.json        (escape)
/// └── slides.pdf         (slides)
pub fn sample_drive() -> FakeDrive {
    FakeDrive::new()
        .root("root", "Course")
        .folder("root", "unit-1", "Unit 1")
        .folder("root", "unit-2", "Unit 2")
        .file("root", "slides", "slides.pdf", "%PDF")
        .file("root", "escape", "escape.json", ESCAPE)
        .file("unit-1", "quiz", "quiz.json", QUIZ)
}

pub fn explorer(drive: &Arc<FakeDrive>, stores: Stores) -> Explorer {
    init_logging();
    Explorer::new(
        drive.clone(),
        stores,
        Arc::new(ManualClock::at(1_700_000_000_000)),
        ExplorerOptions::default(),
    )
}
