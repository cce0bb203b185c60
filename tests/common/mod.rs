// tests/common/mod.rs
#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use axum::Router;
use nodvarsel_monitor::{AlertSource, FeedError};
use tokio::net::TcpListener;

pub const FIXTURE: &str = include_str!("../fixtures/nodvarsel_rss.xml");
pub const EMPTY_FEED: &str = "<rss><channel></channel></rss>";

/// Serve `app` on an ephemeral local port; returns the base URL.
pub async fn serve(app: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind test server");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("test server");
    });
    format!("http://{addr}")
}

/// Source that replays a scripted list of responses, repeating the last one.
pub struct ScriptedSource {
    script: Mutex<VecDeque<Result<String, FeedError>>>,
    last: Mutex<Option<Result<String, FeedError>>>,
    delay: Duration,
    pub calls: AtomicUsize,
}

impl ScriptedSource {
    pub fn new(script: Vec<Result<String, FeedError>>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            last: Mutex::new(None),
            delay: Duration::ZERO,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl AlertSource for ScriptedSource {
    async fn fetch(&self) -> Result<String, FeedError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        let next = self.script.lock().unwrap().pop_front();
        let mut last = self.last.lock().unwrap();
        if let Some(n) = next {
            *last = Some(n);
        }
        last.clone()
            .unwrap_or_else(|| Err(FeedError::Transport("empty script".into())))
    }

    fn name(&self) -> &'static str {
        "scripted"
    }
}
