//! Bounded capture of a child's output pipe.
//!
//! A reader task drains the pipe into a shared buffer until end of file.
//! Bytes past the limit are read and discarded so the child never blocks on
//! a full pipe.

use std::sync::{Arc, Mutex, MutexGuard};

use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::task::JoinHandle;

const CHUNK_SIZE: usize = 8 * 1024;

/// Output bytes up to a fixed limit, plus a count of what was dropped.
#[derive(Debug)]
pub(crate) struct CappedBuffer {
    bytes: Vec<u8>,
    limit: usize,
    discarded: u64,
}

impl CappedBuffer {
    pub(crate) fn new(limit: usize) -> Self {
        Self {
            bytes: Vec::new(),
            limit,
            discarded: 0,
        }
    }

    pub(crate) fn push(&mut self, chunk: &[u8]) {
        let room = self.limit.saturating_sub(self.bytes.len());
        let keep = room.min(chunk.len());
        self.bytes.extend_from_slice(&chunk[..keep]);
        self.discarded += (chunk.len() - keep) as u64;
    }

    /// Lossy UTF-8 text, with a marker line when anything was discarded.
    pub(crate) fn to_text(&self) -> String {
        let mut text = String::from_utf8_lossy(&self.bytes).into_owned();
        if self.discarded > 0 {
            if !text.is_empty() && !text.ends_with('\n') {
                text.push('\n');
            }
            text.push_str(&format!(
                "[output truncated: {} bytes discarded]\n",
                self.discarded
            ));
        }
        text
    }
}

/// A pipe being drained in the background.
pub(crate) struct Capture {
    buffer: Arc<Mutex<CappedBuffer>>,
    task: Option<JoinHandle<()>>,
}

impl Capture {
    /// Start draining `pipe`. A missing pipe captures nothing.
    pub(crate) fn spawn<R>(pipe: Option<R>, limit: usize) -> Self
    where
        R: AsyncRead + Unpin + Send + 'static,
    {
        let buffer = Arc::new(Mutex::new(CappedBuffer::new(limit)));
        let task = pipe.map(|mut pipe| {
            let buffer = buffer.clone();
            tokio::spawn(async move {
                let mut chunk = vec![0u8; CHUNK_SIZE];
                loop {
                    match pipe.read(&mut chunk).await {
                        Ok(0) | Err(_) => break,
                        Ok(n) => {
                            lock(&buffer).push(&chunk[..n]);
                        }
                    }
                }
            })
        });

        Self { buffer, task }
    }

    /// Resolves once the pipe reached end of file.
    pub(crate) async fn finished(&mut self) {
        if let Some(task) = self.task.as_mut() {
            let _ = task.await;
        }
        self.task = None;
    }

    /// Stop reading and return what was captured so far.
    pub(crate) fn into_text(self) -> String {
        if let Some(task) = &self.task {
            task.abort();
        }
        lock(&self.buffer).to_text()
    }
}

fn lock(buffer: &Mutex<CappedBuffer>) -> MutexGuard<'_, CappedBuffer> {
    buffer.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
