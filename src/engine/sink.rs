// src/engine/sink.rs

use std::fmt;
use std::io::{self, Write};

use tracing::warn;

/// Ordered output buffer with a live mirror (tee).
///
/// Every appended chunk is written to the mirror before `append` returns, so
/// the buffer and the live stream never diverge. Owned by a single run loop;
/// read it after the run finishes.
pub struct OutputSink {
    chunks: Vec<String>,
    mirror: Box<dyn Write + Send>,
    mirror_failed: bool,
}

impl OutputSink {
    pub fn new(mirror: impl Write + Send + 'static) -> Self {
        Self {
            chunks: Vec::new(),
            mirror: Box::new(mirror),
            mirror_failed: false,
        }
    }

    /// Mirror to the process's stderr.
    pub fn stderr() -> Self {
        Self::new(io::stderr())
    }

    /// Buffer only; the mirror discards everything.
    pub fn buffer_only() -> Self {
        Self::new(io::sink())
    }

    /// Buffer `chunk` and mirror it immediately.
    pub fn append(&mut self, chunk: impl Into<String>) {
        let chunk = chunk.into();
        self.mirror(chunk.as_bytes());
        self.chunks.push(chunk);
    }

    /// Mirror a diagnostic line without buffering it.
    pub fn notice(&mut self, line: &str) {
        let mut text = String::with_capacity(line.len() + 1);
        text.push_str(line);
        text.push('\n');
        self.mirror(text.as_bytes());
    }

    /// Ordered concatenation of every appended chunk.
    pub fn snapshot(&self) -> String {
        self.chunks.concat()
    }

    pub fn chunks(&self) -> &[String] {
        &self.chunks
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    fn mirror(&mut self, bytes: &[u8]) {
        let res = self
            .mirror
            .write_all(bytes)
            .and_then(|()| self.mirror.flush());
        if let Err(e) = res {
            // Warn once; the buffer stays authoritative.
            if !self.mirror_failed {
                warn!(error = %e, "live output mirror failed");
                self.mirror_failed = true;
            }
        }
    }
}

impl fmt::Debug for OutputSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OutputSink")
            .field("chunks", &self.chunks.len())
            .field("mirror_failed", &self.mirror_failed)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct Shared(Arc<Mutex<Vec<u8>>>);

    impl Write for Shared {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    struct Broken;

    impl Write for Broken {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "closed"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn append_tees_in_order() {
        let live = Shared::default();
        let mut sink = OutputSink::new(live.clone());

        sink.append("first\n");
        sink.append("second\n");
        sink.append("partial");

        assert_eq!(sink.snapshot(), "first\nsecond\npartial");
        assert_eq!(sink.chunks().len(), 3);
        assert_eq!(
            String::from_utf8(live.0.lock().unwrap().clone()).unwrap(),
            sink.snapshot()
        );
    }

    #[test]
    fn notice_is_mirrored_but_not_buffered() {
        let live = Shared::default();
        let mut sink = OutputSink::new(live.clone());

        sink.notice("[TIMEOUT] Task exceeded 1 seconds");
        assert!(sink.is_empty());
        assert_eq!(sink.snapshot(), "");
        assert_eq!(
            String::from_utf8(live.0.lock().unwrap().clone()).unwrap(),
            "[TIMEOUT] Task exceeded 1 seconds\n"
        );
    }

    #[test]
    fn broken_mirror_keeps_buffer() {
        let mut sink = OutputSink::new(Broken);
        sink.append("a");
        sink.append("b");
        assert_eq!(sink.snapshot(), "ab");
    }
}
