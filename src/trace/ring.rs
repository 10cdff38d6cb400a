//! Fixed-capacity instruction ring buffer, dumped on fatal failure. Can also
//! mirror every pushed line to an optional file sink (the `-itrace` log).

use std::collections::VecDeque;
use std::io::Write;

pub struct RingBuffer {
    capacity: usize,
    lines: VecDeque<String>,
    sink: Option<Box<dyn Write + Send>>,
}

impl RingBuffer {
    pub fn new(capacity: usize) -> Self {
        RingBuffer {
            capacity,
            lines: VecDeque::with_capacity(capacity),
            sink: None,
        }
    }

    /// Mirror every future `push`ed line to `sink` as well.
    pub fn enable_sink(&mut self, sink: Box<dyn Write + Send>) {
        self.sink = Some(sink);
    }

    /// Push a formatted instruction line, evicting the oldest entry if full,
    /// and mirroring it to the file sink if one is enabled.
    pub fn push(&mut self, line: String) {
        if let Some(sink) = self.sink.as_mut() {
            let _ = writeln!(sink, "{line}");
        }
        if self.lines.len() >= self.capacity {
            self.lines.pop_front();
        }
        self.lines.push_back(line);
    }

    /// Render entries oldest-to-newest, one per line.
    pub fn dump(&self) -> String {
        self.lines.iter().cloned().collect::<Vec<_>>().join("\n")
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn evicts_oldest_when_full() {
        let mut rb = RingBuffer::new(2);
        rb.push("a".into());
        rb.push("b".into());
        rb.push("c".into());
        assert_eq!(rb.dump(), "b\nc");
    }

    #[test]
    fn dumps_oldest_to_newest() {
        let mut rb = RingBuffer::new(4);
        rb.push("1".into());
        rb.push("2".into());
        assert_eq!(rb.dump(), "1\n2");
    }

    #[test]
    fn enabled_sink_mirrors_every_pushed_line_even_past_eviction() {
        let buf = std::sync::Arc::new(std::sync::Mutex::new(Vec::new()));
        struct SharedSink(std::sync::Arc<std::sync::Mutex<Vec<u8>>>);
        impl Write for SharedSink {
            fn write(&mut self, data: &[u8]) -> std::io::Result<usize> {
                self.0.lock().unwrap().extend_from_slice(data);
                Ok(data.len())
            }
            fn flush(&mut self) -> std::io::Result<()> {
                Ok(())
            }
        }

        let mut rb = RingBuffer::new(1);
        rb.enable_sink(Box::new(SharedSink(buf.clone())));
        rb.push("a".into());
        rb.push("b".into());

        assert_eq!(rb.dump(), "b");
        let logged = String::from_utf8(buf.lock().unwrap().clone()).unwrap();
        assert_eq!(logged, "a\nb\n");
    }
}
