//! Job intake adapters.

use std::io::BufRead;

use crossbeam_channel::Receiver;

use crate::error::{Error, Result};

use super::Job;

/// Anything that yields jobs.
///
/// `None` means intake is closed. `Some(Err(_))` is a record that could not
/// be accepted; the caller decides whether to keep pulling.
pub trait JobSource {
    /// Block until the next job is available.
    fn next_job(&mut self) -> Option<Result<Job>>;
}

/// Jobs pushed through a crossbeam channel.
#[derive(Debug, Clone)]
pub struct ChannelSource {
    rx: Receiver<Job>,
}

impl ChannelSource {
    /// Wrap a receiver; intake closes when every sender is dropped.
    pub fn new(rx: Receiver<Job>) -> Self {
        Self { rx }
    }
}

impl JobSource for ChannelSource {
    fn next_job(&mut self) -> Option<Result<Job>> {
        self.rx.recv().ok().map(|job| job.validate().map(|_| job))
    }
}

/// One JSON job per line.
#[derive(Debug)]
pub struct JsonLinesSource<R> {
    reader: R,
    line_no: usize,
    buf: String,
}

impl<R: BufRead> JsonLinesSource<R> {
    /// Read jobs from `reader`.
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            line_no: 0,
            buf: String::new(),
        }
    }
}

impl<R: BufRead> JobSource for JsonLinesSource<R> {
    fn next_job(&mut self) -> Option<Result<Job>> {
        loop {
            self.buf.clear();
            match self.reader.read_line(&mut self.buf) {
                Ok(0) => return None,
                Ok(_) => {}
                Err(e) => return Some(Err(Error::Io(e))),
            }
            self.line_no += 1;

            let line = self.buf.trim();
            if line.is_empty() {
                continue;
            }
            return Some(Job::from_json(line).map_err(|e| match e {
                Error::InvalidJob(msg) => {
                    Error::InvalidJob(format!("line {}: {}", self.line_no, msg))
                }
                other => other,
            }));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_json_lines_skips_blank_lines() {
        let input = "\n{\"documentId\":\"a\",\"filePath\":\"a.pdf\"}\n\n  \n{\"document_id\":\"b\",\"file_path\":\"b.pdf\"}\n";
        let mut source = JsonLinesSource::new(Cursor::new(input));

        assert_eq!(source.next_job().unwrap().unwrap().document_id, "a");
        assert_eq!(source.next_job().unwrap().unwrap().document_id, "b");
        assert!(source.next_job().is_none());
    }

    #[test]
    fn test_json_lines_reports_line_number() {
        let input = "{\"documentId\":\"a\",\"filePath\":\"a.pdf\"}\n{oops\n";
        let mut source = JsonLinesSource::new(Cursor::new(input));

        assert!(source.next_job().unwrap().is_ok());
        let err = source.next_job().unwrap().unwrap_err();
        assert!(err.to_string().contains("line 2"), "{}", err);
        assert!(source.next_job().is_none());
    }

    #[test]
    fn test_channel_source_closes_with_senders() {
        let (tx, rx) = crossbeam_channel::unbounded();
        let mut source = ChannelSource::new(rx);

        tx.send(Job::new("a", "a.pdf")).unwrap();
        tx.send(Job::new("..", "b.pdf")).unwrap();
        drop(tx);

        assert!(source.next_job().unwrap().is_ok());
        assert!(source.next_job().unwrap().is_err());
        assert!(source.next_job().is_none());
    }
}
