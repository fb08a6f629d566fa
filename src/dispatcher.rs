//! Concurrent dispatcher.
//!
//! One producer (the calling thread) reads input lines into a bounded
//! queue; a fixed pool of scoped worker threads classifies them and writes
//! emitted lines to a single shared sink.
//!
//! ## Lifecycle
//!
//! `Idle` → `Running` → `Draining` → `Done`
//!
//! Output order is only guaranteed to follow input order with one worker.
//! Lines travel as raw bytes, so emitted lines are byte-identical to the
//! input. The first output write error stops the producer.

use std::io::{self, BufRead, Write};
use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;

use crossbeam_channel::{Receiver, Sender};
use parking_lot::{Mutex, RwLock};
use tracing::{debug, trace, warn};

use crate::error::Result;
use crate::processor::Processor;

/// Queue slots per worker.
pub const QUEUE_DEPTH_PER_WORKER: usize = 64;

/// Dispatcher lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchState {
    /// Pool sized, no work received yet
    Idle,
    /// Producer is feeding lines to workers
    Running,
    /// Input exhausted, waiting for in-flight lines
    Draining,
    /// All workers finished
    Done,
}

/// Stops the producer between lines. In-flight lines still finish.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// Outcome of one run.
#[derive(Debug, Default)]
pub struct DispatchStats {
    /// Lines handed to workers
    pub lines_read: u64,
    /// Lines written to the sink
    pub lines_emitted: u64,
    /// Error that cut input short, if any
    pub read_error: Option<io::Error>,
    /// Whether the run stopped because of a cancel request
    pub cancelled: bool,
}

/// Output sink shared by all workers. Holds the first write error.
struct Sink<W> {
    out: W,
    error: Option<io::Error>,
}

impl<W: Write> Sink<W> {
    fn write_line(&mut self, line: &[u8]) -> bool {
        if self.error.is_some() {
            return false;
        }
        match self.out.write_all(line) {
            Ok(()) => true,
            Err(e) => {
                warn!(error = %e, "failed to write output");
                self.error = Some(e);
                false
            }
        }
    }

    fn finish(mut self) -> io::Result<()> {
        if let Some(e) = self.error {
            return Err(e);
        }
        self.out.flush()
    }
}

/// Fixed-size worker pool running a [`Processor`] over a line stream.
pub struct Dispatcher {
    processor: Arc<Processor>,
    procs: NonZeroUsize,
    cancel: CancelToken,
    state: RwLock<DispatchState>,
}

impl Dispatcher {
    pub fn new(processor: Arc<Processor>, procs: NonZeroUsize) -> Self {
        Self {
            processor,
            procs,
            cancel: CancelToken::new(),
            state: RwLock::new(DispatchState::Idle),
        }
    }

    /// Use an external cancellation token.
    pub fn with_cancel(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn procs(&self) -> NonZeroUsize {
        self.procs
    }

    pub fn state(&self) -> DispatchState {
        *self.state.read()
    }

    fn set_state(&self, state: DispatchState) {
        trace!(?state, "dispatcher state");
        *self.state.write() = state;
    }

    /// Process `input` to exhaustion, writing emitted lines to `output`.
    ///
    /// A read error ends the input early but is not fatal: lines already
    /// queued are still processed and the error is returned in
    /// [`DispatchStats::read_error`]. A write error stops reading and fails
    /// the run.
    pub fn run<R, W>(&self, mut input: R, output: W) -> Result<DispatchStats>
    where
        R: BufRead,
        W: Write + Send,
    {
        let workers = self.procs.get();
        let (tx, rx) = crossbeam_channel::bounded::<Vec<u8>>(workers * QUEUE_DEPTH_PER_WORKER);
        let sink = Mutex::new(Sink {
            out: output,
            error: None,
        });
        let emitted = AtomicU64::new(0);
        let output_failed = AtomicBool::new(false);

        self.set_state(DispatchState::Running);
        debug!(workers, "dispatcher running");

        let mut stats = thread::scope(|scope| {
            for _ in 0..workers {
                let rx = rx.clone();
                let processor = &*self.processor;
                let sink = &sink;
                let emitted = &emitted;
                let output_failed = &output_failed;
                scope.spawn(move || work(processor, rx, sink, emitted, output_failed));
            }
            drop(rx);

            let stats = self.produce(&mut input, tx, &output_failed);
            self.set_state(DispatchState::Draining);
            stats
        });

        stats.lines_emitted = emitted.into_inner();
        let result = sink.into_inner().finish();
        self.set_state(DispatchState::Done);

        debug!(
            lines_read = stats.lines_read,
            lines_emitted = stats.lines_emitted,
            cancelled = stats.cancelled,
            "dispatcher done"
        );

        result?;
        Ok(stats)
    }

    /// Feed lines into the queue until input ends. Dropping `tx` on return
    /// tells the workers no more work is coming.
    fn produce<R: BufRead>(
        &self,
        input: &mut R,
        tx: Sender<Vec<u8>>,
        output_failed: &AtomicBool,
    ) -> DispatchStats {
        let mut stats = DispatchStats::default();
        let mut buf = Vec::new();

        loop {
            if self.cancel.is_cancelled() {
                debug!("dispatcher cancelled");
                stats.cancelled = true;
                break;
            }
            if output_failed.load(Ordering::Acquire) {
                debug!("output closed, no more input will be read");
                break;
            }

            buf.clear();
            match input.read_until(b'\n', &mut buf) {
                Ok(0) => break,
                Ok(_) => {
                    let line = trim_line_ending(&buf).to_vec();
                    stats.lines_read += 1;
                    if tx.send(line).is_err() {
                        break;
                    }
                }
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => {
                    warn!(error = %e, "failed to read input");
                    stats.read_error = Some(e);
                    break;
                }
            }
        }

        stats
    }
}

/// Runs until the queue is closed. After a write error lines are only
/// drained so the producer never blocks on a full queue.
fn work<W: Write>(
    processor: &Processor,
    rx: Receiver<Vec<u8>>,
    sink: &Mutex<Sink<W>>,
    emitted: &AtomicU64,
    output_failed: &AtomicBool,
) {
    for line in rx {
        if output_failed.load(Ordering::Acquire) {
            continue;
        }
        if let Some(out) = processor.process_bytes(&line) {
            if sink.lock().write_line(&out) {
                emitted.fetch_add(1, Ordering::Relaxed);
            } else {
                output_failed.store(true, Ordering::Release);
            }
        }
    }
}

/// Strip a trailing `\n` or `\r\n`.
fn trim_line_ending(buf: &[u8]) -> &[u8] {
    let buf = buf.strip_suffix(b"\n").unwrap_or(buf);
    buf.strip_suffix(b"\r").unwrap_or(buf)
}

#[cfg(test)]
mod tests {
    use std::io::{Cursor, Read};

    use super::*;
    use crate::matcher::{FilterChain, InternalFilter};
    use crate::processor::Mode;

    fn dispatcher(procs: usize, mode: Mode) -> Dispatcher {
        let filters = FilterChain::new().with(InternalFilter::builtin().unwrap());
        let processor = Arc::new(Processor::new(filters, mode));
        Dispatcher::new(processor, NonZeroUsize::new(procs).unwrap())
    }

    /// Reader that yields some data and then fails.
    struct FailingReader {
        data: Cursor<Vec<u8>>,
    }

    impl io::Read for FailingReader {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            let n = self.data.read(buf)?;
            if n == 0 {
                return Err(io::Error::new(io::ErrorKind::Other, "device gone"));
            }
            Ok(n)
        }
    }

    struct FailingWriter;

    impl Write for FailingWriter {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "pipe closed"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_trim_line_ending() {
        assert_eq!(trim_line_ending(b"abc\n"), b"abc");
        assert_eq!(trim_line_ending(b"abc\r\n"), b"abc");
        assert_eq!(trim_line_ending(b"abc"), b"abc");
        assert_eq!(trim_line_ending(b"\n"), b"");
    }

    #[test]
    fn test_state_transitions() {
        let d = dispatcher(2, Mode::HideMatches);
        assert_eq!(d.state(), DispatchState::Idle);

        let mut out = Vec::new();
        d.run(Cursor::new("10.0.0.1\n8.8.8.8\n"), &mut out).unwrap();
        assert_eq!(d.state(), DispatchState::Done);
    }

    #[test]
    fn test_single_worker_preserves_order() {
        let d = dispatcher(1, Mode::HideMatches);
        let input = "1.1.1.1\n10.0.0.1\n2.2.2.2\nfoo\n3.3.3.3\n";
        let mut out = Vec::new();
        let stats = d.run(Cursor::new(input), &mut out).unwrap();

        assert_eq!(String::from_utf8(out).unwrap(), "1.1.1.1\n2.2.2.2\nfoo\n3.3.3.3\n");
        assert_eq!(stats.lines_read, 5);
        assert_eq!(stats.lines_emitted, 4);
        assert!(stats.read_error.is_none());
        assert!(!stats.cancelled);
    }

    #[test]
    fn test_last_line_without_newline_and_crlf() {
        let d = dispatcher(1, Mode::HideMatches);
        let mut out = Vec::new();
        d.run(Cursor::new("8.8.8.8\r\n127.0.0.1\r\n9.9.9.9"), &mut out).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "8.8.8.8\n9.9.9.9\n");
    }

    #[test]
    fn test_many_workers_emit_every_line_once() {
        let d = dispatcher(8, Mode::ShowMatches);
        let input: String = (0..2000).map(|i| format!("10.0.{}.{}\n", i / 256, i % 256)).collect();
        let mut out = Vec::new();
        let stats = d.run(Cursor::new(input.clone()), &mut out).unwrap();

        let mut expected: Vec<&str> = input.lines().collect();
        let out = String::from_utf8(out).unwrap();
        let mut got: Vec<&str> = out.lines().collect();
        expected.sort_unstable();
        got.sort_unstable();
        assert_eq!(got, expected);
        assert_eq!(stats.lines_emitted, 2000);
    }

    #[test]
    fn test_empty_input() {
        let d = dispatcher(3, Mode::HideMatches);
        let mut out = Vec::new();
        let stats = d.run(Cursor::new(""), &mut out).unwrap();
        assert!(out.is_empty());
        assert_eq!(stats.lines_read, 0);
        assert_eq!(d.state(), DispatchState::Done);
    }

    #[test]
    fn test_read_error_keeps_processed_output() {
        let d = dispatcher(1, Mode::HideMatches);
        let reader = io::BufReader::new(FailingReader {
            data: Cursor::new(b"8.8.8.8\n192.168.1.1\n1.1.1.1\n".to_vec()),
        });
        let mut out = Vec::new();
        let stats = d.run(reader, &mut out).unwrap();

        assert_eq!(String::from_utf8(out).unwrap(), "8.8.8.8\n1.1.1.1\n");
        let err = stats.read_error.expect("read error should be reported");
        assert_eq!(err.to_string(), "device gone");
    }

    #[test]
    fn test_write_error_fails_run() {
        let d = dispatcher(2, Mode::HideMatches);
        let result = d.run(Cursor::new("8.8.8.8\n1.1.1.1\n"), FailingWriter);
        assert!(result.is_err());
        assert_eq!(d.state(), DispatchState::Done);
    }

    #[test]
    fn test_non_utf8_lines_are_emitted_verbatim() {
        let d = dispatcher(1, Mode::HideMatches);
        let mut out = Vec::new();
        d.run(Cursor::new(b"caf\xe9 line\n8.8.8.8\n10.0.0.1\n\xff\xfe\n".to_vec()), &mut out)
            .unwrap();
        assert_eq!(out, b"caf\xe9 line\n8.8.8.8\n\xff\xfe\n".to_vec());
    }

    #[test]
    fn test_write_error_stops_reading_input() {
        let input: Vec<u8> = "8.8.8.8\n".repeat(200_000).into_bytes();
        let total = input.len();
        let mut reader = Cursor::new(input);

        let d = dispatcher(2, Mode::HideMatches);
        assert!(d.run(&mut reader, FailingWriter).is_err());

        // At most a queue's worth of lines past the failure.
        let consumed_lines = reader.position() as usize / "8.8.8.8\n".len();
        assert!(
            consumed_lines < 1_000,
            "read {} of 200000 lines after the writer failed",
            consumed_lines
        );
        assert!((reader.position() as usize) < total);
        assert_eq!(d.state(), DispatchState::Done);
    }

    #[test]
    fn test_cancelled_before_start_reads_nothing() {
        let cancel = CancelToken::new();
        cancel.cancel();
        let d = dispatcher(2, Mode::HideMatches).with_cancel(cancel.clone());

        let mut out = Vec::new();
        let stats = d.run(Cursor::new("8.8.8.8\n"), &mut out).unwrap();
        assert!(stats.cancelled);
        assert_eq!(stats.lines_read, 0);
        assert!(out.is_empty());
        assert!(cancel.is_cancelled());
    }
}
