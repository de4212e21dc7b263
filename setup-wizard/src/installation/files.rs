//! Chunked file copy.
//!
//! Goals:
//! - Chunk size derives from a target chunk *count*, not a byte size
//! - Report progress after every chunk
//! - Poll for cancellation between chunks only, never while a chunk is in flight
//! - Cancellation removes the partial destination; I/O faults leave it in place for diagnosis

use log::{debug, info, warn};
use std::fs::File;
use std::io::{self, Read, Write};
use std::path::Path;
use std::time::Instant;

/// Default target number of chunks per copy.
pub const DEFAULT_CHUNK_COUNT_HINT: u64 = 100;

/// Progress of one copy. Recomputed after every chunk write.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CopyProgress {
    pub bytes_copied: u64,
    pub total_bytes: u64,
    /// Always within `[0, 100]`.
    pub percent_complete: f64,
}

impl CopyProgress {
    fn new(total_bytes: u64) -> Self {
        Self {
            bytes_copied: 0,
            total_bytes,
            percent_complete: 0.0,
        }
    }

    fn record(&mut self, n: u64) {
        self.bytes_copied = self.bytes_copied.saturating_add(n);
        self.percent_complete = percent_of(self.bytes_copied, self.total_bytes);
    }

    pub fn is_complete(&self) -> bool {
        self.bytes_copied >= self.total_bytes
    }

    /// Whole-number percentage for progress widgets.
    pub fn percent_rounded(&self) -> u8 {
        self.percent_complete.round().clamp(0.0, 100.0) as u8
    }
}

fn percent_of(done: u64, total: u64) -> f64 {
    if total == 0 {
        return 100.0;
    }
    (100.0 * done as f64 / total as f64).clamp(0.0, 100.0)
}

/// Result of one copy invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CopyOutcome {
    Success,
    CancelledByUser,
    IoFailure(String),
}

impl CopyOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, CopyOutcome::Success)
    }
}

/// Outcome plus the progress reached when the copy stopped.
#[derive(Debug, Clone, PartialEq)]
pub struct CopyReport {
    pub outcome: CopyOutcome,
    pub progress: CopyProgress,
}

impl CopyReport {
    fn failure(progress: CopyProgress, detail: String) -> Self {
        warn!("[PHASE: copy] [STEP: chunk] copy failed: {}", detail);
        Self {
            outcome: CopyOutcome::IoFailure(detail),
            progress,
        }
    }
}

/// Receives progress after each chunk and decides whether the copy goes on.
///
/// Hosts process their pending events in `on_progress`, so a cancel request made while
/// the chunk was in flight is visible to `should_continue` before the next read.
pub trait CopyObserver {
    fn on_progress(&mut self, progress: &CopyProgress);
    fn should_continue(&mut self) -> bool;
}

/// [`CopyObserver`] built from a pair of closures.
pub struct FnObserver<P, C> {
    on_progress: P,
    should_continue: C,
}

pub fn observer<P, C>(on_progress: P, should_continue: C) -> FnObserver<P, C>
where
    P: FnMut(&CopyProgress),
    C: FnMut() -> bool,
{
    FnObserver {
        on_progress,
        should_continue,
    }
}

impl<P, C> CopyObserver for FnObserver<P, C>
where
    P: FnMut(&CopyProgress),
    C: FnMut() -> bool,
{
    fn on_progress(&mut self, progress: &CopyProgress) {
        (self.on_progress)(progress)
    }

    fn should_continue(&mut self) -> bool {
        (self.should_continue)()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkPlan {
    pub chunk_count: u64,
    pub chunk_size: u64,
}

/// `chunk_size = ceil(file_size / hint)`.
///
/// A zero-length file yields an empty plan. A hint of 0 is treated as a single chunk.
/// With a ceiling division every non-empty file gets a chunk size of at least one byte,
/// so no hint reduction is ever needed.
pub fn plan_chunks(file_size: u64, chunk_count_hint: u64) -> ChunkPlan {
    if file_size == 0 {
        return ChunkPlan {
            chunk_count: 0,
            chunk_size: 0,
        };
    }
    let hint = chunk_count_hint.max(1);
    let chunk_size = file_size.div_ceil(hint);
    ChunkPlan {
        chunk_count: file_size.div_ceil(chunk_size),
        chunk_size,
    }
}

/// Copies in bounded increments, `chunk_count_hint` chunks per file.
#[derive(Debug, Clone, Copy)]
pub struct ChunkedCopy {
    chunk_count_hint: u64,
}

impl Default for ChunkedCopy {
    fn default() -> Self {
        Self::new(DEFAULT_CHUNK_COUNT_HINT)
    }
}

impl ChunkedCopy {
    pub fn new(chunk_count_hint: u64) -> Self {
        Self { chunk_count_hint }
    }

    pub fn chunk_count_hint(&self) -> u64 {
        self.chunk_count_hint
    }

    /// Copy `src` to `dst`, creating or truncating `dst`.
    ///
    /// On cancellation both handles are closed and `dst` is removed.
    pub fn copy(&self, src: &Path, dst: &Path, observer: &mut dyn CopyObserver) -> CopyReport {
        let started = Instant::now();
        info!(
            "[PHASE: copy] [STEP: start] copying {:?} to {:?} (chunk_count_hint={})",
            src, dst, self.chunk_count_hint
        );

        let total = match std::fs::metadata(src) {
            Ok(meta) => meta.len(),
            Err(e) => {
                return CopyReport::failure(
                    CopyProgress::new(0),
                    format!("stat source failed: {:?}: {}", src, e),
                )
            }
        };
        info!("[PHASE: copy] [STEP: start] source is {} bytes", total);

        let mut src_f = match File::open(src) {
            Ok(f) => f,
            Err(e) => {
                return CopyReport::failure(
                    CopyProgress::new(total),
                    format!("open source failed: {:?}: {}", src, e),
                )
            }
        };
        let mut dst_f = match File::create(dst) {
            Ok(f) => f,
            Err(e) => {
                return CopyReport::failure(
                    CopyProgress::new(total),
                    format!("create destination failed: {:?}: {}", dst, e),
                )
            }
        };

        let report = self.copy_streams(&mut src_f, &mut dst_f, total, observer);
        drop(src_f);
        drop(dst_f);

        if report.outcome == CopyOutcome::CancelledByUser {
            match std::fs::remove_file(dst) {
                Ok(()) => info!(
                    "[PHASE: copy] [STEP: cancel] removed partial destination {:?}",
                    dst
                ),
                Err(e) => warn!(
                    "[PHASE: copy] [STEP: cancel] failed to remove partial destination {:?}: {}",
                    dst, e
                ),
            }
        }

        debug!(
            "[PHASE: copy] [STEP: exit] copy finished (outcome={:?}, bytes={}, duration_ms={})",
            report.outcome,
            report.progress.bytes_copied,
            started.elapsed().as_millis()
        );
        report
    }

    /// Copy `total_bytes` from `reader` to `writer` in chunks.
    ///
    /// Does not clean up anything on cancellation; [`ChunkedCopy::copy`] owns the files.
    pub fn copy_streams<R, W>(
        &self,
        reader: &mut R,
        writer: &mut W,
        total_bytes: u64,
        observer: &mut dyn CopyObserver,
    ) -> CopyReport
    where
        R: Read + ?Sized,
        W: Write + ?Sized,
    {
        let plan = plan_chunks(total_bytes, self.chunk_count_hint);
        let mut progress = CopyProgress::new(total_bytes);

        if plan.chunk_size == 0 {
            info!("[PHASE: copy] [STEP: plan] empty source, nothing to move");
            progress.percent_complete = 100.0;
            observer.on_progress(&progress);
            return CopyReport {
                outcome: CopyOutcome::Success,
                progress,
            };
        }

        info!(
            "[PHASE: copy] [STEP: plan] moving in {} chunks, each chunk is {} bytes",
            plan.chunk_count, plan.chunk_size
        );

        let buf_len = match usize::try_from(plan.chunk_size) {
            Ok(n) => n,
            Err(_) => {
                return CopyReport::failure(
                    progress,
                    format!("chunk size {} does not fit in memory", plan.chunk_size),
                )
            }
        };
        let mut buf = vec![0u8; buf_len];

        loop {
            let remaining = total_bytes - progress.bytes_copied;
            // `remaining < chunk_size <= buf_len` whenever the min picks `remaining`.
            let want = plan.chunk_size.min(remaining) as usize;

            let n = match read_chunk(reader, &mut buf[..want]) {
                Ok(n) => n,
                Err(e) => {
                    return CopyReport::failure(
                        progress,
                        format!("read failed after {} bytes: {}", progress.bytes_copied, e),
                    )
                }
            };

            if n > 0 {
                if let Err(e) = writer.write_all(&buf[..n]) {
                    return CopyReport::failure(
                        progress,
                        format!("write failed after {} bytes: {}", progress.bytes_copied, e),
                    );
                }
                progress.record(n as u64);
                debug!(
                    "[PHASE: copy] [STEP: chunk] {}% complete",
                    progress.percent_rounded()
                );
                observer.on_progress(&progress);
            }

            if n < want {
                return CopyReport::failure(
                    progress,
                    format!(
                        "source ended early ({} of {} bytes)",
                        progress.bytes_copied, total_bytes
                    ),
                );
            }

            if progress.is_complete() {
                break;
            }

            if !observer.should_continue() {
                info!(
                    "[PHASE: copy] [STEP: cancel] cancellation observed after {} of {} bytes",
                    progress.bytes_copied, total_bytes
                );
                return CopyReport {
                    outcome: CopyOutcome::CancelledByUser,
                    progress,
                };
            }
        }

        if let Err(e) = writer.flush() {
            return CopyReport::failure(progress, format!("flush failed: {}", e));
        }

        CopyReport {
            outcome: CopyOutcome::Success,
            progress,
        }
    }
}

/// Fill `buf` unless the reader hits end of input first.
fn read_chunk<R: Read + ?Sized>(reader: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn payload(len: usize) -> Vec<u8> {
        (0..len).map(|i| (i % 251) as u8).collect()
    }

    fn write_source(dir: &Path, len: usize) -> std::path::PathBuf {
        let src = dir.join("binary");
        std::fs::write(&src, payload(len)).unwrap();
        src
    }

    /// Fails the `fail_on`-th write call (1-based).
    struct FailingWriter {
        inner: Vec<u8>,
        writes: usize,
        fail_on: usize,
    }

    impl Write for FailingWriter {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.writes += 1;
            if self.writes == self.fail_on {
                return Err(io::Error::new(io::ErrorKind::Other, "disk full"));
            }
            self.inner.extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn plan_uses_ceiling_division() {
        assert_eq!(
            plan_chunks(101, 100),
            ChunkPlan {
                chunk_count: 51,
                chunk_size: 2
            }
        );
        assert_eq!(
            plan_chunks(99, 100),
            ChunkPlan {
                chunk_count: 99,
                chunk_size: 1
            }
        );
        assert_eq!(
            plan_chunks(10_000, 100),
            ChunkPlan {
                chunk_count: 100,
                chunk_size: 100
            }
        );
    }

    #[test]
    fn plan_handles_empty_file_and_zero_hint() {
        assert_eq!(plan_chunks(0, 100).chunk_size, 0);
        assert_eq!(
            plan_chunks(500, 0),
            ChunkPlan {
                chunk_count: 1,
                chunk_size: 500
            }
        );
    }

    #[test]
    fn copy_round_trips_various_sizes() {
        for n in [1usize, 99, 100, 101, 10_000] {
            let dir = tempfile::tempdir().unwrap();
            let src = write_source(dir.path(), n);
            let dst = dir.path().join("out");

            let mut last_percent = 0.0;
            let mut polls = 0;
            let report = {
                let mut obs = observer(
                    |p: &CopyProgress| {
                        assert!(p.percent_complete >= last_percent);
                        last_percent = p.percent_complete;
                    },
                    || {
                        polls += 1;
                        true
                    },
                );
                ChunkedCopy::default().copy(&src, &dst, &mut obs)
            };

            assert_eq!(report.outcome, CopyOutcome::Success, "size {}", n);
            assert_eq!(report.progress.bytes_copied, n as u64);
            assert_eq!(report.progress.percent_complete, 100.0);
            assert_eq!(last_percent, 100.0);
            assert_eq!(std::fs::read(&dst).unwrap(), payload(n));
            let chunks = plan_chunks(n as u64, DEFAULT_CHUNK_COUNT_HINT).chunk_count;
            assert_eq!(polls as u64, chunks - 1, "no poll after the final chunk");
        }
    }

    #[test]
    fn cancel_after_third_chunk_removes_destination() {
        let dir = tempfile::tempdir().unwrap();
        let src = write_source(dir.path(), 1000);
        let dst = dir.path().join("out");

        let mut polls = 0;
        let report = {
            let mut obs = observer(
                |_: &CopyProgress| {},
                || {
                    polls += 1;
                    polls < 3
                },
            );
            ChunkedCopy::new(10).copy(&src, &dst, &mut obs)
        };

        assert_eq!(report.outcome, CopyOutcome::CancelledByUser);
        assert_eq!(report.progress.bytes_copied, 300);
        assert!(!dst.exists());
    }

    #[test]
    fn write_fault_on_fifth_chunk_reports_four_chunks() {
        let data = payload(1000);
        let mut reader = Cursor::new(data);
        let mut writer = FailingWriter {
            inner: Vec::new(),
            writes: 0,
            fail_on: 5,
        };
        let mut obs = observer(|_: &CopyProgress| {}, || true);

        let report = ChunkedCopy::new(10).copy_streams(&mut reader, &mut writer, 1000, &mut obs);

        assert!(matches!(report.outcome, CopyOutcome::IoFailure(_)));
        assert_eq!(report.progress.bytes_copied, 400);
        assert_eq!(writer.inner.len(), 400);
    }

    #[test]
    fn short_source_is_an_io_failure() {
        let mut reader = Cursor::new(payload(50));
        let mut writer = Vec::new();
        let mut obs = observer(|_: &CopyProgress| {}, || true);

        let report = ChunkedCopy::new(10).copy_streams(&mut reader, &mut writer, 100, &mut obs);

        match report.outcome {
            CopyOutcome::IoFailure(detail) => assert!(detail.contains("ended early")),
            other => panic!("unexpected outcome {:?}", other),
        }
        assert_eq!(report.progress.bytes_copied, 50);
    }

    #[test]
    fn empty_source_completes_immediately() {
        let dir = tempfile::tempdir().unwrap();
        let src = write_source(dir.path(), 0);
        let dst = dir.path().join("out");

        let mut seen = Vec::new();
        let report = {
            let mut obs = observer(
                |p: &CopyProgress| seen.push(p.percent_rounded()),
                || panic!("an empty copy has nothing to poll between"),
            );
            ChunkedCopy::default().copy(&src, &dst, &mut obs)
        };

        assert_eq!(report.outcome, CopyOutcome::Success);
        assert_eq!(seen, vec![100]);
        assert!(dst.exists());
        assert_eq!(std::fs::metadata(&dst).unwrap().len(), 0);
    }

    #[test]
    fn missing_source_is_an_io_failure_without_destination() {
        let dir = tempfile::tempdir().unwrap();
        let dst = dir.path().join("out");
        let mut obs = observer(|_: &CopyProgress| {}, || true);

        let report = ChunkedCopy::default().copy(&dir.path().join("nope"), &dst, &mut obs);

        assert!(matches!(report.outcome, CopyOutcome::IoFailure(_)));
        assert!(!dst.exists());
    }

    #[test]
    fn percent_is_clamped() {
        assert_eq!(percent_of(150, 100), 100.0);
        assert_eq!(percent_of(0, 0), 100.0);
        assert_eq!(percent_of(1, 3).round(), 33.0);
    }
}
