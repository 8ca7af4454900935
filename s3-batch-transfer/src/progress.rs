/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

use std::collections::HashMap;
use std::fmt;
use std::io::{self, Write};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use indicatif::{MultiProgress, ProgressBar, ProgressStyle};

use crate::metrics::unit::ByteUnit;
use crate::metrics::Throughput;

/// Minimum time between two published rate updates for one transfer
const PUBLISH_INTERVAL: Duration = Duration::from_secs(1);

/// Identifies one progress item (a bar, a log line, ...) within a [`ProgressSink`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ProgressId(u64);

impl ProgressId {
    /// The raw id value
    pub fn get(&self) -> u64 {
        self.0
    }
}

/// Narrow capability for rendering transfer progress.
///
/// A sink is shared by every concurrent transfer of a batch. Implementations are expected
/// to serialize updates to any state they share between items.
pub trait ProgressSink: Send + Sync + fmt::Debug {
    /// Register a new item expected to reach `total` units
    fn add_item(&self, label: &str, total: u64) -> ProgressId;

    /// Register the aggregate item of a batch. Defaults to [`add_item`](Self::add_item).
    fn add_batch(&self, label: &str, total: u64) -> ProgressId {
        self.add_item(label, total)
    }

    /// Advance an item by `n` units
    fn advance(&self, id: ProgressId, n: u64);

    /// Raise the expected total of an item by `n` units, for items whose size is discovered
    /// while they progress
    fn grow(&self, _id: ProgressId, _n: u64) {}

    /// Replace the status message shown next to an item
    fn set_message(&self, id: ProgressId, message: &str);

    /// Mark an item as finished. Further updates for the id are ignored.
    fn complete(&self, id: ProgressId);

    /// Print a line of output without corrupting any rendered items
    fn println(&self, message: &str);
}

#[derive(Debug, Default)]
struct IdGenerator(AtomicU64);

impl IdGenerator {
    fn next(&self) -> ProgressId {
        ProgressId(self.0.fetch_add(1, Ordering::Relaxed))
    }
}

/// Terminal progress bars backed by [`indicatif`].
///
/// Batch items stay on screen once complete; per object bars are cleared.
#[derive(Debug)]
pub struct IndicatifSink {
    multi: MultiProgress,
    ids: IdGenerator,
    bars: Mutex<HashMap<ProgressId, (ProgressBar, bool)>>,
}

impl IndicatifSink {
    /// Create a sink drawing to stderr
    pub fn new() -> Self {
        Self {
            multi: MultiProgress::new(),
            ids: IdGenerator::default(),
            bars: Mutex::new(HashMap::new()),
        }
    }

    /// A stderr writer that hides the bars of this sink while a line is written
    pub fn log_writer(&self) -> LogWriter {
        LogWriter {
            multi: self.multi.clone(),
        }
    }

    fn style(persistent: bool) -> ProgressStyle {
        let template = if persistent {
            "{prefix:.bold} [{bar:40.green/white}] {bytes}/{total_bytes} {percent:>3}% {elapsed_precise} • {bytes_per_sec} {msg}"
        } else {
            "  {prefix} [{bar:30.cyan/blue}] {bytes}/{total_bytes} {msg}"
        };
        ProgressStyle::with_template(template)
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=> ")
    }

    fn add(&self, label: &str, total: u64, persistent: bool) -> ProgressId {
        let id = self.ids.next();
        let bar = self.multi.add(ProgressBar::new(total));
        bar.set_style(Self::style(persistent));
        bar.set_prefix(label.to_owned());
        if let Ok(mut bars) = self.bars.lock() {
            bars.insert(id, (bar, persistent));
        }
        id
    }

    fn with_bar(&self, id: ProgressId, f: impl FnOnce(&ProgressBar)) {
        if let Ok(bars) = self.bars.lock() {
            if let Some((bar, _)) = bars.get(&id) {
                f(bar);
            }
        }
    }
}

impl Default for IndicatifSink {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressSink for IndicatifSink {
    fn add_item(&self, label: &str, total: u64) -> ProgressId {
        self.add(label, total, false)
    }

    fn add_batch(&self, label: &str, total: u64) -> ProgressId {
        self.add(label, total, true)
    }

    fn advance(&self, id: ProgressId, n: u64) {
        self.with_bar(id, |bar| bar.inc(n));
    }

    fn grow(&self, id: ProgressId, n: u64) {
        self.with_bar(id, |bar| bar.inc_length(n));
    }

    fn set_message(&self, id: ProgressId, message: &str) {
        let message = message.to_owned();
        self.with_bar(id, |bar| bar.set_message(message));
    }

    fn complete(&self, id: ProgressId) {
        let removed = self.bars.lock().ok().and_then(|mut bars| bars.remove(&id));
        match removed {
            Some((bar, true)) => bar.finish(),
            Some((bar, false)) => {
                bar.finish_and_clear();
                self.multi.remove(&bar);
            }
            None => {}
        }
    }

    fn println(&self, message: &str) {
        if self.multi.println(message).is_err() {
            eprintln!("{message}");
        }
    }
}

/// Writes to stderr without tearing the bars of an [`IndicatifSink`].
///
/// Usable as a `tracing_subscriber` writer through `move || writer.clone()`.
#[derive(Debug, Clone)]
pub struct LogWriter {
    multi: MultiProgress,
}

impl Write for LogWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.multi.suspend(|| io::stderr().write(buf))
    }

    fn flush(&mut self) -> io::Result<()> {
        self.multi.suspend(|| io::stderr().flush())
    }
}

#[derive(Debug)]
struct LoggedItem {
    label: String,
    total: u64,
    done: u64,
}

/// Progress reported as `tracing` events, for non-interactive runs.
#[derive(Debug, Default)]
pub struct LogSink {
    ids: IdGenerator,
    items: Mutex<HashMap<ProgressId, LoggedItem>>,
}

impl LogSink {
    /// Create a new log sink
    pub fn new() -> Self {
        Self::default()
    }
}

impl ProgressSink for LogSink {
    fn add_item(&self, label: &str, total: u64) -> ProgressId {
        let id = self.ids.next();
        tracing::debug!("{label}: started ({total} bytes)");
        if let Ok(mut items) = self.items.lock() {
            items.insert(
                id,
                LoggedItem {
                    label: label.to_owned(),
                    total,
                    done: 0,
                },
            );
        }
        id
    }

    fn advance(&self, id: ProgressId, n: u64) {
        if let Ok(mut items) = self.items.lock() {
            if let Some(item) = items.get_mut(&id) {
                item.done = item.done.saturating_add(n);
                tracing::trace!("{}: {}/{}", item.label, item.done, item.total);
            }
        }
    }

    fn grow(&self, id: ProgressId, n: u64) {
        if let Ok(mut items) = self.items.lock() {
            if let Some(item) = items.get_mut(&id) {
                item.total = item.total.saturating_add(n);
            }
        }
    }

    fn set_message(&self, id: ProgressId, message: &str) {
        if let Ok(items) = self.items.lock() {
            if let Some(item) = items.get(&id) {
                tracing::debug!("{}: {message}", item.label);
            }
        }
    }

    fn complete(&self, id: ProgressId) {
        let removed = self.items.lock().ok().and_then(|mut items| items.remove(&id));
        if let Some(item) = removed {
            tracing::info!("{}: done ({}/{})", item.label, item.done, item.total);
        }
    }

    fn println(&self, message: &str) {
        tracing::info!("{message}");
    }
}

/// A sink that renders nothing
#[derive(Debug, Default)]
pub struct NoopSink {
    ids: IdGenerator,
}

impl ProgressSink for NoopSink {
    fn add_item(&self, _label: &str, _total: u64) -> ProgressId {
        self.ids.next()
    }

    fn advance(&self, _id: ProgressId, _n: u64) {}

    fn set_message(&self, _id: ProgressId, _message: &str) {}

    fn complete(&self, _id: ProgressId) {}

    fn println(&self, _message: &str) {}
}

/// The aggregate progress item of a batch operation
#[derive(Debug, Clone, Copy)]
pub struct BatchProgress {
    id: ProgressId,
    started: Instant,
}

impl BatchProgress {
    /// Register the aggregate item for a batch of `total_bytes` with `sink`
    pub fn start(sink: &dyn ProgressSink, label: &str, total_bytes: u64) -> Self {
        Self {
            id: sink.add_batch(label, total_bytes),
            started: Instant::now(),
        }
    }

    /// The sink id of the aggregate item
    pub fn id(&self) -> ProgressId {
        self.id
    }

    /// When the batch started
    pub fn started(&self) -> Instant {
        self.started
    }
}

/// Byte counters of one transfer.
///
/// `bytes_done <= total_bytes` always holds; an empty transfer is represented as 1/1.
#[derive(Debug, Clone, Copy)]
pub struct ProgressState {
    total_bytes: u64,
    bytes_done: u64,
    window_start: Instant,
    window_bytes: u64,
    batch_start: Instant,
}

impl ProgressState {
    /// Total units expected
    pub fn total_bytes(&self) -> u64 {
        self.total_bytes
    }

    /// Units recorded so far
    pub fn bytes_done(&self) -> u64 {
        self.bytes_done
    }

    /// Whether every expected unit has been recorded
    pub fn is_complete(&self) -> bool {
        self.bytes_done >= self.total_bytes
    }
}

/// Throughput figures published for a transfer
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RateSnapshot {
    /// Bytes since the previous publish over the time since the previous publish
    pub instantaneous: Throughput,
    /// All bytes so far over the time since the batch started
    pub average: Throughput,
}

/// Turns "N bytes transferred" events of one transfer into progress updates and rates.
///
/// A reporter is owned by the task performing the transfer, so it needs no locking of its
/// own; the [`ProgressSink`] it feeds is shared.
pub struct ProgressReporter {
    sink: Arc<dyn ProgressSink>,
    id: ProgressId,
    batch: Option<BatchProgress>,
    unit: ByteUnit,
    state: ProgressState,
    last_rate: Option<RateSnapshot>,
}

impl fmt::Debug for ProgressReporter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProgressReporter")
            .field("id", &self.id)
            .field("batch", &self.batch)
            .field("unit", &self.unit)
            .field("state", &self.state)
            .finish()
    }
}

impl ProgressReporter {
    /// Create a reporter for a transfer of `total_bytes`.
    ///
    /// Bytes recorded are also added to `batch` when given. An empty transfer is reported
    /// as complete immediately.
    pub fn new(
        sink: Arc<dyn ProgressSink>,
        label: &str,
        total_bytes: u64,
        unit: ByteUnit,
        batch: Option<BatchProgress>,
    ) -> Self {
        let now = Instant::now();
        let batch_start = batch.map(|b| b.started).unwrap_or(now);

        if total_bytes == 0 {
            let id = sink.add_item(label, 1);
            sink.advance(id, 1);
            sink.complete(id);
            return Self {
                sink,
                id,
                batch,
                unit,
                state: ProgressState {
                    total_bytes: 1,
                    bytes_done: 1,
                    window_start: now,
                    window_bytes: 0,
                    batch_start,
                },
                last_rate: None,
            };
        }

        let id = sink.add_item(label, total_bytes);
        Self {
            sink,
            id,
            batch,
            unit,
            state: ProgressState {
                total_bytes,
                bytes_done: 0,
                window_start: now,
                window_bytes: 0,
                batch_start,
            },
            last_rate: None,
        }
    }

    /// Record `n` more bytes transferred
    pub fn on_bytes(&mut self, n: u64) {
        self.record(n, Instant::now());
    }

    /// Current counters
    pub fn state(&self) -> &ProgressState {
        &self.state
    }

    /// The most recently published rates, if any
    pub fn last_rate(&self) -> Option<RateSnapshot> {
        self.last_rate
    }

    /// Stop reporting for an unfinished transfer (e.g. after an error)
    pub fn abandon(&mut self) {
        if !self.state.is_complete() {
            self.state.total_bytes = self.state.bytes_done;
            self.sink.complete(self.id);
        }
    }

    fn record(&mut self, n: u64, now: Instant) -> Option<RateSnapshot> {
        if self.state.is_complete() {
            return None;
        }

        let n = n.min(self.state.total_bytes - self.state.bytes_done);
        self.state.bytes_done += n;
        self.state.window_bytes += n;
        self.sink.advance(self.id, n);
        if let Some(batch) = &self.batch {
            self.sink.advance(batch.id, n);
        }

        let finished = self.state.is_complete();
        let since_publish = now.saturating_duration_since(self.state.window_start);
        if since_publish < PUBLISH_INTERVAL && !finished {
            return None;
        }

        let snapshot = RateSnapshot {
            instantaneous: Throughput::new(self.state.window_bytes, since_publish),
            average: Throughput::new(
                self.state.bytes_done,
                now.saturating_duration_since(self.state.batch_start),
            ),
        };
        self.sink.set_message(
            self.id,
            &format!(
                "{:.2} (avg {:.2})",
                snapshot.instantaneous.display_as(self.unit),
                snapshot.average.display_as(self.unit)
            ),
        );
        self.state.window_start = now;
        self.state.window_bytes = 0;
        self.last_rate = Some(snapshot);

        if finished {
            self.sink.complete(self.id);
        }
        Some(snapshot)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq, Eq)]
    pub(crate) enum Event {
        Add(u64, String, u64),
        Advance(u64, u64),
        Grow(u64, u64),
        Message(u64, String),
        Complete(u64),
        Print(String),
    }

    /// Sink that records every call, for assertions
    #[derive(Debug, Default)]
    pub(crate) struct RecordingSink {
        ids: IdGenerator,
        pub(crate) events: Mutex<Vec<Event>>,
    }

    impl RecordingSink {
        pub(crate) fn events(&self) -> Vec<Event> {
            self.events.lock().unwrap().clone()
        }

        pub(crate) fn advanced(&self, id: ProgressId) -> u64 {
            self.events()
                .iter()
                .filter_map(|e| match e {
                    Event::Advance(i, n) if *i == id.get() => Some(*n),
                    _ => None,
                })
                .sum()
        }
    }

    impl ProgressSink for RecordingSink {
        fn add_item(&self, label: &str, total: u64) -> ProgressId {
            let id = self.ids.next();
            self.events
                .lock()
                .unwrap()
                .push(Event::Add(id.get(), label.to_owned(), total));
            id
        }

        fn advance(&self, id: ProgressId, n: u64) {
            self.events.lock().unwrap().push(Event::Advance(id.get(), n));
        }

        fn grow(&self, id: ProgressId, n: u64) {
            self.events.lock().unwrap().push(Event::Grow(id.get(), n));
        }

        fn set_message(&self, id: ProgressId, message: &str) {
            self.events
                .lock()
                .unwrap()
                .push(Event::Message(id.get(), message.to_owned()));
        }

        fn complete(&self, id: ProgressId) {
            self.events.lock().unwrap().push(Event::Complete(id.get()));
        }

        fn println(&self, message: &str) {
            self.events
                .lock()
                .unwrap()
                .push(Event::Print(message.to_owned()));
        }
    }

    fn reporter(sink: &Arc<RecordingSink>, total: u64) -> ProgressReporter {
        ProgressReporter::new(sink.clone(), "obj", total, ByteUnit::Byte, None)
    }

    #[test]
    fn test_zero_byte_item_completes_on_construction() {
        let sink = Arc::new(RecordingSink::default());
        let mut reporter = reporter(&sink, 0);

        assert!(reporter.state().is_complete());
        assert_eq!(1, reporter.state().total_bytes());
        assert_eq!(
            vec![
                Event::Add(0, "obj".into(), 1),
                Event::Advance(0, 1),
                Event::Complete(0)
            ],
            sink.events()
        );

        // nothing further is reported for a finished item
        reporter.on_bytes(10);
        assert_eq!(3, sink.events().len());
    }

    #[test]
    fn test_rate_publish_is_throttled() {
        let sink = Arc::new(RecordingSink::default());
        let mut reporter = reporter(&sink, 4000);
        let start = reporter.state.window_start;

        assert!(reporter
            .record(500, start + Duration::from_millis(200))
            .is_none());
        assert!(reporter
            .record(500, start + Duration::from_millis(900))
            .is_none());

        let snapshot = reporter
            .record(1000, start + Duration::from_secs(2))
            .expect("published after interval");
        assert_eq!(2000, snapshot.instantaneous.bytes_transferred());
        assert_eq!(Duration::from_secs(2), snapshot.instantaneous.elapsed());
        assert_eq!(1000.0, snapshot.instantaneous.as_bytes_per_sec());
        assert_eq!(1000.0, snapshot.average.as_bytes_per_sec());

        // window restarts after a publish
        assert!(reporter
            .record(100, start + Duration::from_millis(2500))
            .is_none());

        let messages = sink
            .events()
            .into_iter()
            .filter(|e| matches!(e, Event::Message(..)))
            .count();
        assert_eq!(1, messages);
    }

    #[test]
    fn test_completion_always_publishes() {
        let sink = Arc::new(RecordingSink::default());
        let mut reporter = reporter(&sink, 100);
        let start = reporter.state.window_start;

        let snapshot = reporter
            .record(100, start + Duration::from_millis(10))
            .expect("completion publishes");
        assert_eq!(100, snapshot.average.bytes_transferred());
        assert_eq!(Some(&Event::Complete(0)), sink.events().last());
    }

    #[test]
    fn test_bytes_are_clamped_and_mirrored_to_batch() {
        let sink = Arc::new(RecordingSink::default());
        let batch = BatchProgress::start(sink.as_ref(), "batch", 150);
        let mut reporter =
            ProgressReporter::new(sink.clone(), "obj", 100, ByteUnit::Mebibyte, Some(batch));

        reporter.on_bytes(60);
        reporter.on_bytes(60);

        assert_eq!(100, reporter.state().bytes_done());
        assert!(reporter.state().is_complete());
        assert_eq!(100, sink.advanced(batch.id()));
    }

    #[test]
    fn test_abandon_completes_unfinished_item() {
        let sink = Arc::new(RecordingSink::default());
        let mut reporter = reporter(&sink, 100);
        reporter.on_bytes(10);
        reporter.abandon();
        assert!(reporter.state().is_complete());
        assert_eq!(Some(&Event::Complete(0)), sink.events().last());
    }

    #[test]
    fn test_log_and_noop_sinks_accept_updates() {
        let log = LogSink::new();
        let id = log.add_item("a", 10);
        log.grow(id, 5);
        log.advance(id, 15);
        assert_eq!(15, log.items.lock().unwrap()[&id].total);
        log.set_message(id, "done");
        log.complete(id);
        // updates after completion are ignored
        log.advance(id, 1);

        let noop = NoopSink::default();
        let a = noop.add_item("a", 1);
        let b = noop.add_batch("b", 1);
        assert_ne!(a, b);
    }

    #[test]
    fn test_indicatif_bar_grows_and_log_lines_pass_through() {
        let sink = IndicatifSink::new();
        let id = sink.add_item("sizing", 10);
        sink.grow(id, 5);
        sink.advance(id, 12);
        {
            let bars = sink.bars.lock().unwrap();
            let (bar, _) = &bars[&id];
            assert_eq!(Some(15), bar.length());
            assert_eq!(12, bar.position());
        }

        let mut writer = sink.log_writer();
        writeln!(writer, "a log line").unwrap();
        writer.flush().unwrap();
        sink.complete(id);
    }
}
