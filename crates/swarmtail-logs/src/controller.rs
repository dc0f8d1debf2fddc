//! Stream controller: one live subscription feeding one bounded buffer

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::buffer::LogBuffer;
use crate::channel::{
    ChannelHandle, ChannelSink, NORMAL_CLOSURE, StreamEvent, StreamEventKind, Transport,
};
use crate::decoder::FrameDecoder;
use crate::endpoint::EndpointBuilder;
use swarmtail_types::{ConnectionIndicator, ConnectionState, Frame, StreamFilter};

/// Default delay before reconnecting after an unintentional close
pub const DEFAULT_RECONNECT_DELAY: Duration = Duration::from_secs(5);

/// Per-view stream settings
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StreamConfig {
    /// Buffer capacity in lines
    pub capacity: usize,

    /// Fixed delay before each reconnect attempt
    pub reconnect_delay: Duration,

    /// Translate terminal escape sequences into styles
    pub style_translation: bool,
}

impl StreamConfig {
    /// Merged swarm view
    pub fn swarm() -> Self {
        Self {
            capacity: 1000,
            reconnect_delay: DEFAULT_RECONNECT_DELAY,
            style_translation: true,
        }
    }

    /// Single-service view
    pub fn service() -> Self {
        Self {
            capacity: 500,
            reconnect_delay: DEFAULT_RECONNECT_DELAY,
            style_translation: false,
        }
    }
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self::swarm()
    }
}

/// Pending reconnect; aborted when dropped
#[derive(Debug)]
struct ReconnectTimer(JoinHandle<()>);

impl Drop for ReconnectTimer {
    fn drop(&mut self) {
        self.0.abort();
    }
}

/// Everything that must be released before a new subscription starts
#[derive(Debug, Default)]
struct ActiveResources {
    channel: Option<ChannelHandle>,
    reconnect: Option<ReconnectTimer>,
}

impl ActiveResources {
    fn release(&mut self) {
        if let Some(channel) = self.channel.take() {
            channel.close();
        }
        self.reconnect = None;
    }
}

/// Owns the connection lifecycle of one log view.
///
/// All state changes go through `&mut self`: channel and timer events are
/// delivered on the receiver returned by [`StreamController::new`] and fed
/// back through [`handle_event`](Self::handle_event) by the owner's event
/// loop. Events from a superseded subscription carry an old generation and
/// are ignored.
pub struct StreamController {
    config: StreamConfig,
    endpoint: Box<dyn EndpointBuilder>,
    transport: Arc<dyn Transport>,
    decoder: FrameDecoder,
    buffer: LogBuffer,

    /// Frames that arrived while paused, merged on resume
    side_buffer: Vec<Frame>,

    filter: StreamFilter,
    state: ConnectionState,
    generation: u64,
    resources: ActiveResources,
    last_error: Option<String>,
    mounted: bool,
    events_tx: mpsc::UnboundedSender<StreamEvent>,
}

impl StreamController {
    pub fn new(
        config: StreamConfig,
        endpoint: Box<dyn EndpointBuilder>,
        transport: Arc<dyn Transport>,
    ) -> (Self, mpsc::UnboundedReceiver<StreamEvent>) {
        let (events_tx, events_rx) = mpsc::unbounded_channel();

        let controller = Self {
            buffer: LogBuffer::new(config.capacity),
            decoder: FrameDecoder::new(config.style_translation),
            config,
            endpoint,
            transport,
            side_buffer: Vec::new(),
            filter: StreamFilter::all(),
            state: ConnectionState::Idle,
            generation: 0,
            resources: ActiveResources::default(),
            last_error: None,
            mounted: false,
            events_tx,
        };

        (controller, events_rx)
    }

    /// Start streaming with the given filter. Lines kept from an earlier
    /// mount survive only if the filter is unchanged; a new filter gets the
    /// same reset as [`set_filter`](Self::set_filter).
    pub fn mount(&mut self, filter: StreamFilter) {
        self.mounted = true;
        if filter != self.filter {
            self.set_filter(filter);
            return;
        }

        if self.state == ConnectionState::Paused {
            self.merge_side_buffer();
        }
        self.connect();
    }

    /// Stop streaming and cancel any pending reconnect
    pub fn unmount(&mut self) {
        self.mounted = false;
        self.resources.release();
        self.generation += 1;
        self.side_buffer.clear();
        self.state = ConnectionState::Idle;
        debug!("log stream unmounted");
    }

    /// Close the channel and divert in-flight frames to the side buffer
    pub fn pause(&mut self) {
        match self.state {
            ConnectionState::Open | ConnectionState::Connecting | ConnectionState::Closed => {
                self.resources.release();
                self.state = ConnectionState::Paused;
                info!(filter = %self.filter.label(), "log stream paused");
            }
            ConnectionState::Idle | ConnectionState::Paused => {}
        }
    }

    /// Merge side-buffered frames and reopen the channel
    pub fn resume(&mut self) {
        if self.state != ConnectionState::Paused {
            return;
        }

        self.merge_side_buffer();
        info!(filter = %self.filter.label(), "log stream resumed");
        self.connect();
    }

    pub fn toggle_pause(&mut self) {
        if self.state == ConnectionState::Paused {
            self.resume();
        } else {
            self.pause();
        }
    }

    /// Empty the buffer without touching the connection
    pub fn clear(&mut self) {
        self.buffer.clear();
        self.side_buffer.clear();
    }

    /// Switch to a different subscription. The old channel is closed before
    /// the new one opens, and lines from the old filter are discarded.
    pub fn set_filter(&mut self, filter: StreamFilter) {
        if filter == self.filter {
            return;
        }

        info!(from = %self.filter.label(), to = %filter.label(), "log filter changed");
        self.resources.release();
        self.generation += 1;
        self.buffer.clear();
        self.side_buffer.clear();
        self.filter = filter;
        self.state = ConnectionState::Idle;

        if self.mounted {
            self.connect();
        }
    }

    /// Apply one channel or timer event
    pub fn handle_event(&mut self, event: StreamEvent) {
        if event.generation != self.generation {
            return;
        }

        match event.kind {
            StreamEventKind::Opened => {
                if self.state == ConnectionState::Connecting {
                    self.state = ConnectionState::Open;
                    self.last_error = None;
                    debug!(generation = self.generation, "log stream open");
                }
            }
            StreamEventKind::Frame(frame) => match self.state {
                ConnectionState::Paused => self.side_buffer.push(frame),
                ConnectionState::Open => self.ingest(&frame),
                _ => {}
            },
            StreamEventKind::Error(message) => {
                self.last_error = Some(message);
                if matches!(
                    self.state,
                    ConnectionState::Connecting | ConnectionState::Open
                ) {
                    self.enter_closed(true);
                }
            }
            StreamEventKind::Closed { code, clean } => match self.state {
                ConnectionState::Connecting | ConnectionState::Open => {
                    let intentional = code == NORMAL_CLOSURE;
                    debug!(code, clean, intentional, "log stream closed");
                    self.enter_closed(!intentional);
                }
                // Already closed: a reconnect is scheduled at most once
                _ => {}
            },
            StreamEventKind::ReconnectDue => {
                self.resources.reconnect = None;
                if self.mounted && self.state == ConnectionState::Closed {
                    debug!(filter = %self.filter.label(), "reconnecting log stream");
                    self.connect();
                }
            }
        }
    }

    fn merge_side_buffer(&mut self) {
        for frame in std::mem::take(&mut self.side_buffer) {
            self.ingest(&frame);
        }
    }

    fn ingest(&mut self, frame: &Frame) {
        let decoded = self.decoder.decode_lines(frame);
        if let Some(e) = decoded.translation_error {
            self.last_error = Some(format!("Could not render terminal styling: {}", e));
        }
        for line in decoded.lines {
            self.buffer.append(line);
        }
    }

    fn connect(&mut self) {
        self.resources.release();
        self.generation += 1;

        let url = match self.endpoint.build(&self.filter) {
            Ok(url) => url,
            Err(e) => {
                warn!(error = %e, "cannot build log stream address");
                self.last_error = Some(e.to_string());
                self.state = ConnectionState::Closed;
                return;
            }
        };

        self.state = ConnectionState::Connecting;
        let sink = ChannelSink::new(self.generation, self.events_tx.clone());
        self.resources.channel = Some(self.transport.open(&url, sink));
    }

    fn enter_closed(&mut self, reconnect: bool) {
        if let Some(channel) = self.resources.channel.take() {
            channel.close();
        }
        self.state = ConnectionState::Closed;

        if reconnect && self.mounted {
            self.schedule_reconnect();
        }
    }

    fn schedule_reconnect(&mut self) {
        if self.resources.reconnect.is_some() {
            return;
        }

        let delay = self.config.reconnect_delay;
        let tx = self.events_tx.clone();
        let event = StreamEvent::new(self.generation, StreamEventKind::ReconnectDue);

        debug!(delay_secs = delay.as_secs(), "log stream reconnect scheduled");
        let task = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let _ = tx.send(event);
        });
        self.resources.reconnect = Some(ReconnectTimer(task));
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn indicator(&self) -> ConnectionIndicator {
        self.state.indicator()
    }

    pub fn filter(&self) -> &StreamFilter {
        &self.filter
    }

    /// Read access to the buffer; only the controller appends or clears
    pub fn buffer(&self) -> &LogBuffer {
        &self.buffer
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn dismiss_error(&mut self) {
        self.last_error = None;
    }

    pub fn side_buffer_len(&self) -> usize {
        self.side_buffer.len()
    }

    pub fn reconnect_pending(&self) -> bool {
        self.resources.reconnect.is_some()
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted
    }

    pub fn config(&self) -> &StreamConfig {
        &self.config
    }
}

impl Drop for StreamController {
    fn drop(&mut self) {
        self.resources.release();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::endpoint::{EndpointError, SwarmLogsEndpoint};
    use parking_lot::Mutex;
    use tokio_util::sync::CancellationToken;
    use url::Url;

    struct OpenedChannel {
        url: Url,
        sink: ChannelSink,
        cancel: CancellationToken,
        /// Whether every earlier channel was already closed at open time
        others_closed: bool,
    }

    #[derive(Clone, Default)]
    struct FakeTransport {
        channels: Arc<Mutex<Vec<OpenedChannel>>>,
    }

    impl FakeTransport {
        fn count(&self) -> usize {
            self.channels.lock().len()
        }

        fn sink(&self, index: usize) -> ChannelSink {
            self.channels.lock()[index].sink.clone()
        }

        fn url(&self, index: usize) -> String {
            self.channels.lock()[index].url.to_string()
        }

        fn is_cancelled(&self, index: usize) -> bool {
            self.channels.lock()[index].cancel.is_cancelled()
        }

        fn all_opened_exclusively(&self) -> bool {
            self.channels.lock().iter().all(|c| c.others_closed)
        }
    }

    impl Transport for FakeTransport {
        fn open(&self, endpoint: &Url, sink: ChannelSink) -> ChannelHandle {
            let cancel = CancellationToken::new();
            let mut channels = self.channels.lock();
            let others_closed = channels.iter().all(|c| c.cancel.is_cancelled());
            channels.push(OpenedChannel {
                url: endpoint.clone(),
                sink,
                cancel: cancel.clone(),
                others_closed,
            });
            ChannelHandle::new(cancel)
        }
    }

    struct Harness {
        controller: StreamController,
        events: mpsc::UnboundedReceiver<StreamEvent>,
        transport: FakeTransport,
    }

    impl Harness {
        fn new(capacity: usize) -> Self {
            let transport = FakeTransport::default();
            let config = StreamConfig {
                capacity,
                ..StreamConfig::swarm()
            };
            let base = Url::parse("http://localhost:5000/api").unwrap();
            let endpoint = SwarmLogsEndpoint::new(&base).unwrap();
            let (controller, events) =
                StreamController::new(config, Box::new(endpoint), Arc::new(transport.clone()));
            Self {
                controller,
                events,
                transport,
            }
        }

        /// Deliver everything queued so far
        fn pump(&mut self) {
            while let Ok(event) = self.events.try_recv() {
                self.controller.handle_event(event);
            }
        }

        fn open_latest(&mut self) {
            let sink = self.transport.sink(self.transport.count() - 1);
            sink.opened();
            self.pump();
        }

        fn send_latest(&mut self, lines: &[&str]) {
            let sink = self.transport.sink(self.transport.count() - 1);
            for line in lines {
                sink.frame(Frame::from(*line));
            }
            self.pump();
        }

        fn texts(&self) -> Vec<String> {
            self.controller
                .buffer()
                .snapshot()
                .iter()
                .map(|l| l.text.clone())
                .collect()
        }
    }

    async fn advance(secs: f64) {
        tokio::time::sleep(Duration::from_secs_f64(secs)).await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_mount_connects_and_opens() {
        let mut h = Harness::new(10);
        h.controller.mount(StreamFilter::stack("web"));

        assert_eq!(h.controller.state(), ConnectionState::Connecting);
        assert_eq!(h.transport.count(), 1);
        assert_eq!(h.transport.url(0), "ws://localhost:5000/api/swarm/logs?stack=web");

        h.open_latest();
        assert_eq!(h.controller.state(), ConnectionState::Open);
        assert_eq!(h.controller.indicator(), ConnectionIndicator::Connected);
    }

    #[tokio::test(start_paused = true)]
    async fn test_frames_append_in_order_with_eviction() {
        let mut h = Harness::new(3);
        h.controller.mount(StreamFilter::all());
        h.open_latest();

        h.send_latest(&["a", "b", "   ", "c", "d"]);
        assert_eq!(h.texts(), vec!["b", "c", "d"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_batched_frame_becomes_lines() {
        let mut h = Harness::new(10);
        h.controller.mount(StreamFilter::all());
        h.open_latest();

        h.send_latest(&["[web_api] one\n[web_api] two\n"]);
        assert_eq!(h.texts(), vec!["[web_api] one", "[web_api] two"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_pause_resume_merges_side_buffer() {
        let mut h = Harness::new(3);
        h.controller.mount(StreamFilter::all());
        h.open_latest();
        h.send_latest(&["a", "b", "c"]);

        h.controller.pause();
        assert_eq!(h.controller.state(), ConnectionState::Paused);
        assert!(h.transport.is_cancelled(0));

        // In-flight frames from the closed channel
        h.send_latest(&["d", "x", "y"]);
        assert_eq!(h.texts(), vec!["a", "b", "c"]);
        assert_eq!(h.controller.side_buffer_len(), 3);

        // A late close while paused must not schedule a reconnect
        h.transport.sink(0).closed(1006, false);
        h.pump();
        assert_eq!(h.controller.state(), ConnectionState::Paused);
        assert!(!h.controller.reconnect_pending());

        h.controller.resume();
        assert_eq!(h.texts(), vec!["d", "x", "y"]);
        assert_eq!(h.controller.side_buffer_len(), 0);
        assert_eq!(h.controller.state(), ConnectionState::Connecting);
        assert_eq!(h.transport.count(), 2);
        assert!(h.transport.all_opened_exclusively());
    }

    #[tokio::test(start_paused = true)]
    async fn test_pause_and_resume_are_idempotent() {
        let mut h = Harness::new(10);
        h.controller.mount(StreamFilter::all());
        h.open_latest();

        h.controller.pause();
        h.controller.pause();
        assert_eq!(h.controller.state(), ConnectionState::Paused);

        h.controller.resume();
        h.controller.resume();
        assert_eq!(h.transport.count(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_filter_change_clears_and_reopens() {
        let mut h = Harness::new(10);
        h.controller.mount(StreamFilter::stack("web"));
        h.open_latest();
        h.send_latest(&["old line"]);

        let old_sink = h.transport.sink(0);
        h.controller
            .set_filter(StreamFilter::new(Some("web".into()), Some("web_api".into())).unwrap());

        assert!(h.transport.is_cancelled(0));
        assert!(h.texts().is_empty());
        assert_eq!(h.controller.state(), ConnectionState::Connecting);
        assert_eq!(
            h.transport.url(1),
            "ws://localhost:5000/api/swarm/logs?stack=web&service=web_api"
        );
        assert!(h.transport.all_opened_exclusively());

        // Late frames from the old subscription are dropped
        old_sink.frame(Frame::from("stale"));
        h.pump();
        assert!(h.texts().is_empty());

        h.open_latest();
        h.send_latest(&["new line"]);
        assert_eq!(h.texts(), vec!["new line"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_same_filter_is_a_no_op() {
        let mut h = Harness::new(10);
        h.controller.mount(StreamFilter::stack("web"));
        h.open_latest();
        h.send_latest(&["keep"]);

        h.controller.set_filter(StreamFilter::stack("web"));
        assert_eq!(h.transport.count(), 1);
        assert_eq!(h.texts(), vec!["keep"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_abnormal_close_reconnects_once_after_delay() {
        let mut h = Harness::new(10);
        h.controller.mount(StreamFilter::all());
        h.open_latest();

        let sink = h.transport.sink(0);
        sink.error("connection reset");
        sink.closed(1006, false);
        h.pump();

        assert_eq!(h.controller.state(), ConnectionState::Closed);
        assert_eq!(h.controller.last_error(), Some("connection reset"));
        assert!(h.controller.reconnect_pending());

        advance(4.0).await;
        h.pump();
        assert_eq!(h.transport.count(), 1);

        advance(1.1).await;
        h.pump();
        assert_eq!(h.transport.count(), 2);
        assert_eq!(h.controller.state(), ConnectionState::Connecting);

        advance(30.0).await;
        h.pump();
        assert_eq!(h.transport.count(), 2);

        // Successful open clears the error slot
        h.open_latest();
        assert_eq!(h.controller.last_error(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_normal_close_does_not_reconnect() {
        let mut h = Harness::new(10);
        h.controller.mount(StreamFilter::all());
        h.open_latest();

        h.transport.sink(0).closed(NORMAL_CLOSURE, true);
        h.pump();
        assert_eq!(h.controller.state(), ConnectionState::Closed);
        assert!(!h.controller.reconnect_pending());

        advance(10.0).await;
        h.pump();
        assert_eq!(h.transport.count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_connect_retries_without_limit() {
        let mut h = Harness::new(10);
        h.controller.mount(StreamFilter::all());

        for attempt in 1..=3 {
            let sink = h.transport.sink(attempt - 1);
            sink.error("refused");
            sink.closed(1006, false);
            h.pump();
            advance(5.1).await;
            h.pump();
            assert_eq!(h.transport.count(), attempt + 1);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_unmount_during_delay_cancels_reconnect() {
        let mut h = Harness::new(10);
        h.controller.mount(StreamFilter::all());
        h.open_latest();
        h.transport.sink(0).closed(1006, false);
        h.pump();

        h.controller.unmount();
        assert_eq!(h.controller.state(), ConnectionState::Idle);

        advance(10.0).await;
        h.pump();
        assert_eq!(h.transport.count(), 1);
        assert_eq!(h.controller.state(), ConnectionState::Idle);

        // Nothing is appended after unmount
        h.transport.sink(0).frame(Frame::from("late"));
        h.pump();
        assert!(h.texts().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_filter_change_during_delay_connects_immediately() {
        let mut h = Harness::new(10);
        h.controller.mount(StreamFilter::all());
        h.open_latest();
        h.transport.sink(0).closed(1006, false);
        h.pump();

        h.controller.set_filter(StreamFilter::stack("db"));
        assert_eq!(h.transport.count(), 2);
        assert_eq!(h.controller.state(), ConnectionState::Connecting);

        // The superseded timer never fires a second connect
        advance(10.0).await;
        h.pump();
        assert_eq!(h.transport.count(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_remount_with_new_filter_drops_old_lines() {
        let mut h = Harness::new(10);
        h.controller.mount(StreamFilter::stack("web"));
        h.open_latest();
        h.send_latest(&["from web"]);
        h.controller.unmount();

        h.controller.mount(StreamFilter::stack("web"));
        assert_eq!(h.texts(), vec!["from web"]);
        h.controller.unmount();

        h.controller.mount(StreamFilter::stack("db"));
        assert!(h.texts().is_empty());
        assert!(h.transport.all_opened_exclusively());
    }

    #[tokio::test(start_paused = true)]
    async fn test_remount_while_paused_with_new_filter_drops_held_frames() {
        let mut h = Harness::new(10);
        h.controller.mount(StreamFilter::stack("web"));
        h.open_latest();
        h.controller.pause();
        h.send_latest(&["held from web"]);
        assert_eq!(h.controller.side_buffer_len(), 1);

        h.controller.mount(StreamFilter::stack("db"));
        assert_eq!(h.controller.state(), ConnectionState::Connecting);
        assert_eq!(h.controller.side_buffer_len(), 0);
        assert!(h.texts().is_empty());
        assert!(h.transport.all_opened_exclusively());

        h.open_latest();
        h.send_latest(&["db line"]);
        h.controller.pause();
        h.controller.resume();
        assert_eq!(h.texts(), vec!["db line"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_remount_while_paused_with_same_filter_merges_first() {
        let mut h = Harness::new(10);
        h.controller.mount(StreamFilter::stack("web"));
        h.open_latest();
        h.send_latest(&["a"]);
        h.controller.pause();
        h.send_latest(&["b"]);

        h.controller.mount(StreamFilter::stack("web"));
        assert_eq!(h.controller.side_buffer_len(), 0);
        assert_eq!(h.controller.state(), ConnectionState::Connecting);

        h.open_latest();
        h.send_latest(&["c"]);
        assert_eq!(h.texts(), vec!["a", "b", "c"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_filter_change_while_paused_connects_fresh() {
        let mut h = Harness::new(10);
        h.controller.mount(StreamFilter::stack("web"));
        h.open_latest();
        h.send_latest(&["old"]);
        h.controller.pause();
        h.send_latest(&["held"]);

        h.controller.set_filter(StreamFilter::stack("db"));
        assert_eq!(h.controller.state(), ConnectionState::Connecting);
        assert_eq!(h.controller.side_buffer_len(), 0);
        assert!(h.texts().is_empty());
        assert_eq!(h.transport.count(), 2);
        assert_eq!(h.transport.url(1), "ws://localhost:5000/api/swarm/logs?stack=db");
    }

    #[tokio::test(start_paused = true)]
    async fn test_filter_change_while_connecting_replaces_attempt() {
        let mut h = Harness::new(10);
        h.controller.mount(StreamFilter::stack("web"));
        assert_eq!(h.controller.state(), ConnectionState::Connecting);

        let old_sink = h.transport.sink(0);
        h.controller.set_filter(StreamFilter::stack("db"));
        assert!(h.transport.is_cancelled(0));
        assert_eq!(h.transport.count(), 2);
        assert_eq!(h.controller.state(), ConnectionState::Connecting);
        assert_eq!(h.controller.side_buffer_len(), 0);
        assert!(h.transport.all_opened_exclusively());

        // A late open from the abandoned attempt changes nothing
        old_sink.opened();
        h.pump();
        assert_eq!(h.controller.state(), ConnectionState::Connecting);
    }

    #[tokio::test(start_paused = true)]
    async fn test_clear_keeps_connection() {
        let mut h = Harness::new(10);
        h.controller.mount(StreamFilter::all());
        h.open_latest();
        h.send_latest(&["a", "b"]);

        h.controller.clear();
        assert!(h.texts().is_empty());
        assert_eq!(h.controller.state(), ConnectionState::Open);

        h.send_latest(&["c"]);
        assert_eq!(h.texts(), vec!["c"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_translation_failure_reported() {
        let mut h = Harness::new(10);
        h.controller.mount(StreamFilter::all());
        h.open_latest();

        h.send_latest(&["broken \x1b[31"]);
        assert_eq!(h.texts(), vec!["broken \x1b[31"]);
        assert!(h.controller.last_error().is_some());

        h.controller.dismiss_error();
        assert_eq!(h.controller.last_error(), None);
    }

    struct FailingEndpoint;

    impl EndpointBuilder for FailingEndpoint {
        fn build(&self, _filter: &StreamFilter) -> Result<Url, EndpointError> {
            Err(EndpointError::EmptyServiceId)
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_endpoint_failure_is_reported() {
        let transport = FakeTransport::default();
        let (mut controller, _events) = StreamController::new(
            StreamConfig::service(),
            Box::new(FailingEndpoint),
            Arc::new(transport.clone()),
        );

        controller.mount(StreamFilter::all());
        assert_eq!(controller.state(), ConnectionState::Closed);
        assert!(controller.last_error().is_some());
        assert_eq!(transport.count(), 0);
    }
}
