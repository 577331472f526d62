//! Adapter Session State Machine
//!
//! `AdapterSession` is a handle over a spawned worker task that owns the
//! channel, the command queue, the response assembler, and the poll timer.
//! The worker processes one event at a time (control message, notification
//! fragment, timer tick), which keeps the shared buffers free of reentrancy
//! hazards. A failed transport open degrades to the synthetic generator;
//! the caller never sees a hard connect failure.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info, warn};

use obd_codec::{decode_response, Pid, TelemetrySample};
use obd_fallback::FallbackGenerator;

use crate::assembler::ResponseAssembler;
use crate::command::Command;
use crate::config::SessionConfig;
use crate::queue::CommandQueue;
use crate::transport::{DuplexByteChannel, Transport};

/// Lifecycle states of an adapter session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionState {
    /// No connect attempted yet
    #[default]
    Idle,
    /// Discovery/open in progress
    Connecting,
    /// Channel open, AT init sequence outstanding
    Initializing,
    /// Initialized; polling and servicing explicit commands
    Ready,
    /// Torn down; terminal until the next connect
    Disconnected,
}

enum Control {
    ScanDtcs,
    Disconnect,
}

/// Handle to a live (or fallback) adapter session
pub struct AdapterSession {
    ctrl: mpsc::UnboundedSender<Control>,
    worker: Option<JoinHandle<()>>,
}

impl AdapterSession {
    /// Open the transport and start the session worker.
    ///
    /// Never fails: if discovery comes back empty the session runs the
    /// fallback generator instead, and the caller interacts with it through
    /// the same handle and update channel.
    pub async fn connect<T>(
        mut transport: T,
        config: SessionConfig,
        updates: mpsc::UnboundedSender<TelemetrySample>,
    ) -> Self
    where
        T: Transport,
    {
        let (ctrl_tx, ctrl_rx) = mpsc::unbounded_channel();

        debug!("opening adapter transport");
        let worker = match transport.open(&config.device_filter).await {
            Ok((channel, fragments)) => {
                info!("transport open, initializing adapter");
                let worker = SessionWorker::new(channel, config, updates);
                tokio::spawn(worker.run(ctrl_rx, fragments))
            }
            Err(err) => {
                warn!("transport unavailable ({}), starting fallback telemetry", err);
                let generator = FallbackGenerator::new(config.fallback, updates);
                tokio::spawn(run_fallback(generator, ctrl_rx))
            }
        };

        Self {
            ctrl: ctrl_tx,
            worker: Some(worker),
        }
    }

    /// Enqueue a Mode 03 stored-DTC scan. Returns once queued; the result
    /// arrives later through the update channel. Ignored before the session
    /// is ready and in fallback mode.
    pub fn scan_dtcs(&self) {
        let _ = self.ctrl.send(Control::ScanDtcs);
    }

    /// Tear the session down. Idempotent; safe while a command is in
    /// flight. By the time this returns the worker has stopped its timers,
    /// detached from notifications, released the channel, and exited: no
    /// further update is delivered afterwards.
    pub async fn disconnect(&mut self) {
        if let Some(worker) = self.worker.take() {
            let _ = self.ctrl.send(Control::Disconnect);
            let _ = worker.await;
            info!("adapter session disconnected");
        }
    }

    /// Whether the session worker is still running
    pub fn is_active(&self) -> bool {
        self.worker.is_some()
    }
}

/// Drive the fallback generator until disconnect. Dropping the generator's
/// future cancels every pending synthetic timer.
async fn run_fallback(
    generator: FallbackGenerator,
    mut ctrl: mpsc::UnboundedReceiver<Control>,
) {
    let run = generator.run();
    tokio::pin!(run);
    loop {
        tokio::select! {
            _ = &mut run => break,
            msg = ctrl.recv() => match msg {
                Some(Control::ScanDtcs) => {
                    debug!("scan request in fallback mode, ignoring");
                }
                Some(Control::Disconnect) | None => break,
            },
        }
    }
}

/// Worker task owning the live-session state
struct SessionWorker {
    channel: Box<dyn DuplexByteChannel>,
    queue: CommandQueue,
    assembler: ResponseAssembler,
    updates: mpsc::UnboundedSender<TelemetrySample>,
    config: SessionConfig,
    state: SessionState,
    /// Init-sequence responses still outstanding before `Ready`
    init_pending: usize,
    /// Index into [`Pid::POLL_CYCLE`] for the next poll
    poll_index: usize,
}

impl SessionWorker {
    fn new(
        channel: Box<dyn DuplexByteChannel>,
        config: SessionConfig,
        updates: mpsc::UnboundedSender<TelemetrySample>,
    ) -> Self {
        Self {
            channel,
            queue: CommandQueue::new(),
            assembler: ResponseAssembler::new(),
            updates,
            config,
            state: SessionState::Connecting,
            init_pending: 0,
            poll_index: 0,
        }
    }

    async fn run(
        mut self,
        mut ctrl: mpsc::UnboundedReceiver<Control>,
        mut fragments: mpsc::Receiver<Vec<u8>>,
    ) {
        self.queue.push(Command::reset());
        self.queue.push(Command::echo_off());
        self.queue.push(Command::select_protocol());
        self.init_pending = self.queue.len();
        self.state = SessionState::Initializing;
        self.pump().await;

        let mut poll = interval(Duration::from_millis(self.config.poll_interval_ms));
        poll.set_missed_tick_behavior(MissedTickBehavior::Skip);
        // An interval's first tick completes immediately; consume it so the
        // first poll lands one full period after initialization.
        poll.tick().await;

        loop {
            tokio::select! {
                msg = ctrl.recv() => match msg {
                    Some(Control::ScanDtcs) => self.on_scan_request().await,
                    Some(Control::Disconnect) | None => break,
                },
                fragment = fragments.recv() => match fragment {
                    Some(bytes) => self.on_fragment(&bytes).await,
                    None => {
                        warn!("notification stream closed by transport");
                        break;
                    }
                },
                _ = poll.tick() => self.on_poll_tick().await,
            }
        }

        // Teardown order: timers first, then the notification stream, then
        // the channel, so no late fragment can race the release.
        drop(poll);
        fragments.close();
        self.channel.close().await;
        self.state = SessionState::Disconnected;
        debug!("session worker stopped");
    }

    /// Poll cadence: round-robin one telemetry PID, but only when nothing
    /// is pending, so a slow adapter bounds the queue instead of growing it.
    async fn on_poll_tick(&mut self) {
        if self.state != SessionState::Ready || !self.queue.is_empty() {
            return;
        }
        let pid = Pid::POLL_CYCLE[self.poll_index];
        self.poll_index = (self.poll_index + 1) % Pid::POLL_CYCLE.len();
        self.queue.push(Command::poll(pid));
        self.pump().await;
    }

    async fn on_scan_request(&mut self) {
        if self.state != SessionState::Ready {
            debug!("scan request before ready, ignoring");
            return;
        }
        // FIFO position, no priority jump over queued polls
        self.queue.push(Command::read_dtcs());
        self.pump().await;
    }

    /// A notification fragment arrived: reassemble, and for every complete
    /// response clear the in-flight slot, decode, and dispatch the next
    /// queued command. One decode per terminator, regardless of how the
    /// fragments were sliced.
    async fn on_fragment(&mut self, bytes: &[u8]) {
        self.assembler.extend(&String::from_utf8_lossy(bytes));
        while let Some(response) = self.assembler.next_response() {
            self.queue.clear_in_flight();
            self.handle_response(&response);
            self.pump().await;
        }
    }

    fn handle_response(&mut self, response: &str) {
        if self.state == SessionState::Initializing {
            self.init_pending = self.init_pending.saturating_sub(1);
            if self.init_pending == 0 {
                info!("adapter initialized, session ready");
                self.state = SessionState::Ready;
                let _ = self.updates.send(TelemetrySample {
                    is_connected: Some(true),
                    ..Default::default()
                });
            }
            return;
        }

        let sample = decode_response(response);
        if sample.is_empty() {
            // Partial or garbled frame; normal on a noisy BLE link
            debug!("no decodable data in response: {:?}", response);
            return;
        }
        let _ = self.updates.send(sample);
    }

    /// Dispatch the next queued command unless one is already in flight.
    /// A rejected write drops the command without retry (a stale command
    /// against a possibly-desynced adapter is worse than a missed poll)
    /// and moves on to the next queued command, so one bad write cannot
    /// stall the commands behind it.
    async fn pump(&mut self) {
        while let Some(command) = self.queue.take_next() {
            debug!("dispatching command {}", command);
            match self.channel.write(&command.wire_bytes()).await {
                Ok(()) => return,
                Err(err) => {
                    warn!("write failed for {}, dropping command: {}", command, err);
                    self.queue.clear_in_flight();
                }
            }
        }
    }
}
