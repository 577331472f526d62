//! Scripted Transport for Tests
//!
//! `ScriptedTransport` stands in for the BLE discovery layer: it records
//! every write, lets the driving test feed response fragments byte-for-byte,
//! and can be told to reject writes. `UnavailableTransport` fails discovery
//! so the fallback path can be exercised.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::error::TransportError;
use crate::transport::{DeviceFilter, DuplexByteChannel, Transport};

/// Shared observation/control surface between a test and its channel
#[derive(Clone, Default)]
struct Shared {
    writes: Arc<Mutex<Vec<String>>>,
    fail_writes: Arc<AtomicBool>,
    closed: Arc<AtomicBool>,
}

/// Channel half handed to the session under test
pub struct ScriptedChannel {
    shared: Shared,
}

#[async_trait]
impl DuplexByteChannel for ScriptedChannel {
    async fn write(&mut self, bytes: &[u8]) -> Result<(), TransportError> {
        let text = String::from_utf8_lossy(bytes).into_owned();
        self.shared.writes.lock().unwrap().push(text);
        if self.shared.fail_writes.load(Ordering::SeqCst) {
            return Err(TransportError::Write("scripted write failure".to_string()));
        }
        Ok(())
    }

    async fn close(&mut self) {
        self.shared.closed.store(true, Ordering::SeqCst);
    }
}

/// Test-side handle: feed fragments, inspect writes, toggle failures
pub struct ScriptHandle {
    fragments: mpsc::Sender<Vec<u8>>,
    shared: Shared,
}

impl ScriptHandle {
    /// Deliver one notification fragment to the session.
    pub async fn feed(&self, text: &str) {
        self.feed_bytes(text.as_bytes()).await;
    }

    /// Deliver a raw fragment, valid UTF-8 or not.
    pub async fn feed_bytes(&self, bytes: &[u8]) {
        let _ = self.fragments.send(bytes.to_vec()).await;
    }

    /// Everything written so far, framing included.
    pub fn writes(&self) -> Vec<String> {
        self.shared.writes.lock().unwrap().clone()
    }

    /// Make subsequent writes fail (or succeed again).
    pub fn set_fail_writes(&self, fail: bool) {
        self.shared.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Whether the session has released the channel.
    pub fn is_closed(&self) -> bool {
        self.shared.closed.load(Ordering::SeqCst)
    }
}

/// Opener yielding one scripted channel
pub struct ScriptedTransport {
    prepared: Option<(ScriptedChannel, mpsc::Receiver<Vec<u8>>)>,
}

/// Build a scripted transport and the handle driving it.
pub fn scripted() -> (ScriptedTransport, ScriptHandle) {
    let shared = Shared::default();
    let (tx, rx) = mpsc::channel(32);
    let transport = ScriptedTransport {
        prepared: Some((
            ScriptedChannel {
                shared: shared.clone(),
            },
            rx,
        )),
    };
    let handle = ScriptHandle {
        fragments: tx,
        shared,
    };
    (transport, handle)
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn open(
        &mut self,
        _filter: &DeviceFilter,
    ) -> Result<(Box<dyn DuplexByteChannel>, mpsc::Receiver<Vec<u8>>), TransportError> {
        let (channel, rx) = self
            .prepared
            .take()
            .ok_or(TransportError::Unavailable)?;
        Ok((Box::new(channel), rx))
    }
}

/// Opener whose discovery always fails, forcing the fallback path
pub struct UnavailableTransport(pub TransportError);

impl Default for UnavailableTransport {
    fn default() -> Self {
        Self(TransportError::Unavailable)
    }
}

#[async_trait]
impl Transport for UnavailableTransport {
    async fn open(
        &mut self,
        _filter: &DeviceFilter,
    ) -> Result<(Box<dyn DuplexByteChannel>, mpsc::Receiver<Vec<u8>>), TransportError> {
        Err(self.0.clone())
    }
}
