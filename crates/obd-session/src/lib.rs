//! OBD-II Adapter Session
//!
//! Drives the connect/initialize/poll/disconnect lifecycle against an
//! ELM327-class adapter reached over an injected duplex byte channel.
//! Commands go out strictly serialized (one in flight at a time, carriage
//! return framed); responses come back as arbitrary BLE fragments and are
//! reassembled on the `'>'` prompt before decoding. When no transport can
//! be opened the session degrades to the synthetic generator from
//! `obd-fallback` instead of failing the connect.

mod assembler;
mod command;
mod config;
mod error;
pub mod mock;
mod queue;
mod session;
mod transport;

pub use assembler::ResponseAssembler;
pub use command::Command;
pub use config::SessionConfig;
pub use error::TransportError;
pub use queue::CommandQueue;
pub use session::{AdapterSession, SessionState};
pub use transport::{DeviceFilter, DuplexByteChannel, Transport};
