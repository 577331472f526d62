//! Outbound Adapter Commands
//!
//! Plain ASCII instruction strings, carriage-return framed on the wire.
//! Immutable once built; consumed exactly once by the write path and never
//! retried.

use std::fmt;

use obd_codec::{mode, Pid};

/// One outbound instruction for the adapter
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command(String);

impl Command {
    /// `ATZ`: reset the adapter
    pub fn reset() -> Self {
        Command("ATZ".to_string())
    }

    /// `ATE0`: disable command echo
    pub fn echo_off() -> Self {
        Command("ATE0".to_string())
    }

    /// `ATSP0`: automatic protocol selection
    pub fn select_protocol() -> Self {
        Command("ATSP0".to_string())
    }

    /// Mode 01 live-data poll for one PID, e.g. `010C`
    pub fn poll(pid: Pid) -> Self {
        Command(pid.request())
    }

    /// `03`: request stored diagnostic trouble codes
    pub fn read_dtcs() -> Self {
        Command(format!("{:02X}", mode::READ_DTC))
    }

    /// The command text without framing
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Wire form: ASCII text plus the trailing carriage return the ELM327
    /// expects.
    pub fn wire_bytes(&self) -> Vec<u8> {
        let mut bytes = self.0.clone().into_bytes();
        bytes.push(b'\r');
        bytes
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
