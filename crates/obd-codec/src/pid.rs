//! OBD-II PID Definitions
//!
//! The three Mode 01 PIDs this client polls, with their request command and
//! positive-response tag spellings.

use serde::{Deserialize, Serialize};

use crate::mode;

/// Polled OBD-II PIDs for Mode 01 (current data)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Pid {
    /// Engine RPM (0x0C)
    Rpm = 0x0C,
    /// Vehicle speed (0x0D)
    Speed = 0x0D,
    /// Engine coolant temperature (0x05)
    CoolantTemp = 0x05,
}

impl Pid {
    /// Poll rotation order: RPM, speed, coolant.
    pub const POLL_CYCLE: [Pid; 3] = [Pid::Rpm, Pid::Speed, Pid::CoolantTemp];

    /// Get the PID hex value
    pub fn as_hex(&self) -> u8 {
        *self as u8
    }

    /// Mode 01 request string sent to the adapter (e.g. `"010C"`)
    pub fn request(&self) -> String {
        format!("{:02X}{:02X}", mode::CURRENT_DATA, self.as_hex())
    }

    /// Positive-response tag the adapter echoes back (e.g. `"410C"`)
    pub fn response_tag(&self) -> String {
        format!("{:02X}{:02X}", mode::CURRENT_DATA | 0x40, self.as_hex())
    }

    /// Number of payload hex characters following the response tag
    pub fn payload_hex_chars(&self) -> usize {
        match self {
            Pid::Rpm => 4,
            Pid::Speed | Pid::CoolantTemp => 2,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_strings() {
        assert_eq!(Pid::Rpm.request(), "010C");
        assert_eq!(Pid::Speed.request(), "010D");
        assert_eq!(Pid::CoolantTemp.request(), "0105");
    }

    #[test]
    fn test_response_tags() {
        assert_eq!(Pid::Rpm.response_tag(), "410C");
        assert_eq!(Pid::Speed.response_tag(), "410D");
        assert_eq!(Pid::CoolantTemp.response_tag(), "4105");
    }
}
