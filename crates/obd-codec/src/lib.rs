//! OBD-II Frame Codec
//!
//! Pure decoding of ELM327-style response text into telemetry values and
//! Diagnostic Trouble Codes. No I/O and no state: the session layer hands
//! each terminator-delimited response string to [`decode_response`] and
//! forwards whatever non-empty [`TelemetrySample`] comes back.

mod decode;
mod dtc;
mod pid;
mod sample;

pub use decode::{
    decode_coolant_temp, decode_response, decode_rpm, decode_speed, normalize,
};
pub use dtc::{decode_dtc_chunk, decode_dtcs};
pub use pid::Pid;
pub use sample::TelemetrySample;

/// OBD-II mode constants
pub mod mode {
    /// Current data
    pub const CURRENT_DATA: u8 = 0x01;
    /// Diagnostic trouble codes
    pub const READ_DTC: u8 = 0x03;
}
