//! Telemetry Response Decoding
//!
//! Tag-based extraction of Mode 01 values from cleaned response text.
//! ELM327 firmwares differ in echo and line-ending behavior, so the tag
//! search is a plain substring match anywhere in the cleaned buffer, and a
//! miss is an ordinary "no data" outcome (`None`), never an error.

use crate::dtc::decode_dtcs;
use crate::pid::Pid;
use crate::sample::TelemetrySample;

/// Strip all whitespace and NUL characters from raw adapter output.
/// BLE notifications arrive with interleaved `\r`, `\n`, spaces and NUL
/// padding depending on firmware.
pub fn normalize(raw: &str) -> String {
    raw.chars()
        .filter(|c| !c.is_whitespace() && *c != '\0')
        .collect()
}

/// Locate `tag` and return the `len` characters right after it, if present.
/// Non-ASCII payloads (mojibake from lossy BLE byte decoding) are rejected
/// rather than sliced, since hex parsing indexes by byte.
fn payload_after<'a>(clean: &'a str, tag: &str, len: usize) -> Option<&'a str> {
    let start = clean.find(tag)? + tag.len();
    let payload = clean.get(start..start + len)?;
    payload.is_ascii().then_some(payload)
}

fn hex_byte(s: &str) -> Option<u8> {
    u8::from_str_radix(s, 16).ok()
}

fn payload_for(clean: &str, pid: Pid) -> Option<&str> {
    payload_after(clean, &pid.response_tag(), pid.payload_hex_chars())
}

/// Decode engine RPM from a `410C` response: `(A*256 + B) / 4`.
pub fn decode_rpm(clean: &str) -> Option<f64> {
    let hex = payload_for(clean, Pid::Rpm)?;
    let a = hex_byte(&hex[..2])? as f64;
    let b = hex_byte(&hex[2..])? as f64;
    Some((a * 256.0 + b) / 4.0)
}

/// Decode vehicle speed from a `410D` response: `A` km/h.
pub fn decode_speed(clean: &str) -> Option<f64> {
    let hex = payload_for(clean, Pid::Speed)?;
    Some(hex_byte(hex)? as f64)
}

/// Decode coolant temperature from a `4105` response: `A - 40` °C.
pub fn decode_coolant_temp(clean: &str) -> Option<f64> {
    let hex = payload_for(clean, Pid::CoolantTemp)?;
    Some(hex_byte(hex)? as f64 - 40.0)
}

/// Decode one complete (terminator-delimited) raw response into a partial
/// telemetry update. Normalizes once, then tries every decoder; fields that
/// do not parse stay `None`. Garbage input yields an empty sample.
pub fn decode_response(raw: &str) -> TelemetrySample {
    let clean = normalize(raw);
    TelemetrySample {
        rpm: decode_rpm(&clean),
        speed_kph: decode_speed(&clean),
        coolant_temp_c: decode_coolant_temp(&clean),
        dtcs: decode_dtcs(&clean),
        is_connected: None,
    }
}
