//! Diagnostic Trouble Code Decoding
//!
//! A Mode 03 positive response is `43` + count byte + a run of 2-byte code
//! chunks. Each chunk packs the 5-character code into 16 bits: bits 7-6 of
//! the first byte select the system letter (P/C/B/U), bits 5-4 the second
//! character (0-3), bits 3-0 the third (hex digit); the second byte is the
//! final two characters. An all-zero chunk is padding, not a real code.

/// System letter lookup for bits 7-6 of the first code byte.
const DTC_LETTERS: [char; 4] = ['P', 'C', 'B', 'U'];

/// Decode one 4-hex-character chunk into a 5-character DTC such as
/// `"P0301"`. Returns `None` for short, non-hex, or zero-valued chunks.
pub fn decode_dtc_chunk(chunk: &str) -> Option<String> {
    if chunk.len() != 4 || !chunk.is_ascii() {
        return None;
    }
    let a = u8::from_str_radix(&chunk[..2], 16).ok()?;
    let b = u8::from_str_radix(&chunk[2..], 16).ok()?;
    if a == 0 && b == 0 {
        // "no code" padding, never emitted as P0000
        return None;
    }

    let letter = DTC_LETTERS[(a >> 6) as usize];
    let second = (a >> 4) & 0x03;
    let third = a & 0x0F;
    Some(format!("{letter}{second}{third:X}{b:02X}"))
}

/// Decode the stored-DTC list from cleaned response text.
///
/// Returns `Some` only when the text starts with the Mode 03 response tag
/// `43`, meaning a scan result, possibly empty. Chunks are walked in order
/// without overlap; a trailing partial chunk is ignored; duplicates are kept
/// as the adapter reported them. The walk is byte-aligned, so one garbled
/// chunk is skipped without losing the valid chunks after it.
pub fn decode_dtcs(clean: &str) -> Option<Vec<String>> {
    let data = clean.strip_prefix("43")?;

    // First byte is the code count; the codes themselves follow.
    if data.len() < 2 {
        return Some(Vec::new());
    }
    let mut codes = Vec::new();
    for chunk in data.as_bytes()[2..].chunks_exact(4) {
        let code = std::str::from_utf8(chunk)
            .ok()
            .and_then(decode_dtc_chunk);
        if let Some(code) = code {
            codes.push(code);
        }
    }
    Some(codes)
}
