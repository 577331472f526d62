//! Response Reassembly
//!
//! BLE notifications deliver response bytes in arbitrary fragments. The
//! assembler accumulates them and yields one complete response per `'>'`
//! prompt the adapter appends; text after the terminator is retained as the
//! start of the next buffer, never discarded.

/// Terminator the ELM327 appends when ready for the next command
pub const TERMINATOR: char = '>';

/// Accumulating buffer of not-yet-terminated response text
#[derive(Debug, Default)]
pub struct ResponseAssembler {
    buffer: String,
}

impl ResponseAssembler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a decoded fragment to the buffer.
    pub fn extend(&mut self, fragment: &str) {
        self.buffer.push_str(fragment);
    }

    /// Split off the text before the first terminator, if one has arrived.
    /// Call in a loop to drain multiple terminators from one fragment; each
    /// terminator yields exactly one response.
    pub fn next_response(&mut self) -> Option<String> {
        let at = self.buffer.find(TERMINATOR)?;
        let rest = self.buffer.split_off(at + TERMINATOR.len_utf8());
        let mut response = std::mem::replace(&mut self.buffer, rest);
        response.pop();
        Some(response)
    }

    /// Not-yet-terminated text still waiting for its prompt
    pub fn remainder(&self) -> &str {
        &self.buffer
    }
}
