//! Byte-at-a-time command line assembly.

/// Capacity of one command line buffer, in bytes.
///
/// A line that reaches this length without a terminator is completed as-is
/// rather than silently truncated byte by byte.
pub const MAX_LINE_LEN: usize = 120;

/// Accumulates bytes into complete command lines.
///
/// Each connection owns its own assembler, so a peer that sends a partial
/// line can never interleave with another peer's input. A partially
/// assembled line is discarded when the assembler is dropped with its
/// connection.
#[derive(Debug)]
pub struct LineAssembler {
    buf: Vec<u8>,
    capacity: usize,
}

impl LineAssembler {
    pub fn new() -> Self {
        Self::with_capacity(MAX_LINE_LEN)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: Vec::with_capacity(capacity),
            capacity,
        }
    }

    /// Feed one byte. Returns the assembled line when the byte completes it,
    /// either via a `\n` terminator or by filling the buffer.
    ///
    /// Carriage returns are dropped so `\r\n` and bare `\n` terminate alike.
    pub fn push(&mut self, byte: u8) -> Option<String> {
        match byte {
            b'\r' => None,
            b'\n' => Some(self.take()),
            _ => {
                self.buf.push(byte);
                if self.buf.len() >= self.capacity {
                    Some(self.take())
                } else {
                    None
                }
            }
        }
    }

    /// Bytes currently buffered without a terminator.
    pub fn pending(&self) -> usize {
        self.buf.len()
    }

    fn take(&mut self) -> String {
        let line = String::from_utf8_lossy(&self.buf).into_owned();
        self.buf.clear();
        line
    }
}

impl Default for LineAssembler {
    fn default() -> Self {
        Self::new()
    }
}
