//! Write sinks

use odata_diagnostics::{ODataError, Result};
use serde_json::Value as Json;
use std::io;

/// Token-level JSON output
///
/// Callers are responsible for separators; the sink writes exactly what it is told.
pub trait JsonSink {
    fn object_start(&mut self) -> Result<()>;
    fn object_end(&mut self) -> Result<()>;
    fn array_start(&mut self) -> Result<()>;
    fn array_end(&mut self) -> Result<()>;
    /// Write an object key followed by the key/value delimiter
    fn key(&mut self, key: &str) -> Result<()>;
    fn separator(&mut self) -> Result<()>;
    fn send_scalar(&mut self, value: &Json) -> Result<()>;

    /// Write `key: value` pairs separated by separators, without a leading separator
    fn key_values(&mut self, pairs: &[(&str, &Json)]) -> Result<()> {
        for (i, (key, value)) in pairs.iter().enumerate() {
            if i > 0 {
                self.separator()?;
            }
            self.key(key)?;
            self.send_scalar(value)?;
        }
        Ok(())
    }
}

/// JSON sink over any byte writer
///
/// Compact by default; [`JsonWriter::pretty`] indents by two spaces the way
/// `serde_json::to_string_pretty` does, without reordering keys.
pub struct JsonWriter<W: io::Write> {
    out: W,
    written: usize,
    pretty: bool,
    /// Whether each open container has items, innermost last
    containers: Vec<bool>,
    /// A key was written and its value is pending
    after_key: bool,
}

impl<W: io::Write> JsonWriter<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            written: 0,
            pretty: false,
            containers: Vec::new(),
            after_key: false,
        }
    }

    /// Indented output
    pub fn pretty(out: W) -> Self {
        Self {
            pretty: true,
            ..Self::new(out)
        }
    }

    /// Number of bytes written so far
    pub fn bytes_written(&self) -> usize {
        self.written
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn raw(&mut self, bytes: &[u8]) -> Result<()> {
        self.out.write_all(bytes)?;
        self.written += bytes.len();
        Ok(())
    }

    fn json(&mut self, value: &impl serde::Serialize) -> Result<()> {
        let encoded = if self.pretty {
            serde_json::to_string_pretty(value)
        } else {
            serde_json::to_string(value)
        }
        .map_err(|e| ODataError::internal(format!("Failed to encode JSON value: {}", e)))?;

        // Nested containers continue at the current depth
        if self.pretty && encoded.contains('\n') {
            let indent = format!("\n{}", "  ".repeat(self.containers.len()));
            return self.raw(encoded.replace('\n', &indent).as_bytes());
        }
        self.raw(encoded.as_bytes())
    }

    fn newline(&mut self, depth: usize) -> Result<()> {
        let line = format!("\n{}", "  ".repeat(depth));
        self.raw(line.as_bytes())
    }

    /// Start a value: array elements go on their own line
    fn begin_value(&mut self) -> Result<()> {
        if std::mem::take(&mut self.after_key) {
            return Ok(());
        }
        self.begin_item()
    }

    fn begin_item(&mut self) -> Result<()> {
        let depth = self.containers.len();
        let Some(has_items) = self.containers.last_mut() else {
            return Ok(());
        };
        *has_items = true;
        if self.pretty {
            self.newline(depth)?;
        }
        Ok(())
    }

    fn open_container(&mut self, token: &[u8]) -> Result<()> {
        self.begin_value()?;
        self.raw(token)?;
        self.containers.push(false);
        Ok(())
    }

    fn close_container(&mut self, token: &[u8]) -> Result<()> {
        if self.containers.pop() == Some(true) && self.pretty {
            self.newline(self.containers.len())?;
        }
        self.raw(token)
    }
}

impl<W: io::Write> JsonSink for JsonWriter<W> {
    fn object_start(&mut self) -> Result<()> {
        self.open_container(b"{")
    }

    fn object_end(&mut self) -> Result<()> {
        self.close_container(b"}")
    }

    fn array_start(&mut self) -> Result<()> {
        self.open_container(b"[")
    }

    fn array_end(&mut self) -> Result<()> {
        self.close_container(b"]")
    }

    fn key(&mut self, key: &str) -> Result<()> {
        self.begin_item()?;
        self.json(&key)?;
        self.after_key = true;
        let delimiter: &[u8] = if self.pretty { b": " } else { b":" };
        self.raw(delimiter)
    }

    fn separator(&mut self) -> Result<()> {
        self.raw(b",")
    }

    fn send_scalar(&mut self, value: &Json) -> Result<()> {
        self.begin_value()?;
        self.json(value)
    }
}

impl JsonWriter<Vec<u8>> {
    /// Writer into an in-memory buffer
    pub fn buffer() -> Self {
        Self::new(Vec::new())
    }

    /// The buffered output as text
    pub fn as_str(&self) -> &str {
        std::str::from_utf8(&self.out).unwrap_or_default()
    }
}
