const MAX_LINES: usize = 2000;

/// Scrollback for the terminal pane. Output arrives in arbitrary chunks, so
/// a chunk may continue the last line instead of starting a new one.
#[derive(Debug, Clone, Default)]
pub struct TerminalPane {
    lines: Vec<String>,
    open_line: bool,
}

impl TerminalPane {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append raw process output.
    pub fn push_output(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        // `\r` is trimmed per segment, so only a raw `\n` at the end of the
        // chunk closes the line; a CRLF split across chunks stays one line.
        let ends_line = text.ends_with('\n');
        let mut segments = text.split('\n').peekable();
        let mut first = true;
        while let Some(segment) = segments.next() {
            let is_last = segments.peek().is_none();
            let segment = segment.trim_end_matches('\r');

            if first && self.open_line {
                if let Some(last) = self.lines.last_mut() {
                    last.push_str(segment);
                }
            } else if !(is_last && ends_line) {
                self.lines.push(segment.to_string());
            }
            first = false;
        }
        self.open_line = !ends_line;
        self.trim();
    }

    /// Append a complete line, e.g. an echoed command or a status note.
    pub fn push_line(&mut self, line: impl Into<String>) {
        self.lines.push(line.into());
        self.open_line = false;
        self.trim();
    }

    pub fn clear(&mut self) {
        self.lines.clear();
        self.open_line = false;
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// The last `n` lines.
    pub fn tail(&self, n: usize) -> &[String] {
        let start = self.lines.len().saturating_sub(n);
        &self.lines[start..]
    }

    fn trim(&mut self) {
        if self.lines.len() > MAX_LINES {
            let excess = self.lines.len() - MAX_LINES;
            self.lines.drain(..excess);
        }
    }
}
