/// Input history for the terminal pane's command line.
#[derive(Debug, Clone, Default)]
pub struct CommandHistory {
    entries: Vec<String>,
    pos: Option<usize>,
}

impl CommandHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a submitted line and reset navigation. Blank lines and
    /// immediate repeats are not stored.
    pub fn push(&mut self, line: impl Into<String>) {
        let line = line.into();
        if !line.trim().is_empty() && self.entries.last() != Some(&line) {
            self.entries.push(line);
        }
        self.pos = None;
    }

    /// Step back in time. Stays on the oldest entry once reached.
    pub fn previous(&mut self) -> Option<&str> {
        if self.entries.is_empty() {
            return None;
        }
        let pos = match self.pos {
            None => self.entries.len() - 1,
            Some(0) => 0,
            Some(p) => p - 1,
        };
        self.pos = Some(pos);
        self.entries.get(pos).map(String::as_str)
    }

    /// Step forward. Returns `None` when moving past the newest entry, which
    /// means the input line should be cleared.
    pub fn next(&mut self) -> Option<&str> {
        let pos = self.pos?;
        if pos + 1 >= self.entries.len() {
            self.pos = None;
            None
        } else {
            self.pos = Some(pos + 1);
            self.entries.get(pos + 1).map(String::as_str)
        }
    }

    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
