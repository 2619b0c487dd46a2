//! Output sinks: where everything the script prints ends up.

/// Receives each line of output produced during one execution.
pub trait OutputSink {
    fn write_line(&mut self, line: &str);
}

/// Collects output lines in memory.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct BufferSink {
    lines: Vec<String>,
}

impl BufferSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// All captured lines joined with `\n`.
    pub fn contents(&self) -> String {
        self.lines.join("\n")
    }

    pub fn into_lines(self) -> Vec<String> {
        self.lines
    }
}

impl OutputSink for BufferSink {
    fn write_line(&mut self, line: &str) {
        self.lines.push(line.to_string());
    }
}
