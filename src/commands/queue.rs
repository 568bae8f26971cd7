use std::collections::VecDeque;

/// A queued line together with its 1-based position in the original batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueuedLine {
    pub index: usize,
    pub text: String,
}

/// Ordered lines waiting to be dispatched.
///
/// Lines leave the queue strictly from the front, so identical lines are
/// never confused with each other.
#[derive(Debug, Clone, Default)]
pub struct CommandQueue {
    lines: VecDeque<QueuedLine>,
}

impl CommandQueue {
    pub fn new<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let lines = lines
            .into_iter()
            .map(Into::into)
            // Whitespace-only lines are dropped rather than sent; chat rejects empty messages.
            .filter(|line: &String| !line.trim().is_empty())
            .enumerate()
            .map(|(i, text)| QueuedLine { index: i + 1, text })
            .collect();
        Self { lines }
    }

    /// Splits a block of text on line endings (`\n` or `\r\n`).
    pub fn from_text(text: &str) -> Self {
        Self::new(text.lines())
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn peek(&self) -> Option<&QueuedLine> {
        self.lines.front()
    }

    pub fn pop(&mut self) -> Option<QueuedLine> {
        self.lines.pop_front()
    }

    pub fn clear(&mut self) {
        self.lines.clear();
    }

    pub fn into_lines(self) -> Vec<String> {
        self.lines.into_iter().map(|l| l.text).collect()
    }
}
