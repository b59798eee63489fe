//! Accumulates streamed speech-to-text fragments until a turn boundary.

use crate::chat::ChatMessage;

#[derive(Debug, Default)]
pub struct TranscriptAccumulator {
    input: String,
    output: String,
}

impl TranscriptAccumulator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a fragment of what the user said.
    pub fn push_input(&mut self, fragment: &str) {
        self.input.push_str(fragment);
    }

    /// Append a fragment of what the model said.
    pub fn push_output(&mut self, fragment: &str) {
        self.output.push_str(fragment);
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.input.trim().is_empty() && self.output.trim().is_empty()
    }

    /// Turn complete: emit the non-empty buffers (user first) and clear both.
    pub fn flush(&mut self) -> Vec<ChatMessage> {
        let input = std::mem::take(&mut self.input);
        let output = std::mem::take(&mut self.output);
        let mut messages = Vec::with_capacity(2);
        if !input.trim().is_empty() {
            messages.push(ChatMessage::user(input.trim()));
        }
        if !output.trim().is_empty() {
            messages.push(ChatMessage::assistant(output.trim()));
        }
        messages
    }

    pub fn clear(&mut self) {
        self.input.clear();
        self.output.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flush_emits_user_then_model() {
        let mut acc = TranscriptAccumulator::new();
        acc.push_output("Sure, ");
        acc.push_input("What do you ");
        acc.push_input("charge?");
        acc.push_output("it depends on scope.");

        let messages = acc.flush();
        assert_eq!(messages.len(), 2);
        assert!(messages[0].is_user);
        assert_eq!(messages[0].text, "What do you charge?");
        assert!(!messages[1].is_user);
        assert_eq!(messages[1].text, "Sure, it depends on scope.");
        assert!(acc.is_empty());
    }

    #[test]
    fn flush_skips_blank_buffers() {
        let mut acc = TranscriptAccumulator::new();
        acc.push_input("   ");
        acc.push_output("Hello!");
        let messages = acc.flush();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].text, "Hello!");
    }

    #[test]
    fn flush_on_empty_yields_nothing_and_stays_empty() {
        let mut acc = TranscriptAccumulator::new();
        assert!(acc.flush().is_empty());
        assert!(acc.flush().is_empty());
    }

    #[test]
    fn flush_clears_between_turns() {
        let mut acc = TranscriptAccumulator::new();
        acc.push_input("first");
        acc.flush();
        acc.push_input("second");
        let messages = acc.flush();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].text, "second");
    }
}
