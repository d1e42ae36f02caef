/// Draft state machine for the chat input
///
/// Sending is optimistic: `take()` clears the draft before the network
/// call, and a failed send puts the exact trimmed text back via
/// `restore()` so the user keeps what they typed. The `sending` flag
/// blocks a second submit from the same composer while one is in flight;
/// there is no cross-instance dedup.
pub const MAX_MESSAGE_CHARS: usize = 1000;

#[derive(Debug, Clone, Default)]
pub struct Composer {
    draft: String,
    sending: bool,
}

impl Composer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn draft(&self) -> &str {
        &self.draft
    }

    pub fn is_sending(&self) -> bool {
        self.sending
    }

    pub fn remaining_chars(&self) -> usize {
        MAX_MESSAGE_CHARS.saturating_sub(self.draft.chars().count())
    }

    /// Append typed input, ignoring anything past the character cap.
    pub fn push_char(&mut self, ch: char) {
        if self.draft.chars().count() < MAX_MESSAGE_CHARS {
            self.draft.push(ch);
        }
    }

    pub fn pop_char(&mut self) {
        self.draft.pop();
    }

    /// Replace the draft wholesale (paste, programmatic fill), truncated
    /// to the character cap.
    pub fn set_draft(&mut self, text: &str) {
        self.draft = text.chars().take(MAX_MESSAGE_CHARS).collect();
    }

    /// Begin a send: trims the draft, clears the input, flips `sending`.
    /// Returns `None` for whitespace-only drafts and while a send is
    /// already outstanding; neither case may reach the network.
    pub fn take(&mut self) -> Option<String> {
        if self.sending {
            return None;
        }
        let text = self.draft.trim();
        if text.is_empty() {
            return None;
        }
        let text = text.to_string();
        self.draft.clear();
        self.sending = true;
        Some(text)
    }

    /// Send confirmed; the composer is ready for the next draft.
    pub fn finish(&mut self) {
        self.sending = false;
    }

    /// Send failed; put the taken text back so the draft is not lost.
    pub fn restore(&mut self, text: String) {
        self.draft = text;
        self.sending = false;
    }
}
