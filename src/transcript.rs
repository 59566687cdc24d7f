//! Append-only conversation transcript.

use strum::Display;

/// Who authored a transcript entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "lowercase")]
pub enum Role {
    User,
    Bot,
    System,
}

/// One line of the conversation.  Entries are never edited or removed once
/// appended; `sequence` increases monotonically within a transcript.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranscriptEntry {
    pub role: Role,
    pub text: String,
    pub sequence: u64,
}

/// Ordered, append-only record of a chat session.  Created empty when the
/// session enters the chatting phase and discarded as a whole when it leaves.
#[derive(Debug, Default)]
pub struct Transcript {
    entries: Vec<TranscriptEntry>,
    next_sequence: u64,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry and return its sequence number.
    pub fn push(&mut self, role: Role, text: impl Into<String>) -> u64 {
        let sequence = self.next_sequence;
        self.next_sequence += 1;
        self.entries.push(TranscriptEntry {
            role,
            text: text.into(),
            sequence,
        });
        sequence
    }

    /// Entries in insertion order.
    pub fn entries(&self) -> &[TranscriptEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Discard the whole transcript.  The only sanctioned mutation besides
    /// appending — used when the session returns to configuration.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.next_sequence = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entries_keep_insertion_order_and_sequence() {
        let mut t = Transcript::new();
        t.push(Role::System, "welcome");
        t.push(Role::User, "hi");
        t.push(Role::Bot, "hello");

        let seqs: Vec<u64> = t.entries().iter().map(|e| e.sequence).collect();
        assert_eq!(seqs, vec![0, 1, 2]);
        let roles: Vec<Role> = t.entries().iter().map(|e| e.role).collect();
        assert_eq!(roles, vec![Role::System, Role::User, Role::Bot]);
    }

    #[test]
    fn clear_empties_and_restarts() {
        let mut t = Transcript::new();
        t.push(Role::User, "one");
        t.clear();
        assert!(t.is_empty());
        assert_eq!(t.push(Role::System, "again"), 0);
    }

    #[test]
    fn role_display_is_lowercase() {
        assert_eq!(Role::User.to_string(), "user");
        assert_eq!(Role::Bot.to_string(), "bot");
        assert_eq!(Role::System.to_string(), "system");
    }
}
