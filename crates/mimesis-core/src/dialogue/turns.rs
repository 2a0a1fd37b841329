//! Round-robin turn scheduling over a roster of personas.

use crate::error::{PersonaError, Result};

/// Cycles through a fixed roster of participants.
///
/// The cursor always points at the participant who speaks next. It is kept
/// consistent across roster edits: removing a participant never causes the
/// next call to skip or repeat anyone.
#[derive(Debug, Clone, Default)]
pub struct TurnScheduler {
    participants: Vec<String>,
    cursor: usize,
}

impl TurnScheduler {
    pub fn new<I, S>(participants: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut scheduler = Self::default();
        for participant in participants {
            scheduler.add_participant(participant);
        }
        scheduler
    }

    pub fn participants(&self) -> &[String] {
        &self.participants
    }

    pub fn len(&self) -> usize {
        self.participants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.participants.is_empty()
    }

    /// Returns the participant whose turn it is and advances the cursor.
    pub fn next_participant(&mut self) -> Result<String> {
        if self.participants.is_empty() {
            return Err(PersonaError::EmptyRoster);
        }
        let speaker = self.participants[self.cursor].clone();
        self.cursor = (self.cursor + 1) % self.participants.len();
        Ok(speaker)
    }

    /// Returns the participant who speaks next without advancing.
    pub fn peek(&self) -> Option<&str> {
        self.participants.get(self.cursor).map(String::as_str)
    }

    /// Appends a participant at the end of the turn order.
    ///
    /// Returns `false` if the participant is already on the roster.
    pub fn add_participant(&mut self, participant: impl Into<String>) -> bool {
        let participant = participant.into();
        if self.participants.contains(&participant) {
            return false;
        }
        self.participants.push(participant);
        true
    }

    /// Removes a participant, returning `false` if it was not on the roster.
    pub fn remove_participant(&mut self, participant: &str) -> bool {
        let Some(index) = self.participants.iter().position(|p| p == participant) else {
            return false;
        };

        self.participants.remove(index);
        if index < self.cursor {
            self.cursor -= 1;
        }
        if self.participants.is_empty() {
            self.cursor = 0;
        } else {
            self.cursor %= self.participants.len();
        }
        true
    }

    /// Moves the cursor so that `participant` speaks next.
    pub fn seek(&mut self, participant: &str) -> bool {
        match self.participants.iter().position(|p| p == participant) {
            Some(index) => {
                self.cursor = index;
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn take(scheduler: &mut TurnScheduler, n: usize) -> Vec<String> {
        (0..n).map(|_| scheduler.next_participant().unwrap()).collect()
    }

    #[test]
    fn test_visits_everyone_in_order_then_repeats() {
        let mut scheduler = TurnScheduler::new(["Alice", "Bob", "Carol"]);
        assert_eq!(
            take(&mut scheduler, 6),
            vec!["Alice", "Bob", "Carol", "Alice", "Bob", "Carol"]
        );
    }

    #[test]
    fn test_empty_roster() {
        let mut scheduler = TurnScheduler::default();
        assert!(matches!(
            scheduler.next_participant(),
            Err(PersonaError::EmptyRoster)
        ));
    }

    #[test]
    fn test_remove_before_cursor_does_not_skip() {
        let mut scheduler = TurnScheduler::new(["Alice", "Bob", "Carol", "Dave"]);
        take(&mut scheduler, 2); // Alice, Bob
        assert!(scheduler.remove_participant("Alice"));
        assert_eq!(take(&mut scheduler, 3), vec!["Carol", "Dave", "Bob"]);
    }

    #[test]
    fn test_remove_at_cursor_moves_to_following() {
        let mut scheduler = TurnScheduler::new(["Alice", "Bob", "Carol"]);
        take(&mut scheduler, 1); // Alice
        assert!(scheduler.remove_participant("Bob"));
        assert_eq!(take(&mut scheduler, 2), vec!["Carol", "Alice"]);
    }

    #[test]
    fn test_remove_last_at_cursor_wraps() {
        let mut scheduler = TurnScheduler::new(["Alice", "Bob", "Carol"]);
        take(&mut scheduler, 2); // cursor on Carol
        assert!(scheduler.remove_participant("Carol"));
        assert_eq!(scheduler.peek(), Some("Alice"));
    }

    #[test]
    fn test_remove_everyone() {
        let mut scheduler = TurnScheduler::new(["Alice"]);
        assert!(scheduler.remove_participant("Alice"));
        assert!(!scheduler.remove_participant("Alice"));
        assert!(scheduler.is_empty());
        assert!(scheduler.next_participant().is_err());
    }

    #[test]
    fn test_add_ignores_duplicates() {
        let mut scheduler = TurnScheduler::new(["Alice"]);
        assert!(!scheduler.add_participant("Alice"));
        assert!(scheduler.add_participant("Bob"));
        assert_eq!(scheduler.len(), 2);
    }

    #[test]
    fn test_seek() {
        let mut scheduler = TurnScheduler::new(["Alice", "Bob", "Carol"]);
        assert!(scheduler.seek("Carol"));
        assert_eq!(take(&mut scheduler, 2), vec!["Carol", "Alice"]);
        assert!(!scheduler.seek("Zed"));
    }
}
