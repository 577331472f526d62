//! Serialized Command Queue
//!
//! FIFO of pending commands with an exclusive in-flight flag. At most one
//! command is ever written-but-unanswered; appending is allowed in any
//! state. The flag stays set from write until the response terminator is
//! observed, or until a write failure drops the command.

use std::collections::VecDeque;

use crate::command::Command;

/// Ordered pending commands plus the one-in-flight discipline
#[derive(Debug, Default)]
pub struct CommandQueue {
    pending: VecDeque<Command>,
    in_flight: bool,
}

impl CommandQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a command; allowed whether or not one is in flight.
    pub fn push(&mut self, command: Command) {
        self.pending.push_back(command);
    }

    /// Take the next command for dispatch, marking it in flight.
    /// Returns `None` while a command is already outstanding or the queue
    /// is empty.
    pub fn take_next(&mut self) -> Option<Command> {
        if self.in_flight {
            return None;
        }
        let command = self.pending.pop_front()?;
        self.in_flight = true;
        Some(command)
    }

    /// Clear the in-flight flag: the response terminator arrived, or the
    /// write failed and the command is dropped.
    pub fn clear_in_flight(&mut self) {
        self.in_flight = false;
    }

    pub fn in_flight(&self) -> bool {
        self.in_flight
    }

    /// True when no command is waiting (an in-flight command no longer
    /// counts as pending).
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use obd_codec::Pid;

    #[test]
    fn test_fifo_order() {
        let mut queue = CommandQueue::new();
        queue.push(Command::poll(Pid::Rpm));
        queue.push(Command::poll(Pid::Speed));

        let first = queue.take_next().unwrap();
        assert_eq!(first.as_str(), "010C");
        queue.clear_in_flight();
        let second = queue.take_next().unwrap();
        assert_eq!(second.as_str(), "010D");
    }

    #[test]
    fn test_single_in_flight() {
        let mut queue = CommandQueue::new();
        queue.push(Command::poll(Pid::Rpm));
        queue.push(Command::poll(Pid::Speed));

        assert!(queue.take_next().is_some());
        assert!(queue.in_flight());
        // Second dispatch blocked until the first completes
        assert!(queue.take_next().is_none());
        queue.clear_in_flight();
        assert!(!queue.in_flight());
        assert!(queue.take_next().is_some());
    }

    #[test]
    fn test_append_while_in_flight() {
        let mut queue = CommandQueue::new();
        queue.push(Command::poll(Pid::Rpm));
        assert!(queue.take_next().is_some());

        queue.push(Command::read_dtcs());
        assert_eq!(queue.len(), 1);
        assert!(queue.take_next().is_none());
    }
}
