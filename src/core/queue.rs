//! Pending action queue and loop replay log.

use std::collections::VecDeque;

use crate::core::action::Action;

/// FIFO of pending actions plus the archive of executed ones used for loop
/// replay. Prepends exist for setup actions and for follow-ups synthesized
/// mid-tick that must run before the rest of the queue.
#[derive(Debug, Default)]
pub struct ActionQueue {
    pending: VecDeque<Action>,
    replay: Vec<Action>,
}

impl ActionQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_back(&mut self, action: Action) {
        self.pending.push_back(action);
    }

    pub fn push_front(&mut self, action: Action) {
        self.pending.push_front(action);
    }

    /// Prepend a block of actions, preserving the block's internal order.
    pub fn push_front_all(&mut self, actions: Vec<Action>) {
        for action in actions.into_iter().rev() {
            self.pending.push_front(action);
        }
    }

    pub fn pop_front(&mut self) -> Option<Action> {
        self.pending.pop_front()
    }

    pub fn peek(&self) -> Option<&Action> {
        self.pending.front()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn pending(&self) -> impl Iterator<Item = &Action> {
        self.pending.iter()
    }

    pub fn archive(&mut self, action: Action) {
        self.replay.push(action);
    }

    pub fn replay(&self) -> &[Action] {
        &self.replay
    }

    /// Move the replay log back into the pending queue. The log is rebuilt
    /// from scratch as the new cycle executes, so draining it is sufficient.
    pub fn refill_from_replay(&mut self) {
        self.pending.extend(self.replay.drain(..));
    }
}

#[cfg(test)]
mod tests {
    use super::ActionQueue;
    use crate::core::action::Action;

    fn pause(ms: u64) -> Action {
        Action::PauseFor { ms }
    }

    fn ms_of(action: &Action) -> u64 {
        match action {
            Action::PauseFor { ms } => *ms,
            _ => panic!("expected PauseFor"),
        }
    }

    #[test]
    fn fifo_order() {
        let mut queue = ActionQueue::new();
        queue.push_back(pause(1));
        queue.push_back(pause(2));
        assert_eq!(queue.pop_front().map(|a| ms_of(&a)), Some(1));
        assert_eq!(queue.pop_front().map(|a| ms_of(&a)), Some(2));
        assert!(queue.pop_front().is_none());
    }

    #[test]
    fn prepended_block_keeps_internal_order() {
        let mut queue = ActionQueue::new();
        queue.push_back(pause(9));
        queue.push_front_all(vec![pause(1), pause(2), pause(3)]);
        let order: Vec<u64> = queue.pending().map(ms_of).collect();
        assert_eq!(order, vec![1, 2, 3, 9]);
    }

    #[test]
    fn refill_moves_replay_log() {
        let mut queue = ActionQueue::new();
        queue.archive(pause(1));
        queue.archive(pause(2));
        assert!(queue.is_empty());
        queue.refill_from_replay();
        assert_eq!(queue.len(), 2);
        assert!(queue.replay().is_empty());
        let order: Vec<u64> = queue.pending().map(ms_of).collect();
        assert_eq!(order, vec![1, 2]);
    }
}
