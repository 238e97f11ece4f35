// src/classify/buffer.rs

use crate::source::{RawNotification, RawOps};

/// Two-slot shift register over the most recent raw notifications.
///
/// Slot 0 holds the newest notification, slot 1 the one before it. An empty
/// slot answers `false` to every bit test.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LookbackBuffer {
    slots: [Option<RawNotification>; 2],
}

impl LookbackBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Shift slot 0 into slot 1 and store `raw` in slot 0. Whatever was in
    /// slot 1 is dropped.
    pub fn push(&mut self, raw: RawNotification) {
        self.slots[1] = self.slots[0].take();
        self.slots[0] = Some(raw);
    }

    pub fn clear(&mut self) {
        self.slots = [None, None];
    }

    pub fn slot0(&self) -> Option<&RawNotification> {
        self.slots[0].as_ref()
    }

    pub fn slot1(&self) -> Option<&RawNotification> {
        self.slots[1].as_ref()
    }

    pub fn slot0_has(&self, op: RawOps) -> bool {
        self.slot0().is_some_and(|n| n.has(op))
    }

    pub fn slot1_has(&self, op: RawOps) -> bool {
        self.slot1().is_some_and(|n| n.has(op))
    }

    pub fn is_empty(&self) -> bool {
        self.slots.iter().all(Option::is_none)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_shifts_and_drops_oldest() {
        let mut buf = LookbackBuffer::new();
        assert!(buf.is_empty());
        assert!(!buf.slot0_has(RawOps::CREATE));

        buf.push(RawNotification::new("/a", RawOps::CREATE));
        buf.push(RawNotification::new("/b", RawOps::REMOVE));
        buf.push(RawNotification::new("/c", RawOps::RENAME));

        assert_eq!(buf.slot0().unwrap().path.to_str(), Some("/c"));
        assert_eq!(buf.slot1().unwrap().path.to_str(), Some("/b"));
        assert!(buf.slot1_has(RawOps::REMOVE));

        buf.clear();
        assert!(buf.is_empty());
    }
}
