// Scroll direction tracking from successive page offsets.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum ScrollDirection {
    #[default]
    Down,
    Up,
}

impl ScrollDirection {
    /// Value written to the direction uniform: +1 down, -1 up.
    pub fn sign(&self) -> f32 {
        match self {
            ScrollDirection::Down => 1.0,
            ScrollDirection::Up => -1.0,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ScrollTracker {
    last_offset: f64,
    direction: ScrollDirection,
}

impl ScrollTracker {
    pub fn new(initial_offset: f64) -> Self {
        ScrollTracker {
            last_offset: initial_offset,
            direction: ScrollDirection::Down,
        }
    }

    /// Record a new vertical offset. An unchanged offset keeps the previous direction.
    pub fn update(&mut self, offset: f64) -> ScrollDirection {
        if offset > self.last_offset {
            self.direction = ScrollDirection::Down;
        } else if offset < self.last_offset {
            self.direction = ScrollDirection::Up;
        }
        self.last_offset = offset;
        self.direction
    }

    pub fn direction(&self) -> ScrollDirection {
        self.direction
    }

    pub fn offset(&self) -> f64 {
        self.last_offset
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tracks_direction_changes() {
        let mut tracker = ScrollTracker::new(0.0);
        assert_eq!(tracker.update(120.0), ScrollDirection::Down);
        assert_eq!(tracker.update(80.0), ScrollDirection::Up);
        assert_eq!(tracker.update(80.0), ScrollDirection::Up);
        assert_eq!(tracker.direction().sign(), -1.0);
        assert_eq!(tracker.offset(), 80.0);
    }
}
