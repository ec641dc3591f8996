use std::time::Duration;

use tokio::time::Instant;

/// Turns a sampled button level into one toggle per long press.
///
/// Fires once when the button has been held for `hold`, not again until it
/// is released and pressed anew.
#[derive(Debug, Clone)]
pub struct LongPressDetector {
    hold: Duration,
    pressed_since: Option<Instant>,
    fired: bool,
}

impl LongPressDetector {
    pub fn new(hold: Duration) -> Self {
        Self {
            hold,
            pressed_since: None,
            fired: false,
        }
    }

    /// Feed one sample; true when a long press completes.
    pub fn update(&mut self, pressed: bool, now: Instant) -> bool {
        if !pressed {
            self.pressed_since = None;
            self.fired = false;
            return false;
        }

        let since = *self.pressed_since.get_or_insert(now);
        if !self.fired && now.saturating_duration_since(since) >= self.hold {
            self.fired = true;
            return true;
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HOLD: Duration = Duration::from_secs(3);

    #[test]
    fn test_fires_once_per_press() {
        let start = Instant::now();
        let mut detector = LongPressDetector::new(HOLD);

        assert!(!detector.update(true, start));
        assert!(!detector.update(true, start + Duration::from_millis(2999)));
        assert!(detector.update(true, start + HOLD));
        assert!(!detector.update(true, start + Duration::from_secs(10)));

        assert!(!detector.update(false, start + Duration::from_secs(11)));
        assert!(!detector.update(true, start + Duration::from_secs(12)));
        assert!(detector.update(true, start + Duration::from_secs(15)));
    }

    #[test]
    fn test_short_press_ignored() {
        let start = Instant::now();
        let mut detector = LongPressDetector::new(HOLD);

        assert!(!detector.update(true, start));
        assert!(!detector.update(false, start + Duration::from_secs(2)));
        assert!(!detector.update(true, start + Duration::from_secs(4)));
        assert!(!detector.update(true, start + Duration::from_secs(5)));
    }
}
