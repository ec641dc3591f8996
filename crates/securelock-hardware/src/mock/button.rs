//! Mock maintenance button.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::{Result, traits::MaintenanceButton};

/// Button whose level is set through a [`MockButtonHandle`].
#[derive(Debug)]
pub struct MockButton {
    pressed: Arc<AtomicBool>,
}

impl MockButton {
    pub fn new() -> (Self, MockButtonHandle) {
        let pressed = Arc::new(AtomicBool::new(false));
        (
            Self {
                pressed: Arc::clone(&pressed),
            },
            MockButtonHandle { pressed },
        )
    }
}

impl MaintenanceButton for MockButton {
    fn is_pressed(&mut self) -> Result<bool> {
        Ok(self.pressed.load(Ordering::SeqCst))
    }
}

/// Handle for pressing and releasing a [`MockButton`].
#[derive(Debug, Clone)]
pub struct MockButtonHandle {
    pressed: Arc<AtomicBool>,
}

impl MockButtonHandle {
    pub fn press(&self) {
        self.pressed.store(true, Ordering::SeqCst);
    }

    pub fn release(&self) {
        self.pressed.store(false, Ordering::SeqCst);
    }

    pub fn is_pressed(&self) -> bool {
        self.pressed.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_press_and_release() {
        let (mut button, handle) = MockButton::new();
        assert!(!button.is_pressed().unwrap());

        handle.press();
        assert!(button.is_pressed().unwrap());

        handle.release();
        assert!(!button.is_pressed().unwrap());
    }
}
