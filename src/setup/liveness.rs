use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Shared "still mounted" flag for a controller.
///
/// Clones observe the same flag. Once [`teardown`](Self::teardown) is called,
/// responses that arrive afterwards must not touch controller state or emit
/// notices.
#[derive(Debug, Clone)]
pub struct Liveness {
    torn_down: Arc<AtomicBool>,
}

impl Default for Liveness {
    fn default() -> Self {
        Self::new()
    }
}

impl Liveness {
    pub fn new() -> Self {
        Self {
            torn_down: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn teardown(&self) {
        self.torn_down.store(true, Ordering::Release);
    }

    pub fn is_alive(&self) -> bool {
        !self.torn_down.load(Ordering::Acquire)
    }
}
