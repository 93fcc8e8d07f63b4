use std::sync::atomic::{AtomicBool, Ordering};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataMode {
    Live,
    Mock,
}

/// Decides whether calls go to the backend. Live only when the backend
/// answered its last health probe, the host reports network access and mock
/// mode is not forced.
#[derive(Debug)]
pub struct Connectivity {
    backend_reachable: AtomicBool,
    online: AtomicBool,
    force_mock: bool,
}

impl Connectivity {
    pub fn new(force_mock: bool) -> Self {
        Self {
            backend_reachable: AtomicBool::new(false),
            online: AtomicBool::new(true),
            force_mock,
        }
    }

    pub fn force_mock(&self) -> bool {
        self.force_mock
    }

    pub fn set_online(&self, online: bool) {
        self.online.store(online, Ordering::SeqCst);
    }

    /// Returns the previous value.
    pub fn set_backend_reachable(&self, reachable: bool) -> bool {
        self.backend_reachable.swap(reachable, Ordering::SeqCst)
    }

    pub fn mode(&self) -> DataMode {
        let live = self.backend_reachable.load(Ordering::SeqCst)
            && self.online.load(Ordering::SeqCst)
            && !self.force_mock;
        if live {
            DataMode::Live
        } else {
            DataMode::Mock
        }
    }

    pub fn is_live(&self) -> bool {
        self.mode() == DataMode::Live
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_live_needs_every_condition() {
        let connectivity = Connectivity::new(false);
        assert_eq!(connectivity.mode(), DataMode::Mock);

        assert!(!connectivity.set_backend_reachable(true));
        assert!(connectivity.is_live());

        connectivity.set_online(false);
        assert_eq!(connectivity.mode(), DataMode::Mock);
        connectivity.set_online(true);
        assert!(connectivity.is_live());

        let forced = Connectivity::new(true);
        forced.set_backend_reachable(true);
        assert_eq!(forced.mode(), DataMode::Mock);
    }
}
