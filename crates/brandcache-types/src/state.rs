/// Process-wide lifecycle flags of the brand service.
///
/// ```text
/// {false,false} --open ok--> {true,false} --cycle ok--> {true,true}
///      ^   |                      ^                          |
///      |   +--open failed---------+-----begin_rebuild--------+
///      +------------------------shut_down--------------------+
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ServiceState {
    /// The store has been confirmed openable.
    pub initialised: bool,
    /// A full ingestion + reconciliation cycle has completed.
    pub data_loaded: bool,
}

impl ServiceState {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            initialised: false,
            data_loaded: false,
        }
    }

    /// Both flags are set: the snapshot is complete and servable.
    #[must_use]
    pub const fn is_ready(self) -> bool {
        self.initialised && self.data_loaded
    }

    /// A rebuild has started; the snapshot is about to be discarded.
    pub fn begin_rebuild(&mut self) {
        self.data_loaded = false;
    }

    pub fn mark_opened(&mut self) {
        self.initialised = true;
    }

    pub fn mark_open_failed(&mut self) {
        self.initialised = false;
        self.data_loaded = false;
    }

    /// A cycle finished cleanly. Has no effect unless the store is open.
    pub fn finish_rebuild(&mut self) {
        if self.initialised {
            self.data_loaded = true;
        }
    }

    pub fn shut_down(&mut self) {
        self.initialised = false;
        self.data_loaded = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_unset() {
        let state = ServiceState::new();
        assert!(!state.initialised);
        assert!(!state.data_loaded);
        assert!(!state.is_ready());
    }

    #[test]
    fn full_lifecycle() {
        let mut state = ServiceState::new();
        state.mark_opened();
        assert!(state.initialised && !state.data_loaded);
        state.finish_rebuild();
        assert!(state.is_ready());
        state.begin_rebuild();
        assert!(state.initialised && !state.data_loaded);
        state.finish_rebuild();
        state.shut_down();
        assert_eq!(state, ServiceState::new());
    }

    #[test]
    fn finish_without_open_stays_unloaded() {
        let mut state = ServiceState::new();
        state.finish_rebuild();
        assert!(!state.data_loaded);
    }

    #[test]
    fn open_failure_clears_both() {
        let mut state = ServiceState {
            initialised: true,
            data_loaded: true,
        };
        state.mark_open_failed();
        assert_eq!(state, ServiceState::new());
    }
}
