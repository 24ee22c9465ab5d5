//! Progress composition across the transfer and completion phases.

/// Which part of an operation a raw 0..=100 value belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressPhase {
    /// Archive upload; first half of install/upgrade progress.
    Transfer,
    /// Device-side install/upgrade; second half.
    Completion,
    /// Operations with a single phase, such as uninstall.
    Whole,
}

impl ProgressPhase {
    /// Map a raw phase percentage onto overall operation progress.
    pub fn overall(self, raw: u8) -> u8 {
        let raw = raw.min(100);
        match self {
            Self::Transfer => raw / 2,
            Self::Completion => 50 + raw / 2,
            Self::Whole => raw,
        }
    }
}

/// Forwards mapped progress to the caller's optional callback.
pub(crate) struct ProgressReporter<'a> {
    callback: Option<&'a mut (dyn FnMut(u8) + Send)>,
}

impl<'a> ProgressReporter<'a> {
    pub(crate) fn new(callback: Option<&'a mut (dyn FnMut(u8) + Send)>) -> Self {
        Self { callback }
    }

    pub(crate) fn report(&mut self, phase: ProgressPhase, raw: u8) {
        if let Some(callback) = self.callback.as_deref_mut() {
            callback(phase.overall(raw));
        }
    }
}
