/// Opaque ticket for one requested display frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameHandle(u64);

/// Single-slot frame scheduler, fired by the run loop once per display refresh.
///
/// Requesting a frame replaces any frame already pending, so at most one tick
/// is ever queued.
#[derive(Debug, Default)]
pub struct FrameScheduler {
    next_id: u64,
    pending: Option<FrameHandle>,
    requests: u64,
    cancels: u64,
}

impl FrameScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a frame for the next refresh.
    pub fn request(&mut self) -> FrameHandle {
        self.next_id += 1;
        let handle = FrameHandle(self.next_id);
        self.pending = Some(handle);
        self.requests += 1;
        handle
    }

    /// Drop the pending frame if it is still `handle`.
    pub fn cancel(&mut self, handle: FrameHandle) {
        if self.pending == Some(handle) {
            self.pending = None;
            self.cancels += 1;
        }
    }

    /// Hand out the pending frame for this refresh, if any.
    pub fn fire(&mut self) -> Option<FrameHandle> {
        self.pending.take()
    }

    pub fn pending(&self) -> Option<FrameHandle> {
        self.pending
    }

    /// Total frames ever requested.
    pub fn requests(&self) -> u64 {
        self.requests
    }

    /// Total frames cancelled before they fired.
    pub fn cancels(&self) -> u64 {
        self.cancels
    }
}
