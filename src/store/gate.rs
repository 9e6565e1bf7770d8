/// Rendezvous between the minimum-skeleton timer and the first snapshot.
///
/// The loading skeleton must neither flicker (snapshot faster than the
/// minimum perceptible duration) nor linger (snapshot slower than it). The
/// skeleton clears when the second of the two events arrives; once `Open`,
/// every further snapshot clears it unconditionally.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadGate {
    /// Fresh attach cycle, neither event seen yet
    WaitingBoth,
    /// Timer elapsed first, waiting on the first snapshot
    TimerDone,
    /// First snapshot arrived early, waiting out the timer
    SnapshotDone,
    /// Rendezvous complete, steady state
    Open,
}

impl LoadGate {
    /// The minimum-duration timer fired. Returns true if the loading
    /// indicator must clear now.
    pub fn on_timer_fired(&mut self) -> bool {
        match self {
            LoadGate::WaitingBoth => {
                *self = LoadGate::TimerDone;
                false
            }
            LoadGate::SnapshotDone => {
                *self = LoadGate::Open;
                true
            }
            // A second timer event can only be a stale one
            LoadGate::TimerDone | LoadGate::Open => false,
        }
    }

    /// A snapshot arrived. Returns true if the loading indicator must
    /// clear now.
    pub fn on_snapshot(&mut self) -> bool {
        match self {
            LoadGate::WaitingBoth => {
                *self = LoadGate::SnapshotDone;
                false
            }
            LoadGate::TimerDone => {
                *self = LoadGate::Open;
                true
            }
            LoadGate::SnapshotDone => false,
            LoadGate::Open => true,
        }
    }

    pub fn is_open(&self) -> bool {
        matches!(self, LoadGate::Open)
    }
}
