/// Lifecycle of the single rendering-engine instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionState {
    /// No instance owned.
    #[default]
    Absent,
    /// A launch is in progress; any previous instance has been released.
    Starting,
    Ready,
    /// A render call hit a transport-level failure; teardown pending.
    Crashed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionMsg {
    /// Result of the liveness probe. `alive: false` also covers "no instance".
    Probed { alive: bool },
    /// Cycle-count cadence reached: restart regardless of liveness.
    RecycleRequested,
    LaunchSucceeded,
    LaunchFailed,
    RenderCrashed,
    /// The owned instance has been closed and dropped.
    Released,
    ShutdownRequested,
}

/// Work the session owner must carry out, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEffect {
    Release,
    Launch,
}

/// Pure transition function: applies a message to the state and returns any effects.
pub fn transition(state: SessionState, msg: SessionMsg) -> (SessionState, Vec<SessionEffect>) {
    use SessionEffect::{Launch, Release};
    use SessionState::{Absent, Crashed, Ready, Starting};

    match (state, msg) {
        (Ready, SessionMsg::Probed { alive: true }) => (Ready, Vec::new()),
        (_, SessionMsg::Probed { .. }) | (_, SessionMsg::RecycleRequested) => {
            (Starting, vec![Release, Launch])
        }
        (Starting, SessionMsg::LaunchSucceeded) => (Ready, Vec::new()),
        (Starting, SessionMsg::LaunchFailed) => (Absent, Vec::new()),
        (Ready, SessionMsg::RenderCrashed) => (Crashed, vec![Release]),
        (Crashed, SessionMsg::Released) => (Absent, Vec::new()),
        (Absent, SessionMsg::ShutdownRequested) => (Absent, Vec::new()),
        (_, SessionMsg::ShutdownRequested) => (Absent, vec![Release]),
        (state, _) => (state, Vec::new()),
    }
}
