use std::collections::VecDeque;
use std::sync::Arc;

use jobwatch_core::{transition, SessionEffect, SessionMsg, SessionState};
use watch_logging::{watch_debug, watch_info, watch_warn};

use crate::render::{BrowserProfile, RenderEngine, RenderSession};
use crate::{RenderError, SessionError};

/// Owns the one rendering-engine instance and carries out the session state
/// machine's effects. An instance is always replaced, never repaired.
pub struct BrowserSessionManager {
    engine: Arc<dyn RenderEngine>,
    profile: BrowserProfile,
    state: SessionState,
    session: Option<Box<dyn RenderSession>>,
    launches: u64,
}

impl BrowserSessionManager {
    pub fn new(engine: Arc<dyn RenderEngine>, profile: BrowserProfile) -> Self {
        Self {
            engine,
            profile,
            state: SessionState::Absent,
            session: None,
            launches: 0,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Number of instances launched so far.
    pub fn launches(&self) -> u64 {
        self.launches
    }

    /// First launch at process start. The caller treats failure as fatal.
    pub async fn start(&mut self) -> Result<(), SessionError> {
        watch_info!("starting rendering engine");
        self.ensure_live().await
    }

    /// Probes the current instance and restarts it when the probe fails or
    /// nothing is running.
    pub async fn ensure_live(&mut self) -> Result<(), SessionError> {
        let alive = match self.session.as_mut() {
            Some(session) if self.state == SessionState::Ready => match session.current_url().await {
                Ok(_) => true,
                Err(err) => {
                    watch_warn!("liveness probe failed: {}", err);
                    false
                }
            },
            _ => false,
        };
        if !alive && self.state != SessionState::Absent {
            watch_info!("restarting rendering engine");
        }
        self.dispatch(SessionMsg::Probed { alive }).await
    }

    /// Unconditional restart used to bound engine memory growth.
    pub async fn recycle(&mut self) -> Result<(), SessionError> {
        watch_info!("recycling rendering engine after {} launches", self.launches);
        self.dispatch(SessionMsg::RecycleRequested).await
    }

    /// Tears the instance down after a transport-level render failure. The
    /// next [`ensure_live`](Self::ensure_live) launches a replacement.
    pub async fn mark_crashed(&mut self) {
        // Only releases; cannot fail.
        let _ = self.dispatch(SessionMsg::RenderCrashed).await;
    }

    pub async fn shutdown(&mut self) {
        // Only releases; cannot fail.
        let _ = self.dispatch(SessionMsg::ShutdownRequested).await;
        watch_info!("rendering engine shut down");
    }

    /// The live instance, present only in [`SessionState::Ready`].
    pub fn session_mut(&mut self) -> Option<&mut (dyn RenderSession + 'static)> {
        self.session.as_deref_mut()
    }

    async fn dispatch(&mut self, msg: SessionMsg) -> Result<(), SessionError> {
        let mut pending = VecDeque::from([msg]);
        let mut launch_error: Option<RenderError> = None;

        while let Some(msg) = pending.pop_front() {
            let (next, effects) = transition(self.state, msg);
            if next != self.state {
                watch_debug!("session {:?} -> {:?} on {:?}", self.state, next, msg);
            }
            self.state = next;

            for effect in effects {
                match effect {
                    SessionEffect::Release => {
                        self.release().await;
                        pending.push_back(SessionMsg::Released);
                    }
                    SessionEffect::Launch => match self.engine.launch(&self.profile).await {
                        Ok(session) => {
                            self.session = Some(session);
                            self.launches += 1;
                            pending.push_back(SessionMsg::LaunchSucceeded);
                        }
                        Err(err) => {
                            watch_warn!("rendering engine launch failed: {}", err);
                            launch_error = Some(err);
                            pending.push_back(SessionMsg::LaunchFailed);
                        }
                    },
                }
            }
        }

        match launch_error {
            Some(err) => Err(SessionError::EngineUnavailable(err)),
            None => Ok(()),
        }
    }

    async fn release(&mut self) {
        if let Some(session) = self.session.take() {
            session.close().await;
        }
    }
}
