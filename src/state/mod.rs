#[cfg(test)]
mod state_test;

use std::fmt;

use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tokio::time::Instant;

use crate::error::{Error, Result};

/// StreamPhase is the shape shared by the local (encode) and remote
/// (decode) state enums; transitions are defined on it once.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum StreamPhase {
    Stopped,
    Starting,
    Active,
    Frozen,
    Failed,
}

impl StreamPhase {
    /// can_transition_to reports whether `next` may follow `self`. Staying
    /// in the same phase is not a transition and is handled by the caller.
    pub fn can_transition_to(self, next: StreamPhase) -> bool {
        use StreamPhase::*;
        matches!(
            (self, next),
            (Stopped, Starting)
                | (Stopped, Failed)
                | (Starting, Active)
                | (Starting, Failed)
                | (Starting, Stopped)
                | (Active, Frozen)
                | (Active, Failed)
                | (Active, Stopped)
                | (Frozen, Active)
                | (Frozen, Failed)
                | (Frozen, Stopped)
                | (Failed, Stopped)
        )
    }
}

/// VideoStreamState is implemented by the local and remote state enums.
pub trait VideoStreamState:
    Copy + Eq + fmt::Debug + fmt::Display + Send + Sync + 'static
{
    /// Reason explains why a transition happened.
    type Reason: Copy + Default + PartialEq + fmt::Debug + Send + Sync + 'static;

    const STOPPED: Self;

    fn phase(&self) -> StreamPhase;

    fn invalid_transition(from: Self, to: Self) -> Error;
}

/// LocalVideoStreamState is the capture/encode state of a local track.
#[derive(Default, Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum LocalVideoStreamState {
    #[default]
    Stopped,
    Starting,
    Encoding,
    Frozen,
    Failed,
}

const LOCAL_VIDEO_STATE_STOPPED_STR: &str = "stopped";
const LOCAL_VIDEO_STATE_STARTING_STR: &str = "starting";
const LOCAL_VIDEO_STATE_ENCODING_STR: &str = "encoding";
const LOCAL_VIDEO_STATE_FROZEN_STR: &str = "frozen";
const LOCAL_VIDEO_STATE_FAILED_STR: &str = "failed";

impl From<&str> for LocalVideoStreamState {
    fn from(raw: &str) -> Self {
        match raw {
            LOCAL_VIDEO_STATE_STARTING_STR => LocalVideoStreamState::Starting,
            LOCAL_VIDEO_STATE_ENCODING_STR => LocalVideoStreamState::Encoding,
            LOCAL_VIDEO_STATE_FROZEN_STR => LocalVideoStreamState::Frozen,
            LOCAL_VIDEO_STATE_FAILED_STR => LocalVideoStreamState::Failed,
            _ => LocalVideoStreamState::Stopped,
        }
    }
}

impl fmt::Display for LocalVideoStreamState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match *self {
            LocalVideoStreamState::Stopped => LOCAL_VIDEO_STATE_STOPPED_STR,
            LocalVideoStreamState::Starting => LOCAL_VIDEO_STATE_STARTING_STR,
            LocalVideoStreamState::Encoding => LOCAL_VIDEO_STATE_ENCODING_STR,
            LocalVideoStreamState::Frozen => LOCAL_VIDEO_STATE_FROZEN_STR,
            LocalVideoStreamState::Failed => LOCAL_VIDEO_STATE_FAILED_STR,
        };
        write!(f, "{s}")
    }
}

/// LocalVideoStreamError is the reason attached to a local state change.
#[derive(Default, Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum LocalVideoStreamError {
    #[default]
    Ok,
    Failure,
    DeviceNoPermission,
    DeviceBusy,
    CaptureFailure,
    EncodeFailure,
}

impl VideoStreamState for LocalVideoStreamState {
    type Reason = LocalVideoStreamError;

    const STOPPED: Self = LocalVideoStreamState::Stopped;

    fn phase(&self) -> StreamPhase {
        match *self {
            LocalVideoStreamState::Stopped => StreamPhase::Stopped,
            LocalVideoStreamState::Starting => StreamPhase::Starting,
            LocalVideoStreamState::Encoding => StreamPhase::Active,
            LocalVideoStreamState::Frozen => StreamPhase::Frozen,
            LocalVideoStreamState::Failed => StreamPhase::Failed,
        }
    }

    fn invalid_transition(from: Self, to: Self) -> Error {
        Error::ErrInvalidLocalStateTransition { from, to }
    }
}

/// RemoteVideoStreamState is the receive/decode state of a remote track.
#[derive(Default, Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RemoteVideoStreamState {
    #[default]
    Stopped,
    Starting,
    Decoding,
    Frozen,
    Failed,
}

const REMOTE_VIDEO_STATE_STOPPED_STR: &str = "stopped";
const REMOTE_VIDEO_STATE_STARTING_STR: &str = "starting";
const REMOTE_VIDEO_STATE_DECODING_STR: &str = "decoding";
const REMOTE_VIDEO_STATE_FROZEN_STR: &str = "frozen";
const REMOTE_VIDEO_STATE_FAILED_STR: &str = "failed";

impl From<&str> for RemoteVideoStreamState {
    fn from(raw: &str) -> Self {
        match raw {
            REMOTE_VIDEO_STATE_STARTING_STR => RemoteVideoStreamState::Starting,
            REMOTE_VIDEO_STATE_DECODING_STR => RemoteVideoStreamState::Decoding,
            REMOTE_VIDEO_STATE_FROZEN_STR => RemoteVideoStreamState::Frozen,
            REMOTE_VIDEO_STATE_FAILED_STR => RemoteVideoStreamState::Failed,
            _ => RemoteVideoStreamState::Stopped,
        }
    }
}

impl fmt::Display for RemoteVideoStreamState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match *self {
            RemoteVideoStreamState::Stopped => REMOTE_VIDEO_STATE_STOPPED_STR,
            RemoteVideoStreamState::Starting => REMOTE_VIDEO_STATE_STARTING_STR,
            RemoteVideoStreamState::Decoding => REMOTE_VIDEO_STATE_DECODING_STR,
            RemoteVideoStreamState::Frozen => REMOTE_VIDEO_STATE_FROZEN_STR,
            RemoteVideoStreamState::Failed => REMOTE_VIDEO_STATE_FAILED_STR,
        };
        write!(f, "{s}")
    }
}

/// RemoteVideoStateReason is the reason attached to a remote state change.
#[derive(Default, Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RemoteVideoStateReason {
    #[default]
    Internal,
    NetworkCongestion,
    NetworkRecovery,
    LocalMuted,
    LocalUnmuted,
    RemoteMuted,
    RemoteUnmuted,
    RemoteOffline,
}

impl VideoStreamState for RemoteVideoStreamState {
    type Reason = RemoteVideoStateReason;

    const STOPPED: Self = RemoteVideoStreamState::Stopped;

    fn phase(&self) -> StreamPhase {
        match *self {
            RemoteVideoStreamState::Stopped => StreamPhase::Stopped,
            RemoteVideoStreamState::Starting => StreamPhase::Starting,
            RemoteVideoStreamState::Decoding => StreamPhase::Active,
            RemoteVideoStreamState::Frozen => StreamPhase::Frozen,
            RemoteVideoStreamState::Failed => StreamPhase::Failed,
        }
    }

    fn invalid_transition(from: Self, to: Self) -> Error {
        Error::ErrInvalidRemoteStateTransition { from, to }
    }
}

/// StateChange is what observers of a track's state receive.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct StateChange<S: VideoStreamState> {
    pub state: S,
    pub reason: S::Reason,
    pub at: Instant,
}

impl<S: VideoStreamState> StateChange<S> {
    fn new(state: S, reason: S::Reason) -> Self {
        StateChange {
            state,
            reason,
            at: Instant::now(),
        }
    }
}

/// StateMachine stores the current state of a track. It does not decide
/// transitions on its own; it checks the ones pushed into it against the
/// transition table and publishes accepted ones to subscribers.
pub struct StateMachine<S: VideoStreamState> {
    tx: watch::Sender<StateChange<S>>,
}

impl<S: VideoStreamState> Default for StateMachine<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: VideoStreamState> fmt::Debug for StateMachine<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StateMachine")
            .field("current", &*self.tx.borrow())
            .finish()
    }
}

impl<S: VideoStreamState> StateMachine<S> {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(StateChange::new(S::STOPPED, S::Reason::default()));
        StateMachine { tx }
    }

    pub fn state(&self) -> S {
        self.tx.borrow().state
    }

    pub fn current(&self) -> StateChange<S> {
        *self.tx.borrow()
    }

    /// subscribe returns a receiver that observes every accepted transition.
    pub fn subscribe(&self) -> watch::Receiver<StateChange<S>> {
        self.tx.subscribe()
    }

    /// transition moves to `next` if the table allows it. Returns Ok(false)
    /// when already in `next`.
    pub fn transition(&self, next: S, reason: S::Reason) -> Result<bool> {
        self.transition_if(next, reason, |_| Ok(()))
    }

    /// transition_if is transition with an extra precondition on the current
    /// state, evaluated under the same lock as the update. An error from the
    /// precondition is returned as is.
    pub(crate) fn transition_if(
        &self,
        next: S,
        reason: S::Reason,
        precondition: impl FnOnce(S) -> Result<()>,
    ) -> Result<bool> {
        let mut outcome = Ok(false);
        self.tx.send_if_modified(|current| {
            let from = current.state;
            if from == next {
                return false;
            }
            if !from.phase().can_transition_to(next.phase()) {
                outcome = Err(S::invalid_transition(from, next));
                return false;
            }
            if let Err(err) = precondition(from) {
                outcome = Err(err);
                return false;
            }
            *current = StateChange::new(next, reason);
            outcome = Ok(true);
            true
        });

        match &outcome {
            Ok(true) => log::debug!("video stream state -> {} ({:?})", next, reason),
            Err(err) => log::warn!("rejected video stream state change: {}", err),
            Ok(false) => {}
        }
        outcome
    }

    /// stop moves to the stopped state from anywhere. Returns false when
    /// already stopped.
    pub fn stop(&self, reason: S::Reason) -> bool {
        let changed = self.tx.send_if_modified(|current| {
            if current.state == S::STOPPED {
                return false;
            }
            *current = StateChange::new(S::STOPPED, reason);
            true
        });
        if changed {
            log::debug!("video stream state -> {} ({:?})", S::STOPPED, reason);
        }
        changed
    }
}
