pub mod error;

use std::fmt;
use std::sync::Arc;

use tonic::transport::{Channel, Endpoint};
use tracing::{debug, info};
use uuid::Uuid;

use crate::endpoint::Target;

use self::error::SessionError;

#[derive(Clone, Hash, PartialEq, Eq)]
pub struct SessionId(Arc<Uuid>);

impl SessionId {
    pub fn generate() -> Self {
        Self(Arc::new(Uuid::new_v4()))
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Debug for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SessionId({})", self.0)
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Observable lifecycle state of a [`ChannelSession`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Unconnected,
    Connected,
    Closed,
}

#[derive(Debug)]
enum Slot {
    Unconnected,
    Connected { target: Target, channel: Channel },
    Closed,
}

/// Owns at most one plaintext channel to a remote endpoint.
///
/// The channel is opened lazily by [`ensure_connected`](Self::ensure_connected) and reused by
/// later calls for the same [`Target`]. [`invalidate`](Self::invalidate) drops the channel so the
/// next call opens a fresh one, while [`close`](Self::close) is terminal: a closed session never
/// connects again and a new session has to be constructed instead.
///
/// A failed call made over the channel does not change the session state. Nothing is retried.
#[derive(Debug)]
pub struct ChannelSession {
    session_id: SessionId,
    slot: Slot,
}

impl ChannelSession {
    pub fn new() -> Self {
        Self {
            session_id: SessionId::generate(),
            slot: Slot::Unconnected,
        }
    }

    pub fn session_id(&self) -> &SessionId {
        &self.session_id
    }

    pub fn state(&self) -> SessionState {
        match self.slot {
            Slot::Unconnected => SessionState::Unconnected,
            Slot::Connected { .. } => SessionState::Connected,
            Slot::Closed => SessionState::Closed,
        }
    }

    /// The target of the live connection, if any.
    pub fn target(&self) -> Option<&Target> {
        match &self.slot {
            Slot::Connected { target, .. } => Some(target),
            _ => None,
        }
    }

    /// Return a channel to `target`, opening one if there is no live connection to it.
    ///
    /// A live connection to a different target is dropped and replaced, so a session never holds
    /// more than one connection. If connecting fails the session is left unconnected.
    pub async fn ensure_connected(&mut self, target: &Target) -> Result<Channel, SessionError> {
        match &self.slot {
            Slot::Closed => {
                return Err(SessionError::Closed {
                    session_id: self.session_id.clone(),
                });
            }
            Slot::Connected {
                target: current,
                channel,
            } if current == target => {
                debug!(session_id = %self.session_id, endpoint = %target, "Reusing channel");
                return Ok(channel.clone());
            }
            Slot::Connected {
                target: current, ..
            } => {
                info!(
                    session_id = %self.session_id,
                    previous = %current,
                    endpoint = %target,
                    "Endpoint changed, replacing channel"
                );
                self.slot = Slot::Unconnected;
            }
            Slot::Unconnected => {}
        }

        debug!(session_id = %self.session_id, endpoint = %target, "Opening plaintext channel");

        let channel = connect(target).await?;

        info!(session_id = %self.session_id, endpoint = %target, "Channel connected");

        self.slot = Slot::Connected {
            target: target.clone(),
            channel: channel.clone(),
        };

        Ok(channel)
    }

    /// Drop the live connection so the next [`ensure_connected`](Self::ensure_connected) opens a
    /// new one. Has no effect on an unconnected or closed session.
    pub fn invalidate(&mut self) {
        if let Slot::Connected { target, .. } = &self.slot {
            debug!(session_id = %self.session_id, endpoint = %target, "Channel invalidated");
            self.slot = Slot::Unconnected;
        }
    }

    /// Release the connection, if any, and move to the terminal closed state.
    pub fn close(&mut self) {
        if matches!(self.slot, Slot::Closed) {
            return;
        }

        debug!(session_id = %self.session_id, state = ?self.state(), "Closing channel session");
        self.slot = Slot::Closed;
    }
}

impl Default for ChannelSession {
    fn default() -> Self {
        Self::new()
    }
}

async fn connect(target: &Target) -> Result<Channel, SessionError> {
    let connect_err = |source| SessionError::Connect {
        target: target.clone(),
        source,
    };

    Endpoint::from_shared(target.uri())
        .map_err(connect_err)?
        .connect()
        .await
        .map_err(connect_err)
}
