//! services/api/src/web/state.rs
//!
//! Defines the application's shared and connection-specific states.

use crate::config::Config;
use hunt_core::ports::{HuntRepository, SessionTokenService};
use hunt_core::progression::Progression;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

//=========================================================================================
// AppState (Shared Across All Connections)
//=========================================================================================

/// The shared application state, created once at startup and passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    pub repo: Arc<dyn HuntRepository>,
    pub tokens: Arc<dyn SessionTokenService>,
    pub config: Arc<Config>,
    /// Cancelled once when the process is asked to stop; open sockets watch it.
    pub shutdown: CancellationToken,
}

impl AppState {
    pub fn progression(&self) -> Progression {
        Progression::new(self.repo.clone(), self.tokens.clone())
    }
}

//=========================================================================================
// ConnectionState (Specific to One WebSocket Connection)
//=========================================================================================

/// What a socket connection is allowed to do, fixed at upgrade time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionRole {
    Player,
    Admin,
}

#[derive(Debug, Clone)]
pub struct ConnectionState {
    pub connection_id: Uuid,
    pub role: ConnectionRole,
}

impl ConnectionState {
    pub fn new(role: ConnectionRole) -> Self {
        Self {
            connection_id: Uuid::new_v4(),
            role,
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role == ConnectionRole::Admin
    }
}
