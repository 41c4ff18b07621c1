/*
 * Responsibility
 * - Shared context attached to the Router (AppState)
 *   - CAS settings, CAS client, local session store, correlator, ticket relay
 * - Cloned per request (everything inside is Arc)
 */
use std::sync::Arc;

use crate::config::CasConfig;
use crate::services::cas::{CasClient, SessionCorrelator, TicketRelay};
use crate::services::session::SessionStore;

#[derive(Clone)]
pub struct AppState {
    pub cas: Arc<CasConfig>,
    pub cas_client: Arc<dyn CasClient>,
    pub sessions: Arc<dyn SessionStore>,
    pub correlator: Arc<SessionCorrelator>,
    pub ticket_relay: Arc<TicketRelay>,
}

impl AppState {
    pub fn new(
        cas: Arc<CasConfig>,
        cas_client: Arc<dyn CasClient>,
        sessions: Arc<dyn SessionStore>,
        correlator: Arc<SessionCorrelator>,
        ticket_relay: Arc<TicketRelay>,
    ) -> Self {
        Self {
            cas,
            cas_client,
            sessions,
            correlator,
            ticket_relay,
        }
    }
}
