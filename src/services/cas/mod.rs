//! CAS single sign-on / single sign-out binding for local sessions.

pub mod client;
pub mod correlator;
pub mod logout_url;
pub mod session_index;
pub mod slo_parser;
pub mod ticket_relay;
pub mod types;
pub mod urls;
pub mod validation;

pub use client::{CasClient, CasError, CasPrincipal, HttpCasClient};
pub use correlator::{SessionCorrelator, SloOutcome};
pub use logout_url::{LogoutPolicy, LogoutUrlParam};
pub use ticket_relay::TicketRelay;
pub use types::{AttemptId, SessionIndex};
