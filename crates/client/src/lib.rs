//! Client side of the hire desk wizard: the HTTP binding for the
//! backend API and the session driver that runs the wizard against
//! any [`hiredesk_core::HireApi`] implementation.
//!
//! [`session::WizardSession`] is the piece front ends embed. It wires
//! the pure state machine to a backend, applies the staleness rules to
//! every response, and leaves an audit trail of the whole capture.

pub mod http;
pub mod schema;
pub mod session;

pub use http::HttpHireApi;
pub use session::WizardSession;
