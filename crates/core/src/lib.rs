//! Core state machine and domain model for the hire desk interaction
//! wizard.
//!
//! The wizard walks a desk operator through capturing a customer
//! interaction: pick the interaction type, identify the customer and
//! their contact and site, build an equipment basket with its derived
//! accessories, capture delivery details, then review and submit. The
//! shape of the flow depends on the interaction type, every dependent
//! selection resets when its parent changes, and responses from the
//! backend are discarded whenever they no longer match the state that
//! requested them.
//!
//! This crate is transport-agnostic: the backend is abstracted behind
//! [`api::HireApi`], with a deterministic fixture implementation for
//! tests and smoke runs. The HTTP binding lives in `hiredesk-client`.

pub mod api;
pub mod audit;
pub mod config;
pub mod domain;
pub mod errors;
pub mod wizard;

pub use api::{FixtureHireApi, HireApi};
pub use audit::{
    AuditCategory, AuditContext, AuditEvent, AuditOutcome, AuditSink, InMemoryAuditSink,
    NoopAuditSink,
};
pub use config::{AppConfig, ConfigError, ConfigOverrides, LoadOptions, LogFormat};
pub use domain::accessory::{Accessory, AccessoryId, AccessoryKind, AccessorySelection};
pub use domain::customer::{Contact, ContactId, Customer, CustomerId, Site, SiteId};
pub use domain::equipment::{
    EquipmentLine, EquipmentSearchResults, EquipmentSelection, EquipmentType, EquipmentTypeId,
    EquipmentUnit, EquipmentUnitId, SearchMode,
};
pub use domain::interaction::{
    AccessoryBooking, ContactMethod, EquipmentBooking, InteractionProfile, InteractionSubmission,
    InteractionType, SubmissionReceipt,
};
pub use errors::{ApiError, SessionError, WizardError};
pub use wizard::{AccessoryRequest, LookupDisposition, PendingOps, WizardState, WizardStep};
