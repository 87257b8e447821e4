pub mod lookups;
pub mod selections;
pub mod state;
pub mod steps;
pub mod submission;

pub use lookups::{
    ContactLookupTicket, CustomerLookups, CustomerSearchTicket, EquipmentSearchTicket,
    LookupDisposition, SiteLookupTicket,
};
pub use selections::AccessoryRequest;
pub use state::{PendingOps, WizardState};
pub use steps::{step_at, step_sequence, total_steps, WizardStep};
