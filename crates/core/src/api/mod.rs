pub mod fixture;

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::domain::accessory::AccessorySelection;
use crate::domain::customer::{Contact, Customer, CustomerId, Site};
use crate::domain::equipment::{EquipmentLine, EquipmentSearchResults, SearchMode};
use crate::domain::interaction::{InteractionSubmission, SubmissionReceipt};
use crate::errors::ApiError;

pub use self::fixture::FixtureHireApi;

/// Backend surface the wizard drives. Everything the wizard knows about
/// the outside world comes through these six calls, which keeps the
/// state machine testable against a deterministic double.
#[async_trait]
pub trait HireApi: Send + Sync {
    async fn search_customers(&self, query: &str) -> Result<Vec<Customer>, ApiError>;

    async fn customer_contacts(&self, customer_id: CustomerId) -> Result<Vec<Contact>, ApiError>;

    async fn customer_sites(&self, customer_id: CustomerId) -> Result<Vec<Site>, ApiError>;

    /// Searches the catalogue (generic mode) or the fleet (specific
    /// mode). `hire_start` narrows specific searches to units free on
    /// that date.
    async fn search_equipment(
        &self,
        mode: SearchMode,
        query: &str,
        hire_start: Option<NaiveDate>,
    ) -> Result<EquipmentSearchResults, ApiError>;

    /// Derives the default accessory rows for the given equipment
    /// lines. The returned rows replace whatever default rows the
    /// caller currently holds.
    async fn auto_accessories(
        &self,
        equipment: &[EquipmentLine],
    ) -> Result<Vec<AccessorySelection>, ApiError>;

    async fn submit_interaction(
        &self,
        submission: &InteractionSubmission,
    ) -> Result<SubmissionReceipt, ApiError>;
}
