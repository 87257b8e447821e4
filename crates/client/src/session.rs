//! Drives a [`WizardState`] against a [`HireApi`] backend.
//!
//! The session owns the request/response round trips the pure state
//! machine stays out of: it issues tickets, awaits the backend, feeds
//! responses back through the staleness checks, and records an audit
//! event for everything that happened. Lookups that come back for a
//! superseded request are dropped quietly; failures on the critical
//! path surface as [`SessionError`] so a front end can show
//! [`SessionError::user_message`] next to the step.

use std::sync::Arc;

use chrono::{NaiveDate, NaiveTime};
use tracing::{debug, info, warn};

use hiredesk_core::api::HireApi;
use hiredesk_core::audit::{
    AuditCategory, AuditContext, AuditEvent, AuditOutcome, AuditSink, NoopAuditSink,
};
use hiredesk_core::domain::accessory::{Accessory, AccessoryId, AccessoryKind};
use hiredesk_core::domain::customer::{Contact, Customer, Site};
use hiredesk_core::domain::equipment::{
    EquipmentType, EquipmentTypeId, EquipmentUnit, EquipmentUnitId, SearchMode,
};
use hiredesk_core::domain::interaction::{ContactMethod, InteractionType, SubmissionReceipt};
use hiredesk_core::errors::{ApiError, SessionError};
use hiredesk_core::wizard::{AccessoryRequest, LookupDisposition, WizardState};

pub struct WizardSession<A: HireApi> {
    state: WizardState,
    api: A,
    audit: Arc<dyn AuditSink>,
    context: AuditContext,
}

impl<A: HireApi> WizardSession<A> {
    pub fn new(api: A) -> Self {
        Self::with_audit(api, "hire-desk", Arc::new(NoopAuditSink))
    }

    pub fn with_audit(api: A, actor: impl Into<String>, audit: Arc<dyn AuditSink>) -> Self {
        let session = Self {
            state: WizardState::new(),
            api,
            audit,
            context: AuditContext::new(actor),
        };
        session.emit(
            AuditCategory::System,
            "session_started",
            AuditOutcome::Success,
            &[],
        );
        session
    }

    pub fn state(&self) -> &WizardState {
        &self.state
    }

    pub fn session_id(&self) -> &str {
        &self.context.session_id
    }

    pub fn correlation_id(&self) -> &str {
        &self.context.correlation_id
    }

    fn emit(
        &self,
        category: AuditCategory,
        event_type: &str,
        outcome: AuditOutcome,
        metadata: &[(&str, String)],
    ) {
        let mut event = AuditEvent::new(&self.context, category, event_type, outcome);
        for (key, value) in metadata {
            event = event.with_metadata(*key, value.clone());
        }
        self.audit.record(event);
    }

    /// Picks the interaction type and restarts the flow. Returns
    /// `false` when the type is not live yet; the wizard is untouched
    /// in that case.
    pub fn select_type(&mut self, interaction_type: InteractionType) -> bool {
        let accepted = self.state.select_type(interaction_type);
        if accepted {
            info!(
                interaction_type = interaction_type.label(),
                total_steps = self.state.total_steps(),
                "interaction type selected"
            );
            self.emit(
                AuditCategory::Flow,
                "type_selected",
                AuditOutcome::Success,
                &[("interaction_type", interaction_type.label().to_string())],
            );
        } else {
            debug!(
                interaction_type = interaction_type.label(),
                "interaction type is not available yet"
            );
            self.emit(
                AuditCategory::Flow,
                "type_selected",
                AuditOutcome::Rejected,
                &[("interaction_type", interaction_type.label().to_string())],
            );
        }
        accepted
    }

    pub fn advance(&mut self) -> Result<(), SessionError> {
        match self.state.advance() {
            Ok(()) => {
                debug!(step = self.state.current_step(), "advanced");
                self.emit(
                    AuditCategory::Flow,
                    "step_advanced",
                    AuditOutcome::Success,
                    &[("step", self.state.current_step().to_string())],
                );
                Ok(())
            }
            Err(error) => {
                self.emit(
                    AuditCategory::Flow,
                    "step_advanced",
                    AuditOutcome::Rejected,
                    &[("reason", error.to_string())],
                );
                Err(error.into())
            }
        }
    }

    pub fn retreat(&mut self) {
        self.state.retreat();
        debug!(step = self.state.current_step(), "stepped back");
    }

    pub fn jump_to_step(&mut self, target: usize) -> Result<(), SessionError> {
        match self.state.jump_to_step(target) {
            Ok(()) => {
                debug!(step = target, "jumped to step");
                self.emit(
                    AuditCategory::Flow,
                    "step_jumped",
                    AuditOutcome::Success,
                    &[("step", target.to_string())],
                );
                Ok(())
            }
            Err(error) => {
                self.emit(
                    AuditCategory::Flow,
                    "step_jumped",
                    AuditOutcome::Rejected,
                    &[("reason", error.to_string())],
                );
                Err(error.into())
            }
        }
    }

    pub async fn search_customers(
        &mut self,
        query: impl Into<String>,
    ) -> Result<LookupDisposition, SessionError> {
        let ticket = self.state.begin_customer_search(query);
        debug!(query = %ticket.query, "searching customers");

        let outcome = self.api.search_customers(&ticket.query).await;
        let failure = outcome.as_ref().err().cloned();
        let disposition = self.state.apply_customer_search(&ticket, outcome);
        match disposition {
            LookupDisposition::Applied => {
                self.emit(
                    AuditCategory::Lookup,
                    "customer_search",
                    AuditOutcome::Success,
                    &[
                        ("query", ticket.query.clone()),
                        ("results", self.state.customer_results().len().to_string()),
                    ],
                );
                Ok(disposition)
            }
            LookupDisposition::DiscardedStale => {
                debug!(query = %ticket.query, "discarded superseded customer search");
                self.emit(
                    AuditCategory::Lookup,
                    "customer_search",
                    AuditOutcome::Discarded,
                    &[("query", ticket.query.clone())],
                );
                Ok(disposition)
            }
            LookupDisposition::Failed => {
                let error = unexpected_failure(failure);
                warn!(query = %ticket.query, error = %error, "customer search failed");
                self.emit(
                    AuditCategory::Lookup,
                    "customer_search",
                    AuditOutcome::Failed,
                    &[("query", ticket.query.clone()), ("error", error.to_string())],
                );
                Err(error.into())
            }
        }
    }

    /// Commits a customer choice and fans out the contact and site
    /// lookups in parallel. A lookup failure here is not fatal: the
    /// dependent list stays empty and the operator can reselect the
    /// customer to retry.
    pub async fn choose_customer(&mut self, customer: Customer) {
        let customer_id = customer.id;
        let customer_name = customer.name.clone();
        let lookups = self.state.select_customer(customer);
        info!(customer_id = customer_id.0, customer = %customer_name, "customer selected");
        self.emit(
            AuditCategory::Lookup,
            "customer_selected",
            AuditOutcome::Success,
            &[("customer_id", customer_id.0.to_string())],
        );

        let (contacts, sites) = tokio::join!(
            self.api.customer_contacts(customer_id),
            self.api.customer_sites(customer_id),
        );

        let contact_failure = contacts.as_ref().err().cloned();
        match self.state.apply_contacts(&lookups.contacts, contacts) {
            LookupDisposition::Applied => {
                self.emit(
                    AuditCategory::Lookup,
                    "contacts_loaded",
                    AuditOutcome::Success,
                    &[
                        ("customer_id", customer_id.0.to_string()),
                        ("contacts", self.state.contact_options().len().to_string()),
                    ],
                );
            }
            LookupDisposition::DiscardedStale => {
                debug!(customer_id = customer_id.0, "discarded contacts for a superseded customer");
                self.emit(
                    AuditCategory::Lookup,
                    "contacts_loaded",
                    AuditOutcome::Discarded,
                    &[("customer_id", customer_id.0.to_string())],
                );
            }
            LookupDisposition::Failed => {
                let error = unexpected_failure(contact_failure);
                warn!(customer_id = customer_id.0, error = %error, "contact lookup failed");
                self.emit(
                    AuditCategory::Lookup,
                    "contacts_loaded",
                    AuditOutcome::Failed,
                    &[
                        ("customer_id", customer_id.0.to_string()),
                        ("error", error.to_string()),
                    ],
                );
            }
        }

        let site_failure = sites.as_ref().err().cloned();
        match self.state.apply_sites(&lookups.sites, sites) {
            LookupDisposition::Applied => {
                self.emit(
                    AuditCategory::Lookup,
                    "sites_loaded",
                    AuditOutcome::Success,
                    &[
                        ("customer_id", customer_id.0.to_string()),
                        ("sites", self.state.site_options().len().to_string()),
                    ],
                );
            }
            LookupDisposition::DiscardedStale => {
                debug!(customer_id = customer_id.0, "discarded sites for a superseded customer");
                self.emit(
                    AuditCategory::Lookup,
                    "sites_loaded",
                    AuditOutcome::Discarded,
                    &[("customer_id", customer_id.0.to_string())],
                );
            }
            LookupDisposition::Failed => {
                let error = unexpected_failure(site_failure);
                warn!(customer_id = customer_id.0, error = %error, "site lookup failed");
                self.emit(
                    AuditCategory::Lookup,
                    "sites_loaded",
                    AuditOutcome::Failed,
                    &[
                        ("customer_id", customer_id.0.to_string()),
                        ("error", error.to_string()),
                    ],
                );
            }
        }
    }

    pub fn choose_contact(&mut self, contact: Contact) {
        self.state.choose_contact(contact);
    }

    pub fn choose_site(&mut self, site: Site) {
        self.state.choose_site(site);
    }

    pub async fn search_equipment(
        &mut self,
        mode: SearchMode,
        query: impl Into<String>,
    ) -> Result<LookupDisposition, SessionError> {
        let ticket = self.state.begin_equipment_search(mode, query);
        debug!(mode = ?ticket.mode, query = %ticket.query, "searching equipment");

        let outcome = self
            .api
            .search_equipment(ticket.mode, &ticket.query, ticket.hire_start)
            .await;
        let failure = outcome.as_ref().err().cloned();
        let disposition = self.state.apply_equipment_search(&ticket, outcome);
        match disposition {
            LookupDisposition::Applied => {
                let results = self
                    .state
                    .equipment_results()
                    .map(|results| results.len())
                    .unwrap_or(0);
                self.emit(
                    AuditCategory::Lookup,
                    "equipment_search",
                    AuditOutcome::Success,
                    &[
                        ("query", ticket.query.clone()),
                        ("results", results.to_string()),
                    ],
                );
                Ok(disposition)
            }
            LookupDisposition::DiscardedStale => {
                debug!(query = %ticket.query, "discarded superseded equipment search");
                self.emit(
                    AuditCategory::Lookup,
                    "equipment_search",
                    AuditOutcome::Discarded,
                    &[("query", ticket.query.clone())],
                );
                Ok(disposition)
            }
            LookupDisposition::Failed => {
                let error = unexpected_failure(failure);
                warn!(query = %ticket.query, error = %error, "equipment search failed");
                self.emit(
                    AuditCategory::Lookup,
                    "equipment_search",
                    AuditOutcome::Failed,
                    &[("query", ticket.query.clone()), ("error", error.to_string())],
                );
                Err(error.into())
            }
        }
    }

    /// Adds a catalogue type to the basket and reruns the accessory
    /// derivation. The basket edit always sticks; an error reports
    /// only a failed derivation, which a later edit reruns.
    pub async fn add_generic_equipment(
        &mut self,
        equipment: EquipmentType,
    ) -> Result<(), SessionError> {
        let request = self.state.add_generic_equipment(equipment);
        self.recalculate_accessories(request).await
    }

    pub async fn add_unit_equipment(&mut self, unit: EquipmentUnit) -> Result<(), SessionError> {
        let request = self.state.add_unit_equipment(unit);
        self.recalculate_accessories(request).await
    }

    pub async fn set_generic_quantity(
        &mut self,
        type_id: EquipmentTypeId,
        quantity: u32,
    ) -> Result<(), SessionError> {
        let request = self.state.set_generic_quantity(type_id, quantity);
        self.recalculate_accessories(request).await
    }

    pub async fn remove_generic_equipment(
        &mut self,
        type_id: EquipmentTypeId,
    ) -> Result<(), SessionError> {
        let request = self.state.remove_generic_equipment(type_id);
        self.recalculate_accessories(request).await
    }

    pub async fn remove_unit_equipment(
        &mut self,
        unit_id: EquipmentUnitId,
    ) -> Result<(), SessionError> {
        let request = self.state.remove_unit_equipment(unit_id);
        self.recalculate_accessories(request).await
    }

    async fn recalculate_accessories(
        &mut self,
        request: Option<AccessoryRequest>,
    ) -> Result<(), SessionError> {
        // No request means the edit either was a no-op or emptied the
        // basket, and the defaults were already dropped in place.
        let Some(request) = request else {
            return Ok(());
        };

        debug!(equipment_lines = request.lines.len(), "recalculating accessories");
        let outcome = self.api.auto_accessories(&request.lines).await;
        let failure = outcome.as_ref().err().cloned();
        match self.state.apply_auto_accessories(&request, outcome) {
            LookupDisposition::Applied => {
                let default_rows = self
                    .state
                    .accessory_selections()
                    .iter()
                    .filter(|row| row.kind == AccessoryKind::Default)
                    .count();
                self.emit(
                    AuditCategory::Derivation,
                    "accessories_recalculated",
                    AuditOutcome::Success,
                    &[
                        ("equipment_lines", request.lines.len().to_string()),
                        ("default_rows", default_rows.to_string()),
                    ],
                );
                Ok(())
            }
            LookupDisposition::DiscardedStale => {
                debug!("discarded accessory derivation for a superseded basket");
                self.emit(
                    AuditCategory::Derivation,
                    "accessories_recalculated",
                    AuditOutcome::Discarded,
                    &[("equipment_lines", request.lines.len().to_string())],
                );
                Ok(())
            }
            LookupDisposition::Failed => {
                let error = unexpected_failure(failure);
                warn!(error = %error, "accessory derivation failed, keeping previous rows");
                self.emit(
                    AuditCategory::Derivation,
                    "accessories_recalculated",
                    AuditOutcome::Failed,
                    &[("error", error.to_string())],
                );
                Err(error.into())
            }
        }
    }

    pub fn add_optional_accessory(&mut self, accessory: &Accessory) {
        self.state.add_optional_accessory(accessory);
    }

    pub fn increment_accessory(&mut self, accessory_id: AccessoryId, kind: AccessoryKind) {
        self.state.increment_accessory(accessory_id, kind);
    }

    pub fn decrement_accessory(&mut self, accessory_id: AccessoryId, kind: AccessoryKind) {
        self.state.decrement_accessory(accessory_id, kind);
    }

    pub fn set_delivery_date(&mut self, date: Option<NaiveDate>) {
        self.state.set_delivery_date(date);
    }

    pub fn set_delivery_time(&mut self, time: Option<NaiveTime>) {
        self.state.set_delivery_time(time);
    }

    pub fn set_hire_start_date(&mut self, date: Option<NaiveDate>) {
        self.state.set_hire_start_date(date);
    }

    pub fn set_hire_end_date(&mut self, date: Option<NaiveDate>) {
        self.state.set_hire_end_date(date);
    }

    pub fn set_contact_method(&mut self, method: ContactMethod) {
        self.state.set_contact_method(method);
    }

    pub fn set_notes(&mut self, notes: impl Into<String>) {
        self.state.set_notes(notes);
    }

    /// Validates, submits, and reports the receipt. On failure the
    /// wizard keeps everything so the operator can correct and
    /// resubmit.
    pub async fn submit(&mut self) -> Result<SubmissionReceipt, SessionError> {
        let submission = match self.state.begin_submission() {
            Ok(submission) => submission,
            Err(error) => {
                debug!(error = %error, "submission blocked");
                self.emit(
                    AuditCategory::Submission,
                    "submission_blocked",
                    AuditOutcome::Rejected,
                    &[("reason", error.to_string())],
                );
                return Err(error.into());
            }
        };

        info!(
            interaction_type = submission.interaction_type.label(),
            equipment_rows = submission.equipment.len(),
            accessory_rows = submission.accessories.len(),
            "submitting interaction"
        );
        let outcome = self.api.submit_interaction(&submission).await;
        self.state.finish_submission();

        match outcome {
            Ok(receipt) => {
                info!(reference = %receipt.reference_number, "interaction submitted");
                self.emit(
                    AuditCategory::Submission,
                    "interaction_submitted",
                    AuditOutcome::Success,
                    &[("reference", receipt.reference_number.clone())],
                );
                Ok(receipt)
            }
            Err(error) => {
                warn!(error = %error, "submission failed, state kept for resubmission");
                self.emit(
                    AuditCategory::Submission,
                    "interaction_submitted",
                    AuditOutcome::Failed,
                    &[("error", error.to_string())],
                );
                Err(error.into())
            }
        }
    }
}

/// A `Failed` disposition always carries the error that caused it;
/// this keeps the fallback out of the per-call match arms.
fn unexpected_failure(failure: Option<ApiError>) -> ApiError {
    failure.unwrap_or_else(|| ApiError::Transport("request failed".into()))
}
