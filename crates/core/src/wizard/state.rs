use chrono::{NaiveDate, NaiveTime};

use crate::domain::accessory::AccessorySelection;
use crate::domain::customer::{Contact, Customer, Site};
use crate::domain::equipment::{EquipmentSearchResults, EquipmentSelection, SearchMode};
use crate::domain::interaction::{ContactMethod, InteractionType};
use crate::errors::WizardError;
use crate::wizard::steps::{self, WizardStep};

/// Which backend calls are currently in flight. The driver flips these
/// on when it issues a request; they clear when the newest response for
/// that operation lands, whether or not it was applied.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PendingOps {
    pub customer_search: bool,
    pub contacts: bool,
    pub sites: bool,
    pub equipment_search: bool,
    pub accessories: bool,
    pub submit: bool,
}

/// Monotonic counters, one per lookup kind. Never reset, even when the
/// wizard itself resets, so a response issued before a reset can still
/// be recognised as superseded.
#[derive(Clone, Copy, Debug, Default)]
pub(crate) struct RequestSequences {
    pub customer_search: u64,
    pub contacts: u64,
    pub sites: u64,
    pub equipment_search: u64,
    pub accessories: u64,
}

/// The whole capture flow in one value: selected interaction type,
/// step position, every dependent selection, and the in-flight request
/// bookkeeping. Completeness is always recomputed from the fields, so
/// there is no cached "step done" flag to fall out of sync.
#[derive(Clone, Debug)]
pub struct WizardState {
    pub(crate) selected_type: Option<InteractionType>,
    pub(crate) current_step: usize,

    pub(crate) customer_query: String,
    pub(crate) customer_results: Vec<Customer>,
    pub(crate) customer: Option<Customer>,
    pub(crate) contact_options: Vec<Contact>,
    pub(crate) contact: Option<Contact>,
    pub(crate) contact_filter: String,
    pub(crate) site_options: Vec<Site>,
    pub(crate) site: Option<Site>,
    pub(crate) site_filter: String,

    pub(crate) equipment_mode: SearchMode,
    pub(crate) equipment_query: String,
    pub(crate) equipment_results: Option<EquipmentSearchResults>,
    pub(crate) equipment: Vec<EquipmentSelection>,
    pub(crate) accessories: Vec<AccessorySelection>,

    pub(crate) delivery_date: Option<NaiveDate>,
    pub(crate) delivery_time: Option<NaiveTime>,
    pub(crate) hire_start_date: Option<NaiveDate>,
    pub(crate) hire_end_date: Option<NaiveDate>,
    pub(crate) contact_method: Option<ContactMethod>,
    pub(crate) notes: String,

    pub(crate) pending: PendingOps,
    pub(crate) sequences: RequestSequences,
}

impl Default for WizardState {
    fn default() -> Self {
        Self {
            selected_type: None,
            current_step: 1,
            customer_query: String::new(),
            customer_results: Vec::new(),
            customer: None,
            contact_options: Vec::new(),
            contact: None,
            contact_filter: String::new(),
            site_options: Vec::new(),
            site: None,
            site_filter: String::new(),
            equipment_mode: SearchMode::Generic,
            equipment_query: String::new(),
            equipment_results: None,
            equipment: Vec::new(),
            accessories: Vec::new(),
            delivery_date: None,
            delivery_time: None,
            hire_start_date: None,
            hire_end_date: None,
            contact_method: None,
            notes: String::new(),
            pending: PendingOps::default(),
            sequences: RequestSequences::default(),
        }
    }
}

impl WizardState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Picks the interaction type and restarts the flow on step two.
    /// Re-selecting the current type resets as well; picking a type
    /// that is not live yet is ignored and returns `false`.
    pub fn select_type(&mut self, interaction_type: InteractionType) -> bool {
        if interaction_type.profile().coming_soon {
            return false;
        }

        self.selected_type = Some(interaction_type);
        self.reset_downstream();
        self.current_step = 2;
        true
    }

    /// Clears everything that depends on the interaction type. The
    /// sequence counters deliberately survive so responses to requests
    /// issued before the reset are recognised as superseded when they
    /// eventually land.
    fn reset_downstream(&mut self) {
        self.customer_query.clear();
        self.customer_results.clear();
        self.customer = None;
        self.contact_options.clear();
        self.contact = None;
        self.contact_filter.clear();
        self.site_options.clear();
        self.site = None;
        self.site_filter.clear();
        self.equipment_mode = SearchMode::Generic;
        self.equipment_query.clear();
        self.equipment_results = None;
        self.equipment.clear();
        self.accessories.clear();
        self.delivery_date = None;
        self.delivery_time = None;
        self.hire_start_date = None;
        self.hire_end_date = None;
        self.contact_method = None;
        self.notes.clear();
        self.pending = PendingOps::default();
    }

    pub fn selected_type(&self) -> Option<InteractionType> {
        self.selected_type
    }

    pub fn current_step(&self) -> usize {
        self.current_step
    }

    pub fn current_step_kind(&self) -> WizardStep {
        self.step_at(self.current_step)
            .unwrap_or(WizardStep::TypeSelection)
    }

    pub fn total_steps(&self) -> usize {
        steps::total_steps(self.selected_type)
    }

    pub fn step_sequence(&self) -> Vec<WizardStep> {
        steps::step_sequence(self.selected_type)
    }

    pub fn step_at(&self, position: usize) -> Option<WizardStep> {
        steps::step_at(self.selected_type, position)
    }

    /// Recomputed from the live fields on every call.
    pub fn is_step_complete(&self, position: usize) -> bool {
        match self.step_at(position) {
            None => false,
            Some(WizardStep::TypeSelection) => self.selected_type.is_some(),
            Some(WizardStep::CustomerDetails) => {
                let site_ok = !self.requires_delivery() || self.site.is_some();
                self.customer.is_some() && self.contact.is_some() && site_ok
            }
            Some(WizardStep::Equipment) => !self.equipment.is_empty(),
            Some(WizardStep::Delivery) => self.delivery_date.is_some(),
            Some(WizardStep::Review) => true,
        }
    }

    pub fn first_incomplete_step(&self) -> Option<usize> {
        (1..=self.total_steps()).find(|position| !self.is_step_complete(*position))
    }

    pub fn advance(&mut self) -> Result<(), WizardError> {
        if !self.is_step_complete(self.current_step) {
            return Err(WizardError::StepIncomplete {
                step: self.current_step,
            });
        }
        if self.current_step < self.total_steps() {
            self.current_step += 1;
        }
        Ok(())
    }

    /// Stepping back never loses data and never fails; the floor is
    /// step one.
    pub fn retreat(&mut self) {
        if self.current_step > 1 {
            self.current_step -= 1;
        }
    }

    /// Direct navigation from the stepper. Allowed when every step
    /// before the target is complete, or when the target is the step
    /// the operator is already on; the target itself may be
    /// incomplete, that is where the operator goes to finish it.
    pub fn jump_to_step(&mut self, target: usize) -> Result<(), WizardError> {
        let total = self.total_steps();
        if target < 1 || target > total {
            return Err(WizardError::StepOutOfRange {
                step: target,
                total,
            });
        }
        if target == self.current_step {
            return Ok(());
        }
        if let Some(blocking) = (1..target).find(|position| !self.is_step_complete(*position)) {
            return Err(WizardError::JumpBlocked { target, blocking });
        }

        self.current_step = target;
        Ok(())
    }

    pub(crate) fn requires_equipment(&self) -> bool {
        self.selected_type
            .map(|interaction_type| interaction_type.profile().requires_equipment)
            .unwrap_or(false)
    }

    pub(crate) fn requires_delivery(&self) -> bool {
        self.selected_type
            .map(|interaction_type| interaction_type.profile().requires_delivery)
            .unwrap_or(false)
    }

    pub fn customer_query(&self) -> &str {
        &self.customer_query
    }

    pub fn customer_results(&self) -> &[Customer] {
        &self.customer_results
    }

    pub fn customer(&self) -> Option<&Customer> {
        self.customer.as_ref()
    }

    pub fn contact_options(&self) -> &[Contact] {
        &self.contact_options
    }

    pub fn contact(&self) -> Option<&Contact> {
        self.contact.as_ref()
    }

    pub fn site_options(&self) -> &[Site] {
        &self.site_options
    }

    pub fn site(&self) -> Option<&Site> {
        self.site.as_ref()
    }

    pub fn equipment_mode(&self) -> SearchMode {
        self.equipment_mode
    }

    pub fn equipment_query(&self) -> &str {
        &self.equipment_query
    }

    pub fn equipment_results(&self) -> Option<&EquipmentSearchResults> {
        self.equipment_results.as_ref()
    }

    pub fn equipment_selections(&self) -> &[EquipmentSelection] {
        &self.equipment
    }

    pub fn accessory_selections(&self) -> &[AccessorySelection] {
        &self.accessories
    }

    pub fn delivery_date(&self) -> Option<NaiveDate> {
        self.delivery_date
    }

    pub fn delivery_time(&self) -> Option<NaiveTime> {
        self.delivery_time
    }

    pub fn hire_start_date(&self) -> Option<NaiveDate> {
        self.hire_start_date
    }

    pub fn hire_end_date(&self) -> Option<NaiveDate> {
        self.hire_end_date
    }

    pub fn contact_method(&self) -> Option<ContactMethod> {
        self.contact_method
    }

    pub fn notes(&self) -> &str {
        &self.notes
    }

    pub fn pending(&self) -> PendingOps {
        self.pending
    }

    pub fn choose_contact(&mut self, contact: Contact) {
        self.contact = Some(contact);
    }

    pub fn choose_site(&mut self, site: Site) {
        self.site = Some(site);
    }

    pub fn set_contact_filter(&mut self, filter: impl Into<String>) {
        self.contact_filter = filter.into();
    }

    pub fn contact_filter(&self) -> &str {
        &self.contact_filter
    }

    pub fn set_site_filter(&mut self, filter: impl Into<String>) {
        self.site_filter = filter.into();
    }

    pub fn site_filter(&self) -> &str {
        &self.site_filter
    }

    /// Flipping the mode invalidates the result list; any search still
    /// in flight for the old mode will be discarded when it lands.
    pub fn set_search_mode(&mut self, mode: SearchMode) {
        if self.equipment_mode != mode {
            self.equipment_mode = mode;
            self.equipment_results = None;
        }
    }

    pub fn set_delivery_date(&mut self, date: Option<NaiveDate>) {
        self.delivery_date = date;
    }

    pub fn set_delivery_time(&mut self, time: Option<NaiveTime>) {
        self.delivery_time = time;
    }

    pub fn set_hire_start_date(&mut self, date: Option<NaiveDate>) {
        self.hire_start_date = date;
    }

    pub fn set_hire_end_date(&mut self, date: Option<NaiveDate>) {
        self.hire_end_date = date;
    }

    pub fn set_contact_method(&mut self, method: ContactMethod) {
        self.contact_method = Some(method);
    }

    pub fn set_notes(&mut self, notes: impl Into<String>) {
        self.notes = notes.into();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::customer::{ContactId, CustomerId, SiteId};

    fn customer() -> Customer {
        Customer {
            id: CustomerId(101),
            name: "Breedon Groundworks Ltd".into(),
            account_ref: Some("BG-0041".into()),
        }
    }

    fn contact() -> Contact {
        Contact {
            id: ContactId(1101),
            customer_id: CustomerId(101),
            name: "Dawn Keller".into(),
            phone: None,
            email: None,
            is_primary_contact: true,
        }
    }

    fn site() -> Site {
        Site {
            id: SiteId(2101),
            customer_id: CustomerId(101),
            name: "Crossgate Depot Yard".into(),
            address: "14 Crossgate Lane".into(),
            postcode: "LS27 8QT".into(),
        }
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
    }

    /// Drives an off-hire wizard to the review step without touching
    /// the lookup machinery.
    fn completed_off_hire() -> WizardState {
        let mut wizard = WizardState::new();
        assert!(wizard.select_type(InteractionType::OffHire));
        wizard.customer = Some(customer());
        wizard.contact = Some(contact());
        wizard.site = Some(site());
        wizard.advance().expect("customer step complete");
        wizard.set_delivery_date(Some(date(2026, 9, 1)));
        wizard.advance().expect("delivery step complete");
        wizard
    }

    #[test]
    fn fresh_wizard_sits_on_the_type_step() {
        let wizard = WizardState::new();
        assert_eq!(wizard.current_step(), 1);
        assert_eq!(wizard.total_steps(), 1);
        assert_eq!(wizard.current_step_kind(), WizardStep::TypeSelection);
        assert!(!wizard.is_step_complete(1));
    }

    #[test]
    fn selecting_a_type_moves_to_step_two_and_expands_the_flow() {
        let mut wizard = WizardState::new();
        assert!(wizard.select_type(InteractionType::Hire));

        assert_eq!(wizard.current_step(), 2);
        assert_eq!(wizard.total_steps(), 5);
        assert!(wizard.is_step_complete(1));
        assert_eq!(wizard.current_step_kind(), WizardStep::CustomerDetails);
    }

    #[test]
    fn coming_soon_types_are_silently_ignored() {
        let mut wizard = WizardState::new();
        assert!(wizard.select_type(InteractionType::Hire));
        wizard.customer = Some(customer());

        assert!(!wizard.select_type(InteractionType::Breakdown));
        assert_eq!(wizard.selected_type(), Some(InteractionType::Hire));
        assert_eq!(wizard.current_step(), 2);
        assert!(wizard.customer().is_some(), "no reset on a refused selection");
    }

    #[test]
    fn advance_refuses_to_leave_an_incomplete_step() {
        let mut wizard = WizardState::new();
        wizard.select_type(InteractionType::Enquiry);

        let error = wizard.advance().expect_err("customer step is empty");
        assert_eq!(error, WizardError::StepIncomplete { step: 2 });
        assert_eq!(wizard.current_step(), 2);
    }

    #[test]
    fn advance_saturates_on_the_final_step() {
        let mut wizard = completed_off_hire();
        assert_eq!(wizard.current_step(), 4);
        assert_eq!(wizard.current_step_kind(), WizardStep::Review);

        wizard.advance().expect("review step is always complete");
        assert_eq!(wizard.current_step(), 4);
    }

    #[test]
    fn retreat_floors_at_step_one_and_keeps_data() {
        let mut wizard = completed_off_hire();
        wizard.retreat();
        wizard.retreat();
        wizard.retreat();
        assert_eq!(wizard.current_step(), 1);
        wizard.retreat();
        assert_eq!(wizard.current_step(), 1);
        assert!(wizard.customer().is_some());
        assert!(wizard.delivery_date().is_some());
    }

    #[test]
    fn jump_lands_on_any_step_with_a_complete_prefix() {
        let mut wizard = completed_off_hire();
        wizard.jump_to_step(2).expect("backward jump");
        assert_eq!(wizard.current_step(), 2);

        wizard.jump_to_step(4).expect("forward jump over complete steps");
        assert_eq!(wizard.current_step(), 4);
    }

    #[test]
    fn jump_is_blocked_by_the_first_incomplete_step() {
        let mut wizard = WizardState::new();
        wizard.select_type(InteractionType::OffHire);

        let error = wizard.jump_to_step(4).expect_err("customer step incomplete");
        assert_eq!(
            error,
            WizardError::JumpBlocked {
                target: 4,
                blocking: 2
            }
        );
        assert_eq!(wizard.current_step(), 2);
    }

    #[test]
    fn jump_to_the_current_step_is_allowed_after_an_earlier_step_regresses() {
        let mut wizard = completed_off_hire();
        assert_eq!(wizard.current_step(), 4);

        // Clearing the delivery date from review regresses step three.
        wizard.set_delivery_date(None);
        assert!(!wizard.is_step_complete(3));

        // Re-selecting the tab the operator is on stays a no-op.
        wizard.jump_to_step(4).expect("staying on the current step");
        assert_eq!(wizard.current_step(), 4);

        // Once the operator leaves, the incomplete step gates the way
        // back in.
        wizard.jump_to_step(3).expect("backward jump");
        assert_eq!(
            wizard.jump_to_step(4),
            Err(WizardError::JumpBlocked {
                target: 4,
                blocking: 3
            })
        );
    }

    #[test]
    fn jump_rejects_positions_outside_the_flow() {
        let mut wizard = WizardState::new();
        wizard.select_type(InteractionType::Enquiry);

        assert_eq!(
            wizard.jump_to_step(0),
            Err(WizardError::StepOutOfRange { step: 0, total: 3 })
        );
        assert_eq!(
            wizard.jump_to_step(7),
            Err(WizardError::StepOutOfRange { step: 7, total: 3 })
        );
    }

    #[test]
    fn switching_type_resets_everything_downstream() {
        let mut wizard = completed_off_hire();
        wizard.set_notes("ready to collect");

        assert!(wizard.select_type(InteractionType::Enquiry));

        assert_eq!(wizard.current_step(), 2);
        assert_eq!(wizard.total_steps(), 3);
        assert!(wizard.customer().is_none());
        assert!(wizard.contact().is_none());
        assert!(wizard.site().is_none());
        assert!(wizard.delivery_date().is_none());
        assert!(wizard.notes().is_empty());
        assert_eq!(wizard.pending(), PendingOps::default());
    }

    #[test]
    fn reselecting_the_same_type_also_resets() {
        let mut wizard = completed_off_hire();
        assert!(wizard.select_type(InteractionType::OffHire));

        assert_eq!(wizard.current_step(), 2);
        assert!(wizard.customer().is_none());
        assert!(wizard.delivery_date().is_none());
    }

    #[test]
    fn site_is_only_required_when_the_type_has_a_delivery_section() {
        let mut wizard = WizardState::new();
        wizard.select_type(InteractionType::Enquiry);
        wizard.customer = Some(customer());
        wizard.contact = Some(contact());
        assert!(wizard.is_step_complete(2), "enquiry needs no site");

        let mut wizard = WizardState::new();
        wizard.select_type(InteractionType::OffHire);
        wizard.customer = Some(customer());
        wizard.contact = Some(contact());
        assert!(!wizard.is_step_complete(2), "off-hire needs a site");
        wizard.site = Some(site());
        assert!(wizard.is_step_complete(2));
    }

    #[test]
    fn first_incomplete_step_tracks_the_flow() {
        let mut wizard = WizardState::new();
        assert_eq!(wizard.first_incomplete_step(), Some(1));

        wizard.select_type(InteractionType::OffHire);
        assert_eq!(wizard.first_incomplete_step(), Some(2));

        let wizard = completed_off_hire();
        assert_eq!(wizard.first_incomplete_step(), None);
    }

    #[test]
    fn completeness_is_recomputed_when_fields_are_cleared() {
        let mut wizard = completed_off_hire();
        assert!(wizard.is_step_complete(3));

        wizard.set_delivery_date(None);
        assert!(!wizard.is_step_complete(3));
        assert_eq!(wizard.first_incomplete_step(), Some(3));
    }

    #[test]
    fn switching_search_mode_drops_the_stale_result_list() {
        let mut wizard = WizardState::new();
        wizard.select_type(InteractionType::Hire);
        wizard.equipment_results = Some(EquipmentSearchResults::Types(Vec::new()));

        wizard.set_search_mode(SearchMode::Specific);
        assert!(wizard.equipment_results().is_none());

        // Same mode again is a no-op.
        wizard.equipment_results = Some(EquipmentSearchResults::Units(Vec::new()));
        wizard.set_search_mode(SearchMode::Specific);
        assert!(wizard.equipment_results().is_some());
    }
}
