//! Request tickets and response application.
//!
//! Every backend lookup is issued against a ticket that captures the
//! request parameters and a per-operation sequence number. When the
//! response comes back the ticket is checked against the wizard's
//! current state: if the captured parameters no longer match, the
//! response is discarded wholesale. Responses are never reordered or
//! retried here; a discarded response simply never touches the state.

use chrono::NaiveDate;

use crate::domain::customer::{Contact, Customer, CustomerId, Site};
use crate::domain::equipment::{EquipmentSearchResults, SearchMode};
use crate::errors::ApiError;
use crate::wizard::state::WizardState;

/// What happened to a response when it was applied.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LookupDisposition {
    /// The response matched the current state and was applied.
    Applied,
    /// The response was for a superseded request and was thrown away.
    DiscardedStale,
    /// The request itself failed; dependent lists are left empty and
    /// existing selections are untouched.
    Failed,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CustomerSearchTicket {
    pub(crate) seq: u64,
    pub query: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ContactLookupTicket {
    pub(crate) seq: u64,
    pub customer_id: CustomerId,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SiteLookupTicket {
    pub(crate) seq: u64,
    pub customer_id: CustomerId,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EquipmentSearchTicket {
    pub(crate) seq: u64,
    pub mode: SearchMode,
    pub query: String,
    /// Start date captured for specific-mode availability filtering;
    /// always `None` in generic mode, which ignores dates.
    pub hire_start: Option<NaiveDate>,
}

/// Tickets for the pair of lookups a customer selection fans out to.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CustomerLookups {
    pub contacts: ContactLookupTicket,
    pub sites: SiteLookupTicket,
}

impl WizardState {
    pub fn begin_customer_search(&mut self, query: impl Into<String>) -> CustomerSearchTicket {
        let query = query.into();
        self.customer_query = query.clone();
        self.sequences.customer_search += 1;
        self.pending.customer_search = true;
        CustomerSearchTicket {
            seq: self.sequences.customer_search,
            query,
        }
    }

    pub fn apply_customer_search(
        &mut self,
        ticket: &CustomerSearchTicket,
        outcome: Result<Vec<Customer>, ApiError>,
    ) -> LookupDisposition {
        if ticket.seq == self.sequences.customer_search {
            self.pending.customer_search = false;
        }
        if ticket.query != self.customer_query {
            return LookupDisposition::DiscardedStale;
        }

        match outcome {
            Ok(customers) => {
                self.customer_results = customers;
                LookupDisposition::Applied
            }
            Err(_) => {
                self.customer_results.clear();
                LookupDisposition::Failed
            }
        }
    }

    /// Commits a customer choice. Contact and site selections clear
    /// immediately so a half-updated cascade is never observable, and
    /// both dependent lookups are issued.
    pub fn select_customer(&mut self, customer: Customer) -> CustomerLookups {
        self.contact = None;
        self.contact_options.clear();
        self.contact_filter.clear();
        self.site = None;
        self.site_options.clear();
        self.site_filter.clear();

        let customer_id = customer.id;
        self.customer = Some(customer);

        self.sequences.contacts += 1;
        self.sequences.sites += 1;
        self.pending.contacts = true;
        self.pending.sites = true;

        CustomerLookups {
            contacts: ContactLookupTicket {
                seq: self.sequences.contacts,
                customer_id,
            },
            sites: SiteLookupTicket {
                seq: self.sequences.sites,
                customer_id,
            },
        }
    }

    pub fn apply_contacts(
        &mut self,
        ticket: &ContactLookupTicket,
        outcome: Result<Vec<Contact>, ApiError>,
    ) -> LookupDisposition {
        if ticket.seq == self.sequences.contacts {
            self.pending.contacts = false;
        }
        let current = self.customer.as_ref().map(|customer| customer.id);
        if current != Some(ticket.customer_id) {
            return LookupDisposition::DiscardedStale;
        }

        match outcome {
            Ok(contacts) => {
                // Preselect only when there is exactly one primary
                // contact and the operator has not already chosen.
                if self.contact.is_none() {
                    let mut primaries = contacts
                        .iter()
                        .filter(|contact| contact.is_primary_contact);
                    if let (Some(primary), None) = (primaries.next(), primaries.next()) {
                        self.contact = Some(primary.clone());
                    }
                }
                self.contact_options = contacts;
                LookupDisposition::Applied
            }
            Err(_) => {
                self.contact_options.clear();
                LookupDisposition::Failed
            }
        }
    }

    pub fn apply_sites(
        &mut self,
        ticket: &SiteLookupTicket,
        outcome: Result<Vec<Site>, ApiError>,
    ) -> LookupDisposition {
        if ticket.seq == self.sequences.sites {
            self.pending.sites = false;
        }
        let current = self.customer.as_ref().map(|customer| customer.id);
        if current != Some(ticket.customer_id) {
            return LookupDisposition::DiscardedStale;
        }

        match outcome {
            Ok(sites) => {
                self.site_options = sites;
                LookupDisposition::Applied
            }
            Err(_) => {
                self.site_options.clear();
                LookupDisposition::Failed
            }
        }
    }

    pub fn begin_equipment_search(
        &mut self,
        mode: SearchMode,
        query: impl Into<String>,
    ) -> EquipmentSearchTicket {
        let query = query.into();
        self.set_search_mode(mode);
        self.equipment_query = query.clone();
        self.sequences.equipment_search += 1;
        self.pending.equipment_search = true;

        let hire_start = match mode {
            SearchMode::Specific => self.hire_start_date,
            SearchMode::Generic => None,
        };
        EquipmentSearchTicket {
            seq: self.sequences.equipment_search,
            mode,
            query,
            hire_start,
        }
    }

    pub fn apply_equipment_search(
        &mut self,
        ticket: &EquipmentSearchTicket,
        outcome: Result<EquipmentSearchResults, ApiError>,
    ) -> LookupDisposition {
        if ticket.seq == self.sequences.equipment_search {
            self.pending.equipment_search = false;
        }

        let current_start = match self.equipment_mode {
            SearchMode::Specific => self.hire_start_date,
            SearchMode::Generic => None,
        };
        let stale = ticket.mode != self.equipment_mode
            || ticket.query != self.equipment_query
            || ticket.hire_start != current_start;
        if stale {
            return LookupDisposition::DiscardedStale;
        }

        match outcome {
            Ok(results) => {
                self.equipment_results = Some(results);
                LookupDisposition::Applied
            }
            Err(_) => {
                self.equipment_results = None;
                LookupDisposition::Failed
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::customer::{ContactId, SiteId};
    use crate::domain::equipment::{EquipmentType, EquipmentTypeId};
    use crate::domain::interaction::InteractionType;
    use rust_decimal::Decimal;

    fn customer(id: i64, name: &str) -> Customer {
        Customer {
            id: CustomerId(id),
            name: name.into(),
            account_ref: None,
        }
    }

    fn contact(id: i64, customer_id: i64, name: &str, primary: bool) -> Contact {
        Contact {
            id: ContactId(id),
            customer_id: CustomerId(customer_id),
            name: name.into(),
            phone: None,
            email: None,
            is_primary_contact: primary,
        }
    }

    fn site(id: i64, customer_id: i64, name: &str) -> Site {
        Site {
            id: SiteId(id),
            customer_id: CustomerId(customer_id),
            name: name.into(),
            address: "1 Yard Lane".into(),
            postcode: "LS1 1AA".into(),
        }
    }

    fn excavator() -> EquipmentType {
        EquipmentType {
            id: EquipmentTypeId(301),
            code: "EXC-1T5".into(),
            name: "1.5t Mini Excavator".into(),
            weekly_rate: Decimal::new(18500, 2),
        }
    }

    fn transport_error() -> ApiError {
        ApiError::Transport("connection reset".into())
    }

    fn hire_wizard() -> WizardState {
        let mut wizard = WizardState::new();
        assert!(wizard.select_type(InteractionType::Hire));
        wizard
    }

    #[test]
    fn customer_search_applies_while_the_query_matches() {
        let mut wizard = hire_wizard();
        let ticket = wizard.begin_customer_search("breedon");
        assert!(wizard.pending().customer_search);

        let disposition =
            wizard.apply_customer_search(&ticket, Ok(vec![customer(101, "Breedon Groundworks")]));

        assert_eq!(disposition, LookupDisposition::Applied);
        assert_eq!(wizard.customer_results().len(), 1);
        assert!(!wizard.pending().customer_search);
    }

    #[test]
    fn out_of_order_customer_searches_keep_the_newest_results() {
        let mut wizard = hire_wizard();
        let first = wizard.begin_customer_search("bre");
        let second = wizard.begin_customer_search("breedon");

        // Newest lands first.
        let disposition =
            wizard.apply_customer_search(&second, Ok(vec![customer(101, "Breedon Groundworks")]));
        assert_eq!(disposition, LookupDisposition::Applied);

        // The older response then arrives and is thrown away.
        let disposition = wizard.apply_customer_search(
            &first,
            Ok(vec![
                customer(101, "Breedon Groundworks"),
                customer(105, "Brewer Scaffolding"),
            ]),
        );
        assert_eq!(disposition, LookupDisposition::DiscardedStale);
        assert_eq!(wizard.customer_results().len(), 1);
    }

    #[test]
    fn pending_clears_only_when_the_newest_response_lands() {
        let mut wizard = hire_wizard();
        let first = wizard.begin_customer_search("bre");
        let second = wizard.begin_customer_search("breedon");

        // The superseded response arrives first: discarded, and the
        // search is still outstanding.
        let disposition = wizard.apply_customer_search(&first, Ok(vec![]));
        assert_eq!(disposition, LookupDisposition::DiscardedStale);
        assert!(wizard.pending().customer_search);

        wizard.apply_customer_search(&second, Ok(vec![]));
        assert!(!wizard.pending().customer_search);
    }

    #[test]
    fn older_ticket_with_identical_params_still_applies() {
        let mut wizard = hire_wizard();
        let first = wizard.begin_customer_search("breedon");
        let _second = wizard.begin_customer_search("breedon");

        // Same query, so the older response is as good as the newer
        // one; it applies but the newer request stays outstanding.
        let disposition =
            wizard.apply_customer_search(&first, Ok(vec![customer(101, "Breedon Groundworks")]));
        assert_eq!(disposition, LookupDisposition::Applied);
        assert!(wizard.pending().customer_search);
    }

    #[test]
    fn failed_customer_search_empties_the_list() {
        let mut wizard = hire_wizard();
        let seed = wizard.begin_customer_search("marl");
        wizard.apply_customer_search(&seed, Ok(vec![customer(103, "Marling Landscapes")]));
        assert_eq!(wizard.customer_results().len(), 1);

        let ticket = wizard.begin_customer_search("breedon");
        let disposition = wizard.apply_customer_search(&ticket, Err(transport_error()));

        assert_eq!(disposition, LookupDisposition::Failed);
        assert!(wizard.customer_results().is_empty());
        assert!(!wizard.pending().customer_search);
    }

    #[test]
    fn selecting_a_customer_clears_dependents_before_any_response() {
        let mut wizard = hire_wizard();
        let lookups = wizard.select_customer(customer(101, "Breedon Groundworks"));
        wizard.apply_contacts(
            &lookups.contacts,
            Ok(vec![contact(1101, 101, "Dawn Keller", true)]),
        );
        wizard.apply_sites(&lookups.sites, Ok(vec![site(2101, 101, "Depot Yard")]));
        wizard.choose_site(site(2101, 101, "Depot Yard"));
        wizard.set_contact_filter("daw");

        let lookups = wizard.select_customer(customer(102, "Fairhurst Construction"));

        assert_eq!(lookups.contacts.customer_id, CustomerId(102));
        assert!(wizard.contact().is_none());
        assert!(wizard.site().is_none());
        assert!(wizard.contact_options().is_empty());
        assert!(wizard.site_options().is_empty());
        assert!(wizard.contact_filter().is_empty());
        assert!(wizard.pending().contacts);
        assert!(wizard.pending().sites);
    }

    #[test]
    fn a_single_primary_contact_is_preselected() {
        let mut wizard = hire_wizard();
        let lookups = wizard.select_customer(customer(101, "Breedon Groundworks"));

        wizard.apply_contacts(
            &lookups.contacts,
            Ok(vec![
                contact(1101, 101, "Dawn Keller", true),
                contact(1102, 101, "Rob Tyrell", false),
            ]),
        );

        assert_eq!(wizard.contact().map(|c| c.id), Some(ContactId(1101)));
    }

    #[test]
    fn no_preselection_without_exactly_one_primary() {
        let mut wizard = hire_wizard();
        let lookups = wizard.select_customer(customer(102, "Fairhurst Construction"));
        wizard.apply_contacts(
            &lookups.contacts,
            Ok(vec![
                contact(1103, 102, "Priya Shah", true),
                contact(1104, 102, "Martin Voss", true),
            ]),
        );
        assert!(wizard.contact().is_none(), "two primaries, no preselection");

        let lookups = wizard.select_customer(customer(103, "Marling Landscapes"));
        wizard.apply_contacts(
            &lookups.contacts,
            Ok(vec![contact(1105, 103, "Edie Marling", false)]),
        );
        assert!(wizard.contact().is_none(), "no primary, no preselection");
    }

    #[test]
    fn late_contacts_for_a_previous_customer_are_discarded() {
        let mut wizard = hire_wizard();
        let first = wizard.select_customer(customer(101, "Breedon Groundworks"));
        let second = wizard.select_customer(customer(102, "Fairhurst Construction"));

        let disposition = wizard.apply_contacts(
            &first.contacts,
            Ok(vec![contact(1101, 101, "Dawn Keller", true)]),
        );
        assert_eq!(disposition, LookupDisposition::DiscardedStale);
        assert!(wizard.contact().is_none());
        assert!(wizard.contact_options().is_empty());

        let disposition = wizard.apply_contacts(
            &second.contacts,
            Ok(vec![contact(1103, 102, "Priya Shah", true)]),
        );
        assert_eq!(disposition, LookupDisposition::Applied);
        assert_eq!(wizard.contact().map(|c| c.id), Some(ContactId(1103)));
    }

    #[test]
    fn duplicate_response_never_overrides_a_manual_choice() {
        let mut wizard = hire_wizard();
        let lookups = wizard.select_customer(customer(101, "Breedon Groundworks"));
        let roster = vec![
            contact(1101, 101, "Dawn Keller", true),
            contact(1102, 101, "Rob Tyrell", false),
        ];

        wizard.apply_contacts(&lookups.contacts, Ok(roster.clone()));
        wizard.choose_contact(contact(1102, 101, "Rob Tyrell", false));

        // A retransmitted response for the same customer refreshes the
        // options but leaves the operator's choice alone.
        let disposition = wizard.apply_contacts(&lookups.contacts, Ok(roster));
        assert_eq!(disposition, LookupDisposition::Applied);
        assert_eq!(wizard.contact().map(|c| c.id), Some(ContactId(1102)));
    }

    #[test]
    fn failed_lookups_leave_lists_empty_and_selections_intact() {
        let mut wizard = hire_wizard();
        let lookups = wizard.select_customer(customer(101, "Breedon Groundworks"));

        let contacts = wizard.apply_contacts(&lookups.contacts, Err(transport_error()));
        let sites = wizard.apply_sites(&lookups.sites, Err(transport_error()));

        assert_eq!(contacts, LookupDisposition::Failed);
        assert_eq!(sites, LookupDisposition::Failed);
        assert!(wizard.contact_options().is_empty());
        assert!(wizard.site_options().is_empty());
        assert!(wizard.customer().is_some(), "the selection itself survives");
        assert!(!wizard.pending().contacts);
        assert!(!wizard.pending().sites);
    }

    #[test]
    fn equipment_search_is_discarded_when_the_window_moved() {
        let mut wizard = hire_wizard();
        wizard.set_hire_start_date(NaiveDate::from_ymd_opt(2026, 9, 1));
        let ticket = wizard.begin_equipment_search(SearchMode::Specific, "exc");

        // Operator changes the start date while the search is running.
        wizard.set_hire_start_date(NaiveDate::from_ymd_opt(2026, 10, 1));

        let disposition = wizard
            .apply_equipment_search(&ticket, Ok(EquipmentSearchResults::Units(Vec::new())));
        assert_eq!(disposition, LookupDisposition::DiscardedStale);
        assert!(wizard.equipment_results().is_none());
        assert!(!wizard.pending().equipment_search);
    }

    #[test]
    fn generic_searches_ignore_the_hire_window() {
        let mut wizard = hire_wizard();
        wizard.set_hire_start_date(NaiveDate::from_ymd_opt(2026, 9, 1));
        let ticket = wizard.begin_equipment_search(SearchMode::Generic, "exc");

        wizard.set_hire_start_date(NaiveDate::from_ymd_opt(2026, 10, 1));

        let disposition = wizard
            .apply_equipment_search(&ticket, Ok(EquipmentSearchResults::Types(vec![excavator()])));
        assert_eq!(disposition, LookupDisposition::Applied);
        assert_eq!(wizard.equipment_results().map(|r| r.len()), Some(1));
    }

    #[test]
    fn mode_flip_discards_the_in_flight_search() {
        let mut wizard = hire_wizard();
        let ticket = wizard.begin_equipment_search(SearchMode::Generic, "breaker");

        wizard.set_search_mode(SearchMode::Specific);

        let disposition = wizard
            .apply_equipment_search(&ticket, Ok(EquipmentSearchResults::Types(vec![excavator()])));
        assert_eq!(disposition, LookupDisposition::DiscardedStale);
        assert!(wizard.equipment_results().is_none());
    }

    #[test]
    fn failed_equipment_search_clears_the_results() {
        let mut wizard = hire_wizard();
        let ticket = wizard.begin_equipment_search(SearchMode::Generic, "mixer");
        wizard.apply_equipment_search(&ticket, Ok(EquipmentSearchResults::Types(vec![excavator()])));

        let ticket = wizard.begin_equipment_search(SearchMode::Generic, "mixer 110");
        let disposition = wizard.apply_equipment_search(&ticket, Err(transport_error()));

        assert_eq!(disposition, LookupDisposition::Failed);
        assert!(wizard.equipment_results().is_none());
    }
}
