use crate::domain::equipment::EquipmentSelection;
use crate::domain::interaction::{
    AccessoryBooking, EquipmentBooking, InteractionSubmission, InteractionType,
};
use crate::errors::WizardError;
use crate::wizard::state::WizardState;

impl WizardState {
    /// Everything still blocking submission, collected in flow order so
    /// the operator sees the full list at once instead of fixing one
    /// field per attempt.
    pub fn missing_submission_fields(&self) -> Vec<String> {
        let Some(interaction_type) = self.selected_type else {
            return vec!["interaction type".to_string()];
        };
        let profile = interaction_type.profile();

        let mut missing: Vec<&str> = Vec::new();
        if self.customer.is_none() {
            missing.push("customer");
        }
        if self.contact.is_none() {
            missing.push("contact");
        }
        if profile.requires_delivery && self.site.is_none() {
            missing.push("site");
        }
        if profile.requires_equipment && self.equipment.is_empty() {
            missing.push("equipment");
        }
        if profile.requires_delivery && self.delivery_date.is_none() {
            missing.push("delivery date");
        }
        if interaction_type == InteractionType::Hire && self.hire_start_date.is_none() {
            missing.push("hire start date");
        }
        if self.contact_method.is_none() {
            missing.push("contact method");
        }

        missing.into_iter().map(str::to_string).collect()
    }

    pub fn can_submit(&self) -> bool {
        self.missing_submission_fields().is_empty()
    }

    /// Assembles the backend payload. Sections a type does not use are
    /// emitted empty even if stray values were somehow still around,
    /// and accessory rows sitting at quantity zero are dropped.
    pub fn build_submission(&self) -> Result<InteractionSubmission, WizardError> {
        let (Some(interaction_type), Some(customer), Some(contact), Some(contact_method)) = (
            self.selected_type,
            self.customer.as_ref(),
            self.contact.as_ref(),
            self.contact_method,
        ) else {
            return Err(WizardError::MissingFields {
                fields: self.missing_submission_fields(),
            });
        };

        let missing = self.missing_submission_fields();
        if !missing.is_empty() {
            return Err(WizardError::MissingFields { fields: missing });
        }

        let profile = interaction_type.profile();
        let is_hire = interaction_type == InteractionType::Hire;

        let equipment: Vec<EquipmentBooking> = if profile.requires_equipment {
            self.equipment
                .iter()
                .map(|selection| match selection {
                    EquipmentSelection::Generic {
                        equipment,
                        quantity,
                    } => EquipmentBooking {
                        equipment_type_id: equipment.id,
                        unit_id: None,
                        quantity: *quantity,
                    },
                    EquipmentSelection::Unit { unit } => EquipmentBooking {
                        equipment_type_id: unit.equipment_type_id,
                        unit_id: Some(unit.id),
                        quantity: 1,
                    },
                })
                .collect()
        } else {
            Vec::new()
        };

        let accessories: Vec<AccessoryBooking> = if profile.requires_equipment {
            self.accessories
                .iter()
                .filter(|row| row.quantity > 0)
                .map(|row| AccessoryBooking {
                    accessory_id: row.accessory_id,
                    quantity: row.quantity,
                    kind: row.kind,
                })
                .collect()
        } else {
            Vec::new()
        };

        Ok(InteractionSubmission {
            interaction_type,
            customer_id: customer.id,
            contact_id: contact.id,
            site_id: if profile.requires_delivery {
                self.site.as_ref().map(|site| site.id)
            } else {
                None
            },
            contact_method,
            notes: self.notes.clone(),
            delivery_date: profile.requires_delivery.then_some(self.delivery_date).flatten(),
            delivery_time: profile.requires_delivery.then_some(self.delivery_time).flatten(),
            hire_start_date: is_hire.then_some(self.hire_start_date).flatten(),
            hire_end_date: is_hire.then_some(self.hire_end_date).flatten(),
            equipment,
            accessories,
        })
    }

    /// Validates and hands out the payload, marking the submission as
    /// in flight. The caller reports back through
    /// [`finish_submission`](Self::finish_submission).
    pub fn begin_submission(&mut self) -> Result<InteractionSubmission, WizardError> {
        let submission = self.build_submission()?;
        self.pending.submit = true;
        Ok(submission)
    }

    /// Clears the in-flight flag once the backend answered. On failure
    /// the wizard keeps all its state so the operator can resubmit.
    pub fn finish_submission(&mut self) {
        self.pending.submit = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::accessory::{Accessory, AccessoryId, AccessoryKind, AccessorySelection};
    use crate::domain::customer::{Contact, ContactId, Customer, CustomerId, Site, SiteId};
    use crate::domain::equipment::{EquipmentType, EquipmentTypeId, EquipmentUnit, EquipmentUnitId};
    use crate::domain::interaction::ContactMethod;
    use chrono::{NaiveDate, NaiveTime};
    use rust_decimal::Decimal;

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

    fn excavator() -> EquipmentType {
        EquipmentType {
            id: EquipmentTypeId(301),
            code: "EXC-1T5".into(),
            name: "1.5t Mini Excavator".into(),
            weekly_rate: Decimal::new(18500, 2),
        }
    }

    fn breaker_unit() -> EquipmentUnit {
        EquipmentUnit {
            id: EquipmentUnitId(403),
            equipment_type_id: EquipmentTypeId(302),
            type_name: "110v Demolition Breaker".into(),
            fleet_code: "BRK-110-12".into(),
        }
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
    }

    fn completed_hire() -> WizardState {
        let mut wizard = WizardState::new();
        assert!(wizard.select_type(InteractionType::Hire));
        let lookups = wizard.select_customer(customer());
        wizard.apply_contacts(&lookups.contacts, Ok(vec![contact()]));
        wizard.apply_sites(&lookups.sites, Ok(vec![site()]));
        wizard.choose_site(site());

        let request = wizard.add_generic_equipment(excavator()).expect("request");
        wizard.apply_auto_accessories(
            &request,
            Ok(vec![AccessorySelection::derived(
                AccessoryId(501),
                "Digging Bucket 300mm",
                1,
            )]),
        );
        let request = wizard.add_unit_equipment(breaker_unit()).expect("request");
        wizard.apply_auto_accessories(
            &request,
            Ok(vec![
                AccessorySelection::derived(AccessoryId(501), "Digging Bucket 300mm", 1),
                AccessorySelection::derived(AccessoryId(504), "Breaker Point & Chisel Set", 1),
            ]),
        );

        wizard.set_delivery_date(Some(date(2026, 9, 1)));
        wizard.set_delivery_time(NaiveTime::from_hms_opt(8, 30, 0));
        wizard.set_hire_start_date(Some(date(2026, 9, 1)));
        wizard.set_hire_end_date(Some(date(2026, 9, 19)));
        wizard.set_contact_method(ContactMethod::Phone);
        wizard.set_notes("deliver before the gates open");
        wizard
    }

    #[test]
    fn a_complete_hire_builds_the_full_payload() {
        let wizard = completed_hire();
        assert!(wizard.can_submit());

        let submission = wizard.build_submission().expect("payload");

        assert_eq!(submission.interaction_type, InteractionType::Hire);
        assert_eq!(submission.customer_id, CustomerId(101));
        assert_eq!(submission.contact_id, ContactId(1101));
        assert_eq!(submission.site_id, Some(SiteId(2101)));
        assert_eq!(submission.delivery_date, Some(date(2026, 9, 1)));
        assert_eq!(submission.hire_start_date, Some(date(2026, 9, 1)));
        assert_eq!(submission.hire_end_date, Some(date(2026, 9, 19)));

        assert_eq!(submission.equipment.len(), 2);
        assert_eq!(submission.equipment[0].unit_id, None);
        assert_eq!(submission.equipment[0].quantity, 1);
        assert_eq!(submission.equipment[1].unit_id, Some(EquipmentUnitId(403)));

        let ids: Vec<_> = submission
            .accessories
            .iter()
            .map(|row| row.accessory_id)
            .collect();
        assert_eq!(ids, vec![AccessoryId(501), AccessoryId(504)]);
    }

    #[test]
    fn zero_quantity_accessory_rows_are_left_out_of_the_payload() {
        let mut wizard = completed_hire();
        wizard.decrement_accessory(AccessoryId(501), AccessoryKind::Default);

        // Row survives in the wizard for re-incrementing.
        assert!(wizard
            .accessory_selections()
            .iter()
            .any(|row| row.accessory_id == AccessoryId(501) && row.quantity == 0));

        let submission = wizard.build_submission().expect("payload");
        assert!(submission
            .accessories
            .iter()
            .all(|row| row.accessory_id != AccessoryId(501)));
    }

    #[test]
    fn optional_rows_keep_their_kind_in_the_payload() {
        let mut wizard = completed_hire();
        wizard.add_optional_accessory(&Accessory {
            id: AccessoryId(503),
            code: "FUEL-20".into(),
            name: "Fuel Can 20L".into(),
        });

        let submission = wizard.build_submission().expect("payload");
        let fuel = submission
            .accessories
            .iter()
            .find(|row| row.accessory_id == AccessoryId(503))
            .expect("optional row present");
        assert_eq!(fuel.kind, AccessoryKind::Optional);
    }

    #[test]
    fn an_enquiry_payload_has_no_conditional_sections() {
        let mut wizard = WizardState::new();
        wizard.select_type(InteractionType::Enquiry);
        let lookups = wizard.select_customer(customer());
        wizard.apply_contacts(&lookups.contacts, Ok(vec![contact()]));
        wizard.set_contact_method(ContactMethod::Web);
        wizard.set_notes("asking about tower availability in October");

        let submission = wizard.build_submission().expect("payload");

        assert_eq!(submission.site_id, None);
        assert_eq!(submission.delivery_date, None);
        assert_eq!(submission.delivery_time, None);
        assert_eq!(submission.hire_start_date, None);
        assert!(submission.equipment.is_empty());
        assert!(submission.accessories.is_empty());
        assert_eq!(
            submission.notes,
            "asking about tower availability in October"
        );
    }

    #[test]
    fn quotation_payloads_never_carry_hire_dates() {
        let mut wizard = WizardState::new();
        wizard.select_type(InteractionType::Quotation);
        let lookups = wizard.select_customer(customer());
        wizard.apply_contacts(&lookups.contacts, Ok(vec![contact()]));
        wizard.add_generic_equipment(excavator());
        wizard.set_contact_method(ContactMethod::Email);
        // The operator set a start date to narrow an availability
        // search; it is not part of a quotation payload.
        wizard.set_hire_start_date(Some(date(2026, 9, 1)));

        let submission = wizard.build_submission().expect("payload");
        assert_eq!(submission.hire_start_date, None);
        assert_eq!(submission.equipment.len(), 1);
    }

    #[test]
    fn all_missing_fields_are_reported_in_one_pass() {
        let mut wizard = WizardState::new();
        wizard.select_type(InteractionType::Hire);

        let error = wizard.build_submission().expect_err("nothing is filled in");
        let WizardError::MissingFields { fields } = error else {
            panic!("expected MissingFields");
        };
        assert_eq!(
            fields,
            vec![
                "customer",
                "contact",
                "site",
                "equipment",
                "delivery date",
                "hire start date",
                "contact method",
            ]
        );
    }

    #[test]
    fn hire_start_date_is_only_demanded_from_hires() {
        let mut wizard = WizardState::new();
        wizard.select_type(InteractionType::OffHire);
        let lookups = wizard.select_customer(customer());
        wizard.apply_contacts(&lookups.contacts, Ok(vec![contact()]));
        wizard.choose_site(site());
        wizard.set_delivery_date(Some(date(2026, 9, 1)));
        wizard.set_contact_method(ContactMethod::Phone);

        assert!(wizard.can_submit(), "off-hire needs no hire start date");
    }

    #[test]
    fn before_a_type_is_chosen_that_is_the_only_missing_field() {
        let wizard = WizardState::new();
        assert_eq!(
            wizard.missing_submission_fields(),
            vec!["interaction type".to_string()]
        );
    }

    #[test]
    fn begin_and_finish_track_the_in_flight_submission() {
        let mut wizard = completed_hire();
        assert!(!wizard.pending().submit);

        wizard.begin_submission().expect("payload");
        assert!(wizard.pending().submit);

        wizard.finish_submission();
        assert!(!wizard.pending().submit);
    }

    #[test]
    fn begin_submission_refuses_an_incomplete_wizard() {
        let mut wizard = WizardState::new();
        wizard.select_type(InteractionType::Enquiry);

        let error = wizard.begin_submission().expect_err("incomplete");
        assert!(matches!(error, WizardError::MissingFields { .. }));
        assert!(!wizard.pending().submit);
    }
}
