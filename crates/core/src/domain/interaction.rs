use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::domain::accessory::{AccessoryId, AccessoryKind};
use crate::domain::customer::{ContactId, CustomerId, SiteId};
use crate::domain::equipment::{EquipmentTypeId, EquipmentUnitId};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InteractionType {
    Hire,
    OffHire,
    Quotation,
    Enquiry,
    Breakdown,
    Exchange,
}

/// Which wizard sections an interaction type needs. Types flagged
/// `coming_soon` are listed on the first step but cannot be selected.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct InteractionProfile {
    pub requires_equipment: bool,
    pub requires_delivery: bool,
    pub coming_soon: bool,
}

impl InteractionType {
    pub const ALL: [InteractionType; 6] = [
        InteractionType::Hire,
        InteractionType::OffHire,
        InteractionType::Quotation,
        InteractionType::Enquiry,
        InteractionType::Breakdown,
        InteractionType::Exchange,
    ];

    pub fn profile(self) -> InteractionProfile {
        match self {
            InteractionType::Hire => InteractionProfile {
                requires_equipment: true,
                requires_delivery: true,
                coming_soon: false,
            },
            InteractionType::OffHire => InteractionProfile {
                requires_equipment: false,
                requires_delivery: true,
                coming_soon: false,
            },
            InteractionType::Quotation => InteractionProfile {
                requires_equipment: true,
                requires_delivery: false,
                coming_soon: false,
            },
            InteractionType::Enquiry => InteractionProfile {
                requires_equipment: false,
                requires_delivery: false,
                coming_soon: false,
            },
            InteractionType::Breakdown => InteractionProfile {
                requires_equipment: false,
                requires_delivery: true,
                coming_soon: true,
            },
            InteractionType::Exchange => InteractionProfile {
                requires_equipment: true,
                requires_delivery: true,
                coming_soon: true,
            },
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            InteractionType::Hire => "Hire",
            InteractionType::OffHire => "Off-hire",
            InteractionType::Quotation => "Quotation",
            InteractionType::Enquiry => "Enquiry",
            InteractionType::Breakdown => "Breakdown",
            InteractionType::Exchange => "Exchange",
        }
    }
}

/// How the customer reached the desk.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContactMethod {
    Phone,
    Email,
    Counter,
    Web,
}

impl ContactMethod {
    pub const ALL: [ContactMethod; 4] = [
        ContactMethod::Phone,
        ContactMethod::Email,
        ContactMethod::Counter,
        ContactMethod::Web,
    ];
}

/// One equipment line of a submission. `unit_id` is set when the
/// operator pinned a specific fleet asset rather than a catalogue type.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EquipmentBooking {
    pub equipment_type_id: EquipmentTypeId,
    pub unit_id: Option<EquipmentUnitId>,
    pub quantity: u32,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessoryBooking {
    pub accessory_id: AccessoryId,
    pub quantity: u32,
    pub kind: AccessoryKind,
}

/// Fully validated payload handed to the backend. Sections that do not
/// apply to the interaction type are empty rather than carried over.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct InteractionSubmission {
    pub interaction_type: InteractionType,
    pub customer_id: CustomerId,
    pub contact_id: ContactId,
    pub site_id: Option<SiteId>,
    pub contact_method: ContactMethod,
    pub notes: String,
    pub delivery_date: Option<NaiveDate>,
    pub delivery_time: Option<NaiveTime>,
    pub hire_start_date: Option<NaiveDate>,
    pub hire_end_date: Option<NaiveDate>,
    pub equipment: Vec<EquipmentBooking>,
    pub accessories: Vec<AccessoryBooking>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionReceipt {
    pub reference_number: String,
}
