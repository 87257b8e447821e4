//! Deterministic in-memory stand-in for the hire desk backend.
//!
//! Seeds a small depot: four customer accounts, a six-line catalogue,
//! a handful of fleet units, and the accessory rules that ride along
//! with each equipment type. Used by unit tests and by the CLI smoke
//! command so both exercise the same world.

use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::api::HireApi;
use crate::domain::accessory::{Accessory, AccessoryId, AccessorySelection};
use crate::domain::customer::{Contact, ContactId, Customer, CustomerId, Site, SiteId};
use crate::domain::equipment::{
    EquipmentLine, EquipmentSearchResults, EquipmentType, EquipmentTypeId, EquipmentUnit,
    EquipmentUnitId, SearchMode,
};
use crate::domain::interaction::{InteractionSubmission, SubmissionReceipt};
use crate::errors::ApiError;

struct CustomerSeed {
    id: i64,
    name: &'static str,
    account_ref: Option<&'static str>,
}

struct ContactSeed {
    id: i64,
    customer_id: i64,
    name: &'static str,
    phone: Option<&'static str>,
    email: Option<&'static str>,
    is_primary_contact: bool,
}

struct SiteSeed {
    id: i64,
    customer_id: i64,
    name: &'static str,
    address: &'static str,
    postcode: &'static str,
}

struct EquipmentTypeSeed {
    id: i64,
    code: &'static str,
    name: &'static str,
    /// Weekly rate in pence.
    weekly_rate_pence: i64,
}

struct UnitSeed {
    id: i64,
    equipment_type_id: i64,
    fleet_code: &'static str,
    /// Booked out until this date (inclusive); `None` means free.
    on_hire_until: Option<(i32, u32, u32)>,
}

struct AccessorySeed {
    id: i64,
    code: &'static str,
    name: &'static str,
}

struct AutoAccessoryRule {
    equipment_type_id: i64,
    accessory_id: i64,
    per_unit: u32,
}

const CUSTOMER_SEEDS: &[CustomerSeed] = &[
    CustomerSeed { id: 101, name: "Breedon Groundworks Ltd", account_ref: Some("BG-0041") },
    CustomerSeed { id: 102, name: "Fairhurst Construction", account_ref: Some("FC-0007") },
    CustomerSeed { id: 103, name: "Marling Landscapes", account_ref: None },
    CustomerSeed { id: 104, name: "Holt Event Services", account_ref: Some("HE-0112") },
];

const CONTACT_SEEDS: &[ContactSeed] = &[
    ContactSeed {
        id: 1101,
        customer_id: 101,
        name: "Dawn Keller",
        phone: Some("0113 496 0041"),
        email: Some("dawn.keller@breedon-groundworks.example"),
        is_primary_contact: true,
    },
    ContactSeed {
        id: 1102,
        customer_id: 101,
        name: "Rob Tyrell",
        phone: Some("0113 496 0042"),
        email: None,
        is_primary_contact: false,
    },
    ContactSeed {
        id: 1103,
        customer_id: 102,
        name: "Priya Shah",
        phone: Some("01274 496 117"),
        email: Some("priya.shah@fairhurst.example"),
        is_primary_contact: true,
    },
    ContactSeed {
        id: 1104,
        customer_id: 102,
        name: "Martin Voss",
        phone: None,
        email: Some("martin.voss@fairhurst.example"),
        is_primary_contact: true,
    },
    ContactSeed {
        id: 1105,
        customer_id: 103,
        name: "Edie Marling",
        phone: Some("01943 600 218"),
        email: None,
        is_primary_contact: false,
    },
];

const SITE_SEEDS: &[SiteSeed] = &[
    SiteSeed {
        id: 2101,
        customer_id: 101,
        name: "Crossgate Depot Yard",
        address: "14 Crossgate Lane, Morley",
        postcode: "LS27 8QT",
    },
    SiteSeed {
        id: 2102,
        customer_id: 101,
        name: "Aireview Housing Site",
        address: "Aireview Road, Armley",
        postcode: "LS12 4BB",
    },
    SiteSeed {
        id: 2103,
        customer_id: 102,
        name: "Fairhurst Plot 9",
        address: "Wharf Street, Bradford",
        postcode: "BD1 3LT",
    },
    SiteSeed {
        id: 2104,
        customer_id: 103,
        name: "Marling Nursery",
        address: "Otley Old Road",
        postcode: "LS16 6HW",
    },
];

const EQUIPMENT_TYPE_SEEDS: &[EquipmentTypeSeed] = &[
    EquipmentTypeSeed { id: 301, code: "EXC-1T5", name: "1.5t Mini Excavator", weekly_rate_pence: 18500 },
    EquipmentTypeSeed { id: 302, code: "BRK-110", name: "110v Demolition Breaker", weekly_rate_pence: 6250 },
    EquipmentTypeSeed { id: 303, code: "PLT-400", name: "Plate Compactor 400mm", weekly_rate_pence: 4800 },
    EquipmentTypeSeed { id: 304, code: "TWR-5M", name: "Alloy Tower 5m", weekly_rate_pence: 9500 },
    EquipmentTypeSeed { id: 305, code: "GEN-6K", name: "6kVA Diesel Generator", weekly_rate_pence: 11000 },
    EquipmentTypeSeed { id: 306, code: "MIX-110", name: "110v Cement Mixer", weekly_rate_pence: 3950 },
];

const UNIT_SEEDS: &[UnitSeed] = &[
    UnitSeed { id: 401, equipment_type_id: 301, fleet_code: "EXC-1T5-04", on_hire_until: None },
    UnitSeed {
        id: 402,
        equipment_type_id: 301,
        fleet_code: "EXC-1T5-07",
        on_hire_until: Some((2026, 9, 30)),
    },
    UnitSeed { id: 403, equipment_type_id: 302, fleet_code: "BRK-110-12", on_hire_until: None },
    UnitSeed {
        id: 404,
        equipment_type_id: 302,
        fleet_code: "BRK-110-15",
        on_hire_until: Some((2026, 9, 4)),
    },
    UnitSeed { id: 405, equipment_type_id: 305, fleet_code: "GEN-6K-02", on_hire_until: None },
];

const ACCESSORY_SEEDS: &[AccessorySeed] = &[
    AccessorySeed { id: 501, code: "BKT-300", name: "Digging Bucket 300mm" },
    AccessorySeed { id: 502, code: "BKT-600", name: "Grading Bucket 600mm" },
    AccessorySeed { id: 503, code: "FUEL-20", name: "Fuel Can 20L" },
    AccessorySeed { id: 504, code: "STL-PT", name: "Breaker Point & Chisel Set" },
    AccessorySeed { id: 505, code: "TRF-3K", name: "110v Transformer 3kVA" },
    AccessorySeed { id: 506, code: "LEAD-14", name: "110v Extension Lead 14m" },
    AccessorySeed { id: 507, code: "RAMP-2T", name: "Loading Ramps 2t Pair" },
];

const AUTO_ACCESSORY_RULES: &[AutoAccessoryRule] = &[
    AutoAccessoryRule { equipment_type_id: 301, accessory_id: 501, per_unit: 1 },
    AutoAccessoryRule { equipment_type_id: 301, accessory_id: 503, per_unit: 1 },
    AutoAccessoryRule { equipment_type_id: 301, accessory_id: 507, per_unit: 1 },
    AutoAccessoryRule { equipment_type_id: 302, accessory_id: 504, per_unit: 1 },
    AutoAccessoryRule { equipment_type_id: 302, accessory_id: 505, per_unit: 1 },
    AutoAccessoryRule { equipment_type_id: 303, accessory_id: 503, per_unit: 1 },
    AutoAccessoryRule { equipment_type_id: 305, accessory_id: 503, per_unit: 2 },
    AutoAccessoryRule { equipment_type_id: 305, accessory_id: 506, per_unit: 1 },
    AutoAccessoryRule { equipment_type_id: 306, accessory_id: 505, per_unit: 1 },
];

fn customer_from(seed: &CustomerSeed) -> Customer {
    Customer {
        id: CustomerId(seed.id),
        name: seed.name.to_string(),
        account_ref: seed.account_ref.map(str::to_string),
    }
}

fn contact_from(seed: &ContactSeed) -> Contact {
    Contact {
        id: ContactId(seed.id),
        customer_id: CustomerId(seed.customer_id),
        name: seed.name.to_string(),
        phone: seed.phone.map(str::to_string),
        email: seed.email.map(str::to_string),
        is_primary_contact: seed.is_primary_contact,
    }
}

fn site_from(seed: &SiteSeed) -> Site {
    Site {
        id: SiteId(seed.id),
        customer_id: CustomerId(seed.customer_id),
        name: seed.name.to_string(),
        address: seed.address.to_string(),
        postcode: seed.postcode.to_string(),
    }
}

fn equipment_type_from(seed: &EquipmentTypeSeed) -> EquipmentType {
    EquipmentType {
        id: EquipmentTypeId(seed.id),
        code: seed.code.to_string(),
        name: seed.name.to_string(),
        weekly_rate: Decimal::new(seed.weekly_rate_pence, 2),
    }
}

fn unit_from(seed: &UnitSeed, type_name: &str) -> EquipmentUnit {
    EquipmentUnit {
        id: EquipmentUnitId(seed.id),
        equipment_type_id: EquipmentTypeId(seed.equipment_type_id),
        type_name: type_name.to_string(),
        fleet_code: seed.fleet_code.to_string(),
    }
}

fn type_name(equipment_type_id: i64) -> Option<&'static str> {
    EQUIPMENT_TYPE_SEEDS
        .iter()
        .find(|seed| seed.id == equipment_type_id)
        .map(|seed| seed.name)
}

fn accessory_name(accessory_id: i64) -> Option<&'static str> {
    ACCESSORY_SEEDS
        .iter()
        .find(|seed| seed.id == accessory_id)
        .map(|seed| seed.name)
}

fn matches_query(query: &str, haystacks: &[&str]) -> bool {
    let needle = query.trim().to_ascii_lowercase();
    if needle.is_empty() {
        return true;
    }
    haystacks
        .iter()
        .any(|haystack| haystack.to_ascii_lowercase().contains(&needle))
}

fn seed_date(ymd: (i32, u32, u32)) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(ymd.0, ymd.1, ymd.2)
}

/// Fixture-backed [`HireApi`]. Reference numbers are monotonic per
/// instance so smoke output is stable run to run.
pub struct FixtureHireApi {
    next_reference: AtomicU64,
}

impl Default for FixtureHireApi {
    fn default() -> Self {
        Self { next_reference: AtomicU64::new(1) }
    }
}

impl FixtureHireApi {
    pub fn new() -> Self {
        Self::default()
    }

    /// Full accessory catalogue, for drivers that add optional rows.
    pub fn accessory_catalog(&self) -> Vec<Accessory> {
        ACCESSORY_SEEDS
            .iter()
            .map(|seed| Accessory {
                id: AccessoryId(seed.id),
                code: seed.code.to_string(),
                name: seed.name.to_string(),
            })
            .collect()
    }

    fn unit_is_free(seed: &UnitSeed, hire_start: Option<NaiveDate>) -> bool {
        match (seed.on_hire_until.and_then(seed_date), hire_start) {
            (Some(until), Some(start)) => start > until,
            (Some(_), None) => false,
            (None, _) => true,
        }
    }
}

#[async_trait]
impl HireApi for FixtureHireApi {
    async fn search_customers(&self, query: &str) -> Result<Vec<Customer>, ApiError> {
        Ok(CUSTOMER_SEEDS
            .iter()
            .filter(|seed| {
                matches_query(query, &[seed.name, seed.account_ref.unwrap_or_default()])
            })
            .map(customer_from)
            .collect())
    }

    async fn customer_contacts(&self, customer_id: CustomerId) -> Result<Vec<Contact>, ApiError> {
        Ok(CONTACT_SEEDS
            .iter()
            .filter(|seed| seed.customer_id == customer_id.0)
            .map(contact_from)
            .collect())
    }

    async fn customer_sites(&self, customer_id: CustomerId) -> Result<Vec<Site>, ApiError> {
        Ok(SITE_SEEDS
            .iter()
            .filter(|seed| seed.customer_id == customer_id.0)
            .map(site_from)
            .collect())
    }

    async fn search_equipment(
        &self,
        mode: SearchMode,
        query: &str,
        hire_start: Option<NaiveDate>,
    ) -> Result<EquipmentSearchResults, ApiError> {
        match mode {
            SearchMode::Generic => Ok(EquipmentSearchResults::Types(
                EQUIPMENT_TYPE_SEEDS
                    .iter()
                    .filter(|seed| matches_query(query, &[seed.code, seed.name]))
                    .map(equipment_type_from)
                    .collect(),
            )),
            SearchMode::Specific => {
                let units = UNIT_SEEDS
                    .iter()
                    .filter(|seed| Self::unit_is_free(seed, hire_start))
                    .filter_map(|seed| {
                        let name = type_name(seed.equipment_type_id)?;
                        matches_query(query, &[seed.fleet_code, name])
                            .then(|| unit_from(seed, name))
                    })
                    .collect();
                Ok(EquipmentSearchResults::Units(units))
            }
        }
    }

    async fn auto_accessories(
        &self,
        equipment: &[EquipmentLine],
    ) -> Result<Vec<AccessorySelection>, ApiError> {
        let mut rows: Vec<AccessorySelection> = Vec::new();
        for rule in AUTO_ACCESSORY_RULES {
            let Some(line) = equipment
                .iter()
                .find(|line| line.equipment_type_id.0 == rule.equipment_type_id)
            else {
                continue;
            };
            let Some(name) = accessory_name(rule.accessory_id) else {
                continue;
            };

            let quantity = rule.per_unit * line.quantity;
            match rows
                .iter()
                .position(|row| row.accessory_id.0 == rule.accessory_id)
            {
                Some(index) => rows[index].quantity += quantity,
                None => rows.push(AccessorySelection::derived(
                    AccessoryId(rule.accessory_id),
                    name,
                    quantity,
                )),
            }
        }
        Ok(rows)
    }

    async fn submit_interaction(
        &self,
        submission: &InteractionSubmission,
    ) -> Result<SubmissionReceipt, ApiError> {
        let known = CUSTOMER_SEEDS
            .iter()
            .any(|seed| seed.id == submission.customer_id.0);
        if !known {
            return Err(ApiError::Backend {
                status: 422,
                message: format!("unknown customer id {}", submission.customer_id.0),
            });
        }

        let serial = self.next_reference.fetch_add(1, Ordering::Relaxed);
        Ok(SubmissionReceipt {
            reference_number: format!("HD-{serial:06}"),
        })
    }
}
