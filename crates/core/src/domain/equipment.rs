use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EquipmentTypeId(pub i64);

/// Catalogue entry for a hireable class of plant or tooling.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EquipmentType {
    pub id: EquipmentTypeId,
    pub code: String,
    pub name: String,
    pub weekly_rate: Decimal,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EquipmentUnitId(pub i64);

/// A single fleet asset, identified by its fleet code.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EquipmentUnit {
    pub id: EquipmentUnitId,
    pub equipment_type_id: EquipmentTypeId,
    pub type_name: String,
    pub fleet_code: String,
}

/// Generic searches match catalogue types; specific searches match
/// individual fleet units that are free over the requested window.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchMode {
    #[default]
    Generic,
    Specific,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum EquipmentSearchResults {
    Types(Vec<EquipmentType>),
    Units(Vec<EquipmentUnit>),
}

impl EquipmentSearchResults {
    pub fn mode(&self) -> SearchMode {
        match self {
            Self::Types(_) => SearchMode::Generic,
            Self::Units(_) => SearchMode::Specific,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Self::Types(types) => types.len(),
            Self::Units(units) => units.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// One row in the wizard's equipment basket.
///
/// Generic rows are keyed by equipment type and carry an editable
/// quantity. Unit rows pin a specific fleet asset and always count as
/// one; booking the same unit twice is a distinct row.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum EquipmentSelection {
    Generic {
        equipment: EquipmentType,
        quantity: u32,
    },
    Unit {
        unit: EquipmentUnit,
    },
}

impl EquipmentSelection {
    pub fn equipment_type_id(&self) -> EquipmentTypeId {
        match self {
            Self::Generic { equipment, .. } => equipment.id,
            Self::Unit { unit } => unit.equipment_type_id,
        }
    }

    pub fn quantity(&self) -> u32 {
        match self {
            Self::Generic { quantity, .. } => *quantity,
            Self::Unit { .. } => 1,
        }
    }

    pub fn display_name(&self) -> &str {
        match self {
            Self::Generic { equipment, .. } => &equipment.name,
            Self::Unit { unit } => &unit.type_name,
        }
    }

    pub fn line(&self) -> EquipmentLine {
        EquipmentLine {
            equipment_type_id: self.equipment_type_id(),
            quantity: self.quantity(),
        }
    }
}

/// Type-and-quantity projection of the basket, used both as the input
/// to accessory derivation and as the snapshot a derivation response is
/// checked against before it is applied.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EquipmentLine {
    pub equipment_type_id: EquipmentTypeId,
    pub quantity: u32,
}
