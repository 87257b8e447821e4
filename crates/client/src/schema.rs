//! Wire representations for the hire desk REST API.
//!
//! The backend speaks camelCase JSON. Response DTOs are deserialized
//! here and then converted into domain types with validation, so a
//! malformed row surfaces as a decode error instead of leaking an
//! impossible value (a blank name, a non-positive id) into the wizard.

use chrono::{NaiveDate, NaiveTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use hiredesk_core::{
    AccessoryId, AccessoryKind, AccessorySelection, ApiError, Contact, ContactId, ContactMethod,
    Customer, CustomerId, EquipmentLine, EquipmentType, EquipmentTypeId, EquipmentUnit,
    EquipmentUnitId, InteractionSubmission, InteractionType, Site, SiteId, SubmissionReceipt,
};

fn positive_id(value: i64, what: &str) -> Result<i64, ApiError> {
    if value > 0 {
        Ok(value)
    } else {
        Err(ApiError::Decode(format!(
            "{what} id must be positive, got {value}"
        )))
    }
}

fn required_text(value: String, what: &str) -> Result<String, ApiError> {
    if value.trim().is_empty() {
        Err(ApiError::Decode(format!("{what} must not be blank")))
    } else {
        Ok(value)
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerDto {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub account_ref: Option<String>,
}

impl TryFrom<CustomerDto> for Customer {
    type Error = ApiError;

    fn try_from(dto: CustomerDto) -> Result<Self, Self::Error> {
        Ok(Customer {
            id: CustomerId(positive_id(dto.id, "customer")?),
            name: required_text(dto.name, "customer name")?,
            account_ref: dto.account_ref,
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactDto {
    pub id: i64,
    pub customer_id: i64,
    pub name: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub is_primary_contact: bool,
}

impl TryFrom<ContactDto> for Contact {
    type Error = ApiError;

    fn try_from(dto: ContactDto) -> Result<Self, Self::Error> {
        Ok(Contact {
            id: ContactId(positive_id(dto.id, "contact")?),
            customer_id: CustomerId(positive_id(dto.customer_id, "contact customer")?),
            name: required_text(dto.name, "contact name")?,
            phone: dto.phone,
            email: dto.email,
            is_primary_contact: dto.is_primary_contact,
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SiteDto {
    pub id: i64,
    pub customer_id: i64,
    pub name: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub postcode: String,
}

impl TryFrom<SiteDto> for Site {
    type Error = ApiError;

    fn try_from(dto: SiteDto) -> Result<Self, Self::Error> {
        Ok(Site {
            id: SiteId(positive_id(dto.id, "site")?),
            customer_id: CustomerId(positive_id(dto.customer_id, "site customer")?),
            name: required_text(dto.name, "site name")?,
            address: dto.address,
            postcode: dto.postcode,
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EquipmentTypeDto {
    pub id: i64,
    pub code: String,
    pub name: String,
    pub weekly_rate: Decimal,
}

impl TryFrom<EquipmentTypeDto> for EquipmentType {
    type Error = ApiError;

    fn try_from(dto: EquipmentTypeDto) -> Result<Self, Self::Error> {
        if dto.weekly_rate.is_sign_negative() {
            return Err(ApiError::Decode(format!(
                "equipment type {} has a negative weekly rate",
                dto.id
            )));
        }
        Ok(EquipmentType {
            id: EquipmentTypeId(positive_id(dto.id, "equipment type")?),
            code: required_text(dto.code, "equipment type code")?,
            name: required_text(dto.name, "equipment type name")?,
            weekly_rate: dto.weekly_rate,
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EquipmentUnitDto {
    pub id: i64,
    pub equipment_type_id: i64,
    pub type_name: String,
    pub fleet_code: String,
}

impl TryFrom<EquipmentUnitDto> for EquipmentUnit {
    type Error = ApiError;

    fn try_from(dto: EquipmentUnitDto) -> Result<Self, Self::Error> {
        Ok(EquipmentUnit {
            id: EquipmentUnitId(positive_id(dto.id, "equipment unit")?),
            equipment_type_id: EquipmentTypeId(positive_id(
                dto.equipment_type_id,
                "equipment unit type",
            )?),
            type_name: required_text(dto.type_name, "equipment unit type name")?,
            fleet_code: required_text(dto.fleet_code, "fleet code")?,
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AutoAccessoryDto {
    pub accessory_id: i64,
    pub name: String,
    pub quantity: u32,
}

impl TryFrom<AutoAccessoryDto> for AccessorySelection {
    type Error = ApiError;

    fn try_from(dto: AutoAccessoryDto) -> Result<Self, Self::Error> {
        Ok(AccessorySelection::derived(
            AccessoryId(positive_id(dto.accessory_id, "accessory")?),
            required_text(dto.name, "accessory name")?,
            dto.quantity,
        ))
    }
}

/// Converts a whole response page, failing on the first bad row.
pub fn convert_rows<D, T>(rows: Vec<D>) -> Result<Vec<T>, ApiError>
where
    T: TryFrom<D, Error = ApiError>,
{
    rows.into_iter().map(T::try_from).collect()
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EquipmentLineDto {
    pub equipment_type_id: i64,
    pub quantity: u32,
}

impl From<&EquipmentLine> for EquipmentLineDto {
    fn from(line: &EquipmentLine) -> Self {
        Self {
            equipment_type_id: line.equipment_type_id.0,
            quantity: line.quantity,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AutoAccessoriesRequestDto {
    pub equipment: Vec<EquipmentLineDto>,
}

impl AutoAccessoriesRequestDto {
    pub fn new(equipment: &[EquipmentLine]) -> Self {
        Self {
            equipment: equipment.iter().map(EquipmentLineDto::from).collect(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EquipmentBookingDto {
    pub equipment_type_id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit_id: Option<i64>,
    pub quantity: u32,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessoryBookingDto {
    pub accessory_id: i64,
    pub quantity: u32,
    pub kind: AccessoryKind,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitInteractionDto {
    pub interaction_type: InteractionType,
    pub customer_id: i64,
    pub contact_id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub site_id: Option<i64>,
    pub contact_method: ContactMethod,
    pub notes: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delivery_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delivery_time: Option<NaiveTime>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hire_start_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hire_end_date: Option<NaiveDate>,
    pub equipment: Vec<EquipmentBookingDto>,
    pub accessories: Vec<AccessoryBookingDto>,
}

impl From<&InteractionSubmission> for SubmitInteractionDto {
    fn from(submission: &InteractionSubmission) -> Self {
        Self {
            interaction_type: submission.interaction_type,
            customer_id: submission.customer_id.0,
            contact_id: submission.contact_id.0,
            site_id: submission.site_id.map(|site_id| site_id.0),
            contact_method: submission.contact_method,
            notes: submission.notes.clone(),
            delivery_date: submission.delivery_date,
            delivery_time: submission.delivery_time,
            hire_start_date: submission.hire_start_date,
            hire_end_date: submission.hire_end_date,
            equipment: submission
                .equipment
                .iter()
                .map(|booking| EquipmentBookingDto {
                    equipment_type_id: booking.equipment_type_id.0,
                    unit_id: booking.unit_id.map(|unit_id| unit_id.0),
                    quantity: booking.quantity,
                })
                .collect(),
            accessories: submission
                .accessories
                .iter()
                .map(|booking| AccessoryBookingDto {
                    accessory_id: booking.accessory_id.0,
                    quantity: booking.quantity,
                    kind: booking.kind,
                })
                .collect(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitResponseDto {
    pub success: bool,
    #[serde(default)]
    pub reference_number: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

/// Resolves the submit envelope. A `success: false` envelope counts as
/// a backend rejection even when the transport status was 2xx.
pub fn receipt_from_envelope(
    status: u16,
    envelope: SubmitResponseDto,
) -> Result<SubmissionReceipt, ApiError> {
    if !envelope.success {
        return Err(ApiError::Backend {
            status,
            message: envelope
                .error
                .unwrap_or_else(|| "submission was not accepted".to_string()),
        });
    }

    match envelope.reference_number {
        Some(reference_number) if !reference_number.trim().is_empty() => {
            Ok(SubmissionReceipt { reference_number })
        }
        _ => Err(ApiError::Decode(
            "accepted submission is missing a reference number".to_string(),
        )),
    }
}
