//! Clinical record models.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::dates::{format_date, iso_date, iso_date_opt, iso_date_patch, present};

/// A single visit/treatment entry as returned by the backend.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ClinicalRecord {
    pub id: u64,
    #[serde(with = "iso_date")]
    pub clinic_date: NaiveDate,
    pub nature_of_ailment: String,
    #[serde(default)]
    pub medicine_prescribed: Option<String>,
    pub procedure_undertaken: String,
    #[serde(default, with = "iso_date_opt")]
    pub date_of_next_appointment: Option<NaiveDate>,
    /// Owning patient, never shown by the screens
    #[serde(default)]
    pub patient_id: Option<u64>,
}

impl ClinicalRecord {
    /// Medicine for display, `N/A` when none was prescribed.
    pub fn medicine_label(&self) -> &str {
        match self.medicine_prescribed.as_deref() {
            Some(m) if !m.is_empty() => m,
            _ => "N/A",
        }
    }

    /// Next appointment for display, `N/A` when unset.
    pub fn next_appointment_label(&self) -> String {
        self.date_of_next_appointment
            .as_ref()
            .map(format_date)
            .unwrap_or_else(|| "N/A".to_string())
    }
}

/// Body of a create request. `patientId` is always sent as `null`.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NewClinicalRecord {
    #[serde(with = "iso_date")]
    pub clinic_date: NaiveDate,
    pub nature_of_ailment: String,
    pub medicine_prescribed: Option<String>,
    pub procedure_undertaken: String,
    #[serde(with = "iso_date_opt")]
    pub date_of_next_appointment: Option<NaiveDate>,
    patient_id: Option<u64>,
}

impl NewClinicalRecord {
    /// Create a request body with no patient association.
    pub fn new(
        clinic_date: NaiveDate,
        nature_of_ailment: String,
        medicine_prescribed: Option<String>,
        procedure_undertaken: String,
        date_of_next_appointment: Option<NaiveDate>,
    ) -> Self {
        Self {
            clinic_date,
            nature_of_ailment,
            medicine_prescribed,
            procedure_undertaken,
            date_of_next_appointment,
            patient_id: None,
        }
    }
}

/// Partial update for a clinical record. Nullable fields use a double
/// option: `None` is "not sent", `Some(None)` is an explicit `null`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ClinicalRecordPatch {
    #[serde(default, skip_serializing_if = "Option::is_none", with = "iso_date_opt")]
    pub clinic_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nature_of_ailment: Option<String>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "present"
    )]
    pub medicine_prescribed: Option<Option<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub procedure_undertaken: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "iso_date_patch")]
    pub date_of_next_appointment: Option<Option<NaiveDate>>,
}

impl ClinicalRecordPatch {
    /// Overwrite the fields present in this patch; everything else is kept.
    pub fn apply_to(&self, record: &mut ClinicalRecord) {
        if let Some(v) = self.clinic_date {
            record.clinic_date = v;
        }
        if let Some(v) = &self.nature_of_ailment {
            record.nature_of_ailment = v.clone();
        }
        if let Some(v) = &self.medicine_prescribed {
            record.medicine_prescribed = v.clone();
        }
        if let Some(v) = &self.procedure_undertaken {
            record.procedure_undertaken = v.clone();
        }
        if let Some(v) = self.date_of_next_appointment {
            record.date_of_next_appointment = v;
        }
    }
}
