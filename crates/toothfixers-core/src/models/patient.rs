//! Patient models.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::dates::iso_date;

/// A patient record as returned by the backend.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Patient {
    /// Backend ID - absent until created
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    pub first_name: String,
    pub sur_name: String,
    #[serde(default, deserialize_with = "super::null_as_empty")]
    pub middle_name: String,
    #[serde(with = "iso_date")]
    pub date_of_birth: NaiveDate,
    #[serde(default, deserialize_with = "super::null_as_empty")]
    pub home_address: String,
    #[serde(with = "iso_date")]
    pub date_of_registration: NaiveDate,
}

impl Patient {
    /// Check if this patient has been persisted by the backend.
    pub fn is_created(&self) -> bool {
        self.id.is_some()
    }

    /// "First Last" as shown in notifications.
    pub fn display_name(&self) -> String {
        format!("{} {}", self.first_name, self.sur_name)
    }

    /// Space-joined first, sur and middle names, used by the name filter.
    pub fn search_text(&self) -> String {
        format!("{} {} {}", self.first_name, self.sur_name, self.middle_name)
    }

    /// Case-insensitive substring match against [`Patient::search_text`].
    pub fn matches(&self, query: &str) -> bool {
        self.search_text()
            .to_lowercase()
            .contains(&query.to_lowercase())
    }
}

/// Body of a create request. Every field is required.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NewPatient {
    pub first_name: String,
    pub sur_name: String,
    pub middle_name: String,
    #[serde(with = "iso_date")]
    pub date_of_birth: NaiveDate,
    pub home_address: String,
    #[serde(with = "iso_date")]
    pub date_of_registration: NaiveDate,
}

/// Partial update. Sent as the PATCH body and read back as the set of
/// fields the backend reports as updated.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PatientPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sur_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub middle_name: Option<String>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "super::dates::iso_date_opt"
    )]
    pub date_of_birth: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub home_address: Option<String>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "super::dates::iso_date_opt"
    )]
    pub date_of_registration: Option<NaiveDate>,
}

impl PatientPatch {
    /// True when no field is set.
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }

    /// Overwrite the fields present in this patch; everything else is kept.
    pub fn apply_to(&self, patient: &mut Patient) {
        if let Some(v) = &self.first_name {
            patient.first_name = v.clone();
        }
        if let Some(v) = &self.sur_name {
            patient.sur_name = v.clone();
        }
        if let Some(v) = &self.middle_name {
            patient.middle_name = v.clone();
        }
        if let Some(v) = self.date_of_birth {
            patient.date_of_birth = v;
        }
        if let Some(v) = &self.home_address {
            patient.home_address = v.clone();
        }
        if let Some(v) = self.date_of_registration {
            patient.date_of_registration = v;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ada() -> Patient {
        Patient {
            id: Some(7),
            first_name: "Ada".into(),
            sur_name: "Lovelace".into(),
            middle_name: "King".into(),
            date_of_birth: NaiveDate::from_ymd_opt(1815, 12, 10).unwrap(),
            home_address: "1 Main St".into(),
            date_of_registration: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
        }
    }

    #[test]
    fn test_wire_format_is_camel_case() {
        let json = serde_json::to_value(ada()).unwrap();
        assert_eq!(json["firstName"], "Ada");
        assert_eq!(json["surName"], "Lovelace");
        assert_eq!(json["dateOfBirth"], "1815-12-10");
        assert_eq!(json["homeAddress"], "1 Main St");
        assert_eq!(json["dateOfRegistration"], "2024-01-01");
    }

    #[test]
    fn test_deserialize_backend_timestamps() {
        let json = r#"{
            "id": 3,
            "firstName": "Grace",
            "surName": "Hopper",
            "middleName": null,
            "dateOfBirth": "1906-12-09T00:00:00.000Z",
            "homeAddress": "Navy Yard",
            "dateOfRegistration": "2024-02-01"
        }"#;
        let patient: Patient = serde_json::from_str(json).unwrap();
        assert_eq!(patient.id, Some(3));
        assert_eq!(patient.middle_name, "");
        assert_eq!(
            patient.date_of_birth,
            NaiveDate::from_ymd_opt(1906, 12, 9).unwrap()
        );
    }

    #[test]
    fn test_search_text_and_matching() {
        let patient = ada();
        assert_eq!(patient.search_text(), "Ada Lovelace King");
        assert!(patient.matches("lovelace"));
        assert!(patient.matches("ADA LOVE"));
        assert!(patient.matches(""));
        assert!(!patient.matches("Babbage"));
    }

    #[test]
    fn test_patch_serializes_only_set_fields() {
        let patch = PatientPatch {
            home_address: Some("2 Oak Ave".into()),
            ..Default::default()
        };
        let json = serde_json::to_string(&patch).unwrap();
        assert_eq!(json, r#"{"homeAddress":"2 Oak Ave"}"#);
    }

    #[test]
    fn test_patch_apply_keeps_absent_fields() {
        let mut patient = ada();
        let patch: PatientPatch =
            serde_json::from_str(r#"{"homeAddress":"2 Oak Ave","unrelated":1}"#).unwrap();
        patch.apply_to(&mut patient);

        assert_eq!(patient.home_address, "2 Oak Ave");
        assert_eq!(patient.first_name, "Ada");
        assert_eq!(patient.middle_name, "King");
        assert_eq!(patient.id, Some(7));
    }

    #[test]
    fn test_empty_patch() {
        assert!(PatientPatch::default().is_empty());
        let patch = PatientPatch {
            first_name: Some("Augusta".into()),
            ..Default::default()
        };
        assert!(!patch.is_empty());
    }
}
