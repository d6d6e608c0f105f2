//! REST gateway to the clinic backend.
//!
//! [`ClinicApi`] is the seam between the screens and the network:
//! [`HttpClinicApi`] talks to the real backend, [`MockClinicApi`] keeps an
//! in-memory backend for tests and offline demos.

mod http;
mod mock;

pub use http::*;
pub use mock::*;

use thiserror::Error;

use crate::models::{
    ClinicalRecord, ClinicalRecordPatch, NewClinicalRecord, NewPatient, Patient, PatientPatch,
};

/// Gateway errors, tagged by cause.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ApiError {
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Server error ({status}): {body}")]
    Server { status: u16, body: String },

    #[error("Unexpected response: {0}")]
    Decode(String),
}

/// Coarse error category surfaced to the screens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    NotFound,
    Network,
    Server,
}

impl ApiError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ApiError::Validation(_) => ErrorKind::Validation,
            ApiError::NotFound(_) => ErrorKind::NotFound,
            ApiError::Network(_) => ErrorKind::Network,
            ApiError::Server { .. } | ApiError::Decode(_) => ErrorKind::Server,
        }
    }

    /// Map a non-success HTTP status to an error.
    pub fn from_status(status: u16, path: &str, body: String) -> Self {
        match status {
            404 => ApiError::NotFound(path.to_string()),
            400 | 422 => ApiError::Validation(body),
            _ => ApiError::Server { status, body },
        }
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

/// The backend's resource operations, one method per endpoint.
pub trait ClinicApi: Send + Sync {
    /// `POST /patients/create`
    fn create_patient(&self, patient: &NewPatient) -> ApiResult<Patient>;

    /// `GET /patients`
    fn list_patients(&self) -> ApiResult<Vec<Patient>>;

    /// `PATCH /patients/{id}`; returns the fields the backend updated.
    fn update_patient(&self, id: u64, patch: &PatientPatch) -> ApiResult<PatientPatch>;

    /// `DELETE /patients/{id}`
    fn delete_patient(&self, id: u64) -> ApiResult<()>;

    /// `POST /clinical-records/create`
    fn create_clinical_record(&self, record: &NewClinicalRecord) -> ApiResult<ClinicalRecord>;

    /// `GET /clinical-records`
    fn list_clinical_records(&self) -> ApiResult<Vec<ClinicalRecord>>;

    /// `GET /clinical-records/{id}`
    fn get_clinical_record(&self, id: u64) -> ApiResult<ClinicalRecord>;

    /// `PATCH /clinical-records/{id}`; returns the fields the backend updated.
    fn update_clinical_record(
        &self,
        id: u64,
        patch: &ClinicalRecordPatch,
    ) -> ApiResult<ClinicalRecordPatch>;

    /// `DELETE /clinical-records/{id}`
    fn delete_clinical_record(&self, id: u64) -> ApiResult<()>;
}

/// Endpoint identifiers, used for request logs and failure injection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    CreatePatient,
    ListPatients,
    UpdatePatient,
    DeletePatient,
    CreateClinicalRecord,
    ListClinicalRecords,
    GetClinicalRecord,
    UpdateClinicalRecord,
    DeleteClinicalRecord,
}

impl Endpoint {
    pub fn method(&self) -> &'static str {
        match self {
            Endpoint::CreatePatient | Endpoint::CreateClinicalRecord => "POST",
            Endpoint::ListPatients | Endpoint::ListClinicalRecords | Endpoint::GetClinicalRecord => {
                "GET"
            }
            Endpoint::UpdatePatient | Endpoint::UpdateClinicalRecord => "PATCH",
            Endpoint::DeletePatient | Endpoint::DeleteClinicalRecord => "DELETE",
        }
    }

    /// Request path; `id` is required by the item endpoints.
    pub fn path(&self, id: Option<u64>) -> String {
        let id = id.map(|i| i.to_string()).unwrap_or_default();
        match self {
            Endpoint::CreatePatient => "/patients/create".to_string(),
            Endpoint::ListPatients => "/patients".to_string(),
            Endpoint::UpdatePatient | Endpoint::DeletePatient => format!("/patients/{}", id),
            Endpoint::CreateClinicalRecord => "/clinical-records/create".to_string(),
            Endpoint::ListClinicalRecords => "/clinical-records".to_string(),
            Endpoint::GetClinicalRecord
            | Endpoint::UpdateClinicalRecord
            | Endpoint::DeleteClinicalRecord => format!("/clinical-records/{}", id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            ApiError::from_status(404, "/clinical-records/42", String::new()).kind(),
            ErrorKind::NotFound
        );
        assert_eq!(
            ApiError::from_status(400, "/patients/create", "bad".into()),
            ApiError::Validation("bad".into())
        );
        assert_eq!(
            ApiError::from_status(422, "/patients/create", String::new()).kind(),
            ErrorKind::Validation
        );
        assert_eq!(
            ApiError::from_status(503, "/patients", "down".into()),
            ApiError::Server {
                status: 503,
                body: "down".into()
            }
        );
    }

    #[test]
    fn test_decode_counts_as_server_fault() {
        assert_eq!(ApiError::Decode("eof".into()).kind(), ErrorKind::Server);
    }

    #[test]
    fn test_endpoint_paths() {
        assert_eq!(Endpoint::CreatePatient.path(None), "/patients/create");
        assert_eq!(Endpoint::UpdatePatient.path(Some(7)), "/patients/7");
        assert_eq!(Endpoint::GetClinicalRecord.path(Some(42)), "/clinical-records/42");
        assert_eq!(Endpoint::DeleteClinicalRecord.method(), "DELETE");
        assert_eq!(Endpoint::UpdateClinicalRecord.method(), "PATCH");
    }
}
