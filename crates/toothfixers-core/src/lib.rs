//! ToothFixers Core Library
//!
//! Client core for the ToothFixers dental clinic: patient and clinical
//! record management over the clinic's REST backend.
//!
//! # Architecture
//!
//! ```text
//!   Native UI / CLI
//!         │
//!   ToothFixersCore (FFI)
//!         │
//!   Screens (views) ──── Session ──── ClinicStore (shared, keyed by id)
//!         │                 │
//!         │              InFlight (latest request per operation wins)
//!         │
//!   ClinicApi ──► HttpClinicApi ──► REST backend
//!             └─► MockClinicApi (tests)
//! ```
//!
//! # Core Principle
//!
//! **The backend is the source of truth.** The store only changes after the
//! backend confirms a write; nothing is applied optimistically.
//!
//! # Modules
//!
//! - [`api`]: REST gateway trait, HTTP client and in-memory mock
//! - [`models`]: Patient and ClinicalRecord types, patches, date handling
//! - [`store`]: Shared entity store
//! - [`inflight`]: Superseded-request tracking
//! - [`session`]: Gateway, store and toast queue shared by the screens
//! - [`views`]: One view model per screen
//! - [`router`]: Path to screen resolution
//! - [`config`]: Client configuration and defaults

pub mod api;
pub mod config;
pub mod inflight;
pub mod models;
pub mod router;
pub mod session;
pub mod store;
pub mod views;

// Re-export commonly used types
pub use api::{ApiError, ClinicApi, ErrorKind, HttpClinicApi, MockClinicApi};
pub use config::{ClientConfig, ConfigError};
pub use models::{
    ClinicalRecord, ClinicalRecordPatch, NewClinicalRecord, NewPatient, Patient, PatientPatch,
};
pub use router::{Route, UnknownRoute};
pub use session::{Session, Toast, ToastLevel};
pub use store::ClinicStore;
pub use views::{Outcome, ViewError, ViewResult};

// UniFFI setup - using proc macros
uniffi::setup_scaffolding!();

use std::sync::Arc;

use chrono::NaiveDate;

use models::dates::{format_date, parse_date};
use views::{
    CreatePatientView, CreateRecordView, PatientForm, RecordEditForm, RecordForm,
    SearchPatientView, SearchRecordView,
};

// =========================================================================
// FFI Error Type
// =========================================================================

#[derive(Debug, thiserror::Error, uniffi::Error)]
pub enum ClinicError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Server error: {0}")]
    Server(String),

    #[error("Unknown route: {0}")]
    UnknownRoute(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl From<ViewError> for ClinicError {
    fn from(e: ViewError) -> Self {
        match e.kind {
            ErrorKind::Validation => ClinicError::Validation(e.message),
            ErrorKind::NotFound => ClinicError::NotFound(e.message),
            ErrorKind::Network => ClinicError::Network(e.message),
            ErrorKind::Server => ClinicError::Server(e.message),
        }
    }
}

impl From<ApiError> for ClinicError {
    fn from(e: ApiError) -> Self {
        let message = e.to_string();
        ClinicError::from(ViewError::new(e.kind(), message))
    }
}

impl From<UnknownRoute> for ClinicError {
    fn from(e: UnknownRoute) -> Self {
        ClinicError::UnknownRoute(e.0)
    }
}

impl From<ConfigError> for ClinicError {
    fn from(e: ConfigError) -> Self {
        ClinicError::InvalidInput(e.to_string())
    }
}

// =========================================================================
// Factory Functions (exported to FFI)
// =========================================================================

/// Connect to the backend at `base_url` with the default timeout.
#[uniffi::export]
pub fn connect(base_url: String) -> Result<Arc<ToothFixersCore>, ClinicError> {
    ToothFixersCore::with_config(&ClientConfig::new(&base_url))
}

/// Connect using `TOOTHFIXERS_API_URL` / `TOOTHFIXERS_API_TIMEOUT_SECS`.
#[uniffi::export]
pub fn connect_from_env() -> Result<Arc<ToothFixersCore>, ClinicError> {
    ToothFixersCore::with_config(&ClientConfig::from_env()?)
}

// =========================================================================
// Main API Object
// =========================================================================

/// Thread-safe session wrapper for FFI.
///
/// Every call builds the screen it needs over the shared session, so
/// screen state that outlives a call lives in the store.
#[derive(uniffi::Object)]
pub struct ToothFixersCore {
    session: Session,
}

impl ToothFixersCore {
    pub fn with_config(config: &ClientConfig) -> Result<Arc<Self>, ClinicError> {
        let api = HttpClinicApi::new(config)?;
        tracing::info!(base_url = api.base_url(), "Connected to clinic backend");
        Ok(Self::with_api(Arc::new(api)))
    }

    /// Wrap any gateway, e.g. [`MockClinicApi`] in tests.
    pub fn with_api(api: Arc<dyn ClinicApi>) -> Arc<Self> {
        Arc::new(Self {
            session: Session::new(api),
        })
    }

    pub fn session(&self) -> &Session {
        &self.session
    }
}

#[uniffi::export]
impl ToothFixersCore {
    // =========================================================================
    // Navigation
    // =========================================================================

    pub fn home_links(&self) -> Vec<FfiNavLink> {
        views::home_links()
            .into_iter()
            .map(|link| FfiNavLink {
                label: link.label.to_string(),
                path: link.route.path(),
            })
            .collect()
    }

    pub fn resolve_route(&self, path: String) -> Result<FfiRoute, ClinicError> {
        Ok(Route::parse(&path)?.into())
    }

    // =========================================================================
    // Patient Operations
    // =========================================================================

    /// Create a patient. `None` if a newer create superseded this one.
    pub fn create_patient(&self, form: FfiPatientForm) -> Result<Option<FfiPatient>, ClinicError> {
        let mut view = CreatePatientView::new(self.session.clone());
        *view.form_mut() = form.into_form()?;
        Ok(view.submit()?.applied().map(FfiPatient::from))
    }

    /// Fetch the patient list into the store.
    pub fn load_patients(&self) -> Result<Vec<FfiPatient>, ClinicError> {
        let mut view = SearchPatientView::new(self.session.clone());
        view.enter()?;
        Ok(view.patients().into_iter().map(FfiPatient::from).collect())
    }

    /// Loaded patients whose names contain `query`.
    pub fn filter_patients(&self, query: String) -> Vec<FfiPatient> {
        let mut view = SearchPatientView::new(self.session.clone());
        view.set_query(query);
        view.patients().into_iter().map(FfiPatient::from).collect()
    }

    /// Send the fields of `form` that differ from the loaded patient.
    pub fn update_patient(
        &self,
        id: u64,
        form: FfiPatientForm,
    ) -> Result<Option<FfiPatient>, ClinicError> {
        let mut view = SearchPatientView::new(self.session.clone());
        if !view.select(id) {
            return Err(ClinicError::NotFound(format!("patient {}", id)));
        }
        if let Some(editor) = view.editor_mut() {
            *editor.form_mut() = form.into_form()?;
        }
        match view.submit_update()? {
            Outcome::Applied(Some(patient)) => Ok(Some(patient.into())),
            // Nothing changed
            Outcome::Applied(None) => {
                let patient = self.session.store().patients.get(id).cloned();
                Ok(patient.map(FfiPatient::from))
            }
            Outcome::Superseded => Ok(None),
        }
    }

    pub fn delete_patient(&self, id: u64) -> Result<(), ClinicError> {
        SearchPatientView::new(self.session.clone()).delete(id)?;
        Ok(())
    }

    // =========================================================================
    // Clinical Record Operations
    // =========================================================================

    pub fn create_clinical_record(
        &self,
        form: FfiRecordForm,
    ) -> Result<Option<FfiClinicalRecord>, ClinicError> {
        let mut view = CreateRecordView::new(self.session.clone());
        *view.form_mut() = form.into_form()?;
        Ok(view.submit()?.applied().map(FfiClinicalRecord::from))
    }

    /// Enter the records screen: look up `id` when given, otherwise load
    /// the full list.
    pub fn enter_clinical_records(
        &self,
        id: Option<String>,
    ) -> Result<Vec<FfiClinicalRecord>, ClinicError> {
        let mut view = SearchRecordView::new(self.session.clone());
        view.enter(id.as_deref())?;
        Ok(match view.record() {
            Some(record) => vec![record.clone().into()],
            None => view.records().into_iter().map(Into::into).collect(),
        })
    }

    pub fn lookup_clinical_record(
        &self,
        id: String,
    ) -> Result<Option<FfiClinicalRecord>, ClinicError> {
        let mut view = SearchRecordView::new(self.session.clone());
        Ok(view.lookup(&id)?.applied().map(FfiClinicalRecord::from))
    }

    /// Records currently held in the store.
    pub fn clinical_records(&self) -> Vec<FfiClinicalRecord> {
        self.session
            .store()
            .records
            .iter()
            .cloned()
            .map(FfiClinicalRecord::from)
            .collect()
    }

    /// Replace every field of a known record.
    pub fn update_clinical_record(
        &self,
        id: u64,
        form: FfiRecordForm,
    ) -> Result<Option<FfiClinicalRecord>, ClinicError> {
        let mut view = SearchRecordView::new(self.session.clone());
        if !view.open_editor(id) {
            return Err(ClinicError::NotFound(format!("clinical record {}", id)));
        }
        if let Some(editor) = view.editor_mut() {
            *editor.form_mut() = form.into_edit_form();
        }
        Ok(view
            .submit_update()?
            .applied()
            .flatten()
            .map(FfiClinicalRecord::from))
    }

    pub fn delete_clinical_record(&self, id: u64) -> Result<(), ClinicError> {
        SearchRecordView::new(self.session.clone()).delete(id)?;
        Ok(())
    }

    // =========================================================================
    // Notifications
    // =========================================================================

    /// Take every pending toast, oldest first.
    pub fn drain_toasts(&self) -> Vec<FfiToast> {
        self.session
            .drain_toasts()
            .into_iter()
            .map(FfiToast::from)
            .collect()
    }
}

// =========================================================================
// FFI Types
// =========================================================================

#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiNavLink {
    pub label: String,
    pub path: String,
}

#[derive(Debug, Clone, PartialEq, Eq, uniffi::Enum)]
pub enum FfiRoute {
    Home,
    CreatePatient,
    CreateClinicalRecord,
    Patients,
    ClinicalRecords { id: Option<String> },
}

impl From<Route> for FfiRoute {
    fn from(route: Route) -> Self {
        match route {
            Route::Home => FfiRoute::Home,
            Route::CreatePatient => FfiRoute::CreatePatient,
            Route::CreateClinicalRecord => FfiRoute::CreateClinicalRecord,
            Route::Patients => FfiRoute::Patients,
            Route::ClinicalRecords { id } => FfiRoute::ClinicalRecords { id },
        }
    }
}

/// FFI-safe patient. Dates are `YYYY-MM-DD`.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiPatient {
    pub id: Option<u64>,
    pub first_name: String,
    pub sur_name: String,
    pub middle_name: String,
    pub date_of_birth: String,
    pub home_address: String,
    pub date_of_registration: String,
}

impl From<Patient> for FfiPatient {
    fn from(patient: Patient) -> Self {
        Self {
            id: patient.id,
            first_name: patient.first_name,
            sur_name: patient.sur_name,
            middle_name: patient.middle_name,
            date_of_birth: format_date(&patient.date_of_birth),
            home_address: patient.home_address,
            date_of_registration: format_date(&patient.date_of_registration),
        }
    }
}

/// Patient form input. Missing or empty dates fall back to today on
/// create and are left unchanged on update.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiPatientForm {
    pub first_name: String,
    pub sur_name: String,
    pub middle_name: String,
    pub home_address: String,
    pub date_of_birth: Option<String>,
    pub date_of_registration: Option<String>,
}

impl FfiPatientForm {
    fn into_form(self) -> Result<PatientForm, ClinicError> {
        Ok(PatientForm {
            date_of_birth: parse_optional_date("dateOfBirth", self.date_of_birth)?,
            date_of_registration: parse_optional_date(
                "dateOfRegistration",
                self.date_of_registration,
            )?,
            first_name: self.first_name,
            sur_name: self.sur_name,
            middle_name: self.middle_name,
            home_address: self.home_address,
        })
    }
}

/// FFI-safe clinical record. Dates are `YYYY-MM-DD`.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiClinicalRecord {
    pub id: u64,
    pub clinic_date: String,
    pub nature_of_ailment: String,
    pub medicine_prescribed: Option<String>,
    pub procedure_undertaken: String,
    pub date_of_next_appointment: Option<String>,
}

impl From<ClinicalRecord> for FfiClinicalRecord {
    fn from(record: ClinicalRecord) -> Self {
        Self {
            id: record.id,
            clinic_date: format_date(&record.clinic_date),
            nature_of_ailment: record.nature_of_ailment,
            medicine_prescribed: record.medicine_prescribed,
            procedure_undertaken: record.procedure_undertaken,
            date_of_next_appointment: record.date_of_next_appointment.as_ref().map(format_date),
        }
    }
}

/// Clinical record form input, used for both create and edit.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiRecordForm {
    pub clinic_date: Option<String>,
    pub nature_of_ailment: String,
    pub medicine_prescribed: Option<String>,
    pub procedure_undertaken: String,
    pub date_of_next_appointment: Option<String>,
}

impl FfiRecordForm {
    fn into_form(self) -> Result<RecordForm, ClinicError> {
        Ok(RecordForm {
            clinic_date: parse_optional_date("clinicDate", self.clinic_date)?,
            nature_of_ailment: self.nature_of_ailment,
            medicine_prescribed: self.medicine_prescribed.unwrap_or_default(),
            procedure_undertaken: self.procedure_undertaken,
            date_of_next_appointment: parse_optional_date(
                "dateOfNextAppointment",
                self.date_of_next_appointment,
            )?,
        })
    }

    fn into_edit_form(self) -> RecordEditForm {
        RecordEditForm {
            clinic_date: self.clinic_date.unwrap_or_default(),
            nature_of_ailment: self.nature_of_ailment,
            medicine_prescribed: self.medicine_prescribed.unwrap_or_default(),
            procedure_undertaken: self.procedure_undertaken,
            date_of_next_appointment: self.date_of_next_appointment.unwrap_or_default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, uniffi::Enum)]
pub enum FfiToastLevel {
    Success,
    Error,
}

#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiToast {
    pub level: FfiToastLevel,
    pub message: String,
}

impl From<Toast> for FfiToast {
    fn from(toast: Toast) -> Self {
        Self {
            level: match toast.level {
                ToastLevel::Success => FfiToastLevel::Success,
                ToastLevel::Error => FfiToastLevel::Error,
            },
            message: toast.message,
        }
    }
}

fn parse_optional_date(field: &str, raw: Option<String>) -> Result<Option<NaiveDate>, ClinicError> {
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => parse_date(value)
            .map(Some)
            .map_err(|e| ClinicError::InvalidInput(format!("{}: {} ({})", field, value, e))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mock_core() -> (Arc<MockClinicApi>, Arc<ToothFixersCore>) {
        let api = Arc::new(MockClinicApi::new());
        let core = ToothFixersCore::with_api(api.clone());
        (api, core)
    }

    fn patient_form() -> FfiPatientForm {
        FfiPatientForm {
            first_name: "Ada".into(),
            sur_name: "Lovelace".into(),
            middle_name: String::new(),
            home_address: "1 Main St".into(),
            date_of_birth: Some("1815-12-10".into()),
            date_of_registration: None,
        }
    }

    #[test]
    fn test_resolve_route() {
        let (_, core) = mock_core();
        assert_eq!(
            core.resolve_route("/clinical-records/42/".into()).unwrap(),
            FfiRoute::ClinicalRecords {
                id: Some("42".into())
            }
        );
        assert!(matches!(
            core.resolve_route("/billing".into()),
            Err(ClinicError::UnknownRoute(_))
        ));
    }

    #[test]
    fn test_create_and_filter_patients() {
        let (_, core) = mock_core();
        let created = core.create_patient(patient_form()).unwrap().unwrap();
        assert!(created.id.is_some());
        assert_eq!(created.date_of_birth, "1815-12-10");

        assert_eq!(core.filter_patients("love".into()).len(), 1);
        assert!(core.filter_patients("hopper".into()).is_empty());

        let toasts = core.drain_toasts();
        assert_eq!(toasts.len(), 1);
        assert_eq!(toasts[0].level, FfiToastLevel::Success);
        assert_eq!(
            toasts[0].message,
            "Patient Ada Lovelace has been successfully created"
        );
    }

    #[test]
    fn test_bad_date_is_invalid_input() {
        let (api, core) = mock_core();
        let mut form = patient_form();
        form.date_of_birth = Some("10/12/1815".into());
        assert!(matches!(
            core.create_patient(form),
            Err(ClinicError::InvalidInput(_))
        ));
        assert!(api.requests().is_empty());
    }

    #[test]
    fn test_update_unknown_patient() {
        let (_, core) = mock_core();
        assert!(matches!(
            core.update_patient(99, patient_form()),
            Err(ClinicError::NotFound(_))
        ));
    }

    #[test]
    fn test_view_error_kind_maps_to_variant() {
        let err: ClinicError = ViewError::new(ErrorKind::Network, "offline").into();
        assert!(matches!(err, ClinicError::Network(m) if m == "offline"));
    }
}
