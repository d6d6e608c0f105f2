//! Patient creation screen.

use chrono::NaiveDate;

use super::{is_blank, today, Outcome, ViewError, ViewResult};
use crate::inflight::Operation;
use crate::models::{NewPatient, Patient, PatientPatch};
use crate::session::Session;

pub const CREATE_PATIENT_FAILED: &str = "Failed to create patient. Please try again.";

/// Editable patient fields, used by the creation screen and the edit panel.
#[derive(Debug, Clone, PartialEq)]
pub struct PatientForm {
    pub first_name: String,
    pub sur_name: String,
    pub middle_name: String,
    pub home_address: String,
    pub date_of_birth: Option<NaiveDate>,
    pub date_of_registration: Option<NaiveDate>,
}

impl Default for PatientForm {
    fn default() -> Self {
        Self::new(today())
    }
}

impl PatientForm {
    /// Blank form with both dates set to `today`.
    pub fn new(today: NaiveDate) -> Self {
        Self {
            first_name: String::new(),
            sur_name: String::new(),
            middle_name: String::new(),
            home_address: String::new(),
            date_of_birth: Some(today),
            date_of_registration: Some(today),
        }
    }

    /// Form seeded with a patient's current values.
    pub fn from_patient(patient: &Patient) -> Self {
        Self {
            first_name: patient.first_name.clone(),
            sur_name: patient.sur_name.clone(),
            middle_name: patient.middle_name.clone(),
            home_address: patient.home_address.clone(),
            date_of_birth: Some(patient.date_of_birth),
            date_of_registration: Some(patient.date_of_registration),
        }
    }

    /// Name of the first required field left blank.
    pub fn missing_required(&self) -> Option<&'static str> {
        if is_blank(&self.first_name) {
            Some("firstName")
        } else if is_blank(&self.sur_name) {
            Some("surName")
        } else if is_blank(&self.home_address) {
            Some("homeAddress")
        } else {
            None
        }
    }

    /// Build the create request; unset dates fall back to `today`.
    pub fn to_new_patient(&self, today: NaiveDate) -> NewPatient {
        NewPatient {
            first_name: self.first_name.clone(),
            sur_name: self.sur_name.clone(),
            middle_name: self.middle_name.clone(),
            date_of_birth: self.date_of_birth.unwrap_or(today),
            home_address: self.home_address.clone(),
            date_of_registration: self.date_of_registration.unwrap_or(today),
        }
    }

    /// Fields whose value differs from `original`. Cleared dates are not
    /// sent since the backend cannot null them.
    pub fn diff(&self, original: &Patient) -> PatientPatch {
        fn changed(new: &str, old: &str) -> Option<String> {
            (new != old).then(|| new.to_string())
        }

        PatientPatch {
            first_name: changed(&self.first_name, &original.first_name),
            sur_name: changed(&self.sur_name, &original.sur_name),
            middle_name: changed(&self.middle_name, &original.middle_name),
            date_of_birth: self
                .date_of_birth
                .filter(|d| *d != original.date_of_birth),
            home_address: changed(&self.home_address, &original.home_address),
            date_of_registration: self
                .date_of_registration
                .filter(|d| *d != original.date_of_registration),
        }
    }
}

/// Create Patient screen. The form is kept after a successful submit.
pub struct CreatePatientView {
    session: Session,
    form: PatientForm,
    error: Option<ViewError>,
}

impl CreatePatientView {
    pub fn new(session: Session) -> Self {
        Self {
            session,
            form: PatientForm::default(),
            error: None,
        }
    }

    pub fn form(&self) -> &PatientForm {
        &self.form
    }

    pub fn form_mut(&mut self) -> &mut PatientForm {
        &mut self.form
    }

    pub fn error(&self) -> Option<&ViewError> {
        self.error.as_ref()
    }

    /// Submit the form. On success the created patient joins the store and
    /// a toast names it; on failure the error is shown inline and toasted.
    pub fn submit(&mut self) -> ViewResult<Patient> {
        if let Some(field) = self.form.missing_required() {
            tracing::warn!(field, "Patient form is missing a required field");
            return Err(self.fail(ViewError::validation(CREATE_PATIENT_FAILED)));
        }

        let body = self.form.to_new_patient(today());
        let ticket = self.session.begin(Operation::CreatePatient);
        let operation = ticket.operation();
        let result = self.session.api().create_patient(&body);
        let current = self.session.finish(ticket);

        match result {
            Ok(created) => {
                // The backend holds the patient even when a newer submit
                // superseded this one.
                {
                    let mut store = self.session.store();
                    if !store.patients.upsert(created.clone()) {
                        store.patients.invalidate();
                    }
                }
                self.session.toast_success(format!(
                    "Patient {} has been successfully created",
                    created.display_name()
                ));
                if !current {
                    tracing::debug!(?operation, "Kept superseded create in store");
                    return Ok(Outcome::Superseded);
                }
                self.error = None;
                Ok(Outcome::Applied(created))
            }
            Err(_) if !current => Ok(Outcome::Superseded),
            Err(e) => {
                tracing::warn!(error = %e, "Error creating patient");
                Err(self.fail(ViewError::from_api(&e, CREATE_PATIENT_FAILED)))
            }
        }
    }

    fn fail(&mut self, err: ViewError) -> ViewError {
        self.error = Some(err.clone());
        self.session.toast_error(err.message.clone());
        err
    }
}
