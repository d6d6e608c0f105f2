//! Patient management screen: list, name filter, inline edit, delete.

use super::{Outcome, PatientForm, ViewError, ViewResult};
use crate::inflight::Operation;
use crate::models::{Patient, PatientPatch};
use crate::session::Session;

pub const FETCH_PATIENTS_FAILED: &str = "Error fetching patients";
pub const UPDATE_PATIENT_FAILED: &str = "Error updating patient";
pub const DELETE_PATIENT_FAILED: &str = "Error deleting patient";

/// Loading state of a fetched list.
#[derive(Debug, Clone, PartialEq)]
pub enum LoadState {
    /// Not requested yet.
    Idle,
    Loading,
    Ready,
    Failed(ViewError),
}

/// Patients whose space-joined names contain `query`, ignoring case.
/// Input order is preserved.
pub fn filter_patients<'a, I>(patients: I, query: &str) -> Vec<Patient>
where
    I: IntoIterator<Item = &'a Patient>,
{
    patients
        .into_iter()
        .filter(|p| p.matches(query))
        .cloned()
        .collect()
}

/// Inline edit panel for one patient.
#[derive(Debug, Clone)]
pub struct PatientEditor {
    id: u64,
    original: Patient,
    form: PatientForm,
}

impl PatientEditor {
    fn open(id: u64, patient: Patient) -> Self {
        Self {
            id,
            form: PatientForm::from_patient(&patient),
            original: patient,
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn original(&self) -> &Patient {
        &self.original
    }

    pub fn form(&self) -> &PatientForm {
        &self.form
    }

    pub fn form_mut(&mut self) -> &mut PatientForm {
        &mut self.form
    }

    /// Fields edited since the panel opened.
    pub fn changes(&self) -> PatientPatch {
        self.form.diff(&self.original)
    }
}

pub struct SearchPatientView {
    session: Session,
    state: LoadState,
    query: String,
    editor: Option<PatientEditor>,
    error: Option<ViewError>,
}

impl SearchPatientView {
    pub fn new(session: Session) -> Self {
        Self {
            session,
            state: LoadState::Idle,
            query: String::new(),
            editor: None,
            error: None,
        }
    }

    /// Fetch the full patient list into the store. Called once per entry.
    pub fn enter(&mut self) -> ViewResult<usize> {
        let previous = std::mem::replace(&mut self.state, LoadState::Loading);
        let ticket = self.session.begin(Operation::ListPatients);
        let result = self.session.api().list_patients();
        if !self.session.finish(ticket) {
            // The newer fetch owns the store; settle on what it left there.
            self.state = if self.session.store().patients.is_loaded() {
                LoadState::Ready
            } else {
                previous
            };
            return Ok(Outcome::Superseded);
        }

        match result {
            Ok(patients) => {
                let mut store = self.session.store();
                store.patients.replace_all(patients);
                self.state = LoadState::Ready;
                Ok(Outcome::Applied(store.patients.len()))
            }
            Err(e) => {
                tracing::warn!(error = %e, "Error fetching patients");
                let err = self.fail(ViewError::from_api(&e, FETCH_PATIENTS_FAILED));
                self.state = LoadState::Failed(err.clone());
                Err(err)
            }
        }
    }

    pub fn state(&self) -> &LoadState {
        &self.state
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn set_query(&mut self, query: impl Into<String>) {
        self.query = query.into();
    }

    /// Patients matching the current query, in list order.
    pub fn patients(&self) -> Vec<Patient> {
        let store = self.session.store();
        filter_patients(store.patients.iter(), &self.query)
    }

    /// Shared error of the last failed operation.
    pub fn error(&self) -> Option<&ViewError> {
        self.error.as_ref()
    }

    /// Open the edit panel seeded with the patient's current values.
    /// Returns false if no listed patient has this id.
    pub fn select(&mut self, id: u64) -> bool {
        let patient = self.session.store().patients.get(id).cloned();
        match patient {
            Some(patient) => {
                self.editor = Some(PatientEditor::open(id, patient));
                true
            }
            None => false,
        }
    }

    pub fn editor(&self) -> Option<&PatientEditor> {
        self.editor.as_ref()
    }

    pub fn editor_mut(&mut self) -> Option<&mut PatientEditor> {
        self.editor.as_mut()
    }

    pub fn cancel_edit(&mut self) {
        self.editor = None;
    }

    /// Send the edited fields. On success the response is merged into the
    /// listed patient and the panel closes. `Applied(None)` means nothing
    /// was sent: no panel was open or no field changed.
    pub fn submit_update(&mut self) -> ViewResult<Option<Patient>> {
        let Some(editor) = &self.editor else {
            return Ok(Outcome::Applied(None));
        };
        let id = editor.id();
        let patch = editor.changes();
        if patch.is_empty() {
            self.editor = None;
            return Ok(Outcome::Applied(None));
        }

        let ticket = self.session.begin(Operation::UpdatePatient(id));
        let operation = ticket.operation();
        let result = self.session.api().update_patient(id, &patch);
        if !self.session.finish(ticket) {
            if result.is_ok() {
                // Which of the overlapping PATCHes landed last is unknown.
                tracing::debug!(?operation, "Superseded update accepted, invalidating patients");
                self.session.store().patients.invalidate();
            }
            return Ok(Outcome::Superseded);
        }

        match result {
            Ok(updated) => {
                let merged = {
                    let mut store = self.session.store();
                    store.patients.update_with(id, |p| updated.apply_to(p));
                    store.patients.get(id).cloned()
                };
                self.editor = None;
                self.error = None;
                self.session.toast_success("Patient updated successfully");
                Ok(Outcome::Applied(merged))
            }
            Err(e) => {
                tracing::warn!(error = %e, patient_id = id, "Error updating patient");
                Err(self.fail(ViewError::from_api(&e, UPDATE_PATIENT_FAILED)))
            }
        }
    }

    /// Delete a patient; the entry leaves the list only once the backend
    /// confirms.
    pub fn delete(&mut self, id: u64) -> ViewResult<()> {
        let ticket = self.session.begin(Operation::DeletePatient(id));
        let operation = ticket.operation();
        let result = self.session.api().delete_patient(id);
        let current = self.session.finish(ticket);

        match result {
            Ok(()) => {
                self.session.store().patients.remove(id);
                if self.editor.as_ref().map(PatientEditor::id) == Some(id) {
                    self.editor = None;
                }
                self.session.toast_success("Patient deleted successfully");
                if !current {
                    tracing::debug!(?operation, "Kept superseded delete in store");
                    return Ok(Outcome::Superseded);
                }
                Ok(Outcome::Applied(()))
            }
            Err(_) if !current => Ok(Outcome::Superseded),
            Err(e) => {
                tracing::warn!(error = %e, patient_id = id, "Error deleting patient");
                Err(self.fail(ViewError::from_api(&e, DELETE_PATIENT_FAILED)))
            }
        }
    }

    fn fail(&mut self, err: ViewError) -> ViewError {
        self.error = Some(err.clone());
        self.session.toast_error(err.message.clone());
        err
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use proptest::prelude::*;

    fn patient(id: u64, first: &str, sur: &str, middle: &str) -> Patient {
        Patient {
            id: Some(id),
            first_name: first.into(),
            sur_name: sur.into(),
            middle_name: middle.into(),
            date_of_birth: NaiveDate::from_ymd_opt(1990, 1, 1).unwrap(),
            home_address: "1 Main St".into(),
            date_of_registration: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
        }
    }

    #[test]
    fn test_filter_across_name_parts() {
        let patients = vec![
            patient(1, "Ada", "Lovelace", "King"),
            patient(2, "Grace", "Hopper", "Brewster"),
            patient(3, "Alan", "Turing", "Mathison"),
        ];

        let hits = filter_patients(&patients, "KING");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, Some(1));

        // Spans the first/sur boundary of the joined text
        let hits = filter_patients(&patients, "grace hop");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, Some(2));

        let hits = filter_patients(&patients, "a");
        assert_eq!(hits.len(), 3);
    }

    fn name_strategy() -> impl Strategy<Value = String> {
        "[a-cA-C]{0,5}"
    }

    proptest! {
        #[test]
        fn prop_filter_is_exact_subset(
            names in proptest::collection::vec(
                (name_strategy(), name_strategy(), name_strategy()),
                0..12,
            ),
            query in "[a-cA-C ]{0,3}",
        ) {
            let patients: Vec<Patient> = names
                .iter()
                .enumerate()
                .map(|(i, (f, s, m))| patient(i as u64 + 1, f, s, m))
                .collect();

            let hits = filter_patients(&patients, &query);
            let expected: Vec<Option<u64>> = patients
                .iter()
                .filter(|p| {
                    format!("{} {} {}", p.first_name, p.sur_name, p.middle_name)
                        .to_lowercase()
                        .contains(&query.to_lowercase())
                })
                .map(|p| p.id)
                .collect();
            let got: Vec<Option<u64>> = hits.iter().map(|p| p.id).collect();
            prop_assert_eq!(got, expected);
        }

        #[test]
        fn prop_filter_stable_under_unrelated_updates(
            names in proptest::collection::vec(
                (name_strategy(), name_strategy(), name_strategy()),
                1..12,
            ),
            query in "[a-c]{1,2}",
        ) {
            let mut patients: Vec<Patient> = names
                .iter()
                .enumerate()
                .map(|(i, (f, s, m))| patient(i as u64 + 1, f, s, m))
                .collect();
            let before = filter_patients(&patients, &query);

            // Touch a field the filter does not read
            for p in patients.iter_mut() {
                p.home_address = "2 Oak Ave".into();
            }
            let after: Vec<Option<u64>> =
                filter_patients(&patients, &query).iter().map(|p| p.id).collect();
            let before: Vec<Option<u64>> = before.iter().map(|p| p.id).collect();
            prop_assert_eq!(after, before);
        }
    }
}
