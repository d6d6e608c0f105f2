//! Clinical records screen: lookup by id, full list, edit modal, delete.

use super::{is_blank, non_empty, LoadState, Outcome, ViewError, ViewResult};
use crate::inflight::Operation;
use crate::models::dates::{format_date, parse_date};
use crate::models::{ClinicalRecord, ClinicalRecordPatch};
use crate::session::Session;

pub const FETCH_RECORD_FAILED: &str = "Failed to fetch clinical record. Please try again.";
pub const FETCH_RECORDS_FAILED: &str = "Failed to fetch clinical records. Please try again.";
pub const UPDATE_RECORD_FAILED: &str = "Failed to update clinical record. Please try again.";
pub const DELETE_RECORD_FAILED: &str = "Failed to delete clinical record. Please try again.";

/// Edit modal state. Dates are held as `YYYY-MM-DD` text and parsed on
/// submit.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordEditForm {
    pub clinic_date: String,
    pub nature_of_ailment: String,
    pub medicine_prescribed: String,
    pub procedure_undertaken: String,
    pub date_of_next_appointment: String,
}

impl RecordEditForm {
    pub fn from_record(record: &ClinicalRecord) -> Self {
        Self {
            clinic_date: format_date(&record.clinic_date),
            nature_of_ailment: record.nature_of_ailment.clone(),
            medicine_prescribed: record.medicine_prescribed.clone().unwrap_or_default(),
            procedure_undertaken: record.procedure_undertaken.clone(),
            date_of_next_appointment: record
                .date_of_next_appointment
                .as_ref()
                .map(format_date)
                .unwrap_or_default(),
        }
    }

    /// Every field as a patch. Blank optional fields become explicit nulls.
    /// The id travels in the request path and is left out of the body.
    pub fn to_patch(&self) -> Result<ClinicalRecordPatch, ViewError> {
        let clinic_date = parse_date(self.clinic_date.trim()).map_err(|e| {
            tracing::warn!(value = %self.clinic_date, error = %e, "Invalid clinic date");
            ViewError::validation(UPDATE_RECORD_FAILED)
        })?;
        let next = if is_blank(&self.date_of_next_appointment) {
            None
        } else {
            let raw = self.date_of_next_appointment.trim();
            Some(parse_date(raw).map_err(|e| {
                tracing::warn!(value = raw, error = %e, "Invalid next appointment date");
                ViewError::validation(UPDATE_RECORD_FAILED)
            })?)
        };

        Ok(ClinicalRecordPatch {
            clinic_date: Some(clinic_date),
            nature_of_ailment: Some(self.nature_of_ailment.clone()),
            medicine_prescribed: Some(non_empty(&self.medicine_prescribed)),
            procedure_undertaken: Some(self.procedure_undertaken.clone()),
            date_of_next_appointment: Some(next),
        })
    }
}

#[derive(Debug, Clone)]
pub struct RecordEditor {
    id: u64,
    form: RecordEditForm,
}

impl RecordEditor {
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn form(&self) -> &RecordEditForm {
        &self.form
    }

    pub fn form_mut(&mut self) -> &mut RecordEditForm {
        &mut self.form
    }
}

/// Clinical Records Management screen.
///
/// Holds two views of the same data: the record found by the last lookup
/// and the full list in the shared store. Edits reach both.
pub struct SearchRecordView {
    session: Session,
    list_state: LoadState,
    search_id: String,
    record: Option<ClinicalRecord>,
    editor: Option<RecordEditor>,
    error: Option<ViewError>,
}

impl SearchRecordView {
    pub fn new(session: Session) -> Self {
        Self {
            session,
            list_state: LoadState::Idle,
            search_id: String::new(),
            record: None,
            editor: None,
            error: None,
        }
    }

    /// Enter the screen. With a route id the record is looked up,
    /// otherwise the full list is fetched.
    pub fn enter(&mut self, route_id: Option<&str>) -> ViewResult<()> {
        match route_id {
            Some(id) => {
                self.search_id = id.to_string();
                Ok(match self.lookup(id)? {
                    Outcome::Applied(_) => Outcome::Applied(()),
                    Outcome::Superseded => Outcome::Superseded,
                })
            }
            None => Ok(match self.load_all()? {
                Outcome::Applied(_) => Outcome::Applied(()),
                Outcome::Superseded => Outcome::Superseded,
            }),
        }
    }

    pub fn search_id(&self) -> &str {
        &self.search_id
    }

    pub fn set_search_id(&mut self, id: impl Into<String>) {
        self.search_id = id.into();
    }

    /// Look up the id typed in the search box.
    pub fn search(&mut self) -> ViewResult<ClinicalRecord> {
        let id = self.search_id.clone();
        self.lookup(&id)
    }

    /// Fetch one record by id. A failure clears the displayed record and
    /// leaves the list alone.
    pub fn lookup(&mut self, raw_id: &str) -> ViewResult<ClinicalRecord> {
        let id = match raw_id.trim().parse::<u64>() {
            Ok(id) => id,
            Err(_) => {
                tracing::warn!(id = raw_id, "Clinical record id is not numeric");
                self.record = None;
                return Err(self.fail(ViewError::validation(FETCH_RECORD_FAILED)));
            }
        };

        let ticket = self.session.begin(Operation::LookupClinicalRecord);
        let result = self.session.api().get_clinical_record(id);
        if !self.session.finish(ticket) {
            return Ok(Outcome::Superseded);
        }

        match result {
            Ok(record) => {
                self.session.store().records.upsert(record.clone());
                self.record = Some(record.clone());
                self.error = None;
                Ok(Outcome::Applied(record))
            }
            Err(e) => {
                tracing::warn!(error = %e, record_id = id, "Error fetching clinical record");
                self.record = None;
                Err(self.fail(ViewError::from_api(&e, FETCH_RECORD_FAILED)))
            }
        }
    }

    /// Fetch every record into the shared store.
    pub fn load_all(&mut self) -> ViewResult<usize> {
        let previous = std::mem::replace(&mut self.list_state, LoadState::Loading);
        let ticket = self.session.begin(Operation::ListClinicalRecords);
        let result = self.session.api().list_clinical_records();
        if !self.session.finish(ticket) {
            self.list_state = if self.session.store().records.is_loaded() {
                LoadState::Ready
            } else {
                previous
            };
            return Ok(Outcome::Superseded);
        }

        match result {
            Ok(records) => {
                let mut store = self.session.store();
                store.records.replace_all(records);
                self.list_state = LoadState::Ready;
                Ok(Outcome::Applied(store.records.len()))
            }
            Err(e) => {
                tracing::warn!(error = %e, "Error fetching clinical records");
                let err = self.fail(ViewError::from_api(&e, FETCH_RECORDS_FAILED));
                self.list_state = LoadState::Failed(err.clone());
                Err(err)
            }
        }
    }

    pub fn list_state(&self) -> &LoadState {
        &self.list_state
    }

    /// Record shown by the last successful lookup.
    pub fn record(&self) -> Option<&ClinicalRecord> {
        self.record.as_ref()
    }

    /// All records, in list order.
    pub fn records(&self) -> Vec<ClinicalRecord> {
        self.session.store().records.snapshot()
    }

    pub fn error(&self) -> Option<&ViewError> {
        self.error.as_ref()
    }

    /// Open the edit modal for a listed or looked-up record.
    pub fn open_editor(&mut self, id: u64) -> bool {
        let found = self
            .session
            .store()
            .records
            .get(id)
            .cloned()
            .or_else(|| self.record.clone().filter(|r| r.id == id));
        match found {
            Some(record) => {
                self.editor = Some(RecordEditor {
                    id,
                    form: RecordEditForm::from_record(&record),
                });
                true
            }
            None => false,
        }
    }

    pub fn editor(&self) -> Option<&RecordEditor> {
        self.editor.as_ref()
    }

    pub fn editor_mut(&mut self) -> Option<&mut RecordEditor> {
        self.editor.as_mut()
    }

    pub fn close_editor(&mut self) {
        self.editor = None;
    }

    /// Send the whole modal form. Errors stay inline and keep the modal
    /// open. `Applied(None)` means no modal was open.
    pub fn submit_update(&mut self) -> ViewResult<Option<ClinicalRecord>> {
        let Some(editor) = &self.editor else {
            return Ok(Outcome::Applied(None));
        };
        let id = editor.id();
        let patch = match editor.form().to_patch() {
            Ok(patch) => patch,
            Err(err) => {
                self.error = Some(err.clone());
                return Err(err);
            }
        };

        let ticket = self.session.begin(Operation::UpdateClinicalRecord(id));
        let operation = ticket.operation();
        let result = self.session.api().update_clinical_record(id, &patch);
        if !self.session.finish(ticket) {
            if result.is_ok() {
                tracing::debug!(?operation, "Superseded update accepted, invalidating records");
                self.session.store().records.invalidate();
            }
            return Ok(Outcome::Superseded);
        }

        match result {
            Ok(updated) => {
                let merged = {
                    let mut store = self.session.store();
                    store.records.update_with(id, |r| updated.apply_to(r));
                    store.records.get(id).cloned()
                };
                if let Some(record) = self.record.as_mut().filter(|r| r.id == id) {
                    updated.apply_to(record);
                }
                self.editor = None;
                self.error = None;
                self.session.toast_success("Record updated successfully");
                Ok(Outcome::Applied(
                    merged.or_else(|| self.record.clone().filter(|r| r.id == id)),
                ))
            }
            Err(e) => {
                tracing::warn!(error = %e, record_id = id, "Error updating clinical record");
                let err = ViewError::from_api(&e, UPDATE_RECORD_FAILED);
                self.error = Some(err.clone());
                Err(err)
            }
        }
    }

    /// Delete a record once the backend confirms. Errors stay inline.
    pub fn delete(&mut self, id: u64) -> ViewResult<()> {
        let ticket = self.session.begin(Operation::DeleteClinicalRecord(id));
        let operation = ticket.operation();
        let result = self.session.api().delete_clinical_record(id);
        let current = self.session.finish(ticket);

        match result {
            Ok(()) => {
                self.session.store().records.remove(id);
                if self.record.as_ref().map(|r| r.id) == Some(id) {
                    self.record = None;
                }
                if self.editor.as_ref().map(RecordEditor::id) == Some(id) {
                    self.editor = None;
                }
                self.session.toast_success("Record deleted successfully");
                if !current {
                    tracing::debug!(?operation, "Kept superseded delete in store");
                    return Ok(Outcome::Superseded);
                }
                Ok(Outcome::Applied(()))
            }
            Err(_) if !current => Ok(Outcome::Superseded),
            Err(e) => {
                tracing::warn!(error = %e, record_id = id, "Error deleting clinical record");
                let err = ViewError::from_api(&e, DELETE_RECORD_FAILED);
                self.error = Some(err.clone());
                Err(err)
            }
        }
    }

    fn fail(&mut self, err: ViewError) -> ViewError {
        self.error = Some(err.clone());
        err
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn record() -> ClinicalRecord {
        ClinicalRecord {
            id: 42,
            clinic_date: date(2024, 5, 2),
            nature_of_ailment: "Toothache".into(),
            medicine_prescribed: None,
            procedure_undertaken: "Filling".into(),
            date_of_next_appointment: Some(date(2024, 6, 2)),
            patient_id: Some(3),
        }
    }

    #[test]
    fn test_edit_form_seeds_strings() {
        let form = RecordEditForm::from_record(&record());
        assert_eq!(form.clinic_date, "2024-05-02");
        assert_eq!(form.medicine_prescribed, "");
        assert_eq!(form.date_of_next_appointment, "2024-06-02");
    }

    #[test]
    fn test_to_patch_sends_every_field() {
        let mut form = RecordEditForm::from_record(&record());
        form.date_of_next_appointment.clear();

        let patch = form.to_patch().unwrap();
        assert_eq!(patch.clinic_date, Some(date(2024, 5, 2)));
        assert_eq!(patch.medicine_prescribed, Some(None));
        assert_eq!(patch.date_of_next_appointment, Some(None));

        let json = serde_json::to_value(&patch).unwrap();
        assert_eq!(json.as_object().unwrap().len(), 5);
        assert!(json.get("id").is_none());
        assert!(json["medicinePrescribed"].is_null());
    }

    #[test]
    fn test_to_patch_rejects_bad_date() {
        let mut form = RecordEditForm::from_record(&record());
        form.clinic_date = "02/05/2024".into();
        let err = form.to_patch().unwrap_err();
        assert_eq!(err.message, UPDATE_RECORD_FAILED);
    }
}
