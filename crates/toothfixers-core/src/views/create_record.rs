//! Clinical record creation screen.

use chrono::NaiveDate;

use super::{is_blank, non_empty, today, Outcome, ViewError, ViewResult};
use crate::inflight::Operation;
use crate::models::dates::format_date;
use crate::models::{ClinicalRecord, NewClinicalRecord};
use crate::session::Session;

pub const CREATE_RECORD_FAILED: &str = "Failed to create clinical record. Please try again.";

#[derive(Debug, Clone, PartialEq)]
pub struct RecordForm {
    pub clinic_date: Option<NaiveDate>,
    pub nature_of_ailment: String,
    pub medicine_prescribed: String,
    pub procedure_undertaken: String,
    pub date_of_next_appointment: Option<NaiveDate>,
}

impl Default for RecordForm {
    fn default() -> Self {
        Self::new(today())
    }
}

impl RecordForm {
    pub fn new(today: NaiveDate) -> Self {
        Self {
            clinic_date: Some(today),
            nature_of_ailment: String::new(),
            medicine_prescribed: String::new(),
            procedure_undertaken: String::new(),
            date_of_next_appointment: Some(today),
        }
    }

    pub fn missing_required(&self) -> Option<&'static str> {
        if is_blank(&self.nature_of_ailment) {
            Some("natureOfAilment")
        } else if is_blank(&self.procedure_undertaken) {
            Some("procedureUndertaken")
        } else {
            None
        }
    }

    /// Build the create request. Both dates fall back to `today`; an empty
    /// medicine is sent as `null`.
    pub fn to_new_record(&self, today: NaiveDate) -> NewClinicalRecord {
        NewClinicalRecord::new(
            self.clinic_date.unwrap_or(today),
            self.nature_of_ailment.clone(),
            non_empty(&self.medicine_prescribed),
            self.procedure_undertaken.clone(),
            Some(self.date_of_next_appointment.unwrap_or(today)),
        )
    }
}

/// Create Clinical Record screen. The form resets after a successful submit.
pub struct CreateRecordView {
    session: Session,
    form: RecordForm,
    success: Option<String>,
    error: Option<ViewError>,
}

impl CreateRecordView {
    pub fn new(session: Session) -> Self {
        Self {
            session,
            form: RecordForm::default(),
            success: None,
            error: None,
        }
    }

    pub fn form(&self) -> &RecordForm {
        &self.form
    }

    pub fn form_mut(&mut self) -> &mut RecordForm {
        &mut self.form
    }

    /// Inline confirmation of the last successful submit.
    pub fn success_message(&self) -> Option<&str> {
        self.success.as_deref()
    }

    pub fn error(&self) -> Option<&ViewError> {
        self.error.as_ref()
    }

    pub fn submit(&mut self) -> ViewResult<ClinicalRecord> {
        if let Some(field) = self.form.missing_required() {
            tracing::warn!(field, "Clinical record form is missing a required field");
            return Err(self.fail(ViewError::validation(CREATE_RECORD_FAILED)));
        }

        let today = today();
        let body = self.form.to_new_record(today);
        let ticket = self.session.begin(Operation::CreateClinicalRecord);
        let operation = ticket.operation();
        let result = self.session.api().create_clinical_record(&body);
        let current = self.session.finish(ticket);

        match result {
            Ok(created) => {
                self.session.store().records.upsert(created.clone());
                let message = format!(
                    "Clinical record created on {}",
                    format_date(&created.clinic_date)
                );
                self.session.toast_success(message.clone());
                if !current {
                    tracing::debug!(?operation, "Kept superseded create in store");
                    return Ok(Outcome::Superseded);
                }
                self.success = Some(message);
                self.error = None;
                self.form = RecordForm::new(today);
                Ok(Outcome::Applied(created))
            }
            Err(_) if !current => Ok(Outcome::Superseded),
            Err(e) => {
                tracing::warn!(error = %e, "Error creating clinical record");
                Err(self.fail(ViewError::from_api(&e, CREATE_RECORD_FAILED)))
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

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_defaults() {
        let form = RecordForm::new(date(2024, 4, 4));
        assert_eq!(form.clinic_date, Some(date(2024, 4, 4)));
        assert_eq!(form.date_of_next_appointment, Some(date(2024, 4, 4)));
        assert!(form.nature_of_ailment.is_empty());
        assert_eq!(form.missing_required(), Some("natureOfAilment"));
    }

    #[test]
    fn test_to_new_record_fallbacks() {
        let form = RecordForm {
            clinic_date: None,
            nature_of_ailment: "Toothache".into(),
            medicine_prescribed: "   ".into(),
            procedure_undertaken: "Filling".into(),
            date_of_next_appointment: None,
        };
        let body = form.to_new_record(date(2024, 4, 4));
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["clinicDate"], "2024-04-04");
        assert_eq!(json["dateOfNextAppointment"], "2024-04-04");
        assert!(json["medicinePrescribed"].is_null());
        assert!(json["patientId"].is_null());
    }
}
