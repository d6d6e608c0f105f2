//! In-memory backend implementing [`ClinicApi`].
//!
//! Mirrors the REST contract closely enough to drive the screens without a
//! server: ids are assigned on create, PATCH answers with the fields it
//! applied, and every request is recorded for later inspection.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use serde::Serialize;
use serde_json::Value;

use super::{ApiError, ApiResult, ClinicApi, Endpoint};
use crate::models::{
    ClinicalRecord, ClinicalRecordPatch, NewClinicalRecord, NewPatient, Patient, PatientPatch,
};

/// A request as the backend would have received it.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedRequest {
    pub endpoint: Endpoint,
    pub method: &'static str,
    pub path: String,
    pub body: Option<Value>,
}

#[derive(Default)]
struct MockState {
    patients: Vec<Patient>,
    records: Vec<ClinicalRecord>,
    next_id: u64,
    requests: Vec<RecordedRequest>,
    failures: HashMap<Endpoint, ApiError>,
    patient_patch_reply: Option<PatientPatch>,
}

/// Mock backend for tests and demos.
#[derive(Default)]
pub struct MockClinicApi {
    state: Mutex<MockState>,
}

impl MockClinicApi {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the backend with existing patients (ids are kept as given).
    pub fn with_patients(self, patients: Vec<Patient>) -> Self {
        {
            let mut state = self.lock();
            let max_id = patients.iter().filter_map(|p| p.id).max().unwrap_or(0);
            state.next_id = state.next_id.max(max_id);
            state.patients = patients;
        }
        self
    }

    /// Seed the backend with existing clinical records.
    pub fn with_records(self, records: Vec<ClinicalRecord>) -> Self {
        {
            let mut state = self.lock();
            let max_id = records.iter().map(|r| r.id).max().unwrap_or(0);
            state.next_id = state.next_id.max(max_id);
            state.records = records;
        }
        self
    }

    /// Make every call to `endpoint` fail with `error` until cleared.
    pub fn fail(&self, endpoint: Endpoint, error: ApiError) {
        self.lock().failures.insert(endpoint, error);
    }

    pub fn clear_failures(&self) {
        self.lock().failures.clear();
    }

    /// Override the body returned by patient PATCH requests.
    pub fn reply_to_patient_patch(&self, reply: PatientPatch) {
        self.lock().patient_patch_reply = Some(reply);
    }

    /// All requests received so far, oldest first.
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.lock().requests.clone()
    }

    /// The most recent request, if any.
    pub fn last_request(&self) -> Option<RecordedRequest> {
        self.lock().requests.last().cloned()
    }

    pub fn patients(&self) -> Vec<Patient> {
        self.lock().patients.clone()
    }

    pub fn records(&self) -> Vec<ClinicalRecord> {
        self.lock().records.clone()
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Record the request and return the state, or the injected failure.
    fn receive<B: Serialize>(
        &self,
        endpoint: Endpoint,
        id: Option<u64>,
        body: Option<&B>,
    ) -> ApiResult<MutexGuard<'_, MockState>> {
        let mut state = self.lock();
        state.requests.push(RecordedRequest {
            endpoint,
            method: endpoint.method(),
            path: endpoint.path(id),
            body: body.and_then(|b| serde_json::to_value(b).ok()),
        });
        if let Some(err) = state.failures.get(&endpoint).cloned() {
            return Err(err);
        }
        Ok(state)
    }
}

impl MockState {
    fn assign_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }
}

fn not_found(endpoint: Endpoint, id: u64) -> ApiError {
    ApiError::NotFound(endpoint.path(Some(id)))
}

impl ClinicApi for MockClinicApi {
    fn create_patient(&self, patient: &NewPatient) -> ApiResult<Patient> {
        let mut state = self.receive(Endpoint::CreatePatient, None, Some(patient))?;
        let created = Patient {
            id: Some(state.assign_id()),
            first_name: patient.first_name.clone(),
            sur_name: patient.sur_name.clone(),
            middle_name: patient.middle_name.clone(),
            date_of_birth: patient.date_of_birth,
            home_address: patient.home_address.clone(),
            date_of_registration: patient.date_of_registration,
        };
        state.patients.push(created.clone());
        Ok(created)
    }

    fn list_patients(&self) -> ApiResult<Vec<Patient>> {
        let state = self.receive::<()>(Endpoint::ListPatients, None, None)?;
        Ok(state.patients.clone())
    }

    fn update_patient(&self, id: u64, patch: &PatientPatch) -> ApiResult<PatientPatch> {
        let mut state = self.receive(Endpoint::UpdatePatient, Some(id), Some(patch))?;
        let reply = state.patient_patch_reply.clone();
        let patient = state
            .patients
            .iter_mut()
            .find(|p| p.id == Some(id))
            .ok_or_else(|| not_found(Endpoint::UpdatePatient, id))?;
        patch.apply_to(patient);
        Ok(reply.unwrap_or_else(|| patch.clone()))
    }

    fn delete_patient(&self, id: u64) -> ApiResult<()> {
        let mut state = self.receive::<()>(Endpoint::DeletePatient, Some(id), None)?;
        let before = state.patients.len();
        state.patients.retain(|p| p.id != Some(id));
        if state.patients.len() == before {
            return Err(not_found(Endpoint::DeletePatient, id));
        }
        Ok(())
    }

    fn create_clinical_record(&self, record: &NewClinicalRecord) -> ApiResult<ClinicalRecord> {
        let mut state = self.receive(Endpoint::CreateClinicalRecord, None, Some(record))?;
        let created = ClinicalRecord {
            id: state.assign_id(),
            clinic_date: record.clinic_date,
            nature_of_ailment: record.nature_of_ailment.clone(),
            medicine_prescribed: record.medicine_prescribed.clone(),
            procedure_undertaken: record.procedure_undertaken.clone(),
            date_of_next_appointment: record.date_of_next_appointment,
            patient_id: None,
        };
        state.records.push(created.clone());
        Ok(created)
    }

    fn list_clinical_records(&self) -> ApiResult<Vec<ClinicalRecord>> {
        let state = self.receive::<()>(Endpoint::ListClinicalRecords, None, None)?;
        Ok(state.records.clone())
    }

    fn get_clinical_record(&self, id: u64) -> ApiResult<ClinicalRecord> {
        let state = self.receive::<()>(Endpoint::GetClinicalRecord, Some(id), None)?;
        state
            .records
            .iter()
            .find(|r| r.id == id)
            .cloned()
            .ok_or_else(|| not_found(Endpoint::GetClinicalRecord, id))
    }

    fn update_clinical_record(
        &self,
        id: u64,
        patch: &ClinicalRecordPatch,
    ) -> ApiResult<ClinicalRecordPatch> {
        let mut state = self.receive(Endpoint::UpdateClinicalRecord, Some(id), Some(patch))?;
        let record = state
            .records
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or_else(|| not_found(Endpoint::UpdateClinicalRecord, id))?;
        patch.apply_to(record);
        Ok(patch.clone())
    }

    fn delete_clinical_record(&self, id: u64) -> ApiResult<()> {
        let mut state = self.receive::<()>(Endpoint::DeleteClinicalRecord, Some(id), None)?;
        let before = state.records.len();
        state.records.retain(|r| r.id != id);
        if state.records.len() == before {
            return Err(not_found(Endpoint::DeleteClinicalRecord, id));
        }
        Ok(())
    }
}
