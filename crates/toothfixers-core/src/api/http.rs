//! Blocking HTTP implementation of [`ClinicApi`].

use std::time::Duration;

use reqwest::blocking::{Client, Response};
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::Serialize;

use super::{ApiError, ApiResult, ClinicApi, Endpoint};
use crate::config::ClientConfig;
use crate::models::{
    ClinicalRecord, ClinicalRecordPatch, NewClinicalRecord, NewPatient, Patient, PatientPatch,
};

/// Header carrying the per-request correlation id.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// REST client for the clinic backend.
pub struct HttpClinicApi {
    base_url: String,
    client: Client,
    timeout_secs: u64,
}

impl HttpClinicApi {
    pub fn new(config: &ClientConfig) -> ApiResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ApiError::Network(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            client,
            timeout_secs: config.timeout_secs,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Send one request and check its status. The body, when given, is
    /// sent as JSON.
    fn execute<B: Serialize + ?Sized>(
        &self,
        endpoint: Endpoint,
        id: Option<u64>,
        body: Option<&B>,
    ) -> ApiResult<Response> {
        let path = endpoint.path(id);
        let url = format!("{}{}", self.base_url, path);
        let request_id = uuid::Uuid::new_v4().to_string();
        let method = Method::from_bytes(endpoint.method().as_bytes()).unwrap_or(Method::GET);

        tracing::debug!(
            method = endpoint.method(),
            path = %path,
            request_id = %request_id,
            "Sending request"
        );

        let mut request = self
            .client
            .request(method, &url)
            .header(REQUEST_ID_HEADER, &request_id);
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().map_err(|e| {
            let err = if e.is_connect() {
                ApiError::Network(format!("Cannot reach backend at {}", self.base_url))
            } else if e.is_timeout() {
                ApiError::Network(format!("Request timed out after {}s", self.timeout_secs))
            } else {
                ApiError::Network(e.to_string())
            };
            tracing::warn!(path = %path, request_id = %request_id, error = %err, "Request failed");
            err
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            let err = ApiError::from_status(status.as_u16(), &path, body);
            tracing::warn!(
                path = %path,
                request_id = %request_id,
                status = status.as_u16(),
                error = %err,
                "Backend rejected request"
            );
            return Err(err);
        }

        Ok(response)
    }

    fn fetch<T, B>(&self, endpoint: Endpoint, id: Option<u64>, body: Option<&B>) -> ApiResult<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.execute(endpoint, id, body)?
            .json()
            .map_err(|e| ApiError::Decode(e.to_string()))
    }

    fn fetch_empty(&self, endpoint: Endpoint, id: Option<u64>) -> ApiResult<()> {
        self.execute::<()>(endpoint, id, None).map(|_| ())
    }
}

impl ClinicApi for HttpClinicApi {
    fn create_patient(&self, patient: &NewPatient) -> ApiResult<Patient> {
        self.fetch(Endpoint::CreatePatient, None, Some(patient))
    }

    fn list_patients(&self) -> ApiResult<Vec<Patient>> {
        self.fetch::<_, ()>(Endpoint::ListPatients, None, None)
    }

    fn update_patient(&self, id: u64, patch: &PatientPatch) -> ApiResult<PatientPatch> {
        self.fetch(Endpoint::UpdatePatient, Some(id), Some(patch))
    }

    fn delete_patient(&self, id: u64) -> ApiResult<()> {
        self.fetch_empty(Endpoint::DeletePatient, Some(id))
    }

    fn create_clinical_record(&self, record: &NewClinicalRecord) -> ApiResult<ClinicalRecord> {
        self.fetch(Endpoint::CreateClinicalRecord, None, Some(record))
    }

    fn list_clinical_records(&self) -> ApiResult<Vec<ClinicalRecord>> {
        self.fetch::<_, ()>(Endpoint::ListClinicalRecords, None, None)
    }

    fn get_clinical_record(&self, id: u64) -> ApiResult<ClinicalRecord> {
        self.fetch::<_, ()>(Endpoint::GetClinicalRecord, Some(id), None)
    }

    fn update_clinical_record(
        &self,
        id: u64,
        patch: &ClinicalRecordPatch,
    ) -> ApiResult<ClinicalRecordPatch> {
        self.fetch(Endpoint::UpdateClinicalRecord, Some(id), Some(patch))
    }

    fn delete_clinical_record(&self, id: u64) -> ApiResult<()> {
        self.fetch_empty(Endpoint::DeleteClinicalRecord, Some(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Read, Write};
    use std::net::{TcpListener, TcpStream};
    use std::thread::{self, JoinHandle};

    /// Raw request as seen by the test server: lowercased head, verbatim body.
    struct CapturedRequest {
        head: String,
        body: String,
    }

    fn read_request(stream: &mut TcpStream) -> CapturedRequest {
        let mut buf = Vec::new();
        let mut chunk = [0u8; 1024];
        loop {
            let n = stream.read(&mut chunk).unwrap();
            if n == 0 {
                break;
            }
            buf.extend_from_slice(&chunk[..n]);
            if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
                let head = String::from_utf8_lossy(&buf[..pos]).to_lowercase();
                let len = head
                    .lines()
                    .find_map(|l| l.strip_prefix("content-length:"))
                    .and_then(|v| v.trim().parse::<usize>().ok())
                    .unwrap_or(0);
                if buf.len() >= pos + 4 + len {
                    let body = String::from_utf8_lossy(&buf[pos + 4..pos + 4 + len]).to_string();
                    return CapturedRequest { head, body };
                }
            }
        }
        panic!("connection closed before request was complete");
    }

    /// Serve exactly one response, returning the captured request.
    fn serve_once(status: &'static str, body: &'static str) -> (String, JoinHandle<CapturedRequest>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let handle = thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let request = read_request(&mut stream);
            let response = format!(
                "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status,
                body.len(),
                body
            );
            stream.write_all(response.as_bytes()).unwrap();
            request
        });
        (format!("http://{}", addr), handle)
    }

    fn client_for(url: &str) -> HttpClinicApi {
        HttpClinicApi::new(&ClientConfig::new(url).with_timeout(5)).unwrap()
    }

    #[test]
    fn client_constructor() {
        let client = HttpClinicApi::new(&ClientConfig::default().with_timeout(12)).unwrap();
        assert_eq!(client.base_url(), "http://localhost:3000");
        assert_eq!(client.timeout_secs, 12);
    }

    #[test]
    fn patch_sends_only_changed_fields() {
        let (url, server) = serve_once("200 OK", r#"{"homeAddress":"2 Oak Ave"}"#);
        let client = client_for(&url);

        let patch = PatientPatch {
            home_address: Some("2 Oak Ave".into()),
            ..Default::default()
        };
        let updated = client.update_patient(7, &patch).unwrap();
        assert_eq!(updated, patch);

        let request = server.join().unwrap();
        assert!(request.head.starts_with("patch /patients/7 http/1.1"));
        assert!(request.head.contains(REQUEST_ID_HEADER));
        assert_eq!(request.body, r#"{"homeAddress":"2 Oak Ave"}"#);
    }

    #[test]
    fn get_missing_record_is_not_found() {
        let (url, server) = serve_once("404 Not Found", r#"{"message":"Not Found"}"#);
        let client = client_for(&url);

        let err = client.get_clinical_record(42).unwrap_err();
        assert_eq!(err, ApiError::NotFound("/clinical-records/42".into()));

        let request = server.join().unwrap();
        assert!(request.head.starts_with("get /clinical-records/42 http/1.1"));
    }

    #[test]
    fn delete_ignores_empty_body() {
        let (url, server) = serve_once("200 OK", "");
        let client = client_for(&url);

        client.delete_clinical_record(3).unwrap();
        let request = server.join().unwrap();
        assert!(request.head.starts_with("delete /clinical-records/3 http/1.1"));
        assert!(request.body.is_empty());
    }

    #[test]
    fn malformed_body_is_decode_error() {
        let (url, server) = serve_once("200 OK", "[{\"id\":");
        let client = client_for(&url);

        let err = client.list_patients().unwrap_err();
        assert!(matches!(err, ApiError::Decode(_)));
        server.join().unwrap();
    }

    #[test]
    fn server_error_keeps_status() {
        let (url, server) = serve_once("500 Internal Server Error", "boom");
        let client = client_for(&url);

        let err = client.list_clinical_records().unwrap_err();
        assert_eq!(
            err,
            ApiError::Server {
                status: 500,
                body: "boom".into()
            }
        );
        server.join().unwrap();
    }

    #[test]
    fn unreachable_backend_is_network_error() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let client = client_for(&format!("http://{}", addr));
        let err = client.list_patients().unwrap_err();
        assert!(matches!(err, ApiError::Network(_)));
    }
}
