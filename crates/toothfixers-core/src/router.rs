//! Client-side routes.

use std::fmt;

use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
#[error("No screen for path: {0}")]
pub struct UnknownRoute(pub String);

/// One screen of the application.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Home,
    CreatePatient,
    CreateClinicalRecord,
    Patients,
    /// Record management, optionally opened on a single record id.
    ClinicalRecords { id: Option<String> },
}

impl Route {
    /// Resolve a path such as `/clinical-records/42`. A trailing slash is
    /// ignored and a leading one is optional.
    pub fn parse(path: &str) -> Result<Self, UnknownRoute> {
        let segments: Vec<&str> = path
            .trim()
            .trim_matches('/')
            .split('/')
            .filter(|s| !s.is_empty())
            .collect();

        match segments.as_slice() {
            [] => Ok(Route::Home),
            ["patients"] => Ok(Route::Patients),
            ["patients", "create"] => Ok(Route::CreatePatient),
            ["clinical-records"] => Ok(Route::ClinicalRecords { id: None }),
            ["clinical-records", "create"] => Ok(Route::CreateClinicalRecord),
            ["clinical-records", id] => Ok(Route::ClinicalRecords {
                id: Some(id.to_string()),
            }),
            _ => Err(UnknownRoute(path.to_string())),
        }
    }

    pub fn path(&self) -> String {
        match self {
            Route::Home => "/".to_string(),
            Route::CreatePatient => "/patients/create".to_string(),
            Route::CreateClinicalRecord => "/clinical-records/create".to_string(),
            Route::Patients => "/patients".to_string(),
            Route::ClinicalRecords { id: None } => "/clinical-records".to_string(),
            Route::ClinicalRecords { id: Some(id) } => format!("/clinical-records/{}", id),
        }
    }

    /// Screen heading.
    pub fn title(&self) -> &'static str {
        match self {
            Route::Home => "Welcome to ToothFixers",
            Route::CreatePatient => "Create Patient",
            Route::CreateClinicalRecord => "Create Clinical Record",
            Route::Patients => "Patient Details",
            Route::ClinicalRecords { .. } => "Search Clinical Record",
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_known_paths() {
        assert_eq!(Route::parse("/").unwrap(), Route::Home);
        assert_eq!(Route::parse("").unwrap(), Route::Home);
        assert_eq!(Route::parse("/patients/create").unwrap(), Route::CreatePatient);
        assert_eq!(Route::parse("patients/create").unwrap(), Route::CreatePatient);
        assert_eq!(Route::parse("/patients/").unwrap(), Route::Patients);
        assert_eq!(
            Route::parse("/clinical-records/create").unwrap(),
            Route::CreateClinicalRecord
        );
        assert_eq!(
            Route::parse("/clinical-records").unwrap(),
            Route::ClinicalRecords { id: None }
        );
        assert_eq!(
            Route::parse("/clinical-records/42").unwrap(),
            Route::ClinicalRecords {
                id: Some("42".into())
            }
        );
    }

    #[test]
    fn test_unknown_paths() {
        assert!(Route::parse("/patients/7").is_err());
        assert!(Route::parse("/billing").is_err());
        assert!(Route::parse("/clinical-records/1/edit").is_err());
    }

    #[test]
    fn test_path_round_trip() {
        for path in [
            "/",
            "/patients/create",
            "/clinical-records/create",
            "/patients",
            "/clinical-records",
            "/clinical-records/9",
        ] {
            assert_eq!(Route::parse(path).unwrap().path(), path);
        }
    }
}
