//! Landing screen: static navigation only.

use crate::router::Route;

pub const HOME_TITLE: &str = "ToothFixers";
pub const HOME_TAGLINE: &str = "Bringing Smiles to Life";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavLink {
    pub label: &'static str,
    pub route: Route,
}

/// The four functional screens, in display order.
pub fn home_links() -> Vec<NavLink> {
    vec![
        NavLink {
            label: "Create Patient",
            route: Route::CreatePatient,
        },
        NavLink {
            label: "Create Clinic Record",
            route: Route::CreateClinicalRecord,
        },
        NavLink {
            label: "Patient Management",
            route: Route::Patients,
        },
        NavLink {
            label: "Clinical Records Management",
            route: Route::ClinicalRecords { id: None },
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_links_cover_functional_screens() {
        let paths: Vec<String> = home_links().iter().map(|l| l.route.path()).collect();
        assert_eq!(
            paths,
            vec![
                "/patients/create",
                "/clinical-records/create",
                "/patients",
                "/clinical-records"
            ]
        );
    }
}
