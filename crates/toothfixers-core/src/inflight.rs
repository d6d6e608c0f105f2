//! In-flight request tracking.
//!
//! Each logical operation has at most one current ticket. Beginning a new
//! request for the same operation supersedes the previous ticket, and a
//! superseded request's response must be dropped. Ticket numbers come
//! from a single counter, so a ticket can never match a later request.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

/// Logical actions a screen can issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    CreatePatient,
    ListPatients,
    UpdatePatient(u64),
    DeletePatient(u64),
    CreateClinicalRecord,
    ListClinicalRecords,
    /// Any single-record lookup; a new search replaces the previous one.
    LookupClinicalRecord,
    UpdateClinicalRecord(u64),
    DeleteClinicalRecord(u64),
}

/// Proof that a request was issued.
#[derive(Debug, PartialEq, Eq)]
pub struct Ticket {
    operation: Operation,
    serial: u64,
}

impl Ticket {
    pub fn operation(&self) -> Operation {
        self.operation
    }
}

#[derive(Default)]
struct Registry {
    next_serial: u64,
    current: HashMap<Operation, u64>,
}

#[derive(Default)]
pub struct InFlight {
    registry: Mutex<Registry>,
}

impl InFlight {
    pub fn new() -> Self {
        Self::default()
    }

    /// Issue a ticket, superseding any outstanding one for `operation`.
    pub fn begin(&self, operation: Operation) -> Ticket {
        let mut registry = self.registry.lock().unwrap_or_else(PoisonError::into_inner);
        registry.next_serial += 1;
        let serial = registry.next_serial;
        if registry.current.insert(operation, serial).is_some() {
            tracing::debug!(?operation, "Superseding in-flight request");
        }
        Ticket { operation, serial }
    }

    /// Retire a ticket once its response arrived. Returns true if the
    /// response should be applied, false if the request was superseded.
    pub fn finish(&self, ticket: Ticket) -> bool {
        let mut registry = self.registry.lock().unwrap_or_else(PoisonError::into_inner);
        if registry.current.get(&ticket.operation) == Some(&ticket.serial) {
            registry.current.remove(&ticket.operation);
            true
        } else {
            tracing::debug!(operation = ?ticket.operation, "Dropping superseded response");
            false
        }
    }

    /// Number of operations with a request outstanding.
    pub fn pending(&self) -> usize {
        let registry = self.registry.lock().unwrap_or_else(PoisonError::into_inner);
        registry.current.len()
    }
}
