// crates/career-coordination-core/src/storage/mod.rs
// ============================================================================
// Module: Repository Interfaces
// Description: Backend-agnostic repositories for atoms, opportunities,
//              interactions, and decision records.
// Purpose: Define the storage contracts the core consumes.
// Dependencies: crate::core, crate::domain
// ============================================================================

//! ## Overview
//! Repositories own their entities and expose upsert/get/list contracts with
//! deterministic list ordering (ascending by identifier). Lookups that find
//! nothing return `Ok(None)`; only infrastructure failures surface as
//! [`StoreError`]. The in-memory implementations here back tests and
//! ephemeral hosts; the sqlite crate provides the durable counterparts.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::sync::Mutex;

use thiserror::Error;

use crate::core::identifiers::AtomId;
use crate::core::identifiers::DecisionId;
use crate::core::identifiers::InteractionId;
use crate::core::identifiers::OpportunityId;
use crate::core::identifiers::TraceId;
use crate::domain::DecisionRecord;
use crate::domain::ExperienceAtom;
use crate::domain::Interaction;
use crate::domain::Opportunity;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Repository errors.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Backing store I/O failure.
    #[error("store io error: {0}")]
    Io(String),
    /// Stored data failed to deserialize or violated an integrity check.
    #[error("store corruption: {0}")]
    Corrupt(String),
    /// Store reported an error.
    #[error("store error: {0}")]
    Store(String),
}

/// Maps a poisoned lock into a [`StoreError`].
fn poisoned() -> StoreError {
    StoreError::Store("repository lock poisoned".to_string())
}

// ============================================================================
// SECTION: Atom Repository
// ============================================================================

/// Storage contract for experience atoms.
pub trait AtomRepository: Send + Sync {
    /// Inserts or replaces an atom under its identifier.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the write fails.
    fn upsert(&self, atom: &ExperienceAtom) -> Result<(), StoreError>;

    /// Returns the atom with the given identifier, when present.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the read fails.
    fn get(&self, id: &AtomId) -> Result<Option<ExperienceAtom>, StoreError>;

    /// Returns all verified atoms ordered by identifier ascending.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the read fails.
    fn list_verified(&self) -> Result<Vec<ExperienceAtom>, StoreError>;

    /// Returns all atoms ordered by identifier ascending.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the read fails.
    fn list_all(&self) -> Result<Vec<ExperienceAtom>, StoreError>;
}

/// In-memory atom repository.
#[derive(Debug, Default)]
pub struct InMemoryAtomRepository {
    /// Atoms keyed by identifier (ordered map keeps listings deterministic).
    atoms: Mutex<BTreeMap<String, ExperienceAtom>>,
}

impl InMemoryAtomRepository {
    /// Creates an empty repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl AtomRepository for InMemoryAtomRepository {
    fn upsert(&self, atom: &ExperienceAtom) -> Result<(), StoreError> {
        let mut atoms = self.atoms.lock().map_err(|_| poisoned())?;
        atoms.insert(atom.atom_id.as_str().to_string(), atom.clone());
        Ok(())
    }

    fn get(&self, id: &AtomId) -> Result<Option<ExperienceAtom>, StoreError> {
        let atoms = self.atoms.lock().map_err(|_| poisoned())?;
        Ok(atoms.get(id.as_str()).cloned())
    }

    fn list_verified(&self) -> Result<Vec<ExperienceAtom>, StoreError> {
        let atoms = self.atoms.lock().map_err(|_| poisoned())?;
        Ok(atoms.values().filter(|atom| atom.verified).cloned().collect())
    }

    fn list_all(&self) -> Result<Vec<ExperienceAtom>, StoreError> {
        let atoms = self.atoms.lock().map_err(|_| poisoned())?;
        Ok(atoms.values().cloned().collect())
    }
}

// ============================================================================
// SECTION: Opportunity Repository
// ============================================================================

/// Storage contract for opportunities.
pub trait OpportunityRepository: Send + Sync {
    /// Inserts or replaces an opportunity under its identifier.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the write fails.
    fn upsert(&self, opportunity: &Opportunity) -> Result<(), StoreError>;

    /// Returns the opportunity with the given identifier, when present.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the read fails.
    fn get(&self, id: &OpportunityId) -> Result<Option<Opportunity>, StoreError>;

    /// Returns all opportunities ordered by identifier ascending.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the read fails.
    fn list_all(&self) -> Result<Vec<Opportunity>, StoreError>;
}

/// In-memory opportunity repository.
#[derive(Debug, Default)]
pub struct InMemoryOpportunityRepository {
    /// Opportunities keyed by identifier.
    opportunities: Mutex<BTreeMap<String, Opportunity>>,
}

impl InMemoryOpportunityRepository {
    /// Creates an empty repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl OpportunityRepository for InMemoryOpportunityRepository {
    fn upsert(&self, opportunity: &Opportunity) -> Result<(), StoreError> {
        let mut opportunities = self.opportunities.lock().map_err(|_| poisoned())?;
        opportunities.insert(
            opportunity.opportunity_id.as_str().to_string(),
            opportunity.clone(),
        );
        Ok(())
    }

    fn get(&self, id: &OpportunityId) -> Result<Option<Opportunity>, StoreError> {
        let opportunities = self.opportunities.lock().map_err(|_| poisoned())?;
        Ok(opportunities.get(id.as_str()).cloned())
    }

    fn list_all(&self) -> Result<Vec<Opportunity>, StoreError> {
        let opportunities = self.opportunities.lock().map_err(|_| poisoned())?;
        Ok(opportunities.values().cloned().collect())
    }
}

// ============================================================================
// SECTION: Interaction Repository
// ============================================================================

/// Storage contract for interactions.
pub trait InteractionRepository: Send + Sync {
    /// Inserts or replaces an interaction under its identifier.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the write fails.
    fn upsert(&self, interaction: &Interaction) -> Result<(), StoreError>;

    /// Returns the interaction with the given identifier, when present.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the read fails.
    fn get(&self, id: &InteractionId) -> Result<Option<Interaction>, StoreError>;

    /// Returns all interactions ordered by identifier ascending.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the read fails.
    fn list_all(&self) -> Result<Vec<Interaction>, StoreError>;

    /// Returns interactions referencing the given opportunity, ordered by
    /// identifier ascending.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the read fails.
    fn list_by_opportunity(&self, id: &OpportunityId) -> Result<Vec<Interaction>, StoreError>;
}

/// In-memory interaction repository.
#[derive(Debug, Default)]
pub struct InMemoryInteractionRepository {
    /// Interactions keyed by identifier.
    interactions: Mutex<BTreeMap<String, Interaction>>,
}

impl InMemoryInteractionRepository {
    /// Creates an empty repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl InteractionRepository for InMemoryInteractionRepository {
    fn upsert(&self, interaction: &Interaction) -> Result<(), StoreError> {
        let mut interactions = self.interactions.lock().map_err(|_| poisoned())?;
        interactions.insert(
            interaction.interaction_id.as_str().to_string(),
            interaction.clone(),
        );
        Ok(())
    }

    fn get(&self, id: &InteractionId) -> Result<Option<Interaction>, StoreError> {
        let interactions = self.interactions.lock().map_err(|_| poisoned())?;
        Ok(interactions.get(id.as_str()).cloned())
    }

    fn list_all(&self) -> Result<Vec<Interaction>, StoreError> {
        let interactions = self.interactions.lock().map_err(|_| poisoned())?;
        Ok(interactions.values().cloned().collect())
    }

    fn list_by_opportunity(&self, id: &OpportunityId) -> Result<Vec<Interaction>, StoreError> {
        let interactions = self.interactions.lock().map_err(|_| poisoned())?;
        Ok(interactions
            .values()
            .filter(|interaction| interaction.opportunity_id == *id)
            .cloned()
            .collect())
    }
}

// ============================================================================
// SECTION: Decision Store
// ============================================================================

/// Storage contract for append-only decision records.
pub trait DecisionStore: Send + Sync {
    /// Inserts or replaces a decision record under its identifier.
    ///
    /// Replacement under the same identifier is supported but semantically
    /// discouraged; decision records are append-only artifacts.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the write fails.
    fn upsert(&self, record: &DecisionRecord) -> Result<(), StoreError>;

    /// Returns the record with the given identifier, when present.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the read fails.
    fn get(&self, id: &DecisionId) -> Result<Option<DecisionRecord>, StoreError>;

    /// Returns records for the trace, ordered by decision id ascending.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the read fails.
    fn list_by_trace(&self, trace_id: &TraceId) -> Result<Vec<DecisionRecord>, StoreError>;
}

/// In-memory decision store.
#[derive(Debug, Default)]
pub struct InMemoryDecisionStore {
    /// Records keyed by decision identifier.
    records: Mutex<BTreeMap<String, DecisionRecord>>,
}

impl InMemoryDecisionStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl DecisionStore for InMemoryDecisionStore {
    fn upsert(&self, record: &DecisionRecord) -> Result<(), StoreError> {
        let mut records = self.records.lock().map_err(|_| poisoned())?;
        records.insert(record.decision_id.as_str().to_string(), record.clone());
        Ok(())
    }

    fn get(&self, id: &DecisionId) -> Result<Option<DecisionRecord>, StoreError> {
        let records = self.records.lock().map_err(|_| poisoned())?;
        Ok(records.get(id.as_str()).cloned())
    }

    fn list_by_trace(&self, trace_id: &TraceId) -> Result<Vec<DecisionRecord>, StoreError> {
        let records = self.records.lock().map_err(|_| poisoned())?;
        Ok(records
            .values()
            .filter(|record| record.trace_id == *trace_id)
            .cloned()
            .collect())
    }
}
