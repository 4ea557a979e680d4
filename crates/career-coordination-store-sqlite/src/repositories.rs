// crates/career-coordination-store-sqlite/src/repositories.rs
// ============================================================================
// Module: SQLite Entity Repositories
// Description: Durable atom, opportunity, and interaction repositories.
// Purpose: Persist core entities with identifier-ordered listings.
// Dependencies: career-coordination-core, rusqlite, serde_json
// ============================================================================

//! ## Overview
//! Entities map to the v1/v2 tables: scalar fields as columns, list fields as
//! JSON text, and opportunity requirements in a position-keyed child table so
//! requirement order survives round-trips. All listings order by identifier.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;

use career_coordination_core::core::identifiers::AtomId;
use career_coordination_core::core::identifiers::ContactId;
use career_coordination_core::core::identifiers::InteractionId;
use career_coordination_core::core::identifiers::OpportunityId;
use career_coordination_core::domain::ExperienceAtom;
use career_coordination_core::domain::Interaction;
use career_coordination_core::domain::InteractionState;
use career_coordination_core::domain::Opportunity;
use career_coordination_core::domain::Requirement;
use career_coordination_core::storage::AtomRepository;
use career_coordination_core::storage::InteractionRepository;
use career_coordination_core::storage::OpportunityRepository;
use career_coordination_core::storage::StoreError;
use rusqlite::Connection;
use rusqlite::OptionalExtension;
use rusqlite::params;

use crate::db::SqliteDb;
use crate::db::db_err;

// ============================================================================
// SECTION: JSON Helpers
// ============================================================================

/// Serializes a string list to JSON text.
fn to_json_list(values: &[String]) -> Result<String, StoreError> {
    serde_json::to_string(values).map_err(|err| StoreError::Store(err.to_string()))
}

/// Deserializes a string list from JSON text.
fn from_json_list(text: &str) -> Result<Vec<String>, StoreError> {
    serde_json::from_str(text).map_err(|err| StoreError::Corrupt(err.to_string()))
}

// ============================================================================
// SECTION: Atom Repository
// ============================================================================

/// Durable atom repository over the v1 `atoms` table.
#[derive(Debug)]
pub struct SqliteAtomRepository {
    /// Shared database handle.
    db: Arc<SqliteDb>,
}

impl SqliteAtomRepository {
    /// Creates a repository over the shared handle.
    #[must_use]
    pub fn new(db: Arc<SqliteDb>) -> Self {
        Self { db }
    }

    /// Maps one row to an atom.
    fn row_to_atom(row: &rusqlite::Row<'_>) -> Result<ExperienceAtom, rusqlite::Error> {
        Ok(ExperienceAtom {
            atom_id: AtomId::new(row.get::<_, String>(0)?),
            domain: row.get(1)?,
            title: row.get(2)?,
            claim: row.get(3)?,
            tags: Vec::new(),
            verified: row.get::<_, i64>(5)? != 0,
            evidence_refs: Vec::new(),
        })
    }

    /// Runs a listing query and hydrates the JSON columns.
    fn list_where(&self, sql: &str) -> Result<Vec<ExperienceAtom>, StoreError> {
        let conn = self.db.lock()?;
        let mut stmt = conn.prepare(sql).map_err(db_err)?;
        let rows = stmt
            .query_map([], |row| {
                let mut atom = Self::row_to_atom(row)?;
                let tags_json: String = row.get(4)?;
                let refs_json: String = row.get(6)?;
                atom.tags = from_json_list(&tags_json).unwrap_or_default();
                atom.evidence_refs = from_json_list(&refs_json).unwrap_or_default();
                Ok(atom)
            })
            .map_err(db_err)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(db_err)
    }
}

impl AtomRepository for SqliteAtomRepository {
    fn upsert(&self, atom: &ExperienceAtom) -> Result<(), StoreError> {
        let conn = self.db.lock()?;
        conn.execute(
            "INSERT INTO atoms
               (atom_id, domain, title, claim, tags_json, verified, evidence_refs_json)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
             ON CONFLICT(atom_id) DO UPDATE SET
               domain             = excluded.domain,
               title              = excluded.title,
               claim              = excluded.claim,
               tags_json          = excluded.tags_json,
               verified           = excluded.verified,
               evidence_refs_json = excluded.evidence_refs_json",
            params![
                atom.atom_id.as_str(),
                atom.domain,
                atom.title,
                atom.claim,
                to_json_list(&atom.tags)?,
                i64::from(atom.verified),
                to_json_list(&atom.evidence_refs)?,
            ],
        )
        .map_err(db_err)?;
        Ok(())
    }

    fn get(&self, id: &AtomId) -> Result<Option<ExperienceAtom>, StoreError> {
        let conn = self.db.lock()?;
        conn.query_row(
            "SELECT atom_id, domain, title, claim, tags_json, verified, evidence_refs_json
             FROM atoms WHERE atom_id = ?1",
            params![id.as_str()],
            |row| {
                let mut atom = Self::row_to_atom(row)?;
                let tags_json: String = row.get(4)?;
                let refs_json: String = row.get(6)?;
                atom.tags = from_json_list(&tags_json).unwrap_or_default();
                atom.evidence_refs = from_json_list(&refs_json).unwrap_or_default();
                Ok(atom)
            },
        )
        .optional()
        .map_err(db_err)
    }

    fn list_verified(&self) -> Result<Vec<ExperienceAtom>, StoreError> {
        self.list_where(
            "SELECT atom_id, domain, title, claim, tags_json, verified, evidence_refs_json
             FROM atoms WHERE verified = 1 ORDER BY atom_id",
        )
    }

    fn list_all(&self) -> Result<Vec<ExperienceAtom>, StoreError> {
        self.list_where(
            "SELECT atom_id, domain, title, claim, tags_json, verified, evidence_refs_json
             FROM atoms ORDER BY atom_id",
        )
    }
}

// ============================================================================
// SECTION: Opportunity Repository
// ============================================================================

/// Durable opportunity repository over the v1 tables.
#[derive(Debug)]
pub struct SqliteOpportunityRepository {
    /// Shared database handle.
    db: Arc<SqliteDb>,
}

impl SqliteOpportunityRepository {
    /// Creates a repository over the shared handle.
    #[must_use]
    pub fn new(db: Arc<SqliteDb>) -> Self {
        Self { db }
    }

    /// Loads an opportunity's requirements in position order.
    fn load_requirements(
        conn: &Connection,
        opportunity_id: &str,
    ) -> Result<Vec<Requirement>, StoreError> {
        let mut stmt = conn
            .prepare(
                "SELECT text, tags_json, required FROM requirements
                 WHERE opportunity_id = ?1 ORDER BY position",
            )
            .map_err(db_err)?;
        let rows = stmt
            .query_map(params![opportunity_id], |row| {
                let tags_json: String = row.get(1)?;
                Ok(Requirement {
                    text: row.get(0)?,
                    tags: from_json_list(&tags_json).unwrap_or_default(),
                    required: row.get::<_, i64>(2)? != 0,
                })
            })
            .map_err(db_err)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(db_err)
    }
}

impl OpportunityRepository for SqliteOpportunityRepository {
    fn upsert(&self, opportunity: &Opportunity) -> Result<(), StoreError> {
        let mut conn = self.db.lock()?;
        let tx = conn.transaction().map_err(db_err)?;
        tx.execute(
            "INSERT INTO opportunities (opportunity_id, company, role_title, source)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(opportunity_id) DO UPDATE SET
               company    = excluded.company,
               role_title = excluded.role_title,
               source     = excluded.source",
            params![
                opportunity.opportunity_id.as_str(),
                opportunity.company,
                opportunity.role_title,
                opportunity.source,
            ],
        )
        .map_err(db_err)?;
        tx.execute(
            "DELETE FROM requirements WHERE opportunity_id = ?1",
            params![opportunity.opportunity_id.as_str()],
        )
        .map_err(db_err)?;
        for (position, requirement) in opportunity.requirements.iter().enumerate() {
            tx.execute(
                "INSERT INTO requirements (opportunity_id, position, text, tags_json, required)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    opportunity.opportunity_id.as_str(),
                    i64::try_from(position)
                        .map_err(|_| StoreError::Store("requirement overflow".to_string()))?,
                    requirement.text,
                    to_json_list(&requirement.tags)?,
                    i64::from(requirement.required),
                ],
            )
            .map_err(db_err)?;
        }
        tx.commit().map_err(db_err)
    }

    fn get(&self, id: &OpportunityId) -> Result<Option<Opportunity>, StoreError> {
        let conn = self.db.lock()?;
        let header = conn
            .query_row(
                "SELECT opportunity_id, company, role_title, source
                 FROM opportunities WHERE opportunity_id = ?1",
                params![id.as_str()],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, String>(3)?,
                    ))
                },
            )
            .optional()
            .map_err(db_err)?;

        let Some((opportunity_id, company, role_title, source)) = header else {
            return Ok(None);
        };
        let requirements = Self::load_requirements(&conn, &opportunity_id)?;
        Ok(Some(Opportunity {
            opportunity_id: OpportunityId::new(opportunity_id),
            company,
            role_title,
            source,
            requirements,
        }))
    }

    fn list_all(&self) -> Result<Vec<Opportunity>, StoreError> {
        let conn = self.db.lock()?;
        let headers: Vec<(String, String, String, String)> = {
            let mut stmt = conn
                .prepare(
                    "SELECT opportunity_id, company, role_title, source
                     FROM opportunities ORDER BY opportunity_id",
                )
                .map_err(db_err)?;
            let rows = stmt
                .query_map([], |row| {
                    Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?))
                })
                .map_err(db_err)?;
            rows.collect::<Result<Vec<_>, _>>().map_err(db_err)?
        };

        let mut opportunities = Vec::with_capacity(headers.len());
        for (opportunity_id, company, role_title, source) in headers {
            let requirements = Self::load_requirements(&conn, &opportunity_id)?;
            opportunities.push(Opportunity {
                opportunity_id: OpportunityId::new(opportunity_id),
                company,
                role_title,
                source,
                requirements,
            });
        }
        Ok(opportunities)
    }
}

// ============================================================================
// SECTION: Interaction Repository
// ============================================================================

/// Durable interaction repository over the v2 table.
#[derive(Debug)]
pub struct SqliteInteractionRepository {
    /// Shared database handle.
    db: Arc<SqliteDb>,
}

impl SqliteInteractionRepository {
    /// Creates a repository over the shared handle.
    #[must_use]
    pub fn new(db: Arc<SqliteDb>) -> Self {
        Self { db }
    }

    /// Parses a stored state label.
    fn parse_state(label: &str) -> Result<InteractionState, StoreError> {
        match label {
            "draft" => Ok(InteractionState::Draft),
            "ready" => Ok(InteractionState::Ready),
            "sent" => Ok(InteractionState::Sent),
            "responded" => Ok(InteractionState::Responded),
            "closed" => Ok(InteractionState::Closed),
            other => Err(StoreError::Corrupt(format!("unknown interaction state: {other}"))),
        }
    }

    /// Runs a listing query with the given parameters.
    fn list_where(
        &self,
        sql: &str,
        bind: &[&dyn rusqlite::ToSql],
    ) -> Result<Vec<Interaction>, StoreError> {
        let conn = self.db.lock()?;
        let mut stmt = conn.prepare(sql).map_err(db_err)?;
        let rows = stmt
            .query_map(bind, |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                ))
            })
            .map_err(db_err)?;
        let mut interactions = Vec::new();
        for row in rows {
            let (interaction_id, contact_id, opportunity_id, state) = row.map_err(db_err)?;
            interactions.push(Interaction {
                interaction_id: InteractionId::new(interaction_id),
                contact_id: ContactId::new(contact_id),
                opportunity_id: OpportunityId::new(opportunity_id),
                state: Self::parse_state(&state)?,
            });
        }
        Ok(interactions)
    }
}

impl InteractionRepository for SqliteInteractionRepository {
    fn upsert(&self, interaction: &Interaction) -> Result<(), StoreError> {
        let conn = self.db.lock()?;
        conn.execute(
            "INSERT INTO interactions (interaction_id, contact_id, opportunity_id, state)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(interaction_id) DO UPDATE SET
               contact_id     = excluded.contact_id,
               opportunity_id = excluded.opportunity_id,
               state          = excluded.state",
            params![
                interaction.interaction_id.as_str(),
                interaction.contact_id.as_str(),
                interaction.opportunity_id.as_str(),
                interaction.state.as_str(),
            ],
        )
        .map_err(db_err)?;
        Ok(())
    }

    fn get(&self, id: &InteractionId) -> Result<Option<Interaction>, StoreError> {
        let interactions = self.list_where(
            "SELECT interaction_id, contact_id, opportunity_id, state
             FROM interactions WHERE interaction_id = ?1",
            &[&id.as_str()],
        )?;
        Ok(interactions.into_iter().next())
    }

    fn list_all(&self) -> Result<Vec<Interaction>, StoreError> {
        self.list_where(
            "SELECT interaction_id, contact_id, opportunity_id, state
             FROM interactions ORDER BY interaction_id",
            &[],
        )
    }

    fn list_by_opportunity(&self, id: &OpportunityId) -> Result<Vec<Interaction>, StoreError> {
        self.list_where(
            "SELECT interaction_id, contact_id, opportunity_id, state
             FROM interactions WHERE opportunity_id = ?1 ORDER BY interaction_id",
            &[&id.as_str()],
        )
    }
}
