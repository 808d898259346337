//! In-memory reference implementation of the storage traits.
//!
//! Each store sits behind one lock, so every read sees a whole rule set and
//! every seed write lands at once. Durable deployments should use the SQLite
//! adapter.

use crate::model::{AssessmentRecord, NewAssessmentRecord};
use crate::traits::{AssessmentLog, RuleSetWrite, RuleStore};
use crate::{StorageError, StorageResult};
use async_trait::async_trait;
use srm_types::{LoadMode, LoadReceipt, Rule, RuleId, RuleSet, RuleSetId, RuleSetSnapshot};
use std::collections::BTreeMap;
use std::sync::RwLock;
use tracing::debug;

#[derive(Default)]
struct RuleState {
    rule_sets: BTreeMap<RuleSetId, RuleSet>,
    rules: BTreeMap<RuleId, Rule>,
    last_rule_set_id: i64,
    last_rule_id: i64,
}

impl RuleState {
    fn find_exact(&self, family: &str, revision: &str) -> Option<RuleSetId> {
        self.rule_sets
            .values()
            .rev()
            .find(|rs| rs.aircraft_family == family && rs.revision == revision)
            .map(|rs| rs.id)
    }

    fn count_rules(&self, rule_set_id: RuleSetId) -> usize {
        self.rules
            .values()
            .filter(|r| r.rule_set_id == rule_set_id)
            .count()
    }
}

/// In-memory rule store and assessment log.
#[derive(Default)]
pub struct InMemoryStorage {
    rules: RwLock<RuleState>,
    assessments: RwLock<Vec<AssessmentRecord>>,
}

impl InMemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

fn poisoned(name: &str) -> StorageError {
    StorageError::Backend(format!("{name} lock poisoned"))
}

#[async_trait]
impl RuleStore for InMemoryStorage {
    async fn resolve_rule_set(
        &self,
        aircraft_family: &str,
        revision: Option<&str>,
    ) -> StorageResult<Option<RuleSet>> {
        let guard = self.rules.read().map_err(|_| poisoned("rule store"))?;
        Ok(guard
            .rule_sets
            .values()
            .rev()
            .find(|rs| {
                rs.aircraft_family == aircraft_family
                    && revision.map_or(true, |rev| rs.revision == rev)
            })
            .cloned())
    }

    async fn list_rule_sets(&self, aircraft_family: Option<&str>) -> StorageResult<Vec<RuleSet>> {
        let guard = self.rules.read().map_err(|_| poisoned("rule store"))?;
        Ok(guard
            .rule_sets
            .values()
            .filter(|rs| aircraft_family.map_or(true, |f| rs.aircraft_family == f))
            .cloned()
            .collect())
    }

    async fn snapshot(&self, rule_set_id: RuleSetId) -> StorageResult<Option<RuleSetSnapshot>> {
        let guard = self.rules.read().map_err(|_| poisoned("rule store"))?;
        let Some(rule_set) = guard.rule_sets.get(&rule_set_id).cloned() else {
            return Ok(None);
        };
        let rules = guard
            .rules
            .values()
            .filter(|r| r.rule_set_id == rule_set_id)
            .cloned()
            .collect();
        Ok(Some(RuleSetSnapshot::new(rule_set, rules)))
    }

    async fn write_rule_set(&self, write: RuleSetWrite) -> StorageResult<LoadReceipt> {
        let mut guard = self.rules.write().map_err(|_| poisoned("rule store"))?;
        let state = &mut *guard;

        let existing = match write.mode {
            LoadMode::Upsert { .. } => {
                state.find_exact(&write.rule_set.aircraft_family, &write.rule_set.revision)
            }
            LoadMode::AlwaysNew => None,
        };

        let rule_set_id = match existing {
            Some(id) => {
                if let Some(rs) = state.rule_sets.get_mut(&id) {
                    rs.name = write.rule_set.name;
                    rs.effective_date = write.rule_set.effective_date;
                    rs.source = write.rule_set.source;
                }
                id
            }
            None => {
                state.last_rule_set_id += 1;
                let id = RuleSetId::new(state.last_rule_set_id);
                state
                    .rule_sets
                    .insert(id, write.rule_set.into_rule_set(id));
                id
            }
        };

        if matches!(write.mode, LoadMode::Upsert { wipe: true }) {
            state.rules.retain(|_, r| r.rule_set_id != rule_set_id);
        }

        let inserted_count = write.rules.len();
        for body in write.rules {
            state.last_rule_id += 1;
            let id = RuleId::new(state.last_rule_id);
            state.rules.insert(id, body.into_rule(id, rule_set_id));
        }

        let total_count = state.count_rules(rule_set_id);
        debug!(
            rule_set_id = %rule_set_id,
            inserted = inserted_count,
            total = total_count,
            "Rule set written"
        );

        Ok(LoadReceipt {
            rule_set_id,
            inserted_count,
            total_count,
        })
    }

    async fn delete_rule_set(&self, rule_set_id: RuleSetId) -> StorageResult<bool> {
        let mut guard = self.rules.write().map_err(|_| poisoned("rule store"))?;
        if guard.rule_sets.remove(&rule_set_id).is_none() {
            return Ok(false);
        }
        guard.rules.retain(|_, r| r.rule_set_id != rule_set_id);
        Ok(true)
    }
}

#[async_trait]
impl AssessmentLog for InMemoryStorage {
    async fn append_assessment(
        &self,
        record: NewAssessmentRecord,
    ) -> StorageResult<AssessmentRecord> {
        let mut guard = self
            .assessments
            .write()
            .map_err(|_| poisoned("assessment log"))?;
        let id = guard.last().map_or(1, |r| r.id + 1);
        let stored = record.with_id(id);
        guard.push(stored.clone());
        Ok(stored)
    }

    async fn recent_assessments(&self, limit: usize) -> StorageResult<Vec<AssessmentRecord>> {
        let guard = self
            .assessments
            .read()
            .map_err(|_| poisoned("assessment log"))?;
        let take = if limit == 0 { guard.len() } else { limit };
        Ok(guard.iter().rev().take(take).cloned().collect())
    }
}
