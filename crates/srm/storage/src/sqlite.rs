//! SQLite adapter for the rule store and the assessment log.
//!
//! Seed writes run inside one transaction; snapshot reads run inside a read
//! transaction so a rule set is never observed half-written. The schema is
//! created on connect.

use crate::model::{AssessmentRecord, NewAssessmentRecord};
use crate::traits::{AssessmentLog, RuleSetWrite, RuleStore};
use crate::{StorageError, StorageResult};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::{
    SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions, SqliteRow,
};
use sqlx::{Row, Sqlite};
use srm_types::{
    LoadMode, LoadReceipt, Rule, RuleId, RuleSet, RuleSetId, RuleSetSnapshot, Side,
    ESCALATION_SEVERITY,
};
use std::path::Path;
use std::str::FromStr;
use tracing::debug;

const RULE_COLUMNS: &str = r#"
    id, rule_set_id, enabled, priority,
    damage_type, structure, structure_zone, zone_detail,
    side, sta_min, sta_max, wl_min, wl_max,
    stringer_min, stringer_max, pressurized, material,
    conditions_json, limits_json, actions_json,
    srm_ref, severity, notes, source_page
"#;

const ASSESSMENT_COLUMNS: &str = r#"
    id, created_utc,
    aircraft_family, aircraft_variant,
    zone, side, sta, wl, stringer_num, pressurized,
    damage_type, structure,
    diameter_mm, depth_mm, thickness_mm, depth_to_thickness_ratio,
    visible_crack, near_fastener_row,
    disposition, severity, rule_id, srm_ref, reasons,
    raw_description, ctx_json
"#;

/// SQLite-backed storage adapter.
#[derive(Debug, Clone)]
pub struct SqliteStorage {
    pool: SqlitePool,
}

impl SqliteStorage {
    /// Connect to `sqlite://...` with an explicit pool size and initialize
    /// the schema. In-memory databases need a pool of one connection,
    /// otherwise every connection sees its own database.
    pub async fn connect_with_options(
        database_url: &str,
        max_connections: u32,
    ) -> StorageResult<Self> {
        let options = SqliteConnectOptions::from_str(database_url).map_err(|e| {
            StorageError::InvalidInput(format!("invalid sqlite url {database_url}: {e}"))
        })?;
        Self::with_options(options, max_connections).await
    }

    /// Open (creating if needed) a database file.
    pub async fn open(path: &Path) -> StorageResult<Self> {
        Self::with_options(SqliteConnectOptions::new().filename(path), 5).await
    }

    async fn with_options(
        options: SqliteConnectOptions,
        max_connections: u32,
    ) -> StorageResult<Self> {
        let options = options
            .create_if_missing(true)
            .foreign_keys(true)
            .journal_mode(SqliteJournalMode::Wal);
        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(options)
            .await
            .map_err(|e| StorageError::Backend(format!("failed to open sqlite: {e}")))?;
        Self::from_pool(pool).await
    }

    /// Create adapter from an existing pool.
    pub async fn from_pool(pool: SqlitePool) -> StorageResult<Self> {
        let store = Self { pool };
        store.init_schema().await?;
        Ok(store)
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    async fn init_schema(&self) -> StorageResult<()> {
        let ddl = [
            r#"
            CREATE TABLE IF NOT EXISTS rule_sets (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL,
                aircraft_family TEXT NOT NULL,
                revision TEXT NOT NULL,
                effective_date TEXT,
                source TEXT
            )
            "#,
            r#"
            CREATE INDEX IF NOT EXISTS rule_sets_family_revision
                ON rule_sets (aircraft_family, revision)
            "#,
            r#"
            CREATE TABLE IF NOT EXISTS rules (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                rule_set_id INTEGER NOT NULL REFERENCES rule_sets (id) ON DELETE CASCADE,
                enabled INTEGER NOT NULL DEFAULT 1,
                priority INTEGER NOT NULL DEFAULT 0,
                damage_type TEXT NOT NULL,
                structure TEXT NOT NULL,
                structure_zone TEXT NOT NULL,
                zone_detail TEXT,
                side TEXT NOT NULL DEFAULT 'ANY',
                sta_min REAL,
                sta_max REAL,
                wl_min REAL,
                wl_max REAL,
                stringer_min INTEGER,
                stringer_max INTEGER,
                pressurized INTEGER,
                material TEXT,
                conditions_json TEXT NOT NULL DEFAULT '{}',
                limits_json TEXT NOT NULL DEFAULT '{}',
                actions_json TEXT NOT NULL DEFAULT '{}',
                srm_ref TEXT,
                severity TEXT NOT NULL DEFAULT 'engineering',
                notes TEXT,
                source_page TEXT
            )
            "#,
            r#"
            CREATE INDEX IF NOT EXISTS rules_lookup
                ON rules (rule_set_id, damage_type, structure_zone, structure)
            "#,
            r#"
            CREATE TABLE IF NOT EXISTS assessments (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                created_utc TEXT NOT NULL,
                aircraft_family TEXT,
                aircraft_variant TEXT,
                zone TEXT,
                side TEXT,
                sta REAL,
                wl REAL,
                stringer_num INTEGER,
                pressurized INTEGER,
                damage_type TEXT,
                structure TEXT,
                diameter_mm REAL,
                depth_mm REAL,
                thickness_mm REAL,
                depth_to_thickness_ratio REAL,
                visible_crack INTEGER,
                near_fastener_row INTEGER,
                disposition TEXT,
                severity TEXT,
                rule_id INTEGER,
                srm_ref TEXT,
                reasons TEXT,
                raw_description TEXT,
                ctx_json TEXT
            )
            "#,
        ];

        for stmt in ddl {
            sqlx::query(stmt)
                .execute(&self.pool)
                .await
                .map_err(|e| StorageError::Backend(format!("schema init failed: {e}")))?;
        }
        debug!("SQLite schema ready");
        Ok(())
    }
}

#[async_trait]
impl RuleStore for SqliteStorage {
    async fn resolve_rule_set(
        &self,
        aircraft_family: &str,
        revision: Option<&str>,
    ) -> StorageResult<Option<RuleSet>> {
        let row = match revision {
            Some(revision) => {
                sqlx::query(
                    r#"
                    SELECT id, name, aircraft_family, revision, effective_date, source
                      FROM rule_sets
                     WHERE aircraft_family = ? AND revision = ?
                     ORDER BY id DESC
                     LIMIT 1
                    "#,
                )
                .bind(aircraft_family)
                .bind(revision)
                .fetch_optional(&self.pool)
                .await
            }
            None => {
                sqlx::query(
                    r#"
                    SELECT id, name, aircraft_family, revision, effective_date, source
                      FROM rule_sets
                     WHERE aircraft_family = ?
                     ORDER BY id DESC
                     LIMIT 1
                    "#,
                )
                .bind(aircraft_family)
                .fetch_optional(&self.pool)
                .await
            }
        }
        .map_err(backend)?;

        row.as_ref().map(rule_set_from_row).transpose()
    }

    async fn list_rule_sets(&self, aircraft_family: Option<&str>) -> StorageResult<Vec<RuleSet>> {
        let rows = sqlx::query(
            r#"
            SELECT id, name, aircraft_family, revision, effective_date, source
              FROM rule_sets
             WHERE (?1 IS NULL OR aircraft_family = ?1)
             ORDER BY id ASC
            "#,
        )
        .bind(aircraft_family)
        .fetch_all(&self.pool)
        .await
        .map_err(backend)?;

        rows.iter().map(rule_set_from_row).collect()
    }

    async fn snapshot(&self, rule_set_id: RuleSetId) -> StorageResult<Option<RuleSetSnapshot>> {
        let mut tx = self.pool.begin().await.map_err(backend)?;

        let rule_set_row = sqlx::query(
            r#"
            SELECT id, name, aircraft_family, revision, effective_date, source
              FROM rule_sets
             WHERE id = ?
            "#,
        )
        .bind(rule_set_id.get())
        .fetch_optional(&mut *tx)
        .await
        .map_err(backend)?;

        let Some(rule_set_row) = rule_set_row else {
            tx.commit().await.map_err(backend)?;
            return Ok(None);
        };
        let rule_set = rule_set_from_row(&rule_set_row)?;

        let rule_rows = sqlx::query(&format!(
            "SELECT {RULE_COLUMNS} FROM rules WHERE rule_set_id = ? ORDER BY priority DESC, id ASC"
        ))
        .bind(rule_set_id.get())
        .fetch_all(&mut *tx)
        .await
        .map_err(backend)?;

        tx.commit().await.map_err(backend)?;

        let rules = rule_rows
            .iter()
            .map(rule_from_row)
            .collect::<StorageResult<Vec<_>>>()?;
        Ok(Some(RuleSetSnapshot::new(rule_set, rules)))
    }

    async fn write_rule_set(&self, write: RuleSetWrite) -> StorageResult<LoadReceipt> {
        let mut tx = self.pool.begin().await.map_err(backend)?;

        let existing = match write.mode {
            LoadMode::Upsert { .. } => sqlx::query_scalar::<_, i64>(
                r#"
                SELECT id FROM rule_sets
                 WHERE aircraft_family = ? AND revision = ?
                 ORDER BY id DESC
                 LIMIT 1
                "#,
            )
            .bind(&write.rule_set.aircraft_family)
            .bind(&write.rule_set.revision)
            .fetch_optional(&mut *tx)
            .await
            .map_err(backend)?,
            LoadMode::AlwaysNew => None,
        };

        let rule_set_id = match existing {
            Some(id) => {
                sqlx::query(
                    r#"
                    UPDATE rule_sets
                       SET name = ?, effective_date = ?, source = ?
                     WHERE id = ?
                    "#,
                )
                .bind(&write.rule_set.name)
                .bind(&write.rule_set.effective_date)
                .bind(&write.rule_set.source)
                .bind(id)
                .execute(&mut *tx)
                .await
                .map_err(backend)?;
                id
            }
            None => sqlx::query(
                r#"
                INSERT INTO rule_sets (name, aircraft_family, revision, effective_date, source)
                VALUES (?, ?, ?, ?, ?)
                "#,
            )
            .bind(&write.rule_set.name)
            .bind(&write.rule_set.aircraft_family)
            .bind(&write.rule_set.revision)
            .bind(&write.rule_set.effective_date)
            .bind(&write.rule_set.source)
            .execute(&mut *tx)
            .await
            .map_err(backend)?
            .last_insert_rowid(),
        };

        if matches!(write.mode, LoadMode::Upsert { wipe: true }) {
            sqlx::query("DELETE FROM rules WHERE rule_set_id = ?")
                .bind(rule_set_id)
                .execute(&mut *tx)
                .await
                .map_err(backend)?;
        }

        for rule in &write.rules {
            sqlx::query(
                r#"
                INSERT INTO rules (
                    rule_set_id, enabled, priority,
                    damage_type, structure, structure_zone, zone_detail,
                    side, sta_min, sta_max, wl_min, wl_max,
                    stringer_min, stringer_max, pressurized, material,
                    conditions_json, limits_json, actions_json,
                    srm_ref, severity, notes, source_page
                )
                VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(rule_set_id)
            .bind(i64::from(rule.enabled))
            .bind(rule.priority)
            .bind(&rule.damage_type)
            .bind(&rule.structure)
            .bind(&rule.structure_zone)
            .bind(&rule.zone_detail)
            .bind(rule.side.as_str())
            .bind(rule.sta_min)
            .bind(rule.sta_max)
            .bind(rule.wl_min)
            .bind(rule.wl_max)
            .bind(rule.stringer_min)
            .bind(rule.stringer_max)
            .bind(rule.pressurized.map(i64::from))
            .bind(&rule.material)
            .bind(&rule.conditions_json)
            .bind(&rule.limits_json)
            .bind(&rule.actions_json)
            .bind(&rule.srm_ref)
            .bind(&rule.severity)
            .bind(&rule.notes)
            .bind(&rule.source_page)
            .execute(&mut *tx)
            .await
            .map_err(backend)?;
        }

        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM rules WHERE rule_set_id = ?")
            .bind(rule_set_id)
            .fetch_one(&mut *tx)
            .await
            .map_err(backend)?;

        tx.commit().await.map_err(backend)?;

        debug!(
            rule_set_id,
            inserted = write.rules.len(),
            total,
            "Rule set written"
        );

        Ok(LoadReceipt {
            rule_set_id: RuleSetId::new(rule_set_id),
            inserted_count: write.rules.len(),
            total_count: to_usize(total)?,
        })
    }

    async fn delete_rule_set(&self, rule_set_id: RuleSetId) -> StorageResult<bool> {
        let result = sqlx::query("DELETE FROM rule_sets WHERE id = ?")
            .bind(rule_set_id.get())
            .execute(&self.pool)
            .await
            .map_err(backend)?;
        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl AssessmentLog for SqliteStorage {
    async fn append_assessment(
        &self,
        record: NewAssessmentRecord,
    ) -> StorageResult<AssessmentRecord> {
        let id = sqlx::query(
            r#"
            INSERT INTO assessments (
                created_utc,
                aircraft_family, aircraft_variant,
                zone, side, sta, wl, stringer_num, pressurized,
                damage_type, structure,
                diameter_mm, depth_mm, thickness_mm, depth_to_thickness_ratio,
                visible_crack, near_fastener_row,
                disposition, severity, rule_id, srm_ref, reasons,
                raw_description, ctx_json
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(record.created_utc)
        .bind(&record.aircraft_family)
        .bind(&record.aircraft_variant)
        .bind(&record.zone)
        .bind(&record.side)
        .bind(record.sta)
        .bind(record.wl)
        .bind(record.stringer_num)
        .bind(record.pressurized.map(i64::from))
        .bind(&record.damage_type)
        .bind(&record.structure)
        .bind(record.diameter_mm)
        .bind(record.depth_mm)
        .bind(record.thickness_mm)
        .bind(record.depth_to_thickness_ratio)
        .bind(record.visible_crack.map(i64::from))
        .bind(record.near_fastener_row.map(i64::from))
        .bind(&record.disposition)
        .bind(&record.severity)
        .bind(record.rule_id.map(RuleId::get))
        .bind(&record.srm_ref)
        .bind(&record.reasons)
        .bind(&record.raw_description)
        .bind(&record.ctx_json)
        .execute(&self.pool)
        .await
        .map_err(backend)?
        .last_insert_rowid();

        Ok(record.with_id(id))
    }

    async fn recent_assessments(&self, limit: usize) -> StorageResult<Vec<AssessmentRecord>> {
        // SQLite treats a negative LIMIT as unbounded
        let limit = if limit == 0 {
            -1
        } else {
            i64::try_from(limit).unwrap_or(i64::MAX)
        };
        let rows = sqlx::query(&format!(
            "SELECT {ASSESSMENT_COLUMNS} FROM assessments ORDER BY id DESC LIMIT ?"
        ))
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(backend)?;

        rows.iter().map(assessment_from_row).collect()
    }
}

fn backend(e: sqlx::Error) -> StorageError {
    StorageError::Backend(e.to_string())
}

fn to_usize(value: i64) -> StorageResult<usize> {
    usize::try_from(value)
        .map_err(|_| StorageError::Backend(format!("negative count: {value}")))
}

fn get<'r, T>(row: &'r SqliteRow, column: &str) -> StorageResult<T>
where
    T: sqlx::Decode<'r, Sqlite> + sqlx::Type<Sqlite>,
{
    row.try_get(column)
        .map_err(|e| StorageError::Serialization(format!("column {column}: {e}")))
}

fn flag(value: Option<i64>) -> Option<bool> {
    value.map(|v| v != 0)
}

fn rule_set_from_row(row: &SqliteRow) -> StorageResult<RuleSet> {
    Ok(RuleSet {
        id: RuleSetId::new(get(row, "id")?),
        name: get(row, "name")?,
        aircraft_family: get(row, "aircraft_family")?,
        revision: get(row, "revision")?,
        effective_date: get(row, "effective_date")?,
        source: get(row, "source")?,
    })
}

fn rule_from_row(row: &SqliteRow) -> StorageResult<Rule> {
    let side: String = get(row, "side")?;
    let side = Side::from_str(&side).map_err(|e| StorageError::Serialization(e.to_string()))?;
    let enabled: i64 = get(row, "enabled")?;
    let conditions_json: Option<String> = get(row, "conditions_json")?;
    let limits_json: Option<String> = get(row, "limits_json")?;
    let actions_json: Option<String> = get(row, "actions_json")?;
    let severity: Option<String> = get(row, "severity")?;

    Ok(Rule {
        id: RuleId::new(get(row, "id")?),
        rule_set_id: RuleSetId::new(get(row, "rule_set_id")?),
        enabled: enabled != 0,
        priority: get(row, "priority")?,
        damage_type: get(row, "damage_type")?,
        structure: get(row, "structure")?,
        structure_zone: get(row, "structure_zone")?,
        zone_detail: get(row, "zone_detail")?,
        side,
        sta_min: get(row, "sta_min")?,
        sta_max: get(row, "sta_max")?,
        wl_min: get(row, "wl_min")?,
        wl_max: get(row, "wl_max")?,
        stringer_min: get(row, "stringer_min")?,
        stringer_max: get(row, "stringer_max")?,
        pressurized: flag(get(row, "pressurized")?),
        material: get(row, "material")?,
        conditions_json: conditions_json.unwrap_or_default(),
        limits_json: limits_json.unwrap_or_default(),
        actions_json: actions_json.unwrap_or_default(),
        srm_ref: get(row, "srm_ref")?,
        severity: severity.unwrap_or_else(|| ESCALATION_SEVERITY.to_string()),
        notes: get(row, "notes")?,
        source_page: get(row, "source_page")?,
    })
}

fn assessment_from_row(row: &SqliteRow) -> StorageResult<AssessmentRecord> {
    let created_utc: DateTime<Utc> = get(row, "created_utc")?;
    let rule_id: Option<i64> = get(row, "rule_id")?;
    let disposition: Option<String> = get(row, "disposition")?;
    let severity: Option<String> = get(row, "severity")?;
    let reasons: Option<String> = get(row, "reasons")?;
    let ctx_json: Option<String> = get(row, "ctx_json")?;

    let record = NewAssessmentRecord {
        created_utc,
        aircraft_family: get(row, "aircraft_family")?,
        aircraft_variant: get(row, "aircraft_variant")?,
        zone: get(row, "zone")?,
        side: get(row, "side")?,
        sta: get(row, "sta")?,
        wl: get(row, "wl")?,
        stringer_num: get(row, "stringer_num")?,
        pressurized: flag(get(row, "pressurized")?),
        damage_type: get(row, "damage_type")?,
        structure: get(row, "structure")?,
        diameter_mm: get(row, "diameter_mm")?,
        depth_mm: get(row, "depth_mm")?,
        thickness_mm: get(row, "thickness_mm")?,
        depth_to_thickness_ratio: get(row, "depth_to_thickness_ratio")?,
        visible_crack: flag(get(row, "visible_crack")?),
        near_fastener_row: flag(get(row, "near_fastener_row")?),
        disposition: disposition.unwrap_or_default(),
        severity: severity.unwrap_or_default(),
        rule_id: rule_id.map(RuleId::new),
        srm_ref: get(row, "srm_ref")?,
        reasons: reasons.unwrap_or_default(),
        raw_description: get(row, "raw_description")?,
        ctx_json: ctx_json.unwrap_or_default(),
    };
    Ok(record.with_id(get(row, "id")?))
}
