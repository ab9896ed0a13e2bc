use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;

use crate::error::Result;
use crate::models::{
    BuildRecord, BuildState, ChangeSummary, ClassificationTally, CommitChanges, CommitRecord,
    ExternalBuild, FileRecord, MinedCommit, VcsSystem,
};
use crate::storage::HistoryStore;

const COMMIT_COLUMNS: &str =
    "id, vcs_system_id, revision_hash, parents, committer_ts, message, is_bugfix";
const BUILD_COLUMNS: &str = "id, vcs_system_id, external_id, number, state, commit_id";

pub struct Storage {
    conn: Connection,
}

impl Storage {
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open(path)?;
        let storage = Self { conn };
        storage.init_db()?;
        Ok(storage)
    }

    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let storage = Self { conn };
        storage.init_db()?;
        Ok(storage)
    }

    fn init_db(&self) -> Result<()> {
        self.conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS vcs_systems (
                id INTEGER PRIMARY KEY,
                url TEXT UNIQUE NOT NULL
            );

            CREATE TABLE IF NOT EXISTS commits (
                id INTEGER PRIMARY KEY,
                vcs_system_id INTEGER NOT NULL REFERENCES vcs_systems(id),
                revision_hash TEXT NOT NULL,
                parents TEXT NOT NULL,
                committer_ts INTEGER NOT NULL,
                message TEXT NOT NULL,
                is_bugfix INTEGER NOT NULL DEFAULT 0,
                UNIQUE(vcs_system_id, revision_hash)
            );

            CREATE TABLE IF NOT EXISTS builds (
                id INTEGER PRIMARY KEY,
                vcs_system_id INTEGER NOT NULL REFERENCES vcs_systems(id),
                external_id TEXT NOT NULL,
                number INTEGER,
                state TEXT NOT NULL,
                commit_id INTEGER REFERENCES commits(id),
                UNIQUE(vcs_system_id, external_id)
            );

            CREATE TABLE IF NOT EXISTS files (
                id INTEGER PRIMARY KEY,
                vcs_system_id INTEGER NOT NULL REFERENCES vcs_systems(id),
                path TEXT NOT NULL,
                UNIQUE(vcs_system_id, path)
            );

            CREATE TABLE IF NOT EXISTS commit_changes (
                id INTEGER PRIMARY KEY,
                old_commit_id INTEGER NOT NULL REFERENCES commits(id),
                new_commit_id INTEGER NOT NULL REFERENCES commits(id),
                changes TEXT,
                analyzed_at TEXT NOT NULL,
                UNIQUE(old_commit_id, new_commit_id)
            );

            CREATE TABLE IF NOT EXISTS file_changes (
                id INTEGER PRIMARY KEY,
                old_commit_id INTEGER NOT NULL REFERENCES commits(id),
                new_commit_id INTEGER NOT NULL REFERENCES commits(id),
                file_id INTEGER NOT NULL REFERENCES files(id),
                changes TEXT NOT NULL,
                UNIQUE(old_commit_id, new_commit_id, file_id)
            );

            CREATE INDEX IF NOT EXISTS idx_commits_vcs_ts ON commits(vcs_system_id, committer_ts);
            CREATE INDEX IF NOT EXISTS idx_builds_commit_state ON builds(commit_id, state);
            "#,
        )?;

        Ok(())
    }

    /// Per-file tallies stored for a pair, by file path.
    pub fn file_changes_for(
        &self,
        old_commit_id: i64,
        new_commit_id: i64,
    ) -> Result<Vec<(String, ClassificationTally)>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT f.path, fc.changes
            FROM file_changes fc
            JOIN files f ON fc.file_id = f.id
            WHERE fc.old_commit_id = ?1 AND fc.new_commit_id = ?2
            ORDER BY f.path
            "#,
        )?;

        let rows = stmt.query_map(params![old_commit_id, new_commit_id], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;

        let mut files = Vec::new();
        for row in rows {
            let (path, json) = row?;
            files.push((path, serde_json::from_str(&json)?));
        }
        Ok(files)
    }
}

fn commit_from_row(row: &Row<'_>) -> rusqlite::Result<CommitRecord> {
    let parents: String = row.get(3)?;
    let committer_ts: i64 = row.get(4)?;
    Ok(CommitRecord {
        id: row.get(0)?,
        vcs_system_id: row.get(1)?,
        revision_hash: row.get(2)?,
        parents: parents.split_whitespace().map(str::to_string).collect(),
        committer_date: DateTime::<Utc>::from_timestamp(committer_ts, 0).unwrap_or_default(),
        message: row.get(5)?,
        is_bugfix: row.get(6)?,
    })
}

fn build_from_row(row: &Row<'_>) -> rusqlite::Result<BuildRecord> {
    let state: String = row.get(4)?;
    Ok(BuildRecord {
        id: row.get(0)?,
        vcs_system_id: row.get(1)?,
        external_id: row.get(2)?,
        number: row.get(3)?,
        state: BuildState::from(state.as_str()),
        commit_id: row.get(5)?,
    })
}

impl HistoryStore for Storage {
    fn ensure_vcs_system(&self, url: &str) -> Result<VcsSystem> {
        self.conn.execute(
            "INSERT OR IGNORE INTO vcs_systems (url) VALUES (?1)",
            params![url],
        )?;

        let id: i64 = self.conn.query_row(
            "SELECT id FROM vcs_systems WHERE url = ?1",
            params![url],
            |row| row.get(0),
        )?;

        Ok(VcsSystem {
            id,
            url: url.to_string(),
        })
    }

    fn vcs_system_by_url(&self, url: &str) -> Result<Option<VcsSystem>> {
        let system = self
            .conn
            .query_row(
                "SELECT id, url FROM vcs_systems WHERE url = ?1",
                params![url],
                |row| {
                    Ok(VcsSystem {
                        id: row.get(0)?,
                        url: row.get(1)?,
                    })
                },
            )
            .optional()?;
        Ok(system)
    }

    fn upsert_commit(
        &self,
        vcs_system_id: i64,
        commit: &MinedCommit,
        is_bugfix: bool,
    ) -> Result<i64> {
        self.conn.execute(
            r#"
            INSERT INTO commits (vcs_system_id, revision_hash, parents, committer_ts, message, is_bugfix)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            ON CONFLICT(vcs_system_id, revision_hash) DO UPDATE SET
                parents = excluded.parents,
                committer_ts = excluded.committer_ts,
                message = excluded.message,
                is_bugfix = excluded.is_bugfix
            "#,
            params![
                vcs_system_id,
                commit.revision_hash,
                commit.parents.join(" "),
                commit.committer_date.timestamp(),
                commit.message,
                is_bugfix,
            ],
        )?;

        let id: i64 = self.conn.query_row(
            "SELECT id FROM commits WHERE vcs_system_id = ?1 AND revision_hash = ?2",
            params![vcs_system_id, commit.revision_hash],
            |row| row.get(0),
        )?;

        Ok(id)
    }

    fn commit_by_hash(
        &self,
        vcs_system_id: i64,
        revision_hash: &str,
    ) -> Result<Option<CommitRecord>> {
        let commit = self
            .conn
            .query_row(
                &format!(
                    "SELECT {} FROM commits WHERE vcs_system_id = ?1 AND revision_hash = ?2",
                    COMMIT_COLUMNS
                ),
                params![vcs_system_id, revision_hash],
                commit_from_row,
            )
            .optional()?;
        Ok(commit)
    }

    fn commit_by_id(&self, id: i64) -> Result<Option<CommitRecord>> {
        let commit = self
            .conn
            .query_row(
                &format!("SELECT {} FROM commits WHERE id = ?1", COMMIT_COLUMNS),
                params![id],
                commit_from_row,
            )
            .optional()?;
        Ok(commit)
    }

    fn commits(&self, vcs_system_id: i64, bugfix_only: bool) -> Result<Vec<CommitRecord>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM commits WHERE vcs_system_id = ?1 AND (?2 = 0 OR is_bugfix = 1) \
             ORDER BY committer_ts DESC, id DESC",
            COMMIT_COLUMNS
        ))?;

        let commits = stmt.query_map(params![vcs_system_id, bugfix_only], commit_from_row)?;
        commits.collect::<std::result::Result<Vec<_>, _>>().map_err(Into::into)
    }

    fn upsert_build(
        &self,
        vcs_system_id: i64,
        build: &ExternalBuild,
        commit_id: Option<i64>,
    ) -> Result<i64> {
        self.conn.execute(
            r#"
            INSERT INTO builds (vcs_system_id, external_id, number, state, commit_id)
            VALUES (?1, ?2, ?3, ?4, ?5)
            ON CONFLICT(vcs_system_id, external_id) DO UPDATE SET
                number = excluded.number,
                state = excluded.state,
                commit_id = excluded.commit_id
            "#,
            params![
                vcs_system_id,
                build.external_id,
                build.number,
                build.state.as_str(),
                commit_id,
            ],
        )?;

        let id: i64 = self.conn.query_row(
            "SELECT id FROM builds WHERE vcs_system_id = ?1 AND external_id = ?2",
            params![vcs_system_id, build.external_id],
            |row| row.get(0),
        )?;

        Ok(id)
    }

    fn builds_not_passing(&self, vcs_system_id: i64) -> Result<Vec<BuildRecord>> {
        let [a, b, c] = BuildState::NOT_PASSING;
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM builds WHERE vcs_system_id = ?1 AND state IN (?2, ?3, ?4) ORDER BY id",
            BUILD_COLUMNS
        ))?;

        let builds = stmt.query_map(
            params![vcs_system_id, a.as_str(), b.as_str(), c.as_str()],
            build_from_row,
        )?;
        builds.collect::<std::result::Result<Vec<_>, _>>().map_err(Into::into)
    }

    fn build_by_commit_and_state(
        &self,
        vcs_system_id: i64,
        commit_id: i64,
        state: BuildState,
    ) -> Result<Option<BuildRecord>> {
        let build = self
            .conn
            .query_row(
                &format!(
                    "SELECT {} FROM builds WHERE vcs_system_id = ?1 AND commit_id = ?2 AND state = ?3 \
                     ORDER BY id LIMIT 1",
                    BUILD_COLUMNS
                ),
                params![vcs_system_id, commit_id, state.as_str()],
                build_from_row,
            )
            .optional()?;
        Ok(build)
    }

    fn file_by_path(&self, vcs_system_id: i64, path: &str) -> Result<Option<FileRecord>> {
        let file = self
            .conn
            .query_row(
                "SELECT id, vcs_system_id, path FROM files WHERE vcs_system_id = ?1 AND path = ?2",
                params![vcs_system_id, path],
                |row| {
                    Ok(FileRecord {
                        id: row.get(0)?,
                        vcs_system_id: row.get(1)?,
                        path: row.get(2)?,
                    })
                },
            )
            .optional()?;
        Ok(file)
    }

    fn insert_file(&self, vcs_system_id: i64, path: &str) -> Result<FileRecord> {
        self.conn.execute(
            "INSERT OR IGNORE INTO files (vcs_system_id, path) VALUES (?1, ?2)",
            params![vcs_system_id, path],
        )?;

        let id: i64 = self.conn.query_row(
            "SELECT id FROM files WHERE vcs_system_id = ?1 AND path = ?2",
            params![vcs_system_id, path],
            |row| row.get(0),
        )?;

        Ok(FileRecord {
            id,
            vcs_system_id,
            path: path.to_string(),
        })
    }

    fn upsert_commit_changes(
        &self,
        old_commit_id: i64,
        new_commit_id: i64,
        summary: &ChangeSummary,
    ) -> Result<()> {
        self.conn.execute(
            r#"
            INSERT INTO commit_changes (old_commit_id, new_commit_id, changes, analyzed_at)
            VALUES (?1, ?2, ?3, ?4)
            ON CONFLICT(old_commit_id, new_commit_id) DO UPDATE SET
                changes = excluded.changes,
                analyzed_at = excluded.analyzed_at
            "#,
            params![
                old_commit_id,
                new_commit_id,
                summary.to_column()?,
                Utc::now().to_rfc3339(),
            ],
        )?;

        Ok(())
    }

    fn upsert_file_changes(
        &self,
        old_commit_id: i64,
        new_commit_id: i64,
        file_id: i64,
        tally: &ClassificationTally,
    ) -> Result<()> {
        self.conn.execute(
            r#"
            INSERT INTO file_changes (old_commit_id, new_commit_id, file_id, changes)
            VALUES (?1, ?2, ?3, ?4)
            ON CONFLICT(old_commit_id, new_commit_id, file_id) DO UPDATE SET
                changes = excluded.changes
            "#,
            params![
                old_commit_id,
                new_commit_id,
                file_id,
                serde_json::to_string(tally)?,
            ],
        )?;

        Ok(())
    }

    fn clear_file_changes(&self, old_commit_id: i64, new_commit_id: i64) -> Result<()> {
        self.conn.execute(
            "DELETE FROM file_changes WHERE old_commit_id = ?1 AND new_commit_id = ?2",
            params![old_commit_id, new_commit_id],
        )?;
        Ok(())
    }

    fn commit_changes(
        &self,
        old_commit_id: i64,
        new_commit_id: i64,
    ) -> Result<Option<ChangeSummary>> {
        let column = self
            .conn
            .query_row(
                "SELECT changes FROM commit_changes WHERE old_commit_id = ?1 AND new_commit_id = ?2",
                params![old_commit_id, new_commit_id],
                |row| row.get::<_, Option<String>>(0),
            )
            .optional()?;

        match column {
            Some(column) => Ok(Some(ChangeSummary::from_column(column)?)),
            None => Ok(None),
        }
    }

    fn list_commit_changes(&self, vcs_system_id: i64) -> Result<Vec<CommitChanges>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT cc.old_commit_id, cc.new_commit_id, o.revision_hash, n.revision_hash, cc.changes
            FROM commit_changes cc
            JOIN commits o ON cc.old_commit_id = o.id
            JOIN commits n ON cc.new_commit_id = n.id
            WHERE n.vcs_system_id = ?1
            ORDER BY n.committer_ts DESC, cc.id
            "#,
        )?;

        let rows = stmt.query_map(params![vcs_system_id], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, i64>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, Option<String>>(4)?,
            ))
        })?;

        let mut results = Vec::new();
        for row in rows {
            let (old_commit_id, new_commit_id, old_revision, new_revision, changes) = row?;
            let changes = match changes {
                Some(json) => Some(serde_json::from_str(&json)?),
                None => None,
            };
            results.push(CommitChanges {
                old_commit_id,
                new_commit_id,
                old_revision,
                new_revision,
                changes,
            });
        }
        Ok(results)
    }
}
