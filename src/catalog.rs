//! Recently opened projects, read from the editor's state database.

use crate::error::{OpenerError, Result};
use rusqlite::{types::ValueRef, Connection, OpenFlags, OptionalExtension};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, info};

pub const HISTORY_KEY: &str = "history.recentlyOpenedPathsList";

const DISPLAY_PREFIXES: [&str; 2] = ["vscode-remote://", "file://"];

/// One folder from the editor's recent list. Immutable once loaded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Project {
    pub folder_id: String,
    pub label: String,
}

impl Project {
    pub fn from_folder_id(folder_id: impl Into<String>) -> Self {
        let folder_id = folder_id.into();
        let label = label_for_folder(&folder_id);
        Self { folder_id, label }
    }

    pub fn display_folder(&self) -> String {
        display_folder_path(&self.folder_id)
    }
}

#[derive(Debug, Deserialize)]
struct RecentHistory {
    #[serde(default)]
    entries: Vec<HistoryEntry>,
}

#[derive(Debug, Deserialize)]
struct HistoryEntry {
    #[serde(default, rename = "folderUri")]
    folder_uri: Option<String>,
}

pub fn load_recent_projects(state_db: &Path) -> Result<Vec<Project>> {
    let history = read_history_blob(state_db)?;
    let projects = parse_recent_projects(&history)?;
    info!(
        count = projects.len(),
        state_db = %state_db.display(),
        "loaded recent projects"
    );
    Ok(projects)
}

pub fn read_history_blob(state_db: &Path) -> Result<String> {
    let database_error = |source| OpenerError::Database {
        path: state_db.to_path_buf(),
        source,
    };
    let conn = Connection::open_with_flags(
        state_db,
        OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
    )
    .map_err(database_error)?;

    read_history_from(&conn)
        .map_err(database_error)?
        .ok_or_else(|| {
            OpenerError::NotFound("could not find any recently opened projects".to_string())
        })
}

fn read_history_from(conn: &Connection) -> rusqlite::Result<Option<String>> {
    let value = conn
        .query_row(
            "SELECT value FROM ItemTable WHERE key = ?1",
            [HISTORY_KEY],
            |row| {
                Ok(match row.get_ref(0)? {
                    ValueRef::Text(bytes) | ValueRef::Blob(bytes) => {
                        Some(String::from_utf8_lossy(bytes).into_owned())
                    }
                    _ => None,
                })
            },
        )
        .optional()?;
    Ok(value.flatten())
}

pub fn parse_recent_projects(history: &str) -> Result<Vec<Project>> {
    let parsed: RecentHistory =
        serde_json::from_str(history).map_err(|err| OpenerError::Parse {
            what: "recently opened projects",
            message: err.to_string(),
        })?;

    let projects: Vec<Project> = parsed
        .entries
        .into_iter()
        .filter_map(|entry| entry.folder_uri)
        .filter(|folder| !folder.is_empty())
        .map(Project::from_folder_id)
        .collect();
    debug!(count = projects.len(), "parsed folder entries");
    Ok(projects)
}

/// Final path segment of a folder URI, percent-decoded. The label doubles as
/// the launcher file name, so decoded separators and drive colons are
/// replaced and a label is never `.` or `..`.
pub fn label_for_folder(folder_id: &str) -> String {
    let trimmed = folder_id.trim_end_matches(['/', '\\']);
    let segment = trimmed
        .rsplit(['/', '\\'])
        .find(|segment| !segment.is_empty())
        .unwrap_or(trimmed);
    file_name_label(&decode_lossy(segment))
}

fn file_name_label(decoded: &str) -> String {
    let label: String = decoded
        .chars()
        .map(|ch| match ch {
            '/' | '\\' | ':' | '<' | '>' | '"' | '|' | '?' | '*' => '_',
            ch if ch.is_control() => '_',
            ch => ch,
        })
        .collect();
    if label.chars().all(|ch| ch == '.') {
        // Also covers the empty label.
        return "_".repeat(label.len().max(1));
    }
    label
}

pub fn display_folder_path(folder_id: &str) -> String {
    let decoded = decode_lossy(folder_id);
    DISPLAY_PREFIXES
        .iter()
        .fold(decoded.as_str(), |path, prefix| {
            path.strip_prefix(prefix).unwrap_or(path)
        })
        .to_string()
}

fn decode_lossy(value: &str) -> String {
    match urlencoding::decode(value) {
        Ok(decoded) => decoded.into_owned(),
        Err(_) => value.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn state_db_with(value: Option<&str>) -> (TempDir, std::path::PathBuf) {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("state.vscdb");
        let conn = Connection::open(&path).unwrap();
        conn.execute_batch(
            "CREATE TABLE ItemTable (key TEXT UNIQUE ON CONFLICT REPLACE, value BLOB);",
        )
        .unwrap();
        conn.execute(
            "INSERT INTO ItemTable (key, value) VALUES (?1, ?2)",
            ["workbench.panel.width", "300"],
        )
        .unwrap();
        if let Some(value) = value {
            conn.execute(
                "INSERT INTO ItemTable (key, value) VALUES (?1, ?2)",
                [HISTORY_KEY, value],
            )
            .unwrap();
        }
        (temp, path)
    }

    #[test]
    fn keeps_only_folder_entries_in_order() {
        let history = r#"{"entries":[
            {"folderUri":"file:///home/me/alpha"},
            {"fileUri":"file:///home/me/notes.md"},
            {"workspace":{"id":"1","configPath":"file:///w.code-workspace"}},
            {"folderUri":""},
            {"folderUri":"vscode-remote://wsl%2Bubuntu/srv/beta","label":"beta [WSL]"}
        ]}"#;
        let projects = parse_recent_projects(history).unwrap();
        assert_eq!(
            projects,
            vec![
                Project {
                    folder_id: "file:///home/me/alpha".to_string(),
                    label: "alpha".to_string(),
                },
                Project {
                    folder_id: "vscode-remote://wsl%2Bubuntu/srv/beta".to_string(),
                    label: "beta".to_string(),
                },
            ]
        );
    }

    #[test]
    fn invalid_history_is_a_parse_failure() {
        let err = parse_recent_projects("{not json").unwrap_err();
        assert!(matches!(err, OpenerError::Parse { .. }));
    }

    #[test]
    fn missing_entries_yield_empty_catalog() {
        assert!(parse_recent_projects("{}").unwrap().is_empty());
    }

    #[test]
    fn label_is_last_segment() {
        assert_eq!(label_for_folder("file:///home/me/my%20app"), "my app");
        assert_eq!(label_for_folder("file:///c%3A/Users/me/proj/"), "proj");
        assert_eq!(label_for_folder(r"C:\work\tool"), "tool");
    }

    #[test]
    fn label_is_always_a_plain_file_name() {
        assert_eq!(
            label_for_folder("file:///srv/a%2F..%2F..%2Fescaped"),
            "a_.._.._escaped"
        );
        assert_eq!(label_for_folder("file:///srv/..%5Cescaped"), ".._escaped");
        assert_eq!(label_for_folder("file:///c%3A/"), "c_");
        assert_eq!(label_for_folder("file:///srv/%2E%2E"), "__");
        assert_eq!(label_for_folder("file:///srv/%2E"), "_");
        assert_eq!(label_for_folder("file:///srv/what%3F"), "what_");
        assert_eq!(label_for_folder("file:///srv/v1.2"), "v1.2");
    }

    #[test]
    fn display_form_is_decoded_and_unprefixed() {
        assert_eq!(
            display_folder_path("file:///c%3A/Users/me/my%20app"),
            "/c:/Users/me/my app"
        );
        assert_eq!(
            display_folder_path("vscode-remote://ssh-remote%2Bbox/srv/api"),
            "ssh-remote+box/srv/api"
        );
    }

    #[test]
    fn reads_history_from_state_database() {
        let (_temp, path) = state_db_with(Some(r#"{"entries":[{"folderUri":"file:///a"}]}"#));
        let projects = load_recent_projects(&path).unwrap();
        assert_eq!(projects, vec![Project::from_folder_id("file:///a")]);
        assert_eq!(projects[0].label, "a");
    }

    #[test]
    fn missing_history_key_is_not_found() {
        let (_temp, path) = state_db_with(None);
        let err = load_recent_projects(&path).unwrap_err();
        assert!(matches!(err, OpenerError::NotFound(_)));
    }
}
