use anyhow::{Context, Result};
use rowsift::member::MemberTeam;
use rowsift::repository::PaginationMeta;
use serde::Serialize;
use std::fs;
use std::path::Path;

pub mod format;

/// What `search` prints, as text or JSON
#[derive(Debug, Serialize)]
pub struct SearchOutput<T> {
    pub filter: Option<String>,
    pub meta: PaginationMeta,
    pub count_query: bool,
    pub content: Vec<T>,
}

/// Read a JSON array of member rows
pub fn load_rows(path: &Path) -> Result<Vec<MemberTeam>> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("Failed to read data file: {}", path.display()))?;
    serde_json::from_str(&raw)
        .with_context(|| format!("Failed to parse member rows from: {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_load_rows() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"[
                {{"member_id": 1, "username": "ann", "age": 31, "team_id": 7, "team_name": "ops"}},
                {{"member_id": 2, "username": null, "age": 19}}
            ]"#
        )
        .unwrap();

        let rows = load_rows(file.path()).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].team_name.as_deref(), Some("ops"));
        assert_eq!(rows[1].username, None);
        assert_eq!(rows[1].team_id, None);
    }

    #[test]
    fn test_load_rows_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("members.json");
        let err = load_rows(&missing).unwrap_err();
        assert!(err.to_string().contains("members.json"));
    }
}
