//! Migrate command: upgrade a saved stats payload to the current schema.

use std::io::{Read, Write};
use std::path::Path;

use anyhow::{Context, Result};

/// Reads a stats payload from `file` (or `input` when no file is given) and
/// prints it in the current schema.
pub fn run<R: Read, W: Write>(writer: &mut W, mut input: R, file: Option<&Path>) -> Result<()> {
    let json = match file {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?,
        None => {
            let mut json = String::new();
            input
                .read_to_string(&mut json)
                .context("failed to read payload from stdin")?;
            json
        }
    };

    let stats = ft_core::migrate_str(&json).context("failed to migrate stats payload")?;
    writeln!(writer, "{}", serde_json::to_string_pretty(&stats)?)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    use ft_core::{SCHEMA_VERSION, SessionStats};

    const LEGACY: &str = r#"{
        "session": {"id": 2, "datetime": "2024-03-01T08:00:00Z"},
        "time_per_app": [["Editor", 4000]],
        "app_visited_entries": [
            {"start": "2024-03-01T08:00:00Z", "finish": "2024-03-01T08:00:04Z", "duration": 4000, "app_title": "Editor"},
            {"start": "2024-03-01T08:00:04Z", "finish": null, "duration": 0, "app_title": "Mail"}
        ],
        "avg_time_in_app": 1,
        "total_time_in_apps": 1
    }"#;

    #[test]
    fn migrates_from_reader() {
        let mut output = Vec::new();
        run(&mut output, LEGACY.as_bytes(), None).unwrap();

        let stats: SessionStats = serde_json::from_slice(&output).unwrap();
        assert_eq!(stats.schema_version, SCHEMA_VERSION);
        assert_eq!(stats.total_time_in_apps, 4000);
        assert_eq!(stats.open_entry().map(|e| e.app_title()), Some("Mail"));
    }

    #[test]
    fn migrates_from_file() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("stats.json");
        std::fs::write(&path, LEGACY).unwrap();

        let mut output = Vec::new();
        run(&mut output, std::io::empty(), Some(&path)).unwrap();
        assert!(String::from_utf8(output).unwrap().contains("\"schema_version\": 1"));
    }

    #[test]
    fn missing_file_is_an_error() {
        let result = run(
            &mut Vec::new(),
            std::io::empty(),
            Some(Path::new("/nonexistent/stats.json")),
        );
        assert!(result.is_err());
    }
}
