use std::path::{Path, PathBuf};

use thiserror::Error;

pub const MEMORY_URL: &str = "sqlite::memory:";

#[derive(Debug, Error)]
pub enum DbUrlError {
    #[error("invalid --db value: {raw}")]
    Invalid { raw: String },
    #[error("failed to prepare database file: {0}")]
    Io(#[from] std::io::Error),
}

/// Turn a bare path or `sqlite:` URL into an absolute `sqlite://` URL.
#[must_use]
pub fn normalize_sqlite_url(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed == MEMORY_URL || trimmed.starts_with("sqlite://") {
        return trimmed.to_string();
    }

    let path_str = trimmed.strip_prefix("sqlite:").unwrap_or(trimmed);
    let path = Path::new(path_str);
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .unwrap_or_else(|_| PathBuf::from("."))
            .join(path)
    };
    format!("sqlite://{}", absolute.display())
}

/// Create the database file and its parent directories if missing.
///
/// # Errors
///
/// Returns `DbUrlError::Invalid` for URLs without a file path, or `Io` when
/// the file cannot be created.
pub fn prepare_sqlite_file(db_url: &str) -> Result<(), DbUrlError> {
    if db_url == MEMORY_URL {
        return Ok(());
    }

    let path = db_url
        .strip_prefix("sqlite://")
        .ok_or_else(|| DbUrlError::Invalid {
            raw: db_url.to_string(),
        })?;
    let path = path.split('?').next().unwrap_or(path);
    if path.is_empty() {
        return Err(DbUrlError::Invalid {
            raw: db_url.to_string(),
        });
    }

    let path = Path::new(path);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    if !path.exists() {
        std::fs::OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(path)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_and_full_urls_pass_through() {
        assert_eq!(normalize_sqlite_url(MEMORY_URL), MEMORY_URL);
        assert_eq!(
            normalize_sqlite_url("sqlite:///tmp/assess.db"),
            "sqlite:///tmp/assess.db"
        );
    }

    #[test]
    fn relative_paths_become_absolute() {
        let url = normalize_sqlite_url("sqlite:data/assess.db");
        assert!(url.starts_with("sqlite:///"), "{url}");
        assert!(url.ends_with("data/assess.db"), "{url}");

        let bare = normalize_sqlite_url("/var/lib/assess.db");
        assert_eq!(bare, "sqlite:///var/lib/assess.db");
    }

    #[test]
    fn prepare_rejects_urls_without_a_path() {
        assert!(matches!(
            prepare_sqlite_file("postgres://nope"),
            Err(DbUrlError::Invalid { .. })
        ));
        assert!(matches!(
            prepare_sqlite_file("sqlite://?mode=rwc"),
            Err(DbUrlError::Invalid { .. })
        ));
        assert!(prepare_sqlite_file(MEMORY_URL).is_ok());
    }

    #[test]
    fn prepare_creates_missing_file_and_parents() {
        let dir = std::env::temp_dir().join(format!("assess-db-{}", uuid::Uuid::new_v4()));
        let file = dir.join("nested").join("assess.db");
        let url = format!("sqlite://{}", file.display());

        prepare_sqlite_file(&url).unwrap();
        assert!(file.exists());

        std::fs::remove_dir_all(&dir).unwrap();
    }
}
