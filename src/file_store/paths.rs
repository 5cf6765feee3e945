/// Stored path normalization
///
/// Rows hold public references such as `/uploads/videos/video_1.mp4`. Older
/// rows may carry an absolute filesystem prefix or Windows separators
/// (`C:\app\uploads\videos\video_1.mp4`). Everything up to and including the
/// first `uploads` segment is stripped; what remains must stay inside the
/// storage root.
use crate::config::STORAGE_ROOT_SEGMENT;
use crate::error::{WorkError, WorkResult};

/// Reduce a stored reference to a path relative to the storage root
pub fn normalize(stored: &str) -> WorkResult<String> {
    let unified = stored.trim().replace('\\', "/");
    let segments: Vec<&str> = unified.split('/').collect();

    let root = segments
        .iter()
        .position(|s| *s == STORAGE_ROOT_SEGMENT)
        .ok_or_else(|| {
            WorkError::FileOperation(format!("Path is outside the storage root: {}", stored))
        })?;

    let mut relative = Vec::new();
    for segment in &segments[root + 1..] {
        match *segment {
            "" | "." => continue,
            ".." => {
                return Err(WorkError::FileOperation(format!(
                    "Path escapes the storage root: {}",
                    stored
                )))
            }
            s if s.contains(':') => {
                return Err(WorkError::FileOperation(format!(
                    "Malformed path segment in {}",
                    stored
                )))
            }
            s => relative.push(s),
        }
    }

    if relative.is_empty() {
        return Err(WorkError::FileOperation(format!(
            "Path does not name a file: {}",
            stored
        )));
    }

    Ok(relative.join("/"))
}

/// Public reference stored in rows for a relative path
pub fn public_path(relative: &str) -> String {
    format!("/{}/{}", STORAGE_ROOT_SEGMENT, relative.trim_start_matches('/'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_public_path_round_trip() {
        let relative = normalize("/uploads/videos/video_1.mp4").unwrap();
        assert_eq!(relative, "videos/video_1.mp4");
        assert_eq!(public_path(&relative), "/uploads/videos/video_1.mp4");
    }

    #[test]
    fn test_windows_and_absolute_prefixes_are_stripped() {
        assert_eq!(
            normalize("C:\\app\\uploads\\targets\\target_1.mind").unwrap(),
            "targets/target_1.mind"
        );
        assert_eq!(
            normalize("/srv/www/app/uploads/images/image_1.png").unwrap(),
            "images/image_1.png"
        );
        assert_eq!(normalize("uploads/images/a.png").unwrap(), "images/a.png");
    }

    #[test]
    fn test_paths_outside_root_rejected() {
        assert!(normalize("/etc/passwd").is_err());
        assert!(normalize("/uploadsx/a.png").is_err());
        assert!(normalize("").is_err());
    }

    #[test]
    fn test_traversal_rejected() {
        assert!(normalize("/uploads/../secrets.txt").is_err());
        assert!(normalize("/uploads/images/../../etc/passwd").is_err());
        assert!(normalize("/uploads/").is_err());
    }

    #[test]
    fn test_redundant_separators_collapse() {
        assert_eq!(normalize("/uploads//images/./a.png").unwrap(), "images/a.png");
    }
}
