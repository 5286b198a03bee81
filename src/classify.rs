//! Photo classification
//!
//! Decides whether a filesystem entry is treated as an image: the lowercased
//! extension is checked against the configured allow-list first, and only
//! unknown extensions fall back to a MIME type guess.

use std::fs;
use std::path::Path;
use tracing::trace;

/// Check whether `path` is a regular file that should be imported as a photo.
///
/// Never errors: unreadable metadata, directories and nonexistent paths all
/// classify as "not a photo".
pub fn is_photo(path: &Path, extensions: &[String]) -> bool {
    let Ok(metadata) = fs::metadata(path) else {
        return false;
    };
    if !metadata.is_file() {
        return false;
    }

    if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
        let ext_lower = ext.to_lowercase();
        if extensions.iter().any(|e| e == &ext_lower) {
            return true;
        }
    }

    // Extension not in the allow-list; accept anything that still looks like
    // an image by MIME type (svg, ico, avif, ...).
    let accepted = mime_guess::from_path(path)
        .first()
        .is_some_and(|mime| mime.type_() == mime_guess::mime::IMAGE);
    trace!(?path, accepted, "Classified by MIME type fallback");
    accepted
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use std::fs::File;

    fn extensions() -> Vec<String> {
        Config::default().image_extensions
    }

    #[test]
    fn test_allow_list_extension_any_case() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["a.jpg", "b.JPG", "c.Nef", "d.HEIC"] {
            let path = dir.path().join(name);
            File::create(&path).unwrap();
            assert!(is_photo(&path, &extensions()), "{name} should classify");
        }
    }

    #[test]
    fn test_rejects_nonexistent_path() {
        assert!(!is_photo(Path::new("/no/such/file.jpg"), &extensions()));
    }

    #[test]
    fn test_rejects_directory() {
        let dir = tempfile::tempdir().unwrap();
        let sub = dir.path().join("album.jpg");
        fs::create_dir(&sub).unwrap();
        assert!(!is_photo(&sub, &extensions()));
    }

    #[test]
    fn test_mime_fallback_accepts_image_type() {
        let dir = tempfile::tempdir().unwrap();
        // svg is not in the allow-list but guesses as image/svg+xml
        let path = dir.path().join("diagram.svg");
        File::create(&path).unwrap();
        assert!(is_photo(&path, &extensions()));
    }

    #[test]
    fn test_rejects_non_image_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.txt");
        File::create(&path).unwrap();
        assert!(!is_photo(&path, &extensions()));

        let no_ext = dir.path().join("README");
        File::create(&no_ext).unwrap();
        assert!(!is_photo(&no_ext, &extensions()));
    }
}
