use std::path::Path;

use url::Url;

use crate::error::{StoreError, StoreResult};

/// Render an absolute path as a `file://` URI.
///
/// Fails with [`StoreError::InvalidLocator`] for relative paths.
pub fn file_uri(path: &Path) -> StoreResult<String> {
    Url::from_file_path(path)
        .map(String::from)
        .map_err(|()| StoreError::InvalidLocator(path.to_path_buf()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[cfg(unix)]
    #[test]
    fn plain_unix_path() {
        assert_eq!(
            file_uri(Path::new("/srv/images/abc.png")).unwrap(),
            "file:///srv/images/abc.png"
        );
    }

    #[cfg(unix)]
    #[test]
    fn escapes_reserved_bytes() {
        assert_eq!(
            file_uri(Path::new("/tmp/my images/a#b.png")).unwrap(),
            "file:///tmp/my%20images/a%23b.png"
        );
    }

    #[cfg(unix)]
    #[test]
    fn escapes_non_ascii() {
        assert_eq!(file_uri(Path::new("/tmp/é")).unwrap(), "file:///tmp/%C3%A9");
    }

    #[cfg(windows)]
    #[test]
    fn drive_letter_path() {
        assert_eq!(
            file_uri(Path::new("C:\\img\\a.png")).unwrap(),
            "file:///C:/img/a.png"
        );
    }

    #[test]
    fn relative_path_is_rejected() {
        assert!(matches!(
            file_uri(Path::new("images/a.png")),
            Err(StoreError::InvalidLocator(p)) if p == Path::new("images/a.png")
        ));
    }
}
