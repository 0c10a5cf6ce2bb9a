use std::path::Path;

/// Replace the contents of `path` with `text`.
///
/// The write is not atomic: an interrupted process can leave a partial file.
pub async fn write_summary(path: &Path, text: &str) -> std::io::Result<()> {
    tokio::fs::write(path, text.as_bytes()).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn overwrites_instead_of_appending() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("summary.txt");

        write_summary(&path, "a much longer first summary").await.unwrap();
        write_summary(&path, "second").await.unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "second");
    }

    #[tokio::test]
    async fn missing_directory_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("summary.txt");

        let err = write_summary(&path, "text").await.unwrap_err();
        assert_eq!(err.kind(), std::io::ErrorKind::NotFound);
    }
}
