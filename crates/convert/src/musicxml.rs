//! Locating and reading the MusicXML files an OMR run leaves behind.

use std::fs;
use std::io::{self, Cursor, Read};
use std::path::{Path, PathBuf};

use zip::ZipArchive;

use crate::ConvertError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MusicXmlArtifact {
    /// `.mxl`: a zip archive holding the score document.
    Compressed(PathBuf),
    /// Plain `.xml` score document.
    Plain(PathBuf),
}

/// Search `dir` recursively, preferring any `.mxl` over any `.xml`.
/// Candidates of the same kind are taken in path order.
pub fn locate_artifact(dir: &Path) -> io::Result<Option<MusicXmlArtifact>> {
    let mut files = Vec::new();
    collect_files(dir, &mut files)?;
    files.sort();

    if let Some(path) = files.iter().find(|path| has_extension(path, "mxl")) {
        return Ok(Some(MusicXmlArtifact::Compressed(path.clone())));
    }
    Ok(files
        .into_iter()
        .find(|path| has_extension(path, "xml"))
        .map(MusicXmlArtifact::Plain))
}

pub fn read_artifact(artifact: &MusicXmlArtifact) -> Result<String, ConvertError> {
    match artifact {
        MusicXmlArtifact::Compressed(path) => extract_mxl(&fs::read(path)?),
        MusicXmlArtifact::Plain(path) => Ok(String::from_utf8(fs::read(path)?)?),
    }
}

/// Return the first `.xml` entry outside `META-INF/` of an `.mxl` archive.
pub fn extract_mxl(bytes: &[u8]) -> Result<String, ConvertError> {
    let mut archive = ZipArchive::new(Cursor::new(bytes))?;
    for index in 0..archive.len() {
        let mut entry = archive.by_index(index)?;
        let name = entry.name().to_string();
        if !name.ends_with(".xml") || name.starts_with("META-INF") {
            continue;
        }
        let mut buffer = Vec::new();
        entry.read_to_end(&mut buffer)?;
        let text = String::from_utf8(buffer)?;
        if text.is_empty() {
            return Err(ConvertError::EmptyArchive);
        }
        return Ok(text);
    }
    Err(ConvertError::EmptyArchive)
}

fn has_extension(path: &Path, extension: &str) -> bool {
    path.extension().and_then(|ext| ext.to_str()) == Some(extension)
}

fn collect_files(dir: &Path, files: &mut Vec<PathBuf>) -> io::Result<()> {
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let file_type = entry.file_type()?;
        if file_type.is_dir() {
            collect_files(&entry.path(), files)?;
        } else if file_type.is_file() {
            files.push(entry.path());
        }
    }
    Ok(())
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::io::Write;
    use zip::write::FileOptions;
    use zip::ZipWriter;

    pub(crate) const SCORE: &str =
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<score-partwise version=\"4.0\"/>\n";

    pub(crate) fn mxl_bytes(entries: &[(&str, &str)]) -> Vec<u8> {
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        for (name, contents) in entries {
            writer.start_file(*name, FileOptions::default()).unwrap();
            writer.write_all(contents.as_bytes()).unwrap();
        }
        writer.finish().unwrap().into_inner()
    }

    #[test]
    fn extracts_score_and_skips_container() {
        let bytes = mxl_bytes(&[
            ("META-INF/container.xml", "<container/>"),
            ("score.xml", SCORE),
        ]);
        assert_eq!(extract_mxl(&bytes).unwrap(), SCORE);
    }

    #[test]
    fn archive_without_score_is_empty() {
        let bytes = mxl_bytes(&[("META-INF/container.xml", "<container/>")]);
        assert!(matches!(extract_mxl(&bytes), Err(ConvertError::EmptyArchive)));
    }

    #[test]
    fn garbage_is_an_archive_error() {
        assert!(matches!(
            extract_mxl(b"not a zip"),
            Err(ConvertError::Archive(_))
        ));
    }

    #[test]
    fn compressed_artifact_wins_over_plain() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.xml"), SCORE).unwrap();
        fs::create_dir(dir.path().join("book")).unwrap();
        fs::write(dir.path().join("book").join("score.mxl"), b"zip").unwrap();

        let artifact = locate_artifact(dir.path()).unwrap();
        assert_eq!(
            artifact,
            Some(MusicXmlArtifact::Compressed(dir.path().join("book").join("score.mxl")))
        );
    }

    #[test]
    fn plain_artifact_is_read_as_text() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("score.log"), "log").unwrap();
        fs::write(dir.path().join("score.xml"), SCORE).unwrap();

        let artifact = locate_artifact(dir.path()).unwrap().unwrap();
        assert_eq!(read_artifact(&artifact).unwrap(), SCORE);
    }

    #[test]
    fn empty_directory_has_no_artifact() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(locate_artifact(dir.path()).unwrap(), None);
    }
}
