use crate::notes::merge::MergeError;
use std::path::PathBuf;
use thiserror::Error;

/// Failures raised while folding notes into monthly archives.
///
/// The first three variants concern a single note and leave the rest of the
/// batch intact. The last three abort `Archiver::write`.
///
/// `MergeFailed` and `MergeExisting` only fire when a note and its archive
/// disagree on section names. Documents built from one `NoteLayout` always
/// agree, so through `Archiver` these are guards rather than expected paths.
#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("cannot add unparsable file name [{file}] to archive")]
    UnparsableFileName {
        file: String,
        #[source]
        source: chrono::ParseError,
    },
    #[error("cannot add unreadable file [{file}] to archive")]
    UnreadableFile {
        file: String,
        #[source]
        source: anyhow::Error,
    },
    #[error("cannot add contents from [{file}] to archive")]
    MergeFailed {
        file: String,
        #[source]
        source: MergeError,
    },
    #[error("unable to open existing archive file [{}]", .path.display())]
    ReadExisting {
        path: PathBuf,
        #[source]
        source: anyhow::Error,
    },
    #[error("unable to merge existing archive file [{}]", .path.display())]
    MergeExisting {
        path: PathBuf,
        #[source]
        source: MergeError,
    },
    #[error("failed to write archive file [{}]", .path.display())]
    WriteFailed {
        path: PathBuf,
        #[source]
        source: anyhow::Error,
    },
}

impl ArchiveError {
    /// True for errors that only cost one note its contribution.
    pub fn is_per_file(&self) -> bool {
        matches!(
            self,
            Self::UnparsableFileName { .. } | Self::UnreadableFile { .. } | Self::MergeFailed { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::ArchiveError;
    use crate::notes::merge::MergeError;
    use std::path::PathBuf;

    #[test]
    fn merge_failures_name_their_file_and_scope() {
        let per_note = ArchiveError::MergeFailed {
            file: "2024-04-05.txt".to_string(),
            source: MergeError::UnknownSection("IDEAS".to_string()),
        };
        assert!(per_note.is_per_file());
        assert!(per_note.to_string().contains("[2024-04-05.txt]"));

        let existing = ArchiveError::MergeExisting {
            path: PathBuf::from("/notes/archive-Apr2024.txt"),
            source: MergeError::UnknownSection("IDEAS".to_string()),
        };
        assert!(!existing.is_per_file());
        assert!(existing.to_string().contains("archive-Apr2024.txt"));
        let chain = format!("{:#}", anyhow::Error::from(existing));
        assert!(chain.contains("section `IDEAS` does not exist"));
    }
}
