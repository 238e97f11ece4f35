// src/event.rs

//! Classified change events handed to consumers.

use std::fmt;
use std::path::{Path, PathBuf};

/// Kind of a classified, user-visible filesystem change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChangeKind {
    CreateFile,
    CreateFolder,
    DeleteFile,
    DeleteFolder,
    RenameFile,
    RenameFolder,
    EditFile,
    Chmod,
}

impl ChangeKind {
    /// Stable upper-snake-case tag, e.g. `"RENAME_FOLDER"`.
    pub fn as_str(self) -> &'static str {
        match self {
            ChangeKind::CreateFile => "CREATE_FILE",
            ChangeKind::CreateFolder => "CREATE_FOLDER",
            ChangeKind::DeleteFile => "DELETE_FILE",
            ChangeKind::DeleteFolder => "DELETE_FOLDER",
            ChangeKind::RenameFile => "RENAME_FILE",
            ChangeKind::RenameFolder => "RENAME_FOLDER",
            ChangeKind::EditFile => "EDIT_FILE",
            ChangeKind::Chmod => "CHMOD",
        }
    }

    pub fn is_rename(self) -> bool {
        matches!(self, ChangeKind::RenameFile | ChangeKind::RenameFolder)
    }

    pub fn is_folder(self) -> bool {
        matches!(
            self,
            ChangeKind::CreateFolder | ChangeKind::DeleteFolder | ChangeKind::RenameFolder
        )
    }
}

impl fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single semantic change.
///
/// `previous_path` is only set for renames, where `path` is the new location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileWatcherEvent {
    pub path: PathBuf,
    pub previous_path: Option<PathBuf>,
    pub kind: ChangeKind,
}

impl FileWatcherEvent {
    pub fn new(kind: ChangeKind, path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            previous_path: None,
            kind,
        }
    }

    pub fn renamed(
        kind: ChangeKind,
        path: impl Into<PathBuf>,
        previous_path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            path: path.into(),
            previous_path: Some(previous_path.into()),
            kind,
        }
    }

    pub fn previous_path(&self) -> Option<&Path> {
        self.previous_path.as_deref()
    }
}

impl fmt::Display for FileWatcherEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}\t{}", self.kind, self.path.display())?;
        if let Some(prev) = &self.previous_path {
            write!(f, "\t{}", prev.display())?;
        }
        Ok(())
    }
}
