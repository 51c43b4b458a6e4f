//! Uploaded files and the uploaded-file tree.
//!
//! # Design Decisions
//! - Status codes follow the common upload-status numbering (0..=8, no 5)
//! - A file only carries a stream when its status is `Ok`
//! - `move_to` consumes the stream; a second move fails

use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

use crate::http::stream::Stream;

/// Upload status of a single file.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadError {
    Ok = 0,
    IniSize = 1,
    FormSize = 2,
    Partial = 3,
    NoFile = 4,
    NoTmpDir = 6,
    CantWrite = 7,
    Extension = 8,
}

impl UploadError {
    /// Map a numeric status to its variant; unknown codes yield `None`.
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(UploadError::Ok),
            1 => Some(UploadError::IniSize),
            2 => Some(UploadError::FormSize),
            3 => Some(UploadError::Partial),
            4 => Some(UploadError::NoFile),
            6 => Some(UploadError::NoTmpDir),
            7 => Some(UploadError::CantWrite),
            8 => Some(UploadError::Extension),
            _ => None,
        }
    }

    pub fn code(self) -> u8 {
        self as u8
    }
}

/// A single uploaded file.
#[derive(Debug)]
pub struct UploadedFile {
    client_filename: Option<String>,
    client_media_type: Option<String>,
    size: u64,
    error: UploadError,
    stream: Option<Box<dyn Stream>>,
    moved: bool,
}

impl UploadedFile {
    pub fn new(
        stream: Option<Box<dyn Stream>>,
        size: u64,
        error: UploadError,
        client_filename: Option<String>,
        client_media_type: Option<String>,
    ) -> Self {
        Self {
            client_filename,
            client_media_type,
            size,
            error,
            stream,
            moved: false,
        }
    }

    pub fn client_filename(&self) -> Option<&str> {
        self.client_filename.as_deref()
    }

    pub fn client_media_type(&self) -> Option<&str> {
        self.client_media_type.as_deref()
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn error(&self) -> UploadError {
        self.error
    }

    /// Content stream, absent when the upload failed or the file was moved.
    pub fn stream_mut(&mut self) -> Option<&mut (dyn Stream + 'static)> {
        self.stream.as_deref_mut()
    }

    pub fn is_moved(&self) -> bool {
        self.moved
    }

    /// Copy the uploaded content to `target`. Allowed once.
    pub fn move_to(&mut self, target: &Path) -> io::Result<()> {
        if self.moved {
            return Err(io::Error::new(
                io::ErrorKind::Other,
                "uploaded file has already been moved",
            ));
        }
        let mut stream = self.stream.take().ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::NotFound,
                format!("uploaded file has no content (status {})", self.error.code()),
            )
        })?;

        if stream.is_seekable() {
            stream.rewind()?;
        }
        let content = stream.contents()?;
        let mut out = File::create(target)?;
        out.write_all(&content)?;
        self.moved = true;

        tracing::debug!(target = %target.display(), bytes = content.len(), "Uploaded file moved");
        Ok(())
    }
}

/// Tree of uploaded files, mirroring nested form field names.
#[derive(Debug)]
pub enum UploadedFiles {
    File(UploadedFile),
    Branch(Vec<(String, UploadedFiles)>),
}

impl UploadedFiles {
    /// Child by key (field name or index), if this is a branch.
    pub fn get(&self, key: &str) -> Option<&UploadedFiles> {
        match self {
            UploadedFiles::File(_) => None,
            UploadedFiles::Branch(children) => children
                .iter()
                .find(|(k, _)| k == key)
                .map(|(_, child)| child),
        }
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut UploadedFiles> {
        match self {
            UploadedFiles::File(_) => None,
            UploadedFiles::Branch(children) => children
                .iter_mut()
                .find(|(k, _)| k == key)
                .map(|(_, child)| child),
        }
    }

    pub fn as_file(&self) -> Option<&UploadedFile> {
        match self {
            UploadedFiles::File(file) => Some(file),
            UploadedFiles::Branch(_) => None,
        }
    }

    pub fn as_file_mut(&mut self) -> Option<&mut UploadedFile> {
        match self {
            UploadedFiles::File(file) => Some(file),
            UploadedFiles::Branch(_) => None,
        }
    }

    /// Number of direct children; a leaf counts as one.
    pub fn len(&self) -> usize {
        match self {
            UploadedFiles::File(_) => 1,
            UploadedFiles::Branch(children) => children.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, UploadedFiles::Branch(children) if children.is_empty())
    }

    /// Direct children of a branch; empty for a leaf.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &UploadedFiles)> {
        let children: &[(String, UploadedFiles)] = match self {
            UploadedFiles::File(_) => &[],
            UploadedFiles::Branch(children) => children,
        };
        children.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl Default for UploadedFiles {
    fn default() -> Self {
        UploadedFiles::Branch(Vec::new())
    }
}
