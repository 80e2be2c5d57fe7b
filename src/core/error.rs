//! Purpose: Structured error model shared by input resolution, validation, and the API client.
//! Exports: `ErrorKind`, `Error`, `to_exit_code`.
//! Role: One error type for every layer; the CLI renders it and maps the kind to an exit code.
//! Invariants: Exit codes are stable per kind; new kinds get new codes.
//! Invariants: Context fields (name, path, media type) are optional and additive.
use std::error::Error as StdError;
use std::fmt;
use std::path::{Path, PathBuf};

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ErrorKind {
    Internal,
    Usage,
    MissingFilename,
    ConflictingName,
    FileOpen,
    EmptyContent,
    NonTextContent,
    Remote,
    Permission,
    NotFound,
    Io,
}

#[derive(Debug)]
pub struct Error {
    kind: ErrorKind,
    message: Option<String>,
    hint: Option<String>,
    name: Option<String>,
    path: Option<PathBuf>,
    media_type: Option<String>,
    status: Option<u16>,
    source: Option<Box<dyn StdError + Send + Sync>>,
}

impl Error {
    pub fn new(kind: ErrorKind) -> Self {
        Self {
            kind,
            message: None,
            hint: None,
            name: None,
            path: None,
            media_type: None,
            status: None,
            source: None,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    pub fn hint(&self) -> Option<&str> {
        self.hint.as_deref()
    }

    /// Display name of the item the error belongs to, when known.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Sniffed media type, set on `NonTextContent` errors.
    pub fn media_type(&self) -> Option<&str> {
        self.media_type.as_deref()
    }

    pub fn status(&self) -> Option<u16> {
        self.status
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn with_media_type(mut self, media_type: impl Into<String>) -> Self {
        self.media_type = Some(media_type.into());
        self
    }

    pub fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_source(mut self, source: impl StdError + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.kind)?;
        if let Some(message) = &self.message {
            write!(f, ": {message}")?;
        }
        if let Some(name) = &self.name {
            write!(f, " (name: {name})")?;
        }
        if let Some(path) = &self.path {
            write!(f, " (path: {})", path.display())?;
        }
        if let Some(media_type) = &self.media_type {
            write!(f, " (media type: {media_type})")?;
        }
        if let Some(status) = self.status {
            write!(f, " (status: {status})")?;
        }
        Ok(())
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.source
            .as_ref()
            .map(|source| source.as_ref() as &(dyn StdError + 'static))
    }
}

pub fn to_exit_code(kind: ErrorKind) -> i32 {
    match kind {
        ErrorKind::Internal => 1,
        ErrorKind::Usage | ErrorKind::MissingFilename | ErrorKind::ConflictingName => 2,
        ErrorKind::FileOpen => 3,
        ErrorKind::EmptyContent => 4,
        ErrorKind::NonTextContent => 5,
        ErrorKind::Remote => 6,
        ErrorKind::Permission => 7,
        ErrorKind::NotFound => 8,
        ErrorKind::Io => 9,
    }
}

#[cfg(test)]
mod tests {
    use super::{Error, ErrorKind, to_exit_code};
    use std::error::Error as StdError;

    #[test]
    fn exit_code_mapping_is_stable() {
        let cases = [
            (ErrorKind::Internal, 1),
            (ErrorKind::Usage, 2),
            (ErrorKind::MissingFilename, 2),
            (ErrorKind::ConflictingName, 2),
            (ErrorKind::FileOpen, 3),
            (ErrorKind::EmptyContent, 4),
            (ErrorKind::NonTextContent, 5),
            (ErrorKind::Remote, 6),
            (ErrorKind::Permission, 7),
            (ErrorKind::NotFound, 8),
            (ErrorKind::Io, 9),
        ];

        for (kind, code) in cases {
            assert_eq!(to_exit_code(kind), code);
        }
    }

    #[test]
    fn display_includes_context_fields() {
        let err = Error::new(ErrorKind::NonTextContent)
            .with_message("non-text content detected")
            .with_name("photo.png")
            .with_media_type("image/png");
        let text = err.to_string();
        assert!(text.starts_with("NonTextContent: non-text content detected"));
        assert!(text.contains("(name: photo.png)"));
        assert!(text.contains("(media type: image/png)"));
    }

    #[test]
    fn source_is_exposed() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err = Error::new(ErrorKind::FileOpen).with_source(io_err);
        let source = err.source().expect("source");
        assert_eq!(source.to_string(), "gone");
    }
}
