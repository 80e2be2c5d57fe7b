//! Purpose: Resolve command-line input specs into an ordered list of named byte sources.
//! Exports: `SourceSpec`, `SourcePlan`, `PlannedSource`, `StdinInput`, `ResolvedItem`, `Origin`.
//! Role: Input Resolver for upload and text commands; planning is pure, reading is lazy.
//! Invariants: Contradictory specs (missing or conflicting names) fail before any I/O.
//! Invariants: At most one file handle is open at a time; it is closed before the next read.
//! Invariants: A resolved item always carries a non-empty name and non-empty bytes.
use std::fs::File;
use std::io::{self, IsTerminal, Read};
use std::path::{Path, PathBuf};

use super::error::{Error, ErrorKind};

/// Literal argument that selects standard input.
pub const STDIN_MARKER: &str = "-";

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Origin {
    File,
    Stdin,
}

/// Raw input selection as given on the command line.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct SourceSpec {
    /// Positional path arguments, in order.
    pub paths: Vec<String>,
    /// Value of the explicit `--file` flag.
    pub file: Option<String>,
    /// Display-name override (`--name`).
    pub name: Option<String>,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum PlannedSource {
    Stdin { name: String, explicit: bool },
    File { path: PathBuf, name: String },
    /// A `-` among several candidates; no item is produced for this slot.
    SkippedStdinMarker { index: usize },
}

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct SourcePlan {
    sources: Vec<PlannedSource>,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ResolvedItem {
    pub name: String,
    pub bytes: Vec<u8>,
    pub origin: Origin,
}

/// Standard input plus whether it is attached to a terminal.
pub struct StdinInput<R> {
    reader: R,
    interactive: bool,
}

impl StdinInput<io::Stdin> {
    pub fn from_process() -> Self {
        let stdin = io::stdin();
        let interactive = stdin.is_terminal();
        Self {
            reader: stdin,
            interactive,
        }
    }
}

impl<R: Read> StdinInput<R> {
    pub fn piped(reader: R) -> Self {
        Self {
            reader,
            interactive: false,
        }
    }

    pub fn terminal(reader: R) -> Self {
        Self {
            reader,
            interactive: true,
        }
    }

    /// Reads stdin to completion. An implicit read from a terminal is refused
    /// rather than blocking on interactive input.
    fn read_all(&mut self, explicit: bool) -> Result<Vec<u8>, Error> {
        if self.interactive && !explicit {
            return Err(Error::new(ErrorKind::Usage)
                .with_message("no input: provide --file <path> or pipe content via stdin")
                .with_hint("Pass a file path, or use `-` to read from the terminal explicitly."));
        }
        let mut bytes = Vec::new();
        self.reader.read_to_end(&mut bytes).map_err(|err| {
            Error::new(ErrorKind::Io)
                .with_message("failed to read stdin")
                .with_source(err)
        })?;
        Ok(bytes)
    }
}

fn is_stdin_marker(value: &str) -> bool {
    value == STDIN_MARKER
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|value| !value.is_empty())
}

/// Last path segment of a candidate, used as its display name.
pub fn base_name(path: &str) -> String {
    Path::new(path)
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string())
}

impl SourceSpec {
    pub fn new(paths: Vec<String>, file: Option<String>, name: Option<String>) -> Self {
        Self { paths, file, name }
    }

    /// Positional paths first, then `--file` unless it is empty or `-`.
    pub fn candidates(&self) -> Vec<&str> {
        let mut candidates: Vec<&str> = self.paths.iter().map(String::as_str).collect();
        if let Some(file) = non_empty(self.file.as_deref()) {
            if !is_stdin_marker(file) {
                candidates.push(file);
            }
        }
        candidates
    }

    /// Decide what to read without touching the filesystem.
    pub fn plan(&self) -> Result<SourcePlan, Error> {
        let candidates = self.candidates();
        let name = non_empty(self.name.as_deref());
        let explicit_stdin = self.file.as_deref().is_some_and(is_stdin_marker);

        if candidates.is_empty() || (candidates.len() == 1 && is_stdin_marker(candidates[0])) {
            let Some(name) = name else {
                return Err(Error::new(ErrorKind::MissingFilename)
                    .with_message("filename must be provided via --name when reading from stdin"));
            };
            let explicit = explicit_stdin || !candidates.is_empty();
            return Ok(SourcePlan {
                sources: vec![PlannedSource::Stdin {
                    name: name.to_string(),
                    explicit,
                }],
            });
        }

        if candidates.len() > 1 && name.is_some() {
            return Err(Error::new(ErrorKind::ConflictingName)
                .with_message("cannot use --name with multiple files")
                .with_hint("Drop --name, or upload the files one at a time."));
        }

        let sources = candidates
            .iter()
            .enumerate()
            .map(|(index, candidate)| {
                if is_stdin_marker(candidate) {
                    return PlannedSource::SkippedStdinMarker { index };
                }
                let name = match name {
                    Some(name) => name.to_string(),
                    None => base_name(candidate),
                };
                PlannedSource::File {
                    path: PathBuf::from(candidate),
                    name,
                }
            })
            .collect();
        Ok(SourcePlan { sources })
    }
}

impl SourcePlan {
    pub fn sources(&self) -> &[PlannedSource] {
        &self.sources
    }

    pub fn is_batch(&self) -> bool {
        self.sources.len() > 1
    }
}

impl PlannedSource {
    /// Single-source selection used by text commands: `--file PATH`, `--file -`, or none.
    pub fn for_text(file: Option<&str>) -> Self {
        match non_empty(file) {
            Some(path) if !is_stdin_marker(path) => PlannedSource::File {
                path: PathBuf::from(path),
                name: base_name(path),
            },
            Some(_) => PlannedSource::Stdin {
                name: "stdin".to_string(),
                explicit: true,
            },
            None => PlannedSource::Stdin {
                name: "stdin".to_string(),
                explicit: false,
            },
        }
    }

    pub fn name(&self) -> Option<&str> {
        match self {
            PlannedSource::Stdin { name, .. } | PlannedSource::File { name, .. } => Some(name),
            PlannedSource::SkippedStdinMarker { .. } => None,
        }
    }

    /// Read this source fully. Returns `Ok(None)` for a skipped stdin marker.
    ///
    /// Zero-length content is rejected with `EmptyContent`; open and read
    /// failures on files surface as `FileOpen`.
    pub fn read<R: Read>(&self, stdin: &mut StdinInput<R>) -> Result<Option<ResolvedItem>, Error> {
        match self {
            PlannedSource::SkippedStdinMarker { .. } => Ok(None),
            PlannedSource::Stdin { name, explicit } => {
                let bytes = stdin.read_all(*explicit)?;
                if bytes.is_empty() {
                    return Err(Error::new(ErrorKind::EmptyContent)
                        .with_message("content is empty")
                        .with_name(name.clone()));
                }
                Ok(Some(ResolvedItem {
                    name: name.clone(),
                    bytes,
                    origin: Origin::Stdin,
                }))
            }
            PlannedSource::File { path, name } => {
                let bytes = read_file(path)?;
                if bytes.is_empty() {
                    return Err(Error::new(ErrorKind::EmptyContent)
                        .with_message("file is empty")
                        .with_name(name.clone())
                        .with_path(path.clone()));
                }
                Ok(Some(ResolvedItem {
                    name: name.clone(),
                    bytes,
                    origin: Origin::File,
                }))
            }
        }
    }
}

// The handle is dropped on return, on every path.
fn read_file(path: &Path) -> Result<Vec<u8>, Error> {
    let mut file = File::open(path).map_err(|err| {
        Error::new(ErrorKind::FileOpen)
            .with_message(format!("failed to open file {:?}", path.display().to_string()))
            .with_path(path)
            .with_source(err)
    })?;
    let mut bytes = Vec::new();
    file.read_to_end(&mut bytes).map_err(|err| {
        Error::new(ErrorKind::FileOpen)
            .with_message(format!("failed to read file {:?}", path.display().to_string()))
            .with_path(path)
            .with_source(err)
    })?;
    Ok(bytes)
}
