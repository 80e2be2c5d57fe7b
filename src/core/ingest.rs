//! Purpose: Drive resolved sources into the remote collaborator with per-item error isolation.
//! Exports: `ItemOutcome`, `BatchReport`, `upload_batch`, `read_text`.
//! Role: Upload orchestration for file-class commands and the single-source text reader.
//! Invariants: Items are processed strictly in plan order, one at a time.
//! Invariants: Every planned file or stdin source yields exactly one outcome; skipped markers yield none.
//! Invariants: `FileOpen` and other local read failures abort the batch; empty items and
//! submission failures are recorded and the batch continues.
use std::io::Read;

use super::error::{Error, ErrorKind};
use super::sniff::{MediaSniffer, decode_text, ensure_not_blank, ensure_text_content};
use super::source::{PlannedSource, ResolvedItem, SourcePlan, StdinInput};

#[derive(Debug)]
pub struct ItemOutcome<T> {
    /// Position of the source in the plan.
    pub index: usize,
    pub name: String,
    pub result: Result<T, Error>,
}

#[derive(Debug)]
pub struct BatchReport<T> {
    pub outcomes: Vec<ItemOutcome<T>>,
    pub skipped: usize,
}

impl<T> Default for BatchReport<T> {
    fn default() -> Self {
        Self {
            outcomes: Vec::new(),
            skipped: 0,
        }
    }
}

impl<T> BatchReport<T> {
    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.result.is_ok()).count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes.len() - self.succeeded()
    }

    pub fn first_failure(&self) -> Option<&Error> {
        self.outcomes.iter().find_map(|o| o.result.as_ref().err())
    }
}

/// Upload every planned source in order.
///
/// `submit` is called once per readable item. `on_outcome` sees each outcome as
/// soon as it is recorded, and `on_skip` is told about every skipped `-` marker.
pub fn upload_batch<R, T, S, O, K>(
    plan: &SourcePlan,
    stdin: &mut StdinInput<R>,
    mut submit: S,
    mut on_outcome: O,
    mut on_skip: K,
) -> Result<BatchReport<T>, Error>
where
    R: Read,
    S: FnMut(&ResolvedItem) -> Result<T, Error>,
    O: FnMut(&ItemOutcome<T>),
    K: FnMut(usize),
{
    let mut report = BatchReport::default();

    for (index, source) in plan.sources().iter().enumerate() {
        if let PlannedSource::SkippedStdinMarker { index } = source {
            tracing::debug!(index, "skipping stdin marker among multiple sources");
            report.skipped += 1;
            on_skip(*index);
            continue;
        }
        let name = source.name().unwrap_or_default().to_string();

        let result = match source.read(stdin) {
            Ok(Some(item)) => {
                tracing::debug!(name = %item.name, bytes = item.bytes.len(), "submitting item");
                submit(&item).map_err(|err| attach_name(err, &item.name))
            }
            Ok(None) => continue,
            Err(err) if err.kind() == ErrorKind::EmptyContent => Err(err),
            Err(err) => return Err(attach_name(err, &name)),
        };

        match &result {
            Ok(_) => tracing::debug!(name = %name, "item uploaded"),
            Err(err) => tracing::debug!(name = %name, error = %err, "item failed"),
        }
        let outcome = ItemOutcome {
            index,
            name,
            result,
        };
        on_outcome(&outcome);
        report.outcomes.push(outcome);
    }

    Ok(report)
}

fn attach_name(err: Error, name: &str) -> Error {
    if err.name().is_some() {
        return err;
    }
    err.with_name(name)
}

/// Read and validate paste content for text-class commands.
///
/// Errors propagate immediately. UTF-8 input is returned verbatim; other
/// accepted charsets are transcoded to UTF-8.
pub fn read_text<R: Read>(
    file: Option<&str>,
    stdin: &mut StdinInput<R>,
    sniffer: &dyn MediaSniffer,
) -> Result<String, Error> {
    let source = PlannedSource::for_text(file);
    let item = source
        .read(stdin)?
        .ok_or_else(|| Error::new(ErrorKind::Internal).with_message("text source was skipped"))?;

    let verdict = ensure_text_content(&item.bytes, sniffer)?;
    let content = decode_text(item.bytes, &verdict)?;
    ensure_not_blank(content.as_bytes())?;
    Ok(content)
}

#[cfg(test)]
mod tests {
    use super::{read_text, upload_batch};
    use crate::core::error::{Error, ErrorKind};
    use crate::core::sniff::DefaultSniffer;
    use crate::core::source::{SourceSpec, StdinInput};
    use std::io::Cursor;
    use std::path::Path;

    fn write(dir: &Path, name: &str, bytes: &[u8]) -> String {
        let path = dir.join(name);
        std::fs::write(&path, bytes).expect("write");
        path.to_string_lossy().into_owned()
    }

    fn empty_stdin() -> StdinInput<Cursor<Vec<u8>>> {
        StdinInput::piped(Cursor::new(Vec::new()))
    }

    #[test]
    fn remote_failure_does_not_stop_batch() {
        let temp = tempfile::tempdir().expect("tempdir");
        let paths = vec![
            write(temp.path(), "ok.txt", b"one"),
            write(temp.path(), "rejected.txt", b"two"),
            write(temp.path(), "ok2.txt", b"three"),
        ];
        let plan = SourceSpec::new(paths, None, None).plan().expect("plan");

        let mut seen = Vec::new();
        let report = upload_batch(
            &plan,
            &mut empty_stdin(),
            |item| {
                if item.name == "rejected.txt" {
                    Err(Error::new(ErrorKind::Remote).with_message("quota exceeded"))
                } else {
                    Ok(item.bytes.len())
                }
            },
            |outcome| seen.push(outcome.name.clone()),
            |_| {},
        )
        .expect("report");

        assert_eq!(report.outcomes.len(), 3);
        assert_eq!(seen, ["ok.txt", "rejected.txt", "ok2.txt"]);
        assert_eq!(report.outcomes[0].result.as_ref().ok(), Some(&3));
        let err = report.outcomes[1].result.as_ref().expect_err("err");
        assert_eq!(err.kind(), ErrorKind::Remote);
        assert_eq!(err.name(), Some("rejected.txt"));
        assert_eq!(report.outcomes[2].result.as_ref().ok(), Some(&5));
        assert_eq!(report.failed(), 1);
    }

    #[test]
    fn missing_file_aborts_batch() {
        let temp = tempfile::tempdir().expect("tempdir");
        let paths = vec![
            write(temp.path(), "a.txt", b"a"),
            temp.path().join("missing.txt").to_string_lossy().into_owned(),
            write(temp.path(), "c.txt", b"c"),
        ];
        let plan = SourceSpec::new(paths, None, None).plan().expect("plan");

        let mut submitted = Vec::new();
        let err = upload_batch(
            &plan,
            &mut empty_stdin(),
            |item| {
                submitted.push(item.name.clone());
                Ok(())
            },
            |_| {},
            |_| {},
        )
        .expect_err("err");

        assert_eq!(err.kind(), ErrorKind::FileOpen);
        assert_eq!(err.name(), Some("missing.txt"));
        assert_eq!(submitted, ["a.txt"]);
    }

    #[test]
    fn empty_item_is_recorded_and_batch_continues() {
        let temp = tempfile::tempdir().expect("tempdir");
        let paths = vec![
            write(temp.path(), "empty.bin", b""),
            write(temp.path(), "full.bin", &[0x89, 0x50, 0x4E, 0x47]),
        ];
        let plan = SourceSpec::new(paths, None, None).plan().expect("plan");

        let report = upload_batch(&plan, &mut empty_stdin(), |_| Ok(()), |_| {}, |_| {})
            .expect("report");
        assert_eq!(report.outcomes.len(), 2);
        let err = report.outcomes[0].result.as_ref().expect_err("err");
        assert_eq!(err.kind(), ErrorKind::EmptyContent);
        assert!(report.outcomes[1].result.is_ok());
    }

    #[test]
    fn stdin_marker_is_skipped_and_reported() {
        let temp = tempfile::tempdir().expect("tempdir");
        let paths = vec![
            write(temp.path(), "a.txt", b"a"),
            "-".to_string(),
            write(temp.path(), "b.txt", b"b"),
        ];
        let plan = SourceSpec::new(paths, None, None).plan().expect("plan");

        let mut skipped = Vec::new();
        let report = upload_batch(
            &plan,
            &mut empty_stdin(),
            |_| Ok(()),
            |_| {},
            |index| skipped.push(index),
        )
        .expect("report");
        assert_eq!(report.outcomes.len(), 2);
        assert_eq!(report.skipped, 1);
        assert_eq!(skipped, [1]);
        assert_eq!(report.outcomes[1].index, 2);
    }

    #[test]
    fn stdin_upload_uses_override_name() {
        let plan = SourceSpec::new(Vec::new(), Some("-".to_string()), Some("blob.bin".to_string()))
            .plan()
            .expect("plan");
        let mut stdin = StdinInput::piped(Cursor::new(vec![0u8, 1, 2]));
        let report = upload_batch(
            &plan,
            &mut stdin,
            |item| Ok(item.name.clone()),
            |_| {},
            |_| {},
        )
        .expect("report");
        assert_eq!(
            report.outcomes[0].result.as_ref().ok().map(String::as_str),
            Some("blob.bin")
        );
    }

    #[test]
    fn read_text_returns_file_content_verbatim() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = write(temp.path(), "test.txt", b"hello world");
        let content = read_text(Some(&path), &mut empty_stdin(), &DefaultSniffer).expect("text");
        assert_eq!(content, "hello world");
    }

    #[test]
    fn read_text_rejects_whitespace_only() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = write(temp.path(), "blank.txt", b"   \n\t ");
        let err = read_text(Some(&path), &mut empty_stdin(), &DefaultSniffer).expect_err("err");
        assert_eq!(err.kind(), ErrorKind::EmptyContent);

        let mut stdin = StdinInput::piped(Cursor::new(b"   ".to_vec()));
        let err = read_text(Some("-"), &mut stdin, &DefaultSniffer).expect_err("err");
        assert_eq!(err.kind(), ErrorKind::EmptyContent);
        assert_eq!(err.message(), Some("content is empty"));
    }

    #[test]
    fn read_text_rejects_binary() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = write(temp.path(), "binary.bin", &[0x00, 0xFF, 0x10, 0x00, 0x01]);
        let err = read_text(Some(&path), &mut empty_stdin(), &DefaultSniffer).expect_err("err");
        assert_eq!(err.kind(), ErrorKind::NonTextContent);
    }

    #[test]
    fn read_text_from_piped_stdin() {
        let mut stdin = StdinInput::piped(Cursor::new(b"hello from stdin".to_vec()));
        let content = read_text(None, &mut stdin, &DefaultSniffer).expect("text");
        assert_eq!(content, "hello from stdin");
    }

    #[test]
    fn read_text_missing_file() {
        let err = read_text(
            Some("non-existent-file.txt"),
            &mut empty_stdin(),
            &DefaultSniffer,
        )
        .expect_err("err");
        assert_eq!(err.kind(), ErrorKind::FileOpen);
    }

    #[test]
    fn read_text_transcodes_latin1_and_utf16() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = write(temp.path(), "latin1.txt", b"na\xefve r\xe9sum\xe9");
        let content = read_text(Some(&path), &mut empty_stdin(), &DefaultSniffer).expect("text");
        assert_eq!(content, "na\u{ef}ve r\u{e9}sum\u{e9}");

        let mut stdin = StdinInput::piped(Cursor::new(vec![0xFF, 0xFE, 0x6F, 0x00, 0x6B, 0x00]));
        let content = read_text(None, &mut stdin, &DefaultSniffer).expect("text");
        assert_eq!(content, "ok");
    }

    #[test]
    fn read_text_rejects_blank_utf16() {
        let mut stdin = StdinInput::piped(Cursor::new(vec![0xFF, 0xFE, 0x20, 0x00, 0x0A, 0x00]));
        let err = read_text(None, &mut stdin, &DefaultSniffer).expect_err("err");
        assert_eq!(err.kind(), ErrorKind::EmptyContent);
    }

    #[test]
    fn read_text_accepts_prose_that_opens_like_a_signature() {
        let mut stdin = StdinInput::piped(Cursor::new(b"BMW service notes\n".to_vec()));
        let content = read_text(None, &mut stdin, &DefaultSniffer).expect("text");
        assert_eq!(content, "BMW service notes\n");
    }
}
