//! Page dumps produced by a `djvused` subprocess.

use crate::error::{Error, Result};
use crate::parser::{PageDump, PageSource, PageStream, ParseOptions};
use log::debug;
use std::io::{BufReader, Write};
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdout, Command, Stdio};
use tempfile::NamedTempFile;

/// Default name of the `djvused` executable.
pub const DEFAULT_PROGRAM: &str = "djvused";

/// Handle to the `djvused` executable.
#[derive(Debug, Clone)]
pub struct Djvused {
    program: PathBuf,
}

impl Djvused {
    /// Use the given executable.
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// Number of pages in a document (`djvused -e n`).
    pub fn page_count(&self, document: &Path) -> Result<u32> {
        let output = Command::new(&self.program)
            .arg("-e")
            .arg("n")
            .arg(document)
            .output()
            .map_err(|e| self.spawn_error(e))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(Error::Subprocess(format!(
                "{} failed ({}): {}",
                self.program.display(),
                output.status,
                stderr.trim()
            )));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let first = stdout.lines().next().unwrap_or("").trim();
        first.parse().map_err(|_| {
            Error::Subprocess(format!(
                "{} printed {:?} instead of a page count",
                self.program.display(),
                first
            ))
        })
    }

    /// Start dumping the given pages, in order.
    pub fn spawn(
        &self,
        document: &Path,
        pages: &[u32],
        options: &ParseOptions,
    ) -> Result<DjvusedPages> {
        let mut script = tempfile::Builder::new()
            .prefix("djvu2hocr")
            .suffix(".djvused")
            .tempfile()?;
        script.write_all(dump_script(pages).as_bytes())?;
        script.flush()?;
        debug!(
            "running {} -f {} {}",
            self.program.display(),
            script.path().display(),
            document.display()
        );

        let mut child = Command::new(&self.program)
            .arg("-f")
            .arg(script.path())
            .arg(document)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .spawn()
            .map_err(|e| self.spawn_error(e))?;

        let stdout = match child.stdout.take() {
            Some(stdout) => stdout,
            None => {
                let _ = child.kill();
                let _ = child.wait();
                return Err(Error::Subprocess("djvused stdout was not captured".into()));
            }
        };

        Ok(DjvusedPages {
            stream: Some(PageStream::with_options(BufReader::new(stdout), options)),
            child,
            program: self.program.clone(),
            _script: script,
            finished: false,
        })
    }

    fn spawn_error(&self, e: std::io::Error) -> Error {
        Error::Subprocess(format!("cannot run {}: {}", self.program.display(), e))
    }
}

impl Default for Djvused {
    fn default() -> Self {
        Self::new(DEFAULT_PROGRAM)
    }
}

/// `djvused` script printing the size record and text layer of each page.
pub fn dump_script(pages: &[u32]) -> String {
    pages
        .iter()
        .map(|n| format!("select {}; size; print-txt\n", n))
        .collect()
}

/// Pages streamed from a running `djvused`.
///
/// Call [`finish`](Self::finish) once the pages are consumed to reap the
/// process and check its exit status. Dropping an unfinished handle kills
/// the process.
pub struct DjvusedPages {
    stream: Option<PageStream<BufReader<ChildStdout>>>,
    child: Child,
    program: PathBuf,
    _script: NamedTempFile,
    finished: bool,
}

impl DjvusedPages {
    /// Close the output pipe and wait for the process to exit.
    pub fn finish(&mut self) -> Result<()> {
        self.stream = None;
        self.finished = true;
        let status = self.child.wait()?;
        if !status.success() {
            return Err(Error::Subprocess(format!(
                "{} exited with {}",
                self.program.display(),
                status
            )));
        }
        Ok(())
    }
}

impl PageSource for DjvusedPages {
    fn next_page(&mut self) -> Result<Option<PageDump>> {
        match self.stream {
            Some(ref mut stream) => stream.next_page(),
            None => Ok(None),
        }
    }
}

impl Drop for DjvusedPages {
    fn drop(&mut self) {
        if !self.finished {
            let _ = self.child.kill();
            let _ = self.child.wait();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dump_script() {
        assert_eq!(
            dump_script(&[3, 1]),
            "select 3; size; print-txt\nselect 1; size; print-txt\n"
        );
        assert_eq!(dump_script(&[]), "");
    }

    #[test]
    fn test_missing_program() {
        let djvused = Djvused::new("/nonexistent/djvused");
        let result = djvused.page_count(Path::new("book.djvu"));
        assert!(matches!(result, Err(Error::Subprocess(_))));

        let result = djvused.spawn(Path::new("book.djvu"), &[1], &ParseOptions::default());
        assert!(matches!(result, Err(Error::Subprocess(_))));
    }

    #[cfg(unix)]
    #[test]
    fn test_spawned_pages() {
        use std::os::unix::fs::PermissionsExt;

        // A stand-in that prints a fixed one-page dump.
        let dir = tempfile::tempdir().unwrap();
        let program = dir.path().join("fake-djvused");
        std::fs::write(
            &program,
            "#!/bin/sh\necho 'width=10 height=10'\necho '(page 0 0 10 10 (word 0 0 10 10 \"ok\"))'\n",
        )
        .unwrap();
        std::fs::set_permissions(&program, std::fs::Permissions::from_mode(0o755)).unwrap();

        let mut pages = Djvused::new(&program)
            .spawn(Path::new("book.djvu"), &[1], &ParseOptions::default())
            .unwrap();
        let page = pages.next_page().unwrap().unwrap();
        assert_eq!(page.size.width, 10);
        assert!(pages.next_page().unwrap().is_none());
        pages.finish().unwrap();
    }
}
