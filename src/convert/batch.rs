//! Parallel conversion of several inputs.

use super::{convert_file, ConvertOptions};
use crate::error::{Error, Result};
use crate::render::{ConvertStats, OutputFormat};
use log::info;
use rayon::prelude::*;
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

/// Outcome of converting one input of a batch.
#[derive(Debug)]
pub struct BatchItem {
    /// Input path
    pub input: PathBuf,
    /// Output path
    pub output: PathBuf,
    /// Conversion statistics, or the error that stopped the conversion
    pub result: Result<ConvertStats>,
}

impl BatchItem {
    /// Check if the input was converted.
    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }
}

/// Output file for `input` inside `out_dir`: the input's stem with the
/// extension of the output format.
pub fn output_path(input: &Path, out_dir: &Path, format: OutputFormat) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "stdin".to_string());
    let extension = match format {
        OutputFormat::Hocr => "html",
        OutputFormat::Json => "json",
    };
    out_dir.join(format!("{}.{}", stem, extension))
}

/// Convert every input into `out_dir`, running up to `jobs` conversions at
/// once (`0` lets rayon pick).
///
/// `on_done` is called from worker threads as each input finishes. Items
/// are returned in input order; a failed input does not stop the others.
pub fn convert_files<F>(
    inputs: &[PathBuf],
    out_dir: &Path,
    options: &ConvertOptions,
    jobs: usize,
    on_done: F,
) -> Result<Vec<BatchItem>>
where
    F: Fn(&BatchItem) + Sync,
{
    std::fs::create_dir_all(out_dir)?;
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(jobs)
        .build()
        .map_err(|e| Error::InvalidOption(format!("thread pool: {}", e)))?;

    let items = pool.install(|| {
        inputs
            .par_iter()
            .map(|input| {
                let output = output_path(input, out_dir, options.output_format);
                let result = convert_one(input, &output, options);
                let item = BatchItem {
                    input: input.clone(),
                    output,
                    result,
                };
                on_done(&item);
                item
            })
            .collect()
    });
    Ok(items)
}

fn convert_one(input: &Path, output: &Path, options: &ConvertOptions) -> Result<ConvertStats> {
    info!("{} -> {}", input.display(), output.display());
    let mut writer = BufWriter::new(File::create(output)?);
    convert_file(input, &mut writer, options)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::convert::InputKind;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_output_path() {
        let out = Path::new("/tmp/out");
        assert_eq!(
            output_path(Path::new("scans/book.djvu"), out, OutputFormat::Hocr),
            PathBuf::from("/tmp/out/book.html")
        );
        assert_eq!(
            output_path(Path::new("book.dump"), out, OutputFormat::Json),
            PathBuf::from("/tmp/out/book.json")
        );
    }

    #[test]
    fn test_convert_files() {
        let dir = tempfile::tempdir().unwrap();
        let good = dir.path().join("good.txt");
        std::fs::write(&good, "width=10 height=10\n(page 0 0 10 10 (word 0 0 10 10 \"a\"))\n")
            .unwrap();
        let bad = dir.path().join("bad.txt");
        std::fs::write(&bad, "width=10 height=10\n(page 0 0 10 10 (glyph 0 0 1 1 \"a\"))\n")
            .unwrap();

        let out_dir = dir.path().join("out");
        let options = ConvertOptions::new().with_input(InputKind::Dump);
        let done = AtomicUsize::new(0);
        let items = convert_files(&[good, bad], &out_dir, &options, 2, |_| {
            done.fetch_add(1, Ordering::SeqCst);
        })
        .unwrap();

        assert_eq!(done.load(Ordering::SeqCst), 2);
        assert!(items[0].is_ok());
        assert!(!items[1].is_ok());

        let html = std::fs::read_to_string(out_dir.join("good.html")).unwrap();
        assert!(html.contains("ocrx_word"));
    }
}
