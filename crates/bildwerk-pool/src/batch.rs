// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Batch orchestration over the worker pool.
//
// Two submission policies, chosen by the downstream consumer: parallel for
// independent per-file outputs (ZIP bundling, individual downloads), and
// strictly sequential for consumers where output order matters (PDF page
// assembly). One pipeline, no fallback duplicate path.

use bildwerk_core::error::Result;
use bildwerk_core::{ConversionOutcome, ConvertOptions, SourceFile};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};

use crate::pool::WorkerPool;

/// One failed file in a batch, reported structurally rather than logged away.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchFailure {
    pub original_name: String,
    pub error: String,
}

/// Aggregate result of a batch conversion. Failed files never block the
/// batch; successfully converted files remain available for download.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct BatchReport {
    pub succeeded: Vec<ConversionOutcome>,
    pub failed: Vec<BatchFailure>,
}

impl BatchReport {
    pub fn total(&self) -> usize {
        self.succeeded.len() + self.failed.len()
    }

    pub fn success_count(&self) -> usize {
        self.succeeded.len()
    }

    pub fn failure_count(&self) -> usize {
        self.failed.len()
    }
}

/// Convert a set of files concurrently and aggregate the per-file results.
///
/// All files are submitted up front; the pool's concurrency cap and FIFO
/// queue govern actual parallelism. Completion order is not meaningful — the
/// report preserves submission order instead.
#[instrument(skip(pool, files, options), fields(files = files.len()))]
pub async fn convert_batch(
    pool: &WorkerPool,
    files: Vec<SourceFile>,
    options: &ConvertOptions,
) -> BatchReport {
    let jobs: Vec<_> = files
        .into_iter()
        .map(|file| {
            let name = file.name.clone();
            (name, tokio::spawn(pool.submit(file, options.clone())))
        })
        .collect();

    let mut report = BatchReport::default();
    for (name, handle) in jobs {
        match handle.await {
            Ok(Ok(outcome)) => report.succeeded.push(outcome),
            Ok(Err(err)) => {
                warn!(name = %name, error = %err, "batch file failed");
                report.failed.push(BatchFailure {
                    original_name: name,
                    error: err.to_string(),
                });
            }
            Err(join_err) => {
                warn!(name = %name, error = %join_err, "batch task failed to join");
                report.failed.push(BatchFailure {
                    original_name: name,
                    error: join_err.to_string(),
                });
            }
        }
    }

    info!(
        succeeded = report.success_count(),
        failed = report.failure_count(),
        "batch conversion finished"
    );
    report
}

/// Convert files one at a time, awaiting each job before submitting the next.
///
/// Required by page-ordered consumers: completion order across concurrent
/// jobs is unspecified, so strict sequencing is the only way to guarantee
/// output order matches input order.
#[instrument(skip(pool, files, options), fields(files = files.len()))]
pub async fn convert_ordered(
    pool: &WorkerPool,
    files: Vec<SourceFile>,
    options: &ConvertOptions,
) -> Vec<Result<ConversionOutcome>> {
    let mut results = Vec::with_capacity(files.len());
    for file in files {
        results.push(pool.submit(file, options.clone()).await);
    }
    results
}

#[cfg(test)]
mod tests {
    use super::*;
    use bildwerk_core::{AppConfig, OutputFormat};
    use image::{DynamicImage, Rgba, RgbaImage};

    fn png_file(name: &str, shade: u8) -> SourceFile {
        let img = DynamicImage::ImageRgba8(RgbaImage::from_pixel(
            60,
            40,
            Rgba([shade, shade, shade, 255]),
        ));
        let mut bytes = Vec::new();
        img.write_to(&mut std::io::Cursor::new(&mut bytes), image::ImageFormat::Png)
            .expect("encode png");
        SourceFile::new(name, bytes)
    }

    #[tokio::test]
    async fn batch_isolates_the_corrupt_file() {
        let pool = WorkerPool::start(AppConfig::default());
        let files = vec![
            png_file("1.png", 10),
            png_file("2.png", 20),
            SourceFile::new("3.png", Vec::new()), // zero-byte, must fail alone
            png_file("4.png", 40),
            png_file("5.png", 50),
        ];

        let report = convert_batch(&pool, files, &ConvertOptions::new(OutputFormat::Jpeg)).await;

        assert_eq!(report.total(), 5);
        assert_eq!(report.success_count(), 4);
        assert_eq!(report.failure_count(), 1);
        assert_eq!(report.failed[0].original_name, "3.png");
        assert!(report.failed[0].error.contains("decoding failed"));

        let names: Vec<_> = report
            .succeeded
            .iter()
            .map(|o| o.original_name.as_str())
            .collect();
        assert_eq!(names, ["1.png", "2.png", "4.png", "5.png"]);

        pool.shutdown().await;
    }

    #[tokio::test]
    async fn ordered_conversion_preserves_input_order() {
        let pool = WorkerPool::start(AppConfig::default());
        let files: Vec<_> = (0..6).map(|i| png_file(&format!("page{i}.png"), i as u8)).collect();

        let results =
            convert_ordered(&pool, files, &ConvertOptions::new(OutputFormat::Jpeg)).await;

        assert_eq!(results.len(), 6);
        for (i, result) in results.iter().enumerate() {
            let outcome = result.as_ref().expect("page converts");
            assert_eq!(outcome.original_name, format!("page{i}.png"));
        }

        pool.shutdown().await;
    }

    #[tokio::test]
    async fn empty_batch_produces_empty_report() {
        let pool = WorkerPool::start(AppConfig::default());
        let report =
            convert_batch(&pool, Vec::new(), &ConvertOptions::new(OutputFormat::Png)).await;
        assert_eq!(report.total(), 0);
        pool.shutdown().await;
    }
}
