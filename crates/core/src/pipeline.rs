use crate::chunking::chunk_text;
use crate::error::IngestError;
use crate::extractor::TextExtractor;
use crate::jobs::{IngestionJob, JobStatus, JobStore};
use crate::models::{ChunkingOptions, TextFragment};
use crate::traits::FragmentIndex;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

pub const NO_TEXT_ERROR: &str = "No extractable text found.";
pub const EMPTY_CHUNKS_ERROR: &str = "Document too short or unreadable.";

struct IngestionTask {
    job_id: String,
    source_path: PathBuf,
    filename: String,
}

/// Background ingestion: a work queue drained by a fixed set of worker
/// tasks. Each task drives one job from `Queued` to a terminal state; the
/// job record is only ever touched through the shared [`JobStore`].
pub struct IngestionPipeline {
    jobs: JobStore,
    queue: flume::Sender<IngestionTask>,
}

impl IngestionPipeline {
    pub fn spawn<I, E>(
        jobs: JobStore,
        index: Arc<I>,
        extractor: Arc<E>,
        options: ChunkingOptions,
        workers: usize,
    ) -> Self
    where
        I: FragmentIndex + 'static,
        E: TextExtractor + 'static,
    {
        let (sender, receiver) = flume::unbounded::<IngestionTask>();

        for worker in 0..workers.max(1) {
            let receiver = receiver.clone();
            let jobs = jobs.clone();
            let index = Arc::clone(&index);
            let extractor = Arc::clone(&extractor);

            tokio::spawn(async move {
                while let Ok(task) = receiver.recv_async().await {
                    process_document(&jobs, index.as_ref(), &extractor, &options, task).await;
                }
                debug!(worker, "ingestion worker stopped");
            });
        }

        Self {
            jobs,
            queue: sender,
        }
    }

    /// Registers the job and enqueues it, returning the `Queued` record
    /// immediately; processing happens on the worker tasks.
    pub async fn submit(&self, source_path: impl Into<PathBuf>, filename: &str) -> IngestionJob {
        let job = self.jobs.create(filename).await;
        let task = IngestionTask {
            job_id: job.id.clone(),
            source_path: source_path.into(),
            filename: filename.to_string(),
        };

        if self.queue.send(task).is_err() {
            // Workers only disappear when the runtime is tearing down; the
            // caller still gets its acknowledgment, the record goes terminal.
            self.jobs.fail(&job.id, "ingestion workers are not running").await;
            return self.jobs.get(&job.id).await.unwrap_or(job);
        }

        job
    }
}

async fn process_document<I, E>(
    jobs: &JobStore,
    index: &I,
    extractor: &Arc<E>,
    options: &ChunkingOptions,
    task: IngestionTask,
) where
    I: FragmentIndex,
    E: TextExtractor + 'static,
{
    let IngestionTask {
        job_id,
        source_path,
        filename,
    } = task;

    info!(job = %job_id, file = %filename, "ingestion started");

    match run_stages(jobs, index, extractor, options, &job_id, &source_path, &filename).await {
        Ok(count) => {
            jobs.complete(&job_id, count).await;
            info!(job = %job_id, fragments = count, "ingestion completed");
        }
        Err(error) => {
            let message = error.to_string();
            warn!(job = %job_id, error = %message, "ingestion failed");
            jobs.fail(&job_id, message).await;
            discard_upload(&source_path).await;
        }
    }
}

async fn run_stages<I, E>(
    jobs: &JobStore,
    index: &I,
    extractor: &Arc<E>,
    options: &ChunkingOptions,
    job_id: &str,
    source_path: &Path,
    filename: &str,
) -> Result<usize, IngestError>
where
    I: FragmentIndex,
    E: TextExtractor + 'static,
{
    jobs.advance(job_id, JobStatus::Extracting).await;
    let raw_text = extract_blocking(Arc::clone(extractor), source_path.to_path_buf()).await?;
    if raw_text.trim().is_empty() {
        return Err(IngestError::EmptyDocument(NO_TEXT_ERROR.to_string()));
    }

    jobs.advance(job_id, JobStatus::Chunking).await;
    let chunks = chunk_text(&raw_text, options)?;
    if chunks.is_empty() {
        return Err(IngestError::EmptyDocument(EMPTY_CHUNKS_ERROR.to_string()));
    }

    jobs.advance(job_id, JobStatus::Indexing).await;
    let fragments = build_fragments(filename, chunks);
    index.add_fragments(&fragments).await?;

    Ok(fragments.len())
}

async fn extract_blocking<E>(extractor: Arc<E>, path: PathBuf) -> Result<String, IngestError>
where
    E: TextExtractor + 'static,
{
    tokio::task::spawn_blocking(move || extractor.extract_text(&path))
        .await
        .map_err(|join_error| IngestError::Extraction(join_error.to_string()))?
}

fn build_fragments(filename: &str, chunks: Vec<String>) -> Vec<TextFragment> {
    chunks
        .into_iter()
        .enumerate()
        .map(|(position, text)| TextFragment {
            fragment_id: fragment_id(filename),
            source: filename.to_string(),
            position,
            text,
        })
        .collect()
}

fn fragment_id(filename: &str) -> String {
    let suffix = Uuid::new_v4().simple().to_string();
    format!("{filename}_{}", &suffix[..8])
}

async fn discard_upload(path: &Path) {
    if tokio::fs::metadata(path).await.is_ok() {
        if let Err(error) = tokio::fs::remove_file(path).await {
            warn!(path = %path.display(), %error, "failed to remove uploaded file");
        }
    }
}
