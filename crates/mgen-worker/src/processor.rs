//! Video processor: record lifecycle around the recovery loop.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use metrics::{counter, histogram};
use tokio::sync::Semaphore;
use tracing::{info, warn};

use mgen_models::{UserId, VideoId, VideoRecord, VideoStatus, VideoUpdate};
use mgen_render::locate::find_newest_artifact;
use mgen_storage::{video_key, BlobStore};
use mgen_store::VideoRecordStore;

use crate::config::WorkerConfig;
use crate::error::{WorkerError, WorkerResult};
use crate::logging::JobLogger;
use crate::recovery::RecoveryLoop;

/// Runs the pipeline for video records.
///
/// Admission is bounded by `max_concurrent_jobs` permits shared between
/// synchronous and background runs.
pub struct VideoProcessor {
    config: WorkerConfig,
    recovery: Arc<RecoveryLoop>,
    videos: Arc<dyn VideoRecordStore>,
    blobs: Option<Arc<dyn BlobStore>>,
    permits: Arc<Semaphore>,
}

impl VideoProcessor {
    pub fn new(
        config: WorkerConfig,
        recovery: Arc<RecoveryLoop>,
        videos: Arc<dyn VideoRecordStore>,
        blobs: Option<Arc<dyn BlobStore>>,
    ) -> Self {
        let permits = Arc::new(Semaphore::new(config.max_concurrent_jobs.max(1)));
        Self {
            config,
            recovery,
            videos,
            blobs,
            permits,
        }
    }

    pub fn config(&self) -> &WorkerConfig {
        &self.config
    }

    pub fn blob_store(&self) -> Option<&Arc<dyn BlobStore>> {
        self.blobs.as_ref()
    }

    /// Directory owned by one video's pipeline run.
    pub fn output_dir(&self, id: &VideoId) -> PathBuf {
        self.config.videos_dir.join(id.as_str())
    }

    /// Create a record and run the pipeline to completion.
    ///
    /// The record is left `completed` or `failed`; on failure the error is
    /// also returned.
    pub async fn generate_now(&self, owner: &UserId, prompt: &str) -> WorkerResult<VideoRecord> {
        let record = self
            .videos
            .create(owner, prompt, VideoStatus::Processing)
            .await?;
        self.process(record).await
    }

    /// Create a `pending` record and run the pipeline in the background.
    pub async fn submit(
        self: &Arc<Self>,
        owner: &UserId,
        prompt: &str,
    ) -> WorkerResult<VideoRecord> {
        let record = self
            .videos
            .create(owner, prompt, VideoStatus::Pending)
            .await?;

        let processor = Arc::clone(self);
        let queued = record.clone();
        tokio::spawn(async move {
            let id = queued.id.clone();
            if let Err(e) = processor.process(queued).await {
                warn!(video_id = %id, "Background generation failed: {}", e);
            }
        });

        Ok(record)
    }

    async fn process(&self, record: VideoRecord) -> WorkerResult<VideoRecord> {
        let _permit = self
            .permits
            .acquire()
            .await
            .map_err(|_| WorkerError::config_error("worker semaphore closed"))?;

        let logger = JobLogger::new(&record.id, "generate");
        let started = Instant::now();

        if record.status != VideoStatus::Processing {
            self.videos
                .update(&record.id, VideoUpdate::status(VideoStatus::Processing))
                .await?;
        }

        let dir = self.output_dir(&record.id);
        let run = self
            .recovery
            .run(&record.prompt, &dir, self.config.max_retries, &logger)
            .await;

        let result = match run.outcome {
            Ok(artifact) => {
                let mut update = VideoUpdate::status(VideoStatus::Completed)
                    .with_video_path(artifact.to_string_lossy())
                    .with_attempts(run.attempts);
                if let Some(source) = &run.last_source {
                    update = update.with_code(&source.text);
                }
                let completed = self.videos.update(&record.id, update).await?;

                match self.upload_artifact(&completed, &artifact).await {
                    Some(_) => self
                        .videos
                        .find_by_id(&record.id)
                        .await?
                        .ok_or_else(|| WorkerError::config_error("record vanished after upload")),
                    None => Ok(completed),
                }
            }
            Err(e) => {
                let mut update = VideoUpdate::status(VideoStatus::Failed)
                    .with_error(e.to_string())
                    .with_attempts(run.attempts);
                if let Some(source) = &run.last_source {
                    update = update.with_code(&source.text);
                }
                self.videos.update(&record.id, update).await?;
                logger.log_error(&e.to_string());
                Err(e)
            }
        };

        if self.config.cleanup_scratch {
            self.cleanup_scratch(&dir, &logger).await;
        }

        let status = if result.is_ok() { "completed" } else { "failed" };
        counter!("mgen_videos_total", "status" => status).increment(1);
        histogram!("mgen_pipeline_duration_seconds").record(started.elapsed().as_secs_f64());

        result
    }

    /// Upload a rendered artifact and record its URL.
    ///
    /// Failures are logged and return `None`; the local artifact stays usable.
    pub async fn upload_artifact(&self, record: &VideoRecord, artifact: &Path) -> Option<String> {
        let blobs = self.blobs.as_ref()?;
        let key = video_key(&record.id);

        match blobs.upload(artifact, &key).await {
            Ok(url) => {
                if let Err(e) = self
                    .videos
                    .update(&record.id, VideoUpdate::default().with_blob_url(&url))
                    .await
                {
                    warn!(video_id = %record.id, "Failed to record blob URL: {}", e);
                }
                info!(video_id = %record.id, url = %url, "Uploaded artifact");
                Some(url)
            }
            Err(e) => {
                warn!(video_id = %record.id, "Artifact upload failed: {}", e);
                None
            }
        }
    }

    /// Find a record's artifact on disk: the recorded path, then the newest
    /// video anywhere under the record's output directory.
    pub async fn locate_artifact(&self, record: &VideoRecord) -> Option<PathBuf> {
        if let Some(path) = record.video_path.as_deref().map(PathBuf::from) {
            if tokio::fs::try_exists(&path).await.unwrap_or(false) {
                return Some(path);
            }
        }

        let dir = self.output_dir(&record.id);
        match find_newest_artifact(&[dir], "mp4", Path::new(""), None).await {
            Ok(found) => found,
            Err(e) => {
                warn!(video_id = %record.id, "Artifact search failed: {}", e);
                None
            }
        }
    }

    async fn cleanup_scratch(&self, dir: &Path, logger: &JobLogger) {
        let media = dir.join("media");
        match tokio::fs::remove_dir_all(&media).await {
            Ok(()) => logger.log_progress("removed render scratch tree"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => logger.log_warning(&format!("failed to remove {}: {}", media.display(), e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{source, FakeRenderer, FakeSource};
    use mgen_codegen::{CodegenError, StaticIssueDetector};
    use mgen_models::{RenderOutcome, ReasonCategory, TargetProfile};
    use mgen_storage::LocalBlobStore;
    use mgen_store::InMemoryVideoStore;
    use tempfile::TempDir;

    const GOOD: &str = "class DrawCircle(Scene):\n    def construct(self):\n        self.play(Create(Circle()))\n";

    struct Harness {
        processor: Arc<VideoProcessor>,
        videos: Arc<InMemoryVideoStore>,
        renderer: Arc<FakeRenderer>,
        _videos_dir: TempDir,
        _blob_dir: TempDir,
    }

    fn harness(
        sources: Vec<mgen_codegen::CodegenResult<mgen_models::GeneratedSource>>,
        outcomes: Vec<mgen_render::RenderResult<RenderOutcome>>,
        with_blobs: bool,
        videos_dir: TempDir,
    ) -> Harness {
        let blob_dir = TempDir::new().unwrap();
        let renderer = FakeRenderer::new(outcomes);
        let recovery = RecoveryLoop::new(
            FakeSource::new(sources),
            StaticIssueDetector::from_profile(&TargetProfile::manim_community()),
            renderer.clone(),
        );
        let videos = Arc::new(InMemoryVideoStore::new());
        let blobs: Option<Arc<dyn BlobStore>> = if with_blobs {
            Some(Arc::new(LocalBlobStore::new(
                blob_dir.path(),
                "https://cdn.test",
            )))
        } else {
            None
        };
        let config = WorkerConfig {
            videos_dir: videos_dir.path().to_path_buf(),
            cleanup_scratch: true,
            ..Default::default()
        };
        let processor = Arc::new(VideoProcessor::new(
            config,
            Arc::new(recovery),
            videos.clone(),
            blobs,
        ));

        Harness {
            processor,
            videos,
            renderer,
            _videos_dir: videos_dir,
            _blob_dir: blob_dir,
        }
    }

    #[tokio::test]
    async fn test_generate_now_completes_and_uploads() {
        let videos_dir = TempDir::new().unwrap();
        // The fake renderer writes the artifact wherever the outcome points.
        let artifact = videos_dir.path().join("out").join("DrawCircle.mp4");
        let h = harness(
            vec![Ok(source(GOOD))],
            vec![Ok(RenderOutcome::success(&artifact))],
            true,
            videos_dir,
        );

        let owner = UserId::new();
        let record = h.processor.generate_now(&owner, "draw a circle").await.unwrap();

        assert_eq!(record.status, VideoStatus::Completed);
        assert_eq!(record.attempts, 1);
        assert_eq!(record.code.as_deref(), Some(GOOD));
        assert_eq!(
            record.video_path.as_deref(),
            Some(artifact.to_string_lossy().as_ref())
        );
        assert_eq!(
            record.blob_url,
            Some(format!("https://cdn.test/videos/{}.mp4", record.id))
        );
        assert_eq!(h.renderer.calls(), 1);
    }

    #[tokio::test]
    async fn test_generate_now_records_failure() {
        let videos_dir = TempDir::new().unwrap();
        let name_error = || {
            Ok(RenderOutcome::retryable(
                ReasonCategory::UndefinedName,
                "NameError: name 'Foo' is not defined",
            ))
        };
        let h = harness(
            vec![Ok(source(GOOD)), Ok(source(GOOD)), Ok(source(GOOD))],
            vec![name_error(), name_error(), name_error()],
            false,
            videos_dir,
        );

        let owner = UserId::new();
        let err = h
            .processor
            .generate_now(&owner, "draw a circle")
            .await
            .unwrap_err();
        assert!(err.is_pipeline_failure());

        let listing = h
            .videos
            .find_by_owner(&owner, mgen_models::Page::default())
            .await
            .unwrap();
        let record = &listing.items[0];
        assert_eq!(record.status, VideoStatus::Failed);
        assert_eq!(record.attempts, 3);
        assert!(record
            .error_message
            .as_deref()
            .unwrap()
            .contains("NameError: name 'Foo' is not defined"));
        assert_eq!(record.code.as_deref(), Some(GOOD));
    }

    #[tokio::test]
    async fn test_generation_exhausted_marks_failed() {
        let videos_dir = TempDir::new().unwrap();
        let h = harness(
            vec![Err(CodegenError::generation_exhausted(3, "syntax"))],
            Vec::new(),
            false,
            videos_dir,
        );

        let owner = UserId::new();
        assert!(h.processor.generate_now(&owner, "x").await.is_err());

        let listing = h
            .videos
            .find_by_owner(&owner, mgen_models::Page::default())
            .await
            .unwrap();
        assert_eq!(listing.items[0].status, VideoStatus::Failed);
        assert_eq!(listing.items[0].attempts, 0);
    }

    #[tokio::test]
    async fn test_submit_runs_in_background() {
        let videos_dir = TempDir::new().unwrap();
        let artifact = videos_dir.path().join("bg").join("DrawCircle.mp4");
        let h = harness(
            vec![Ok(source(GOOD))],
            vec![Ok(RenderOutcome::success(&artifact))],
            false,
            videos_dir,
        );

        let owner = UserId::new();
        let record = h.processor.submit(&owner, "draw a circle").await.unwrap();
        assert_eq!(record.status, VideoStatus::Pending);

        let mut status = record.status;
        for _ in 0..100 {
            status = h.videos.find_by_id(&record.id).await.unwrap().unwrap().status;
            if status.is_terminal() {
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        }
        assert_eq!(status, VideoStatus::Completed);
    }

    #[tokio::test]
    async fn test_locate_artifact_falls_back_to_search() {
        let videos_dir = TempDir::new().unwrap();
        let h = harness(Vec::new(), Vec::new(), false, videos_dir);

        let mut record = VideoRecord::new(UserId::new(), "x", VideoStatus::Completed);
        record.video_path = Some("/nonexistent/DrawCircle.mp4".to_string());
        assert_eq!(h.processor.locate_artifact(&record).await, None);

        let dir = h.processor.output_dir(&record.id);
        let nested = dir.join("media/videos/animation/720p30/DrawCircle.mp4");
        tokio::fs::create_dir_all(nested.parent().unwrap()).await.unwrap();
        tokio::fs::write(&nested, b"v").await.unwrap();

        assert_eq!(h.processor.locate_artifact(&record).await, Some(nested));
    }

    #[tokio::test]
    async fn test_cleanup_removes_media_tree() {
        let videos_dir = TempDir::new().unwrap();
        let h = harness(
            vec![Err(CodegenError::generation_exhausted(1, "x"))],
            Vec::new(),
            false,
            videos_dir,
        );

        let owner = UserId::new();
        let pending = h.videos.create(&owner, "x", VideoStatus::Processing).await.unwrap();
        let media = h.processor.output_dir(&pending.id).join("media");
        tokio::fs::create_dir_all(&media).await.unwrap();

        assert!(h.processor.process(pending).await.is_err());
        assert!(!media.exists());
    }
}
