//! Scripted fakes of the generator and renderer seams.

use std::collections::VecDeque;
use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use mgen_codegen::{CodegenError, CodegenResult, ScriptSource};
use mgen_models::{GeneratedSource, GenerationRequest, RenderOutcome};
use mgen_render::{RenderResult, Renderer};

pub fn source(text: &str) -> GeneratedSource {
    GeneratedSource::new(text, "DrawCircle")
}

/// Returns queued sources in order and records every request.
pub struct FakeSource {
    queue: Mutex<VecDeque<CodegenResult<GeneratedSource>>>,
    requests: Mutex<Vec<GenerationRequest>>,
}

impl FakeSource {
    pub fn new(queue: Vec<CodegenResult<GeneratedSource>>) -> Arc<Self> {
        Arc::new(Self {
            queue: Mutex::new(queue.into()),
            requests: Mutex::new(Vec::new()),
        })
    }

    pub fn requests(&self) -> Vec<GenerationRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl ScriptSource for FakeSource {
    async fn generate(&self, request: &GenerationRequest) -> CodegenResult<GeneratedSource> {
        self.requests.lock().unwrap().push(request.clone());
        self.queue
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(CodegenError::generation_exhausted(0, "fake source drained")))
    }
}

/// Returns queued outcomes in order and records every rendered source.
///
/// A `Success` outcome also writes a small file at the artifact path so
/// callers can treat it as real.
pub struct FakeRenderer {
    queue: Mutex<VecDeque<RenderResult<RenderOutcome>>>,
    rendered: Mutex<Vec<String>>,
}

impl FakeRenderer {
    pub fn new(queue: Vec<RenderResult<RenderOutcome>>) -> Arc<Self> {
        Arc::new(Self {
            queue: Mutex::new(queue.into()),
            rendered: Mutex::new(Vec::new()),
        })
    }

    pub fn calls(&self) -> usize {
        self.rendered.lock().unwrap().len()
    }

    pub fn rendered(&self) -> Vec<String> {
        self.rendered.lock().unwrap().clone()
    }
}

#[async_trait]
impl Renderer for FakeRenderer {
    async fn render(&self, source: &str, _output_dir: &Path) -> RenderResult<RenderOutcome> {
        self.rendered.lock().unwrap().push(source.to_string());
        let next = self.queue.lock().unwrap().pop_front();
        let outcome = next.unwrap_or_else(|| {
            Ok(RenderOutcome::fatal(
                mgen_models::FatalKind::RendererFailed,
                "fake renderer drained",
            ))
        })?;

        if let RenderOutcome::Success { artifact_path } = &outcome {
            if let Some(parent) = artifact_path.parent() {
                tokio::fs::create_dir_all(parent).await?;
            }
            tokio::fs::write(artifact_path, b"fake video").await?;
        }
        Ok(outcome)
    }
}
