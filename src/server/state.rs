use std::sync::Arc;

use crate::pipeline::{DubbingPipeline, OutputStore};

#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<DubbingPipeline>,
    pub max_upload_bytes: usize,
}

impl AppState {
    pub fn new(pipeline: DubbingPipeline, max_upload_bytes: usize) -> Self {
        Self {
            pipeline: Arc::new(pipeline),
            max_upload_bytes,
        }
    }

    pub fn outputs(&self) -> &OutputStore {
        self.pipeline.outputs()
    }
}
