use super::TraceEngine;
use crate::analysis::deadcode::DeadCodeDetector;
use std::path::Path;
use tracescope_api::{ApiResult, DeadCodeOptions, DeadCodeReport, ProjectScanner};

impl ProjectScanner for TraceEngine {
    fn dead_code(&self, root: &Path, options: &DeadCodeOptions) -> ApiResult<DeadCodeReport> {
        self.with_context(root, |ctx| DeadCodeDetector::new(ctx).detect(options))
    }
}
