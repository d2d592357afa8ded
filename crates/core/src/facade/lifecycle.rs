use super::TraceEngine;
use std::path::Path;
use tracescope_api::IndexLifecycle;

impl IndexLifecycle for TraceEngine {
    fn invalidate(&self, root: &Path) {
        if !self.cache.invalidate(root) {
            tracing::debug!("no cached index for {}", root.display());
        }
    }

    fn clear(&self) {
        tracing::info!("clearing {} cached project indexes", self.cache.len());
        self.cache.clear();
    }
}
