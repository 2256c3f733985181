use std::sync::Arc;

use tokio::sync::Mutex;

use crate::core::config::Settings;
use crate::db::DataDir;

#[derive(Clone)]
pub(crate) struct AppState {
    inner: Arc<InnerState>,
}

struct InnerState {
    settings: Settings,
    data_dir: DataDir,
    results_lock: Mutex<()>,
    exams_lock: Mutex<()>,
}

impl AppState {
    pub(crate) fn new(settings: Settings, data_dir: DataDir) -> Self {
        Self {
            inner: Arc::new(InnerState {
                settings,
                data_dir,
                results_lock: Mutex::new(()),
                exams_lock: Mutex::new(()),
            }),
        }
    }

    pub(crate) fn settings(&self) -> &Settings {
        &self.inner.settings
    }

    pub(crate) fn data_dir(&self) -> &DataDir {
        &self.inner.data_dir
    }

    /// Serializes read-modify-write cycles on the shared results file.
    pub(crate) fn results_lock(&self) -> &Mutex<()> {
        &self.inner.results_lock
    }

    /// Serializes edits to stored exam files so concurrent teacher edits are not lost.
    pub(crate) fn exams_lock(&self) -> &Mutex<()> {
        &self.inner.exams_lock
    }
}
