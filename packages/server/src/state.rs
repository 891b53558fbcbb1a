use std::sync::Arc;

use crate::config::AppConfig;
use crate::repository::MahasiswaRepository;
use crate::uploads::UploadStore;

#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub repo: Arc<dyn MahasiswaRepository>,
    pub uploads: Arc<dyn UploadStore>,
}
