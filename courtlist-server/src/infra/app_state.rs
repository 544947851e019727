use courtlist_core::PublicationService;
use std::{fmt, sync::Arc};

#[derive(Clone)]
pub struct AppState {
    pub publications: Arc<PublicationService>,
}

impl AppState {
    pub fn new(publications: Arc<PublicationService>) -> Self {
        Self { publications }
    }
}

impl fmt::Debug for AppState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppState").finish_non_exhaustive()
    }
}
