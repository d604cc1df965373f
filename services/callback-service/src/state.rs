use std::sync::Arc;

use crate::recognizer::UnpublishNotifier;

#[derive(Clone)]
pub struct AppState {
    pub notifier: Arc<dyn UnpublishNotifier>,
}
