use std::sync::Arc;

use crate::application::services::Resolver;

#[derive(Clone)]
pub struct AppState {
    pub resolver: Arc<Resolver>,
    /// `Some(host)` enables strict mode: requests whose `Host` header differs
    /// are rejected as not-found regardless of id validity.
    pub strict_host: Option<String>,
}
