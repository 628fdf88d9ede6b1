use axum::extract::FromRef;

use crate::matching::{DuplicateChecker, MetadataResolver};
use crate::submission_store::SubmissionStore;
use std::sync::Arc;
use std::time::Instant;

use super::ServerConfig;

pub type GuardedSubmissionStore = Arc<dyn SubmissionStore>;
pub type GuardedChecker = Arc<DuplicateChecker>;
pub type GuardedResolver = Arc<MetadataResolver>;

#[derive(Clone)]
pub struct ServerState {
    pub config: ServerConfig,
    pub start_time: Instant,
    pub store: GuardedSubmissionStore,
    pub checker: GuardedChecker,
    pub resolver: GuardedResolver,
    pub hash: String,
}

impl FromRef<ServerState> for GuardedSubmissionStore {
    fn from_ref(input: &ServerState) -> Self {
        input.store.clone()
    }
}

impl FromRef<ServerState> for GuardedChecker {
    fn from_ref(input: &ServerState) -> Self {
        input.checker.clone()
    }
}

impl FromRef<ServerState> for GuardedResolver {
    fn from_ref(input: &ServerState) -> Self {
        input.resolver.clone()
    }
}

impl FromRef<ServerState> for ServerConfig {
    fn from_ref(input: &ServerState) -> Self {
        input.config.clone()
    }
}
