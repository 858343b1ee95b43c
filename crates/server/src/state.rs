use axum::extract::FromRef;
use storage::Db;

use crate::submission::CommentService;

#[derive(Clone)]
pub struct AppState {
    pub db: Db,
    pub comments: CommentService,
}

impl FromRef<AppState> for Db {
    fn from_ref(state: &AppState) -> Self {
        state.db.clone()
    }
}

impl FromRef<AppState> for CommentService {
    fn from_ref(state: &AppState) -> Self {
        state.comments.clone()
    }
}
