use std::sync::Arc;

use actix_web::web;
use tempfile::TempDir;

use sitewatch_service::database::LibsqlRegistry;
use sitewatch_service::pool::open_pool;

use crate::state::AppState;

/// State backed by a fresh database in a temporary directory
pub async fn test_state() -> (web::Data<AppState>, TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let pool = open_pool(&dir.path().join("server.db"), 2).await.unwrap();
    let state = web::Data::new(AppState::new(Arc::new(LibsqlRegistry::new_from_pool(pool)), 10));
    (state, dir)
}

/// Full route table over `state`
macro_rules! test_app {
    ($state:expr) => {
        actix_web::test::init_service(
            actix_web::App::new().app_data($state.clone()).configure(crate::routes::routes),
        )
        .await
    };
}

pub(crate) use test_app;
