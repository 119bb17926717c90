use actix_web::{HttpResponse, delete, get, post, web};
use serde_json::json;
use tracing::info;

use sitewatch_service::database::NewSink;
use sitewatch_service::validation::validate_new_sink;

use crate::error::ApiError;
use crate::state::AppState;

macros_utils::routes! {
    route create_webhook,
    route list_webhooks,
    route delete_webhook,
}

/// Register a webhook that receives every status change
#[post("/webhook")]
pub async fn create_webhook(
    state: web::Data<AppState>,
    body: web::Json<NewSink>,
) -> Result<HttpResponse, ApiError> {
    let sink = validate_new_sink(&body)?;
    let created = state
        .registry
        .create_sink(&sink)
        .await
        .map_err(ApiError::for_record("Webhook"))?;

    info!(sink_id = created.id, "Webhook registered");
    Ok(HttpResponse::Ok().json(created))
}

#[get("/webhooks")]
pub async fn list_webhooks(state: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    Ok(HttpResponse::Ok().json(state.registry.list_sinks().await?))
}

#[delete("/webhooks/{id}")]
pub async fn delete_webhook(state: web::Data<AppState>, id: web::Path<i64>) -> Result<HttpResponse, ApiError> {
    state
        .registry
        .delete_sink(*id)
        .await
        .map_err(ApiError::for_record("Webhook"))?;

    info!(sink_id = *id, "Webhook deleted");
    Ok(HttpResponse::Ok().json(json!({ "message": "Webhook deleted successfully" })))
}

#[cfg(test)]
mod tests {
    use actix_web::http::StatusCode;
    use actix_web::test;

    use sitewatch_service::database::Sink;

    use crate::routes::test_support::{test_app, test_state};

    #[actix_web::test]
    async fn register_list_and_delete() {
        let (state, _dir) = test_state().await;
        let app = test_app!(state);

        let request = test::TestRequest::post()
            .uri("/webhook")
            .set_json(serde_json::json!({ "url": "https://discord.com/api/webhooks/1/abc", "name": "ops" }))
            .to_request();
        let created: Sink = test::call_and_read_body_json(&app, request).await;
        assert_eq!(created.name.as_deref(), Some("ops"));

        let request = test::TestRequest::get().uri("/webhooks").to_request();
        let sinks: Vec<Sink> = test::call_and_read_body_json(&app, request).await;
        assert_eq!(sinks, vec![created.clone()]);

        let request = test::TestRequest::delete().uri(&format!("/webhooks/{}", created.id)).to_request();
        assert_eq!(test::call_service(&app, request).await.status(), StatusCode::OK);

        let request = test::TestRequest::delete().uri(&format!("/webhooks/{}", created.id)).to_request();
        assert_eq!(test::call_service(&app, request).await.status(), StatusCode::NOT_FOUND);
    }

    #[actix_web::test]
    async fn duplicate_and_invalid_webhooks_are_rejected() {
        let (state, _dir) = test_state().await;
        let app = test_app!(state);

        for (body, expected) in [
            (serde_json::json!({ "url": "https://hooks.example.com/a" }), StatusCode::OK),
            (serde_json::json!({ "url": "https://hooks.example.com/a" }), StatusCode::BAD_REQUEST),
            (serde_json::json!({ "url": "not a url" }), StatusCode::BAD_REQUEST),
        ] {
            let request = test::TestRequest::post().uri("/webhook").set_json(&body).to_request();
            assert_eq!(test::call_service(&app, request).await.status(), expected, "{body}");
        }
    }
}
