use std::sync::Arc;

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Extension, OriginalUri, Path};
use axum::http::{StatusCode, Uri};
use serde_json::{Map, Value};
use user_preferences_sdk::{PreferenceEntry, PreferenceKey};

use crate::domain::error::DomainError;
use crate::domain::service::Service;

use super::auth::CurrentUser;
use super::dto::{
    self, PreferenceDescriptorDto, PreferenceEntryDto, PreferencesDto, SetPreferenceRequest,
};
use super::error::{domain_error_to_problem, json_rejection_to_problem};
use super::problem::{ApiResult, Problem};

/// Error mapper stamping problems with the request path.
fn problem_at(uri: &Uri) -> impl Fn(DomainError) -> Problem + '_ {
    move |e| domain_error_to_problem(&e, uri.path())
}

fn json_body<T>(body: Result<Json<T>, JsonRejection>, uri: &Uri) -> ApiResult<T> {
    body.map(|Json(value)| value)
        .map_err(|rejection| json_rejection_to_problem(&rejection, uri.path()))
}

fn parse_key(raw: &str) -> Result<PreferenceKey, DomainError> {
    Ok(raw.parse::<PreferenceKey>()?)
}

pub async fn list_preferences(
    CurrentUser(user): CurrentUser,
    Extension(svc): Extension<Arc<Service>>,
    OriginalUri(uri): OriginalUri,
) -> ApiResult<Json<PreferencesDto>> {
    let entries = svc.get_all(user).await.map_err(problem_at(&uri))?;
    Ok(Json(entries.into()))
}

pub async fn patch_preferences(
    CurrentUser(user): CurrentUser,
    Extension(svc): Extension<Arc<Service>>,
    OriginalUri(uri): OriginalUri,
    body: Result<Json<Map<String, Value>>, JsonRejection>,
) -> ApiResult<Json<PreferencesDto>> {
    let body = json_body(body, &uri)?;
    let entries = dto::patch_to_entries(body)
        .map_err(|violations| DomainError::Validation { violations })
        .map_err(problem_at(&uri))?;

    svc.set_many(user, &entries)
        .await
        .map_err(problem_at(&uri))?;

    let snapshot = svc.get_all(user).await.map_err(problem_at(&uri))?;
    Ok(Json(snapshot.into()))
}

pub async fn get_preference(
    CurrentUser(user): CurrentUser,
    Extension(svc): Extension<Arc<Service>>,
    OriginalUri(uri): OriginalUri,
    Path(key): Path<String>,
) -> ApiResult<Json<PreferenceEntryDto>> {
    let key = parse_key(&key).map_err(problem_at(&uri))?;
    let value = svc.get(user, key).await.map_err(problem_at(&uri))?;
    Ok(Json(PreferenceEntry::new(key, value).into()))
}

pub async fn put_preference(
    CurrentUser(user): CurrentUser,
    Extension(svc): Extension<Arc<Service>>,
    OriginalUri(uri): OriginalUri,
    Path(key): Path<String>,
    body: Result<Json<SetPreferenceRequest>, JsonRejection>,
) -> ApiResult<Json<PreferenceEntryDto>> {
    let key = parse_key(&key).map_err(problem_at(&uri))?;
    let req = json_body(body, &uri)?;
    let value = dto::value_from_json(key.as_str(), req.value)
        .map_err(|violation| DomainError::Validation {
            violations: vec![violation],
        })
        .map_err(problem_at(&uri))?;

    svc.set(user, key, value.clone())
        .await
        .map_err(problem_at(&uri))?;
    Ok(Json(PreferenceEntry::new(key, value).into()))
}

pub async fn reset_preference(
    CurrentUser(user): CurrentUser,
    Extension(svc): Extension<Arc<Service>>,
    OriginalUri(uri): OriginalUri,
    Path(key): Path<String>,
) -> ApiResult<StatusCode> {
    let key = parse_key(&key).map_err(problem_at(&uri))?;
    svc.reset(user, key).await.map_err(problem_at(&uri))?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn describe_registry(
    Extension(svc): Extension<Arc<Service>>,
    OriginalUri(uri): OriginalUri,
) -> ApiResult<Json<Vec<PreferenceDescriptorDto>>> {
    let specs = svc.describe().map_err(problem_at(&uri))?;
    Ok(Json(specs.into_iter().map(Into::into).collect()))
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::api::rest::auth::IdentityHeader;
    use crate::api::rest::openapi::OpenApiRegistry;
    use crate::api::rest::routes;
    use crate::domain::repo::{PreferenceRepository, PreferenceWrite, StoredPreference};
    use crate::domain::service::ServiceConfig;
    use async_trait::async_trait;
    use axum::Router;
    use axum::body::Body;
    use axum::http::Request;
    use parking_lot::Mutex;
    use serde_json::json;
    use tower::ServiceExt as _;
    use user_preferences_sdk::UserId;
    use uuid::Uuid;

    const USER: &str = "0b9d2b7e-2f4c-4c55-8f6e-0e6a4a3c9f01";

    #[derive(Default)]
    struct MockRepository {
        rows: Mutex<HashMap<(UserId, PreferenceKey), Option<String>>>,
    }

    #[async_trait]
    impl PreferenceRepository for MockRepository {
        async fn find(
            &self,
            user: UserId,
            key: PreferenceKey,
        ) -> anyhow::Result<Option<StoredPreference>> {
            Ok(self
                .rows
                .lock()
                .get(&(user, key))
                .map(|raw| StoredPreference {
                    user,
                    key: key.as_str().to_owned(),
                    raw: raw.clone(),
                }))
        }

        async fn list_for_user(&self, user: UserId) -> anyhow::Result<Vec<StoredPreference>> {
            Ok(self
                .rows
                .lock()
                .iter()
                .filter(|((owner, _), _)| *owner == user)
                .map(|((_, key), raw)| StoredPreference {
                    user,
                    key: key.as_str().to_owned(),
                    raw: raw.clone(),
                })
                .collect())
        }

        async fn apply(&self, user: UserId, writes: Vec<PreferenceWrite>) -> anyhow::Result<()> {
            let mut rows = self.rows.lock();
            for write in writes {
                match write {
                    PreferenceWrite::Upsert { key, raw } => {
                        rows.insert((user, key), raw);
                    }
                    PreferenceWrite::Delete { key } => {
                        rows.remove(&(user, key));
                    }
                }
            }
            Ok(())
        }
    }

    fn create_test_router() -> (Router, Arc<MockRepository>) {
        let repo = Arc::new(MockRepository::default());
        let service = Arc::new(Service::new(repo.clone(), ServiceConfig::default()));
        let router = routes::register_routes(
            Router::new(),
            &OpenApiRegistry::new(),
            service,
            IdentityHeader::parse("x-user-id").unwrap(),
        );
        (router, repo)
    }

    fn request(method: &str, uri: &str, body: Option<Value>) -> Request<Body> {
        let builder = Request::builder()
            .method(method)
            .uri(uri)
            .header("x-user-id", USER);
        match body {
            Some(json) => builder
                .header("content-type", "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        }
    }

    fn content_type(response: &axum::response::Response) -> Option<&str> {
        response
            .headers()
            .get("content-type")
            .and_then(|v| v.to_str().ok())
    }

    async fn body_json(response: axum::response::Response) -> Value {
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&body).unwrap()
    }

    #[tokio::test]
    async fn test_list_returns_every_key_with_defaults() {
        let (app, _) = create_test_router();

        let response = app
            .oneshot(request("GET", "/user-preferences/v1/preferences", None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let json = body_json(response).await;
        let object = json.as_object().unwrap();
        assert_eq!(object.len(), PreferenceKey::ALL.len());
        assert_eq!(json["cg_itemsperpage"], 7);
        assert_eq!(json["cg_fulllstprev"], true);
        assert_eq!(json["p_avatarprov"], "deviantart");
        assert_eq!(json["p_vectorapp"], Value::Null);
    }

    #[tokio::test]
    async fn test_put_then_get_round_trips() {
        let (app, repo) = create_test_router();

        let response = app
            .clone()
            .oneshot(request(
                "PUT",
                "/user-preferences/v1/preferences/cg_itemsperpage",
                Some(json!({"value": 15})),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            body_json(response).await,
            json!({"key": "cg_itemsperpage", "value": 15})
        );
        assert_eq!(repo.rows.lock().len(), 1);

        let response = app
            .oneshot(request(
                "GET",
                "/user-preferences/v1/preferences/cg_itemsperpage",
                None,
            ))
            .await
            .unwrap();
        assert_eq!(body_json(response).await["value"], 15);
    }

    #[tokio::test]
    async fn test_put_out_of_range_is_unprocessable() {
        let (app, repo) = create_test_router();

        let response = app
            .oneshot(request(
                "PUT",
                "/user-preferences/v1/preferences/cg_itemsperpage",
                Some(json!({"value": 5})),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let json = body_json(response).await;
        assert_eq!(json["errors"][0]["field"], "cg_itemsperpage");
        assert!(repo.rows.lock().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_path_key_is_not_found() {
        let (app, _) = create_test_router();

        let response = app
            .oneshot(request(
                "GET",
                "/user-preferences/v1/preferences/cg_bogus",
                None,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(content_type(&response), Some("application/problem+json"));
        assert_eq!(
            body_json(response).await["instance"],
            "/user-preferences/v1/preferences/cg_bogus"
        );
    }

    #[tokio::test]
    async fn test_put_with_unknown_body_field_is_a_problem() {
        let (app, repo) = create_test_router();

        let response = app
            .oneshot(request(
                "PUT",
                "/user-preferences/v1/preferences/cg_itemsperpage",
                Some(json!({"value": 15, "extra": 1})),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(content_type(&response), Some("application/problem+json"));

        let json = body_json(response).await;
        assert_eq!(json["errors"][0]["field"], "body");
        assert_eq!(
            json["instance"],
            "/user-preferences/v1/preferences/cg_itemsperpage"
        );
        assert!(repo.rows.lock().is_empty());
    }

    #[tokio::test]
    async fn test_patch_with_non_object_body_is_a_problem() {
        let (app, repo) = create_test_router();

        let response = app
            .oneshot(request(
                "PATCH",
                "/user-preferences/v1/preferences",
                Some(json!([1, 2])),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(content_type(&response), Some("application/problem+json"));
        assert_eq!(body_json(response).await["errors"][0]["field"], "body");
        assert!(repo.rows.lock().is_empty());
    }

    #[tokio::test]
    async fn test_syntax_error_and_missing_content_type_are_problems() {
        let (app, _) = create_test_router();

        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .method("PATCH")
                    .uri("/user-preferences/v1/preferences")
                    .header("x-user-id", USER)
                    .header("content-type", "application/json")
                    .body(Body::from("{\"cg_hidesynon\": tru"))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(content_type(&response), Some("application/problem+json"));
        assert_eq!(
            body_json(response).await["code"],
            "PREFERENCES_MALFORMED_BODY"
        );

        let response = app
            .oneshot(
                Request::builder()
                    .method("PUT")
                    .uri("/user-preferences/v1/preferences/cg_hidesynon")
                    .header("x-user-id", USER)
                    .body(Body::from("{\"value\": true}"))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
        assert_eq!(content_type(&response), Some("application/problem+json"));
    }

    #[tokio::test]
    async fn test_missing_identity_is_unauthorized() {
        let (app, _) = create_test_router();

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/user-preferences/v1/preferences")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_patch_rejects_unknown_keys_without_writing() {
        let (app, repo) = create_test_router();

        let response = app
            .oneshot(request(
                "PATCH",
                "/user-preferences/v1/preferences",
                Some(json!({"cg_hidesynon": true, "cg_bogus": 3})),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body_json(response).await["errors"][0]["field"], "cg_bogus");
        assert!(repo.rows.lock().is_empty());
    }

    #[tokio::test]
    async fn test_patch_returns_updated_snapshot() {
        let (app, repo) = create_test_router();

        let response = app
            .oneshot(request(
                "PATCH",
                "/user-preferences/v1/preferences",
                Some(json!({"cg_hidesynon": true, "p_vectorapp": "inkscape", "cg_itemsperpage": 7})),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let json = body_json(response).await;
        assert_eq!(json["cg_hidesynon"], true);
        assert_eq!(json["p_vectorapp"], "inkscape");
        assert_eq!(json["cg_itemsperpage"], 7);
        // the default-valued entry is compacted away
        assert_eq!(repo.rows.lock().len(), 2);
    }

    #[tokio::test]
    async fn test_delete_resets_to_default() {
        let (app, repo) = create_test_router();
        let user = UserId::new(Uuid::parse_str(USER).unwrap());
        repo.rows
            .lock()
            .insert((user, PreferenceKey::CgHideSynon), Some("1".to_owned()));

        let response = app
            .oneshot(request(
                "DELETE",
                "/user-preferences/v1/preferences/cg_hidesynon",
                None,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        assert!(repo.rows.lock().is_empty());
    }

    #[tokio::test]
    async fn test_registry_is_public() {
        let (app, _) = create_test_router();

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/user-preferences/v1/registry")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let json = body_json(response).await;
        let items = json.as_array().unwrap();
        assert_eq!(items.len(), PreferenceKey::ALL.len());
        assert_eq!(items[0]["key"], "cg_itemsperpage");
        assert_eq!(items[0]["min"], 7);
    }
}
