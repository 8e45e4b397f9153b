use std::sync::Arc;

use axum::routing::get;
use axum::{Extension, Router, middleware};
use http::Method;
use serde_json::Value;
use utoipa::openapi::schema::{ObjectBuilder, Schema, SchemaType, Type};

use crate::api::rest::{auth, dto, handlers};
use crate::domain::registry::{Domain, PreferenceSpec};
use crate::domain::service::Service;

use super::auth::IdentityHeader;
use super::dto::value_to_json;
use super::openapi::{BodySchema, OpenApiRegistry, OperationSpec};
use super::problem::Problem;

pub const PREFERENCES_PATH: &str = "/user-preferences/v1/preferences";
pub const PREFERENCE_PATH: &str = "/user-preferences/v1/preferences/{key}";
pub const REGISTRY_PATH: &str = "/user-preferences/v1/registry";

#[must_use]
pub fn register_routes(
    router: Router,
    openapi: &OpenApiRegistry,
    service: Arc<Service>,
    identity: IdentityHeader,
) -> Router {
    register_docs(openapi, &service);

    let preferences = Router::new()
        .route(
            PREFERENCES_PATH,
            get(handlers::list_preferences).patch(handlers::patch_preferences),
        )
        .route(
            PREFERENCE_PATH,
            get(handlers::get_preference)
                .put(handlers::put_preference)
                .delete(handlers::reset_preference),
        )
        .route_layer(middleware::from_fn_with_state(
            identity,
            auth::identify_user,
        ));

    let public = Router::new().route(REGISTRY_PATH, get(handlers::describe_registry));

    router.merge(preferences.merge(public).layer(Extension(service)))
}

fn register_docs(openapi: &OpenApiRegistry, service: &Service) {
    openapi.register_schema::<Problem>();
    let entry = openapi.ensure_schema::<dto::PreferenceEntryDto>();
    let set_request = openapi.ensure_schema::<dto::SetPreferenceRequest>();
    let descriptor = openapi.ensure_schema::<dto::PreferenceDescriptorDto>();
    let snapshot = BodySchema::Inline(snapshot_schema(service.registry().specs()));

    openapi.register_operation(
        OperationSpec::new(Method::GET, PREFERENCES_PATH, "user-preferences.list")
            .summary("Get all preferences of the caller, defaults included")
            .json_response(200, "Preference snapshot", Some(snapshot.clone()))
            .problem_response(401, "Missing or invalid caller identity")
            .problem_response(500, "Internal error"),
    );

    openapi.register_operation(
        OperationSpec::new(Method::PATCH, PREFERENCES_PATH, "user-preferences.patch")
            .summary("Change several preferences atomically")
            .request_body(snapshot.clone())
            .json_response(200, "Updated preference snapshot", Some(snapshot))
            .problem_response(401, "Missing or invalid caller identity")
            .problem_response(422, "Unknown keys or invalid values")
            .problem_response(500, "Internal error"),
    );

    openapi.register_operation(
        OperationSpec::new(Method::GET, PREFERENCE_PATH, "user-preferences.get")
            .summary("Get one preference")
            .path_param("key", "Preference key")
            .json_response(200, "Current value", Some(entry.clone()))
            .problem_response(401, "Missing or invalid caller identity")
            .problem_response(404, "Unknown preference key")
            .problem_response(500, "Internal error"),
    );

    openapi.register_operation(
        OperationSpec::new(Method::PUT, PREFERENCE_PATH, "user-preferences.set")
            .summary("Set one preference")
            .path_param("key", "Preference key")
            .request_body(set_request)
            .json_response(200, "Stored value", Some(entry))
            .problem_response(401, "Missing or invalid caller identity")
            .problem_response(404, "Unknown preference key")
            .problem_response(422, "Value outside the key's domain")
            .problem_response(500, "Internal error"),
    );

    openapi.register_operation(
        OperationSpec::new(Method::DELETE, PREFERENCE_PATH, "user-preferences.reset")
            .summary("Reset one preference to its default")
            .path_param("key", "Preference key")
            .empty_response(204, "Preference reset")
            .problem_response(401, "Missing or invalid caller identity")
            .problem_response(404, "Unknown preference key")
            .problem_response(500, "Internal error"),
    );

    openapi.register_operation(
        OperationSpec::new(Method::GET, REGISTRY_PATH, "user-preferences.registry")
            .summary("Describe every registered preference")
            .tag("Registry")
            .json_response(200, "Registered preferences", Some(descriptor.array()))
            .problem_response(500, "Internal error"),
    );
}

/// Object schema with one property per registered key. Nullable keys admit
/// `null` and choice keys list their options.
fn snapshot_schema<'a>(specs: impl Iterator<Item = &'a PreferenceSpec>) -> Schema {
    let object = specs.fold(ObjectBuilder::new(), |object, spec| {
        let ty = match spec.domain {
            Domain::Boolean => Type::Boolean,
            Domain::Integer { .. } => Type::Integer,
            Domain::Choice { .. } => Type::String,
        };
        let nullable = spec.domain.is_nullable();
        let schema_type = if nullable {
            [ty, Type::Null].into_iter().collect::<SchemaType>()
        } else {
            SchemaType::Type(ty)
        };

        let mut property = ObjectBuilder::new()
            .schema_type(schema_type)
            .description(Some(describe_domain(spec)))
            .default(Some(value_to_json(&spec.default)));
        if let Domain::Choice { options, .. } = spec.domain {
            let mut values: Vec<Value> = options.iter().map(|&o| Value::from(o)).collect();
            if nullable {
                values.push(Value::Null);
            }
            property = property.enum_values(Some(values));
        }
        object.property(spec.key.as_str(), Schema::Object(property.build()))
    });
    Schema::Object(object.build())
}

fn describe_domain(spec: &PreferenceSpec) -> String {
    let domain = match spec.domain {
        Domain::Boolean => "boolean".to_owned(),
        Domain::Integer { min, max, .. } => format!("integer {min}..={max}"),
        Domain::Choice { options, .. } => format!("one of {}", options.join(", ")),
    };
    let nullable = if spec.domain.is_nullable() {
        ", nullable"
    } else {
        ""
    };
    format!("{domain}{nullable}, default {}", value_to_json(&spec.default))
}
