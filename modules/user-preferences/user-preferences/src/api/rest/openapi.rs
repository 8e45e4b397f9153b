//! In-process OpenAPI registry.
//!
//! Route registration records an [`OperationSpec`] per endpoint and the
//! schemas its DTOs reference; [`OpenApiRegistry::build_openapi`] turns the
//! collected data into a utoipa document.

use std::collections::BTreeMap;

use http::Method;
use parking_lot::Mutex;
use utoipa::openapi::{
    OpenApi, OpenApiBuilder, Ref, RefOr, Required,
    content::ContentBuilder,
    info::InfoBuilder,
    path::{
        HttpMethod, OperationBuilder as UOperationBuilder, ParameterBuilder, ParameterIn,
        PathItemBuilder, PathsBuilder,
    },
    request_body::RequestBodyBuilder,
    response::{ResponseBuilder, ResponsesBuilder},
    schema::{Array, ComponentsBuilder, ObjectBuilder, Schema, SchemaType, Type},
};

use super::problem::APPLICATION_PROBLEM_JSON;

type SchemaCollection = Vec<(String, RefOr<Schema>)>;

/// Schema attached to a request or response body.
#[derive(Clone)]
pub enum BodySchema {
    /// `$ref` to a registered component.
    Component(String),
    /// Schema embedded in place.
    Inline(Schema),
}

impl BodySchema {
    /// JSON array whose items follow `self`.
    #[must_use]
    pub fn array(&self) -> Self {
        Self::Inline(Schema::Array(Array::new(schema_ref(self))))
    }
}

#[derive(Clone)]
pub struct ResponseSpec {
    pub status: u16,
    pub description: String,
    pub content_type: &'static str,
    pub schema: Option<BodySchema>,
}

#[derive(Debug, Clone)]
pub struct PathParamSpec {
    pub name: &'static str,
    pub description: &'static str,
}

/// Description of one registered HTTP operation.
#[derive(Clone)]
#[must_use]
pub struct OperationSpec {
    pub method: Method,
    pub path: &'static str,
    pub operation_id: String,
    pub summary: String,
    pub tag: &'static str,
    pub path_params: Vec<PathParamSpec>,
    pub request_body: Option<BodySchema>,
    pub responses: Vec<ResponseSpec>,
}

impl OperationSpec {
    pub fn new(method: Method, path: &'static str, operation_id: impl Into<String>) -> Self {
        Self {
            method,
            path,
            operation_id: operation_id.into(),
            summary: String::new(),
            tag: "Preferences",
            path_params: Vec::new(),
            request_body: None,
            responses: Vec::new(),
        }
    }

    pub fn summary(mut self, summary: impl Into<String>) -> Self {
        self.summary = summary.into();
        self
    }

    pub fn tag(mut self, tag: &'static str) -> Self {
        self.tag = tag;
        self
    }

    pub fn path_param(mut self, name: &'static str, description: &'static str) -> Self {
        self.path_params.push(PathParamSpec { name, description });
        self
    }

    pub fn request_body(mut self, schema: BodySchema) -> Self {
        self.request_body = Some(schema);
        self
    }

    pub fn json_response(
        mut self,
        status: u16,
        description: impl Into<String>,
        schema: Option<BodySchema>,
    ) -> Self {
        self.responses.push(ResponseSpec {
            status,
            description: description.into(),
            content_type: "application/json",
            schema,
        });
        self
    }

    pub fn empty_response(mut self, status: u16, description: impl Into<String>) -> Self {
        self.responses.push(ResponseSpec {
            status,
            description: description.into(),
            content_type: "",
            schema: None,
        });
        self
    }

    /// Problem response referencing the `Problem` component.
    pub fn problem_response(mut self, status: u16, description: impl Into<String>) -> Self {
        self.responses.push(ResponseSpec {
            status,
            description: description.into(),
            content_type: APPLICATION_PROBLEM_JSON,
            schema: Some(BodySchema::Component("Problem".to_owned())),
        });
        self
    }
}

#[derive(Debug, Clone)]
pub struct OpenApiInfo {
    pub title: String,
    pub version: String,
    pub description: Option<String>,
}

impl Default for OpenApiInfo {
    fn default() -> Self {
        Self {
            title: "User Preferences API".to_owned(),
            version: env!("CARGO_PKG_VERSION").to_owned(),
            description: None,
        }
    }
}

#[derive(Default)]
pub struct OpenApiRegistry {
    operations: Mutex<Vec<OperationSpec>>,
    components: Mutex<BTreeMap<String, RefOr<Schema>>>,
}

impl OpenApiRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_operation(&self, spec: OperationSpec) {
        tracing::debug!(
            method = %spec.method,
            path = spec.path,
            operation_id = %spec.operation_id,
            "Registered API operation"
        );
        self.operations.lock().push(spec);
    }

    /// Registers `T` and every schema it references.
    pub fn register_schema<T: utoipa::ToSchema + 'static>(&self) {
        let root_name = T::name().to_string();

        let mut collected: SchemaCollection =
            vec![(root_name.clone(), <T as utoipa::PartialSchema>::schema())];
        T::schemas(&mut collected);

        let mut components = self.components.lock();
        for (name, schema) in collected {
            components.entry(name).or_insert(schema);
        }
    }

    /// Like [`Self::register_schema`], returning a body schema pointing at
    /// `T`'s component.
    #[must_use]
    pub fn ensure_schema<T: utoipa::ToSchema + 'static>(&self) -> BodySchema {
        self.register_schema::<T>();
        BodySchema::Component(T::name().to_string())
    }

    #[must_use]
    pub fn operation_count(&self) -> usize {
        self.operations.lock().len()
    }

    #[must_use]
    pub fn build_openapi(&self, info: &OpenApiInfo) -> OpenApi {
        let operations = self.operations.lock().clone();
        tracing::info!(
            operations = operations.len(),
            "Building OpenAPI document"
        );

        // Operations sharing a path end up in one path item.
        let mut grouped: BTreeMap<&'static str, PathItemBuilder> = BTreeMap::new();
        for spec in &operations {
            let Some(method) = http_method(&spec.method) else {
                tracing::warn!(
                    method = %spec.method,
                    path = spec.path,
                    "Skipping operation with a method OpenAPI cannot describe"
                );
                continue;
            };
            let item = grouped.remove(spec.path).unwrap_or_default();
            grouped.insert(spec.path, item.operation(method, build_operation(spec)));
        }

        let paths = grouped
            .into_iter()
            .fold(PathsBuilder::new(), |paths, (path, item)| {
                paths.path(path, item.build())
            });

        let components = self
            .components
            .lock()
            .iter()
            .fold(ComponentsBuilder::new(), |builder, (name, schema)| {
                builder.schema(name.clone(), schema.clone())
            });

        OpenApiBuilder::new()
            .info(
                InfoBuilder::new()
                    .title(&info.title)
                    .version(&info.version)
                    .description(info.description.clone())
                    .build(),
            )
            .paths(paths.build())
            .components(Some(components.build()))
            .build()
    }
}

/// `None` for CONNECT and extension methods.
fn http_method(method: &Method) -> Option<HttpMethod> {
    Some(match *method {
        Method::GET => HttpMethod::Get,
        Method::POST => HttpMethod::Post,
        Method::PUT => HttpMethod::Put,
        Method::DELETE => HttpMethod::Delete,
        Method::PATCH => HttpMethod::Patch,
        Method::HEAD => HttpMethod::Head,
        Method::OPTIONS => HttpMethod::Options,
        Method::TRACE => HttpMethod::Trace,
        _ => return None,
    })
}

fn schema_ref(schema: &BodySchema) -> RefOr<Schema> {
    match schema {
        BodySchema::Component(name) => RefOr::Ref(Ref::from_schema_name(name.clone())),
        BodySchema::Inline(schema) => RefOr::T(schema.clone()),
    }
}

fn build_operation(spec: &OperationSpec) -> utoipa::openapi::path::Operation {
    let mut op = UOperationBuilder::new()
        .operation_id(Some(spec.operation_id.clone()))
        .summary(Some(spec.summary.clone()))
        .tag(spec.tag);

    for param in &spec.path_params {
        let schema = Schema::Object(
            ObjectBuilder::new()
                .schema_type(SchemaType::Type(Type::String))
                .build(),
        );
        op = op.parameter(
            ParameterBuilder::new()
                .name(param.name)
                .parameter_in(ParameterIn::Path)
                .required(Required::True)
                .description(Some(param.description))
                .schema(Some(schema))
                .build(),
        );
    }

    if let Some(body) = &spec.request_body {
        let content = ContentBuilder::new().schema(Some(schema_ref(body))).build();
        op = op.request_body(Some(
            RequestBodyBuilder::new()
                .content("application/json", content)
                .required(Some(Required::True))
                .build(),
        ));
    }

    let mut responses = ResponsesBuilder::new();
    for r in &spec.responses {
        let mut resp = ResponseBuilder::new().description(&r.description);
        if let Some(schema) = &r.schema {
            resp = resp.content(
                r.content_type,
                ContentBuilder::new().schema(Some(schema_ref(schema))).build(),
            );
        }
        responses = responses.response(r.status.to_string(), resp.build());
    }

    op.responses(responses.build()).build()
}
