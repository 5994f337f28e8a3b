//! Section handlers.
//!
//! ```text
//! GET    /api/sections
//! GET    /api/sections/{id}
//! POST   /api/sections            {"name":"Hero Section","title":"...","content":"..."}
//! PUT    /api/sections/update-all {"sections":[{"id":"...","order":0}]}
//! PUT    /api/sections/{id}       {"isVisible":false,"expectedRevision":3}
//! DELETE /api/sections/{id}
//! ```
//!
//! Reads are public. Writes take [`Authenticated`] ahead of their body, so a
//! missing or bad token is rejected before the body is parsed; both roles may
//! edit.

use actix_web::{HttpResponse, delete, get, post, put, web};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::debug;
use utoipa::ToSchema;

use crate::domain::{
    Error, NewSection, Section, SectionName, SectionPatch, SectionReplacement,
};
use crate::inbound::http::ApiResult;
use crate::inbound::http::auth::MessageResponse;
use crate::inbound::http::schemas::ErrorSchema;
use crate::inbound::http::session::Authenticated;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{
    FieldName, map_section_validation_error, parse_section_id, required,
};

const ID_FIELD: FieldName = FieldName::new("id");
const NAME_FIELD: FieldName = FieldName::new("name");
const SECTIONS_FIELD: &str = "sections";

/// Section as returned to clients.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SectionResponse {
    #[schema(format = "uuid")]
    pub id: String,
    #[schema(example = "Hero Section")]
    pub name: String,
    pub title: String,
    pub content: String,
    #[schema(minimum = 0)]
    pub order: u32,
    pub is_visible: bool,
    /// Bumped on every write; send it back as `expectedRevision` or
    /// `revision` to detect concurrent edits.
    #[schema(minimum = 1)]
    pub revision: u32,
    pub updated_at: DateTime<Utc>,
}

impl From<Section> for SectionResponse {
    fn from(section: Section) -> Self {
        Self {
            id: section.id.to_string(),
            name: section.name.to_string(),
            title: section.title,
            content: section.content,
            order: section.order,
            is_visible: section.is_visible,
            revision: section.revision,
            updated_at: section.updated_at,
        }
    }
}

fn to_responses(sections: Vec<Section>) -> Vec<SectionResponse> {
    sections.into_iter().map(SectionResponse::from).collect()
}

/// Body for `POST /api/sections`. Omitted `order` appends; omitted
/// `isVisible` means visible.
#[derive(Debug, Default, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateSectionRequest {
    pub name: Option<String>,
    pub title: Option<String>,
    pub content: Option<String>,
    pub order: Option<u32>,
    pub is_visible: Option<bool>,
}

impl TryFrom<CreateSectionRequest> for NewSection {
    type Error = Error;

    fn try_from(value: CreateSectionRequest) -> Result<Self, Self::Error> {
        let name = required(value.name, NAME_FIELD)?;
        let name = SectionName::new(name)
            .map_err(|err| map_section_validation_error(err, NAME_FIELD))?;
        Ok(Self {
            name,
            title: value.title.unwrap_or_default(),
            content: value.content.unwrap_or_default(),
            order: value.order,
            is_visible: value.is_visible,
        })
    }
}

/// Body for `PUT /api/sections/{id}`. Only supplied fields change.
#[derive(Debug, Default, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateSectionRequest {
    pub name: Option<String>,
    pub title: Option<String>,
    pub content: Option<String>,
    pub order: Option<u32>,
    pub is_visible: Option<bool>,
    /// Reject the write with 409 unless the stored revision matches.
    pub expected_revision: Option<u32>,
}

impl TryFrom<UpdateSectionRequest> for SectionPatch {
    type Error = Error;

    fn try_from(value: UpdateSectionRequest) -> Result<Self, Self::Error> {
        let name = value
            .name
            .map(SectionName::new)
            .transpose()
            .map_err(|err| map_section_validation_error(err, NAME_FIELD))?;
        Ok(Self {
            name,
            title: value.title,
            content: value.content,
            order: value.order,
            is_visible: value.is_visible,
            expected_revision: value.expected_revision,
        })
    }
}

/// One entry of `PUT /api/sections/update-all`.
#[derive(Debug, Default, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SectionBatchEntry {
    /// Section id; the legacy `_id` key is accepted too.
    #[serde(alias = "_id")]
    pub id: Option<String>,
    pub title: Option<String>,
    pub content: Option<String>,
    pub order: Option<u32>,
    pub is_visible: Option<bool>,
    /// Stored revision the client last saw.
    pub revision: Option<u32>,
}

impl TryFrom<SectionBatchEntry> for SectionReplacement {
    type Error = Error;

    fn try_from(value: SectionBatchEntry) -> Result<Self, Self::Error> {
        let raw = required(value.id, ID_FIELD)?;
        Ok(Self {
            id: parse_section_id(&raw, ID_FIELD)?,
            title: value.title,
            content: value.content,
            order: value.order,
            is_visible: value.is_visible,
            revision: value.revision,
        })
    }
}

/// Documented shape of the bulk body. The handler reads it as raw JSON so a
/// non-array `sections` gets its own message.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct SectionBatchRequest {
    pub sections: Vec<SectionBatchEntry>,
}

fn sections_not_array() -> Error {
    Error::invalid_request("Sections must be an array").with_details(json!({
        "field": SECTIONS_FIELD,
        "code": "not_an_array",
    }))
}

fn parse_batch(mut body: Value) -> Result<Vec<SectionReplacement>, Error> {
    let Some(Value::Array(entries)) = body.get_mut(SECTIONS_FIELD).map(Value::take) else {
        return Err(sections_not_array());
    };

    entries
        .into_iter()
        .enumerate()
        .map(|(index, raw)| {
            let entry: SectionBatchEntry = serde_json::from_value(raw).map_err(|err| {
                Error::invalid_request(format!("invalid section entry: {err}"))
                    .with_details(json!({ "index": index, "code": "invalid_entry" }))
            })?;
            SectionReplacement::try_from(entry)
        })
        .collect()
}

/// List every section in display order.
#[utoipa::path(
    get,
    path = "/api/sections",
    responses(
        (status = 200, description = "Sections sorted by order", body = [SectionResponse]),
        (status = 500, description = "Internal server error", body = ErrorSchema),
        (status = 503, description = "Store unavailable", body = ErrorSchema)
    ),
    tags = ["sections"],
    operation_id = "listSections",
    security([])
)]
#[get("/sections")]
pub async fn list_sections(
    state: web::Data<HttpState>,
) -> ApiResult<web::Json<Vec<SectionResponse>>> {
    let sections = state.sections.list().await?;
    Ok(web::Json(to_responses(sections)))
}

/// Fetch one section.
#[utoipa::path(
    get,
    path = "/api/sections/{id}",
    params(("id" = String, Path, description = "Section id")),
    responses(
        (status = 200, description = "Section", body = SectionResponse),
        (status = 400, description = "Malformed id", body = ErrorSchema),
        (status = 404, description = "Section not found", body = ErrorSchema)
    ),
    tags = ["sections"],
    operation_id = "getSection",
    security([])
)]
#[get("/sections/{id}")]
pub async fn get_section(
    state: web::Data<HttpState>,
    path: web::Path<String>,
) -> ApiResult<web::Json<SectionResponse>> {
    let id = parse_section_id(&path.into_inner(), ID_FIELD)?;
    let section = state.sections.get(&id).await?;
    Ok(web::Json(section.into()))
}

/// Create a section.
#[utoipa::path(
    post,
    path = "/api/sections",
    request_body = CreateSectionRequest,
    responses(
        (status = 201, description = "Section created", body = SectionResponse),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 401, description = "No token provided", body = ErrorSchema),
        (status = 403, description = "Invalid or expired token", body = ErrorSchema),
        (status = 409, description = "Concurrent write rejected", body = ErrorSchema)
    ),
    tags = ["sections"],
    operation_id = "createSection"
)]
#[post("/sections")]
pub async fn create_section(
    state: web::Data<HttpState>,
    caller: Authenticated,
    payload: web::Json<CreateSectionRequest>,
) -> ApiResult<HttpResponse> {
    let new_section = NewSection::try_from(payload.into_inner())?;
    let created = state.section_commands.create(new_section).await?;
    debug!(user_id = %caller.0.user_id, section_id = %created.id, "section created over http");
    Ok(HttpResponse::Created().json(SectionResponse::from(created)))
}

/// Save a batch of sections at once, typically after drag-and-drop.
///
/// The batch is all or nothing: unknown ids, stale revisions or an order
/// set that is not a permutation reject every entry.
#[utoipa::path(
    put,
    path = "/api/sections/update-all",
    request_body = SectionBatchRequest,
    responses(
        (status = 200, description = "Updated sections in request order", body = [SectionResponse]),
        (status = 400, description = "Malformed batch", body = ErrorSchema),
        (status = 401, description = "No token provided", body = ErrorSchema),
        (status = 403, description = "Invalid or expired token", body = ErrorSchema),
        (status = 404, description = "Unknown section", body = ErrorSchema),
        (status = 409, description = "Stale revision", body = ErrorSchema)
    ),
    tags = ["sections"],
    operation_id = "updateAllSections"
)]
#[put("/sections/update-all")]
pub async fn update_all_sections(
    state: web::Data<HttpState>,
    caller: Authenticated,
    payload: web::Json<Value>,
) -> ApiResult<web::Json<Vec<SectionResponse>>> {
    let entries = parse_batch(payload.into_inner())?;
    let written = state.section_commands.reorder_all(entries).await?;
    debug!(user_id = %caller.0.user_id, count = written.len(), "section batch saved over http");
    Ok(web::Json(to_responses(written)))
}

/// Patch one section.
#[utoipa::path(
    put,
    path = "/api/sections/{id}",
    params(("id" = String, Path, description = "Section id")),
    request_body = UpdateSectionRequest,
    responses(
        (status = 200, description = "Updated section", body = SectionResponse),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 401, description = "No token provided", body = ErrorSchema),
        (status = 403, description = "Invalid or expired token", body = ErrorSchema),
        (status = 404, description = "Section not found", body = ErrorSchema),
        (status = 409, description = "Stale revision", body = ErrorSchema)
    ),
    tags = ["sections"],
    operation_id = "updateSection"
)]
#[put("/sections/{id}")]
pub async fn update_section(
    state: web::Data<HttpState>,
    caller: Authenticated,
    path: web::Path<String>,
    payload: web::Json<UpdateSectionRequest>,
) -> ApiResult<web::Json<SectionResponse>> {
    let id = parse_section_id(&path.into_inner(), ID_FIELD)?;
    let patch = SectionPatch::try_from(payload.into_inner())?;
    let updated = state.section_commands.update(&id, patch).await?;
    debug!(user_id = %caller.0.user_id, section_id = %id, "section updated over http");
    Ok(web::Json(updated.into()))
}

/// Delete a section and close the gap it leaves.
#[utoipa::path(
    delete,
    path = "/api/sections/{id}",
    params(("id" = String, Path, description = "Section id")),
    responses(
        (status = 200, description = "Section deleted", body = MessageResponse),
        (status = 401, description = "No token provided", body = ErrorSchema),
        (status = 403, description = "Invalid or expired token", body = ErrorSchema),
        (status = 404, description = "Section not found", body = ErrorSchema)
    ),
    tags = ["sections"],
    operation_id = "deleteSection"
)]
#[delete("/sections/{id}")]
pub async fn delete_section(
    state: web::Data<HttpState>,
    caller: Authenticated,
    path: web::Path<String>,
) -> ApiResult<web::Json<MessageResponse>> {
    let id = parse_section_id(&path.into_inner(), ID_FIELD)?;
    state.section_commands.delete(&id).await?;
    debug!(user_id = %caller.0.user_id, section_id = %id, "section deleted over http");
    Ok(web::Json(MessageResponse::new("Section deleted successfully")))
}

#[cfg(test)]
#[path = "sections_tests.rs"]
mod tests;
