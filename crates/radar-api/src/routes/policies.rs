//! # Policy Registry API
//!
//! Policies are created and amended but never deleted; repeal is a status
//! change. Every amendment appends a [`PolicyChange`] and re-runs the
//! active impact assessments that reference the policy.

use std::collections::BTreeMap;

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use chrono::{DateTime, Duration, NaiveDate, Utc};
use radar_core::taxonomy::is_known_industry;
use radar_core::{
    CategoryGroup, ChangeType, JurisdictionCode, Policy, PolicyCategory, PolicyChange,
    PolicyStatus, PolicyType,
};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::assessments::{self, BatchSummary};
use crate::auth::{require_role, CallerIdentity, Role};
use crate::envelope::{ApiResponse, Pagination};
use crate::error::AppError;
use crate::extractors::{extract_query, extract_validated_json, Validate};
use crate::state::AppState;

/// Build the policies router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/v1/policies", get(list_policies).post(create_policy))
        .route(
            "/api/v1/policies/categories",
            get(list_categories).post(create_category),
        )
        .route("/api/v1/policies/analytics/summary", get(policy_summary))
        .route("/api/v1/policies/search", get(search_policies))
        .route("/api/v1/policies/recent", get(recent_policies))
        .route("/api/v1/policies/high-risk", get(high_risk_policies))
        .route("/api/v1/policies/:id", get(get_policy).put(update_policy))
        .route("/api/v1/policies/:id/changes", get(list_changes))
}

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

/// Filters for `GET /api/v1/policies`.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PolicyListQuery {
    /// 1-based page (default 1).
    pub page: Option<u32>,
    /// Page size, 1..=1000 (default 100).
    pub per_page: Option<u32>,
    /// Jurisdiction code, case-insensitive.
    pub jurisdiction: Option<String>,
    /// Industry slug; economy-wide policies always match.
    pub industry: Option<String>,
    pub status: Option<PolicyStatus>,
    pub category_id: Option<Uuid>,
    /// Earliest proposal date (inclusive).
    pub start_date: Option<NaiveDate>,
    /// Latest proposal date (inclusive).
    pub end_date: Option<NaiveDate>,
}

impl Validate for PolicyListQuery {
    fn validate(&self) -> Result<(), String> {
        Pagination::new(self.page, self.per_page)?;
        if let (Some(start), Some(end)) = (self.start_date, self.end_date) {
            if end < start {
                return Err("end_date must not precede start_date".to_string());
            }
        }
        Ok(())
    }
}

/// Request to register a policy.
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreatePolicyRequest {
    pub title: String,
    pub description: Option<String>,
    /// Unique registry number.
    pub policy_number: String,
    /// Jurisdiction code (2-10 of `A-Z`, `0-9`, `-`).
    pub jurisdiction: String,
    pub policy_type: PolicyType,
    /// Defaults to `proposed`.
    pub status: Option<PolicyStatus>,
    pub proposed_date: Option<DateTime<Utc>>,
    pub enacted_date: Option<DateTime<Utc>>,
    pub effective_date: Option<DateTime<Utc>>,
    pub expiration_date: Option<DateTime<Utc>>,
    pub regulatory_body: Option<String>,
    pub authority: Option<String>,
    pub content_summary: Option<String>,
    pub full_text_url: Option<String>,
    pub source_url: Option<String>,
    /// Economy-wide impact estimate (M USD).
    pub estimated_impact: Option<f64>,
    /// Confidence in the estimate, 0..=1.
    pub impact_confidence: Option<f64>,
    #[serde(default)]
    pub affected_industries: Vec<String>,
    pub category_id: Option<Uuid>,
}

impl Validate for CreatePolicyRequest {
    fn validate(&self) -> Result<(), String> {
        if self.title.len() > 500 {
            return Err("title must not exceed 500 characters".to_string());
        }
        if self.policy_number.len() > 100 {
            return Err("policy_number must not exceed 100 characters".to_string());
        }
        check_industries(&self.affected_industries)
    }
}

/// Amendment to a policy. Absent fields are left unchanged.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct UpdatePolicyRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<PolicyStatus>,
    pub enacted_date: Option<DateTime<Utc>>,
    pub effective_date: Option<DateTime<Utc>>,
    pub expiration_date: Option<DateTime<Utc>>,
    pub regulatory_body: Option<String>,
    pub content_summary: Option<String>,
    pub estimated_impact: Option<f64>,
    pub impact_confidence: Option<f64>,
    pub affected_industries: Option<Vec<String>>,
    pub category_id: Option<Uuid>,

    /// Kind of change recorded. Defaults to `repeal` when the status moves
    /// to `repealed`, otherwise `amendment`.
    pub change_type: Option<ChangeType>,
    pub change_description: Option<String>,
    /// Signed magnitude, -1..=1.
    pub impact_magnitude: Option<f64>,
    pub source_document: Option<String>,
    pub legislative_session: Option<String>,
}

impl Validate for UpdatePolicyRequest {
    fn validate(&self) -> Result<(), String> {
        if let Some(industries) = &self.affected_industries {
            check_industries(industries)?;
        }
        Ok(())
    }
}

/// Result of an amendment.
#[derive(Debug, Serialize, ToSchema)]
pub struct PolicyUpdateResult {
    pub policy: Policy,
    /// Change record appended for the amendment.
    pub change: PolicyChange,
    /// Recomputation of the active assessments referencing the policy.
    pub reassessment: BatchSummary,
}

/// Request to create a category.
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateCategoryRequest {
    pub name: String,
    pub description: Option<String>,
    pub parent_category_id: Option<Uuid>,
    /// Defaults to the group inferred from the name.
    pub group: Option<CategoryGroup>,
}

impl Validate for CreateCategoryRequest {
    fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("name must not be empty".to_string());
        }
        if self.name.len() > 200 {
            return Err("name must not exceed 200 characters".to_string());
        }
        Ok(())
    }
}

/// Text search parameters.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct SearchQuery {
    /// Case-insensitive substring.
    pub q: String,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

impl Validate for SearchQuery {
    fn validate(&self) -> Result<(), String> {
        if self.q.trim().is_empty() {
            return Err("q must not be empty".to_string());
        }
        if self.q.len() > 200 {
            return Err("q must not exceed 200 characters".to_string());
        }
        Pagination::new(self.page, self.per_page).map(|_| ())
    }
}

/// Window for recently proposed policies.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct RecentQuery {
    /// Look-back in days, 1..=365 (default 30).
    pub days: Option<i64>,
    /// Maximum results, 1..=1000 (default 50).
    pub limit: Option<usize>,
}

impl Validate for RecentQuery {
    fn validate(&self) -> Result<(), String> {
        if let Some(days) = self.days {
            if !(1..=365).contains(&days) {
                return Err("days must be between 1 and 365".to_string());
            }
        }
        check_limit(self.limit)
    }
}

/// Limit for ranked lists.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct LimitQuery {
    /// Maximum results, 1..=1000 (default 50).
    pub limit: Option<usize>,
}

impl Validate for LimitQuery {
    fn validate(&self) -> Result<(), String> {
        check_limit(self.limit)
    }
}

/// Registry-wide policy statistics.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PolicySummary {
    pub total_policies: usize,
    pub enacted_policies: usize,
    pub proposed_policies: usize,
    pub high_risk_policies: usize,
    /// Mean `estimated_impact` over policies that carry one.
    pub average_impact: Option<f64>,
    pub total_estimated_impact: f64,
    pub by_status: BTreeMap<String, usize>,
    pub by_type: BTreeMap<String, usize>,
    pub by_jurisdiction: BTreeMap<String, usize>,
    /// Policies per affected industry; economy-wide policies count under `all`.
    pub by_industry: BTreeMap<String, usize>,
}

const DEFAULT_LIMIT: usize = 50;

fn check_limit(limit: Option<usize>) -> Result<(), String> {
    match limit {
        Some(l) if !(1..=1000).contains(&l) => Err("limit must be between 1 and 1000".to_string()),
        _ => Ok(()),
    }
}

fn check_industries(industries: &[String]) -> Result<(), String> {
    match industries.iter().find(|i| !is_known_industry(i)) {
        Some(unknown) => Err(format!("unknown industry '{unknown}'")),
        None => Ok(()),
    }
}

fn not_found(id: Uuid) -> AppError {
    AppError::NotFound(format!("policy {id} not found"))
}

fn ensure_category(state: &AppState, category_id: Option<Uuid>) -> Result<(), AppError> {
    match category_id {
        Some(id) if !state.categories.contains(&id) => {
            Err(AppError::Validation(format!("category {id} does not exist")))
        }
        _ => Ok(()),
    }
}

/// Newest proposal first, ties by policy number.
fn sort_newest_first(policies: &mut [Policy]) {
    policies.sort_by(|a, b| {
        b.reference_date()
            .cmp(&a.reference_date())
            .then_with(|| a.policy_number.cmp(&b.policy_number))
    });
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// GET /api/v1/policies — List policies.
#[utoipa::path(
    get,
    path = "/api/v1/policies",
    params(PolicyListQuery),
    responses(
        (status = 200, description = "Page of policies (data)", body = Vec<Policy>),
        (status = 422, description = "Invalid filter", body = crate::error::ErrorBody),
    ),
    tag = "policies"
)]
async fn list_policies(
    State(state): State<AppState>,
    query: Result<Query<PolicyListQuery>, QueryRejection>,
) -> Result<Json<ApiResponse<Vec<Policy>>>, AppError> {
    let q = extract_query(query)?;
    let pagination = Pagination::new(q.page, q.per_page).map_err(AppError::Validation)?;

    let mut policies = state.policies.filter(|p| {
        q.jurisdiction
            .as_deref()
            .map_or(true, |j| p.jurisdiction.matches(j))
            && q.industry.as_deref().map_or(true, |i| p.affects_industry(i))
            && q.status.map_or(true, |s| p.status == s)
            && q.category_id.map_or(true, |c| p.category_id == Some(c))
            && q
                .start_date
                .map_or(true, |d| p.reference_date().date_naive() >= d)
            && q
                .end_date
                .map_or(true, |d| p.reference_date().date_naive() <= d)
    });
    sort_newest_first(&mut policies);
    Ok(Json(ApiResponse::page(policies, pagination)))
}

/// POST /api/v1/policies — Register a policy.
#[utoipa::path(
    post,
    path = "/api/v1/policies",
    request_body = CreatePolicyRequest,
    responses(
        (status = 201, description = "Policy created (data)", body = Policy),
        (status = 409, description = "Duplicate policy number", body = crate::error::ErrorBody),
        (status = 422, description = "Validation error", body = crate::error::ErrorBody),
    ),
    tag = "policies"
)]
async fn create_policy(
    State(state): State<AppState>,
    caller: CallerIdentity,
    body: Result<Json<CreatePolicyRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<ApiResponse<Policy>>), AppError> {
    require_role(&caller, Role::Analyst)?;
    let req = extract_validated_json(body)?;
    ensure_category(&state, req.category_id)?;

    let now = Utc::now();
    let policy = Policy {
        id: Uuid::new_v4(),
        title: req.title.trim().to_string(),
        description: req.description,
        policy_number: req.policy_number.trim().to_string(),
        jurisdiction: JurisdictionCode::new(&req.jurisdiction)?,
        policy_type: req.policy_type,
        status: req.status.unwrap_or(PolicyStatus::Proposed),
        proposed_date: req.proposed_date,
        enacted_date: req.enacted_date,
        effective_date: req.effective_date,
        expiration_date: req.expiration_date,
        regulatory_body: req.regulatory_body,
        authority: req.authority,
        content_summary: req.content_summary,
        full_text_url: req.full_text_url,
        source_url: req.source_url,
        estimated_impact: req.estimated_impact,
        impact_confidence: req.impact_confidence,
        affected_industries: req.affected_industries,
        category_id: req.category_id,
        created_at: now,
        updated_at: now,
    };
    policy.validate()?;

    state
        .policies
        .insert_unless(policy.id, policy.clone(), |p, new| {
            p.policy_number.eq_ignore_ascii_case(&new.policy_number)
        })
        .map_err(|existing| {
            AppError::Conflict(format!(
                "policy number {} already exists",
                existing.policy_number
            ))
        })?;
    state.persist(&policy).await?;
    state.invalidate_caches();

    tracing::info!(
        policy_id = %policy.id,
        policy_number = %policy.policy_number,
        jurisdiction = policy.jurisdiction.as_str(),
        "Policy created"
    );
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(policy))))
}

/// GET /api/v1/policies/:id — Get a policy.
#[utoipa::path(
    get,
    path = "/api/v1/policies/{id}",
    params(("id" = Uuid, Path, description = "Policy ID")),
    responses(
        (status = 200, description = "Policy found (data)", body = Policy),
        (status = 404, description = "Not found", body = crate::error::ErrorBody),
    ),
    tag = "policies"
)]
async fn get_policy(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<Policy>>, AppError> {
    state
        .policies
        .get(&id)
        .map(|p| Json(ApiResponse::ok(p)))
        .ok_or_else(|| not_found(id))
}

/// PUT /api/v1/policies/:id — Amend a policy.
#[utoipa::path(
    put,
    path = "/api/v1/policies/{id}",
    params(("id" = Uuid, Path, description = "Policy ID")),
    request_body = UpdatePolicyRequest,
    responses(
        (status = 200, description = "Policy amended (data)", body = PolicyUpdateResult),
        (status = 404, description = "Not found", body = crate::error::ErrorBody),
        (
            status = 422,
            description = "Invalid field or status change",
            body = crate::error::ErrorBody
        ),
    ),
    tag = "policies"
)]
async fn update_policy(
    State(state): State<AppState>,
    caller: CallerIdentity,
    Path(id): Path<Uuid>,
    body: Result<Json<UpdatePolicyRequest>, JsonRejection>,
) -> Result<Json<ApiResponse<PolicyUpdateResult>>, AppError> {
    require_role(&caller, Role::Analyst)?;
    let req = extract_validated_json(body)?;
    ensure_category(&state, req.category_id)?;

    let now = Utc::now();
    let mut change = PolicyChange {
        id: Uuid::new_v4(),
        policy_id: id,
        change_type: ChangeType::Amendment,
        change_date: now,
        change_description: req.change_description.clone(),
        impact_magnitude: req.impact_magnitude,
        impact_direction: req.impact_magnitude.map(|m| {
            if m > 0.0 {
                "positive"
            } else if m < 0.0 {
                "negative"
            } else {
                "neutral"
            }
            .to_string()
        }),
        source_document: req.source_document.clone(),
        legislative_session: req.legislative_session.clone(),
        created_at: now,
    };
    change.validate()?;

    let policy = state
        .policies
        .try_update(&id, |policy| -> Result<Policy, AppError> {
            if let Some(status) = req.status {
                if !policy.status.can_move_to(status) {
                    return Err(AppError::Validation(format!(
                        "policy is {}; status cannot change to {status}",
                        policy.status
                    )));
                }
            }
            let mut next = policy.clone();
            apply_update(&mut next, &req);
            next.updated_at = now;
            next.validate()?;
            *policy = next.clone();
            Ok(next)
        })
        .ok_or_else(|| not_found(id))??;

    change.change_type = req.change_type.unwrap_or(match req.status {
        Some(PolicyStatus::Repealed) => ChangeType::Repeal,
        _ => ChangeType::Amendment,
    });
    if change.change_description.is_none() {
        change.change_description = Some(describe_update(&req));
    }
    state.policy_changes.insert(change.id, change.clone());

    state.persist(&policy).await?;
    state.persist(&change).await?;
    state.invalidate_caches();

    let reassessment = assessments::reassess_policy(&state, id, now).await?;
    tracing::info!(
        policy_id = %id,
        change_type = ?change.change_type,
        superseded = reassessment.superseded,
        "Policy amended"
    );
    Ok(Json(ApiResponse::ok(PolicyUpdateResult {
        policy,
        change,
        reassessment,
    })))
}

fn apply_update(policy: &mut Policy, req: &UpdatePolicyRequest) {
    if let Some(title) = &req.title {
        policy.title = title.trim().to_string();
    }
    if let Some(v) = &req.description {
        policy.description = Some(v.clone());
    }
    if let Some(status) = req.status {
        policy.status = status;
    }
    if let Some(d) = req.enacted_date {
        policy.enacted_date = Some(d);
    }
    if let Some(d) = req.effective_date {
        policy.effective_date = Some(d);
    }
    if let Some(d) = req.expiration_date {
        policy.expiration_date = Some(d);
    }
    if let Some(v) = &req.regulatory_body {
        policy.regulatory_body = Some(v.clone());
    }
    if let Some(v) = &req.content_summary {
        policy.content_summary = Some(v.clone());
    }
    if let Some(v) = req.estimated_impact {
        policy.estimated_impact = Some(v);
    }
    if let Some(v) = req.impact_confidence {
        policy.impact_confidence = Some(v);
    }
    if let Some(v) = &req.affected_industries {
        policy.affected_industries = v.clone();
    }
    if let Some(v) = req.category_id {
        policy.category_id = Some(v);
    }
}

fn describe_update(req: &UpdatePolicyRequest) -> String {
    let mut fields = Vec::new();
    let mut note = |set: bool, name: &'static str| {
        if set {
            fields.push(name);
        }
    };
    note(req.title.is_some(), "title");
    note(req.description.is_some(), "description");
    note(req.status.is_some(), "status");
    note(req.enacted_date.is_some(), "enacted_date");
    note(req.effective_date.is_some(), "effective_date");
    note(req.expiration_date.is_some(), "expiration_date");
    note(req.regulatory_body.is_some(), "regulatory_body");
    note(req.content_summary.is_some(), "content_summary");
    note(req.estimated_impact.is_some(), "estimated_impact");
    note(req.impact_confidence.is_some(), "impact_confidence");
    note(req.affected_industries.is_some(), "affected_industries");
    note(req.category_id.is_some(), "category_id");
    if fields.is_empty() {
        "no field changes".to_string()
    } else {
        format!("updated {}", fields.join(", "))
    }
}

/// GET /api/v1/policies/:id/changes — Change history, oldest first.
#[utoipa::path(
    get,
    path = "/api/v1/policies/{id}/changes",
    params(("id" = Uuid, Path, description = "Policy ID")),
    responses(
        (status = 200, description = "Change history (data)", body = Vec<PolicyChange>),
        (status = 404, description = "Not found", body = crate::error::ErrorBody),
    ),
    tag = "policies"
)]
async fn list_changes(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<Vec<PolicyChange>>>, AppError> {
    if !state.policies.contains(&id) {
        return Err(not_found(id));
    }
    let mut changes = state.policy_changes.filter(|c| c.policy_id == id);
    changes.sort_by_key(|c| (c.change_date, c.created_at, c.id));
    let total = changes.len().max(1) as u32;
    let pagination = Pagination {
        page: 1,
        per_page: total,
    };
    Ok(Json(ApiResponse::page(changes, pagination)))
}

/// GET /api/v1/policies/categories — List categories.
#[utoipa::path(
    get,
    path = "/api/v1/policies/categories",
    responses((status = 200, description = "Categories (data)", body = Vec<PolicyCategory>)),
    tag = "policies"
)]
async fn list_categories(State(state): State<AppState>) -> Json<ApiResponse<Vec<PolicyCategory>>> {
    let mut categories = state.categories.list();
    categories.sort_by(|a, b| a.name.cmp(&b.name));
    Json(ApiResponse::ok(categories))
}

/// POST /api/v1/policies/categories — Create a category.
#[utoipa::path(
    post,
    path = "/api/v1/policies/categories",
    request_body = CreateCategoryRequest,
    responses(
        (status = 201, description = "Category created (data)", body = PolicyCategory),
        (status = 409, description = "Duplicate name", body = crate::error::ErrorBody),
        (status = 422, description = "Validation error", body = crate::error::ErrorBody),
    ),
    tag = "policies"
)]
async fn create_category(
    State(state): State<AppState>,
    caller: CallerIdentity,
    body: Result<Json<CreateCategoryRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<ApiResponse<PolicyCategory>>), AppError> {
    require_role(&caller, Role::Analyst)?;
    let req = extract_validated_json(body)?;
    let name = req.name.trim().to_string();

    if let Some(parent) = req.parent_category_id {
        if !state.categories.contains(&parent) {
            return Err(AppError::Validation(format!(
                "parent category {parent} does not exist"
            )));
        }
    }

    let now = Utc::now();
    let category = PolicyCategory {
        id: Uuid::new_v4(),
        group: req.group.unwrap_or_else(|| CategoryGroup::classify(&name)),
        name,
        description: req.description,
        parent_category_id: req.parent_category_id,
        created_at: now,
        updated_at: now,
    };
    state
        .categories
        .insert_unless(category.id, category.clone(), |c, new| {
            c.name.eq_ignore_ascii_case(&new.name)
        })
        .map_err(|existing| {
            AppError::Conflict(format!("category '{}' already exists", existing.name))
        })?;
    state.persist(&category).await?;
    state.invalidate_caches();

    Ok((StatusCode::CREATED, Json(ApiResponse::ok(category))))
}

/// GET /api/v1/policies/analytics/summary — Registry statistics.
#[utoipa::path(
    get,
    path = "/api/v1/policies/analytics/summary",
    responses((status = 200, description = "Policy statistics (data)", body = PolicySummary)),
    tag = "policies"
)]
async fn policy_summary(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<serde_json::Value>>, AppError> {
    let summary = state
        .cache
        .get_or_compute("policies:summary".to_string(), || async {
            Ok::<_, AppError>(summarize(&state.policies.list()))
        })
        .await?;
    Ok(Json(ApiResponse::ok(summary)))
}

/// Registry statistics over `policies`.
pub fn summarize(policies: &[Policy]) -> PolicySummary {
    let mut by_status = BTreeMap::new();
    let mut by_type = BTreeMap::new();
    let mut by_jurisdiction = BTreeMap::new();
    let mut by_industry = BTreeMap::new();
    let mut impacts = Vec::new();

    for p in policies {
        *by_status.entry(p.status.as_str().to_string()).or_insert(0) += 1;
        *by_type.entry(p.policy_type.as_str().to_string()).or_insert(0) += 1;
        *by_jurisdiction
            .entry(p.jurisdiction.as_str().to_string())
            .or_insert(0) += 1;
        if p.affected_industries.is_empty() {
            *by_industry.entry("all".to_string()).or_insert(0) += 1;
        }
        for industry in &p.affected_industries {
            *by_industry.entry(industry.clone()).or_insert(0) += 1;
        }
        if let Some(i) = p.estimated_impact {
            impacts.push(i);
        }
    }

    let total: f64 = impacts.iter().sum();
    PolicySummary {
        total_policies: policies.len(),
        enacted_policies: policies.iter().filter(|p| p.status.is_in_force()).count(),
        proposed_policies: policies
            .iter()
            .filter(|p| matches!(p.status, PolicyStatus::Draft | PolicyStatus::Proposed))
            .count(),
        high_risk_policies: policies.iter().filter(|p| p.is_high_risk()).count(),
        average_impact: (!impacts.is_empty()).then(|| total / impacts.len() as f64),
        total_estimated_impact: total,
        by_status,
        by_type,
        by_jurisdiction,
        by_industry,
    }
}

/// GET /api/v1/policies/search — Text search.
#[utoipa::path(
    get,
    path = "/api/v1/policies/search",
    params(SearchQuery),
    responses(
        (status = 200, description = "Matching policies (data)", body = Vec<Policy>),
        (status = 422, description = "Missing query", body = crate::error::ErrorBody),
    ),
    tag = "policies"
)]
async fn search_policies(
    State(state): State<AppState>,
    query: Result<Query<SearchQuery>, QueryRejection>,
) -> Result<Json<ApiResponse<Vec<Policy>>>, AppError> {
    let q = extract_query(query)?;
    let pagination = Pagination::new(q.page, q.per_page).map_err(AppError::Validation)?;
    let needle = q.q.trim();
    let mut hits = state.policies.filter(|p| p.matches_text(needle));
    sort_newest_first(&mut hits);
    Ok(Json(ApiResponse::page(hits, pagination)))
}

/// GET /api/v1/policies/recent — Policies proposed within the last N days.
#[utoipa::path(
    get,
    path = "/api/v1/policies/recent",
    params(RecentQuery),
    responses(
        (status = 200, description = "Recent policies, newest first (data)", body = Vec<Policy>),
        (status = 422, description = "Invalid window", body = crate::error::ErrorBody),
    ),
    tag = "policies"
)]
async fn recent_policies(
    State(state): State<AppState>,
    query: Result<Query<RecentQuery>, QueryRejection>,
) -> Result<Json<ApiResponse<Vec<Policy>>>, AppError> {
    let q = extract_query(query)?;
    let cutoff = Utc::now() - Duration::days(q.days.unwrap_or(30));
    let mut recent = state
        .policies
        .filter(|p| p.proposed_date.is_some_and(|d| d >= cutoff));
    sort_newest_first(&mut recent);
    recent.truncate(q.limit.unwrap_or(DEFAULT_LIMIT));
    Ok(Json(ApiResponse::ok(recent)))
}

/// GET /api/v1/policies/high-risk — Large expected costs or unreliable estimates.
#[utoipa::path(
    get,
    path = "/api/v1/policies/high-risk",
    params(LimitQuery),
    responses(
        (
            status = 200,
            description = "High-risk policies, most negative impact first (data)",
            body = Vec<Policy>
        ),
    ),
    tag = "policies"
)]
async fn high_risk_policies(
    State(state): State<AppState>,
    query: Result<Query<LimitQuery>, QueryRejection>,
) -> Result<Json<ApiResponse<Vec<Policy>>>, AppError> {
    let q = extract_query(query)?;
    let mut risky = state.policies.filter(Policy::is_high_risk);
    risky.sort_by(|a, b| {
        let ia = a.estimated_impact.unwrap_or(f64::INFINITY);
        let ib = b.estimated_impact.unwrap_or(f64::INFINITY);
        ia.total_cmp(&ib)
            .then_with(|| a.policy_number.cmp(&b.policy_number))
    });
    risky.truncate(q.limit.unwrap_or(DEFAULT_LIMIT));
    Ok(Json(ApiResponse::ok(risky)))
}
