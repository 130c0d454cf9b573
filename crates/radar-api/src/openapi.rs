//! # OpenAPI Specification Assembly
//!
//! Assembles all utoipa-documented routes into a single OpenAPI spec,
//! served at `/openapi.json`.

use axum::routing::get;
use axum::{Json, Router};
use utoipa::OpenApi;

use crate::state::AppState;

/// Assembled OpenAPI spec for the entire API surface.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "PolicyRadar API",
        version = "1.0.0",
        description = "Policy impact assessment and prediction: policy and company \
                       registries, impact assessments, forecasts, market data, analytics, \
                       dashboard and reports.",
        license(name = "BUSL-1.1")
    ),
    paths(
        // Service
        crate::routes::health::banner,
        crate::routes::health::health,
        // Policies
        crate::routes::policies::list_policies,
        crate::routes::policies::create_policy,
        crate::routes::policies::get_policy,
        crate::routes::policies::update_policy,
        crate::routes::policies::list_changes,
        crate::routes::policies::list_categories,
        crate::routes::policies::create_category,
        crate::routes::policies::policy_summary,
        crate::routes::policies::search_policies,
        crate::routes::policies::recent_policies,
        crate::routes::policies::high_risk_policies,
        // Companies
        crate::routes::companies::list_companies,
        crate::routes::companies::create_company,
        crate::routes::companies::get_company,
        crate::routes::companies::update_company,
        crate::routes::companies::get_profile,
        crate::routes::companies::put_profile,
        crate::routes::companies::list_metrics,
        crate::routes::companies::append_metrics,
        // Impacts
        crate::routes::impacts::list_impacts,
        crate::routes::impacts::get_impact,
        crate::routes::impacts::impact_history,
        crate::routes::impacts::assess,
        crate::routes::impacts::assess_policy,
        // Predictions
        crate::routes::predictions::list_predictions,
        crate::routes::predictions::get_prediction,
        crate::routes::predictions::generate_prediction,
        crate::routes::predictions::record_outcome,
        crate::routes::predictions::list_models,
        crate::routes::predictions::model_performance,
        // Market data
        crate::routes::market::list_market_data,
        crate::routes::market::append_market_data,
        crate::routes::market::list_indicators,
        crate::routes::market::append_indicator,
        crate::routes::market::list_trade_flows,
        crate::routes::market::append_trade_flow,
        // Analytics
        crate::routes::analytics::scenario_analysis,
        crate::routes::analytics::trends,
        crate::routes::analytics::risk_analysis,
        // Dashboard
        crate::routes::dashboard::summary,
        // Reports
        crate::routes::reports::generate_report,
        crate::routes::reports::get_report,
    ),
    components(schemas(
        // Domain records
        radar_core::Policy,
        radar_core::PolicyCategory,
        radar_core::PolicyChange,
        radar_core::PolicyType,
        radar_core::PolicyStatus,
        radar_core::ChangeType,
        radar_core::CategoryGroup,
        radar_core::JurisdictionCode,
        radar_core::Company,
        radar_core::CompanyProfile,
        radar_core::RiskTolerance,
        radar_core::FinancialMetrics,
        radar_core::ImpactAssessment,
        radar_core::ImpactDirection,
        radar_core::RiskLevel,
        radar_core::RiskFactorScore,
        radar_core::Scenario,
        radar_core::AssessmentStatus,
        radar_core::AssessmentPeriod,
        radar_core::Prediction,
        radar_core::PredictionType,
        radar_core::PredictionStatus,
        radar_core::PredictionModel,
        radar_core::ModelType,
        radar_core::ForecastPoint,
        radar_core::PredictionOutcome,
        radar_core::MarketData,
        radar_core::EconomicIndicator,
        radar_core::Frequency,
        radar_core::TradeFlow,
        radar_core::TradeType,
        radar_forecast::ModelPerformance,
        // Service records
        crate::state::ReportRecord,
        crate::envelope::PageMeta,
        crate::assessments::RecordedAssessment,
        crate::assessments::BatchSummary,
        crate::routes::health::HealthStatus,
        crate::routes::health::ServiceBanner,
        // Error types
        crate::error::ErrorBody,
        crate::error::ErrorDetail,
        // Policy DTOs
        crate::routes::policies::CreatePolicyRequest,
        crate::routes::policies::UpdatePolicyRequest,
        crate::routes::policies::PolicyUpdateResult,
        crate::routes::policies::CreateCategoryRequest,
        crate::routes::policies::PolicySummary,
        // Company DTOs
        crate::routes::companies::CreateCompanyRequest,
        crate::routes::companies::UpdateCompanyRequest,
        crate::routes::companies::ProfileRequest,
        crate::routes::companies::FinancialMetricsRequest,
        // Impact DTOs
        crate::routes::impacts::AssessRequest,
        crate::routes::impacts::AssessPolicyRequest,
        // Prediction DTOs
        crate::routes::predictions::GeneratePredictionRequest,
        crate::routes::predictions::RecordOutcomeRequest,
        // Market DTOs
        crate::routes::market::MarketDataRequest,
        crate::routes::market::IndicatorRequest,
        crate::routes::market::TradeFlowRequest,
        // Analytics DTOs
        crate::routes::analytics::ScenarioRequest,
        crate::routes::analytics::CompanyScenarioImpact,
        crate::routes::analytics::ScenarioOutcome,
        crate::routes::analytics::ScenarioAnalysis,
        crate::routes::analytics::PolicyTrends,
        crate::routes::analytics::ImpactTrends,
        crate::routes::analytics::RiskTrends,
        crate::routes::analytics::TrendsReport,
        crate::routes::analytics::RiskGroup,
        crate::routes::analytics::RiskExposure,
        crate::routes::analytics::RiskAnalysis,
        // Dashboard DTOs
        crate::routes::dashboard::DashboardAlert,
        crate::routes::dashboard::DashboardSummary,
        // Report DTOs
        crate::routes::reports::ReportType,
        crate::routes::reports::ReportFormat,
        crate::routes::reports::GenerateReportRequest,
    )),
    tags(
        (name = "health", description = "Service banner and health"),
        (name = "policies", description = "Policy registry, categories and change history"),
        (name = "companies", description = "Company registry, profiles and financial metrics"),
        (name = "impacts", description = "Impact assessments"),
        (name = "predictions", description = "Forecasts, outcomes and the model registry"),
        (name = "market", description = "Market data, economic indicators and trade flows"),
        (name = "analytics", description = "Scenario, trend and risk analytics"),
        (name = "dashboard", description = "Dashboard summary"),
        (name = "reports", description = "Report generation"),
    )
)]
pub struct ApiDoc;

/// Build the OpenAPI router.
pub fn router() -> Router<AppState> {
    Router::new().route("/openapi.json", get(openapi_json))
}

/// GET /openapi.json — Return the generated OpenAPI specification.
async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spec_lists_every_surface() {
        let spec = ApiDoc::openapi();
        for path in [
            "/api/v1/policies",
            "/api/v1/companies/{id}/profile",
            "/api/v1/impacts/assess",
            "/api/v1/predictions/generate",
            "/api/v1/market-data/economic-indicators",
            "/api/v1/market-data/trade-flows",
            "/api/v1/analytics/scenario",
            "/api/v1/dashboard/summary",
            "/api/v1/reports/{id}",
        ] {
            assert!(spec.paths.paths.contains_key(path), "missing {path}");
        }
    }
}
