use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};

use super::intake::{
    city_suggestions, AgeGroup, EmploymentType, IncomeBand, MAX_LOAN_AMOUNT, MIN_LOAN_AMOUNT,
};
use super::kyc::FieldSnapshot;
use super::status::{SessionStatusResolver, StatusView};
use crate::backend::{ApplicationStore, AuthProvider};
use crate::error::AppError;
use crate::identity::IdentityField;

/// Router builder exposing the read-only funnel endpoints.
pub fn funnel_router<A, S>(resolver: Arc<SessionStatusResolver<A, S>>) -> Router
where
    A: AuthProvider + 'static,
    S: ApplicationStore + 'static,
{
    Router::new()
        .route("/api/v1/funnel/route", get(route_handler::<A, S>))
        .route("/api/v1/loan/status", get(status_handler::<A, S>))
        .route("/api/v1/kyc/check", post(kyc_check_handler))
        .route("/api/v1/intake/options", get(intake_options_handler))
        .route("/api/v1/intake/cities", get(city_suggestions_handler))
        .with_state(resolver)
}

pub(crate) async fn route_handler<A, S>(
    State(resolver): State<Arc<SessionStatusResolver<A, S>>>,
) -> Result<Json<Value>, AppError>
where
    A: AuthProvider + 'static,
    S: ApplicationStore + 'static,
{
    let resolution = resolver.resolve().await?;
    Ok(Json(json!({
        "resolution": resolution.label(),
        "route": resolution.initial_route().path(),
    })))
}

pub(crate) async fn status_handler<A, S>(
    State(resolver): State<Arc<SessionStatusResolver<A, S>>>,
) -> Result<Json<StatusView>, AppError>
where
    A: AuthProvider + 'static,
    S: ApplicationStore + 'static,
{
    let view = resolver.status_view().await?;
    Ok(Json(view))
}

#[derive(Debug, Deserialize)]
pub(crate) struct KycCheckRequest {
    #[serde(default)]
    pan: String,
    #[serde(default)]
    aadhaar: String,
}

pub(crate) async fn kyc_check_handler(Json(request): Json<KycCheckRequest>) -> Response {
    let pan = FieldSnapshot::capture(IdentityField::Pan, &request.pan);
    let aadhaar = FieldSnapshot::capture(IdentityField::Aadhaar, &request.aadhaar);
    let payload = json!({
        "complete": pan.is_valid() && aadhaar.is_valid(),
        "pan": pan,
        "aadhaar": aadhaar,
    });
    (StatusCode::OK, Json(payload)).into_response()
}

pub(crate) async fn intake_options_handler() -> Response {
    fn labels<T: Copy>(all: &[T], label: fn(T) -> &'static str) -> Vec<&'static str> {
        all.iter().copied().map(label).collect()
    }

    let payload = json!({
        "loan_amount": { "min": MIN_LOAN_AMOUNT, "max": MAX_LOAN_AMOUNT },
        "employment_types": labels(EmploymentType::ALL, EmploymentType::label),
        "income_bands": labels(IncomeBand::ALL, IncomeBand::label),
        "age_groups": labels(AgeGroup::ALL, AgeGroup::label),
    });
    (StatusCode::OK, Json(payload)).into_response()
}

#[derive(Debug, Deserialize)]
pub(crate) struct CityQuery {
    #[serde(default)]
    q: String,
}

pub(crate) async fn city_suggestions_handler(Query(query): Query<CityQuery>) -> Response {
    let payload = json!({ "cities": city_suggestions(&query.q) });
    (StatusCode::OK, Json(payload)).into_response()
}
