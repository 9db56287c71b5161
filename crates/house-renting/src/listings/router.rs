use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use tracing::error;

use super::catalogue::{HouseCatalogueService, HouseServiceError};
use super::domain::HouseId;
use super::form::HouseForm;
use super::principal::Principal;
use super::query::AllHousesQuery;
use super::rental::RentalError;
use super::repository::{AgentDirectory, HouseRepository};
use crate::categories::CategoryRepository;

pub const GENERAL_ERROR_MESSAGE: &str =
    "Unexpected error occurred. Please try again later or contact administrator.";

type SharedService<H, D, C> = Arc<HouseCatalogueService<H, D, C>>;

/// Router builder exposing the listing, rental, and category endpoints.
pub fn house_router<H, D, C>(service: SharedService<H, D, C>) -> Router
where
    H: HouseRepository + 'static,
    D: AgentDirectory + 'static,
    C: CategoryRepository + 'static,
{
    Router::new()
        .route(
            "/api/v1/houses",
            get(all_handler::<H, D, C>).post(add_handler::<H, D, C>),
        )
        .route("/api/v1/houses/mine", get(mine_handler::<H, D, C>))
        .route(
            "/api/v1/houses/:house_id",
            get(details_handler::<H, D, C>)
                .put(edit_handler::<H, D, C>)
                .delete(delete_handler::<H, D, C>),
        )
        .route(
            "/api/v1/houses/:house_id/edit",
            get(edit_form_handler::<H, D, C>),
        )
        .route(
            "/api/v1/houses/:house_id/rent",
            post(rent_handler::<H, D, C>),
        )
        .route(
            "/api/v1/houses/:house_id/leave",
            post(leave_handler::<H, D, C>),
        )
        .route("/api/v1/categories", get(categories_handler::<H, D, C>))
        .route(
            "/api/v1/categories/names",
            get(category_names_handler::<H, D, C>),
        )
        .with_state(service)
}

pub(crate) async fn all_handler<H, D, C>(
    State(service): State<SharedService<H, D, C>>,
    Query(query): Query<AllHousesQuery>,
) -> Response
where
    H: HouseRepository + 'static,
    D: AgentDirectory + 'static,
    C: CategoryRepository + 'static,
{
    match service.all(&query) {
        Ok(page) => (StatusCode::OK, Json(page)).into_response(),
        Err(err) => service_error_response(err),
    }
}

pub(crate) async fn mine_handler<H, D, C>(
    State(service): State<SharedService<H, D, C>>,
    headers: HeaderMap,
) -> Response
where
    H: HouseRepository + 'static,
    D: AgentDirectory + 'static,
    C: CategoryRepository + 'static,
{
    let principal = match authenticated(&headers) {
        Ok(principal) => principal,
        Err(response) => return response,
    };

    match service.mine(&principal) {
        Ok(houses) => (StatusCode::OK, Json(houses)).into_response(),
        Err(err) => service_error_response(err),
    }
}

pub(crate) async fn add_handler<H, D, C>(
    State(service): State<SharedService<H, D, C>>,
    headers: HeaderMap,
    Json(form): Json<HouseForm>,
) -> Response
where
    H: HouseRepository + 'static,
    D: AgentDirectory + 'static,
    C: CategoryRepository + 'static,
{
    let principal = match authenticated(&headers) {
        Ok(principal) => principal,
        Err(response) => return response,
    };

    match service.add(&principal, &form) {
        Ok(house_id) => (StatusCode::CREATED, Json(json!({ "id": house_id }))).into_response(),
        Err(err) => service_error_response(err),
    }
}

pub(crate) async fn details_handler<H, D, C>(
    State(service): State<SharedService<H, D, C>>,
    Path(house_id): Path<String>,
) -> Response
where
    H: HouseRepository + 'static,
    D: AgentDirectory + 'static,
    C: CategoryRepository + 'static,
{
    let Some(house_id) = HouseId::parse(&house_id) else {
        return rental_error_response(RentalError::NotFound);
    };

    match service.details(&house_id) {
        Ok(details) => (StatusCode::OK, Json(details)).into_response(),
        Err(err) => service_error_response(err),
    }
}

pub(crate) async fn edit_form_handler<H, D, C>(
    State(service): State<SharedService<H, D, C>>,
    headers: HeaderMap,
    Path(house_id): Path<String>,
) -> Response
where
    H: HouseRepository + 'static,
    D: AgentDirectory + 'static,
    C: CategoryRepository + 'static,
{
    let (principal, house_id) = match caller_and_house(&headers, &house_id) {
        Ok(parts) => parts,
        Err(response) => return response,
    };

    let form = match service.edit_form(&principal, &house_id) {
        Ok(form) => form,
        Err(err) => return service_error_response(err),
    };

    match service.categories().all_categories() {
        Ok(categories) => (
            StatusCode::OK,
            Json(json!({ "form": form, "categories": categories })),
        )
            .into_response(),
        Err(err) => service_error_response(err.into()),
    }
}

pub(crate) async fn edit_handler<H, D, C>(
    State(service): State<SharedService<H, D, C>>,
    headers: HeaderMap,
    Path(house_id): Path<String>,
    Json(form): Json<HouseForm>,
) -> Response
where
    H: HouseRepository + 'static,
    D: AgentDirectory + 'static,
    C: CategoryRepository + 'static,
{
    let (principal, house_id) = match caller_and_house(&headers, &house_id) {
        Ok(parts) => parts,
        Err(response) => return response,
    };

    match service.edit(&principal, &house_id, &form) {
        Ok(details) => (StatusCode::OK, Json(details)).into_response(),
        Err(err) => service_error_response(err),
    }
}

pub(crate) async fn delete_handler<H, D, C>(
    State(service): State<SharedService<H, D, C>>,
    headers: HeaderMap,
    Path(house_id): Path<String>,
) -> Response
where
    H: HouseRepository + 'static,
    D: AgentDirectory + 'static,
    C: CategoryRepository + 'static,
{
    let (principal, house_id) = match caller_and_house(&headers, &house_id) {
        Ok(parts) => parts,
        Err(response) => return response,
    };

    match service.delete(&principal, &house_id) {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => service_error_response(err),
    }
}

pub(crate) async fn rent_handler<H, D, C>(
    State(service): State<SharedService<H, D, C>>,
    headers: HeaderMap,
    Path(house_id): Path<String>,
) -> Response
where
    H: HouseRepository + 'static,
    D: AgentDirectory + 'static,
    C: CategoryRepository + 'static,
{
    let (principal, house_id) = match caller_and_house(&headers, &house_id) {
        Ok(parts) => parts,
        Err(response) => return response,
    };

    match service.rentals().rent(&house_id, &principal) {
        Ok(house) => (StatusCode::OK, Json(house.summary())).into_response(),
        Err(err) => rental_error_response(err),
    }
}

pub(crate) async fn leave_handler<H, D, C>(
    State(service): State<SharedService<H, D, C>>,
    headers: HeaderMap,
    Path(house_id): Path<String>,
) -> Response
where
    H: HouseRepository + 'static,
    D: AgentDirectory + 'static,
    C: CategoryRepository + 'static,
{
    let (principal, house_id) = match caller_and_house(&headers, &house_id) {
        Ok(parts) => parts,
        Err(response) => return response,
    };

    match service.rentals().leave(&house_id, &principal) {
        Ok(house) => (StatusCode::OK, Json(house.summary())).into_response(),
        Err(err) => rental_error_response(err),
    }
}

pub(crate) async fn categories_handler<H, D, C>(
    State(service): State<SharedService<H, D, C>>,
) -> Response
where
    H: HouseRepository + 'static,
    D: AgentDirectory + 'static,
    C: CategoryRepository + 'static,
{
    match service.categories().all_categories() {
        Ok(categories) => (StatusCode::OK, Json(categories)).into_response(),
        Err(err) => service_error_response(err.into()),
    }
}

pub(crate) async fn category_names_handler<H, D, C>(
    State(service): State<SharedService<H, D, C>>,
) -> Response
where
    H: HouseRepository + 'static,
    D: AgentDirectory + 'static,
    C: CategoryRepository + 'static,
{
    match service.categories().all_category_names() {
        Ok(names) => (StatusCode::OK, Json(names)).into_response(),
        Err(err) => service_error_response(err.into()),
    }
}

fn authenticated(headers: &HeaderMap) -> Result<Principal, Response> {
    Principal::from_headers(headers).ok_or_else(|| {
        let payload = json!({ "error": "authentication required" });
        (StatusCode::UNAUTHORIZED, Json(payload)).into_response()
    })
}

fn caller_and_house(headers: &HeaderMap, raw_id: &str) -> Result<(Principal, HouseId), Response> {
    let principal = authenticated(headers)?;
    let house_id =
        HouseId::parse(raw_id).ok_or_else(|| rental_error_response(RentalError::NotFound))?;
    Ok((principal, house_id))
}

pub(crate) fn service_error_response(err: HouseServiceError) -> Response {
    match err {
        HouseServiceError::Validation(errors) => {
            let payload = json!({ "errors": errors });
            (StatusCode::UNPROCESSABLE_ENTITY, Json(payload)).into_response()
        }
        HouseServiceError::Rental(err) => rental_error_response(err),
    }
}

pub(crate) fn rental_error_response(err: RentalError) -> Response {
    let (status, message) = match &err {
        RentalError::NotFound => (StatusCode::NOT_FOUND, err.to_string()),
        RentalError::Forbidden(reason) => (StatusCode::FORBIDDEN, reason.message().to_string()),
        RentalError::Conflict(reason) => (StatusCode::CONFLICT, reason.message().to_string()),
        RentalError::Persistence(source) => {
            error!(error = %source, "house persistence failure");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                GENERAL_ERROR_MESSAGE.to_string(),
            )
        }
    };

    (status, Json(json!({ "error": message }))).into_response()
}
