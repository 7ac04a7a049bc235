use axum::{
    extract::{Path, Query, State},
    middleware,
    routing::{get, post},
    Extension, Json, Router,
};
use uuid::Uuid;

use crate::controllers::booking_controller::BookingController;
use crate::dto::booking_dto::{
    AvailabilityQuery, AvailabilityResponse, BookingResponse, PaginationQuery, ReserveRequest,
};
use crate::dto::ApiResponse;
use crate::middleware::auth::{auth_middleware, AuthenticatedActor};
use crate::state::AppState;
use crate::utils::errors::AppError;

pub fn create_booking_router(state: AppState) -> Router<AppState> {
    // Preview de disponibilidad: lectura pública, sin transacción
    let public = Router::new().route("/availability", get(check_availability));

    let protected = Router::new()
        .route("/", post(reserve_booking))
        .route("/my", get(list_my_bookings))
        .route("/agency", get(list_agency_bookings))
        .route("/:id", get(get_booking))
        .route("/:id/cancel", post(cancel_booking))
        .route("/:id/complete", post(complete_booking))
        .route_layer(middleware::from_fn_with_state(state, auth_middleware));

    public.merge(protected)
}

async fn reserve_booking(
    State(state): State<AppState>,
    Extension(actor): Extension<AuthenticatedActor>,
    Json(request): Json<ReserveRequest>,
) -> Result<Json<ApiResponse<BookingResponse>>, AppError> {
    let customer_id = actor.require_customer()?;
    let controller = BookingController::new(state.pool.clone());
    let booking = controller.reserve(customer_id, request).await?;
    let message = format!("Car booked successfully! Booking ID: #{}", booking.id);
    Ok(Json(ApiResponse::success_with_message(booking.into(), message)))
}

async fn cancel_booking(
    State(state): State<AppState>,
    Extension(actor): Extension<AuthenticatedActor>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<BookingResponse>>, AppError> {
    let customer_id = actor.require_customer()?;
    let controller = BookingController::new(state.pool.clone());
    let booking = controller.cancel(id, customer_id).await?;
    Ok(Json(ApiResponse::success_with_message(
        booking.into(),
        "Booking cancelled successfully".to_string(),
    )))
}

async fn complete_booking(
    State(state): State<AppState>,
    Extension(actor): Extension<AuthenticatedActor>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<BookingResponse>>, AppError> {
    let agency_id = actor.require_agency()?;
    let controller = BookingController::new(state.pool.clone());
    let booking = controller.complete(id, agency_id).await?;
    Ok(Json(ApiResponse::success_with_message(
        booking.into(),
        "Booking marked as completed".to_string(),
    )))
}

async fn check_availability(
    State(state): State<AppState>,
    Query(query): Query<AvailabilityQuery>,
) -> Result<Json<AvailabilityResponse>, AppError> {
    let controller = BookingController::new(state.pool.clone());
    let response = controller.check_availability(query).await?;
    Ok(Json(response))
}

async fn get_booking(
    State(state): State<AppState>,
    Extension(actor): Extension<AuthenticatedActor>,
    Path(id): Path<Uuid>,
) -> Result<Json<BookingResponse>, AppError> {
    let controller = BookingController::new(state.pool.clone());
    let booking = controller.get_by_id(id, &actor).await?;
    Ok(Json(booking.into()))
}

async fn list_my_bookings(
    State(state): State<AppState>,
    Extension(actor): Extension<AuthenticatedActor>,
    Query(page): Query<PaginationQuery>,
) -> Result<Json<Vec<BookingResponse>>, AppError> {
    let customer_id = actor.require_customer()?;
    let controller = BookingController::new(state.pool.clone());
    let bookings = controller
        .list_for_customer(customer_id, page.limit(), page.offset())
        .await?;
    Ok(Json(bookings.into_iter().map(Into::into).collect()))
}

async fn list_agency_bookings(
    State(state): State<AppState>,
    Extension(actor): Extension<AuthenticatedActor>,
    Query(page): Query<PaginationQuery>,
) -> Result<Json<Vec<BookingResponse>>, AppError> {
    let agency_id = actor.require_agency()?;
    let controller = BookingController::new(state.pool.clone());
    let bookings = controller
        .list_for_agency(agency_id, page.limit(), page.offset())
        .await?;
    Ok(Json(bookings.into_iter().map(Into::into).collect()))
}
