use axum::{
    extract::{Path, State},
    middleware,
    routing::{delete, get, post, put},
    Extension, Json, Router,
};
use uuid::Uuid;

use crate::controllers::vehicle_controller::VehicleController;
use crate::dto::vehicle_dto::{CreateVehicleRequest, UpdateVehicleRequest, VehicleResponse};
use crate::dto::ApiResponse;
use crate::middleware::auth::{auth_middleware, AuthenticatedActor};
use crate::state::AppState;
use crate::utils::errors::AppError;

pub fn create_vehicle_router(state: AppState) -> Router<AppState> {
    // Navegación pública: cualquiera puede ver la flota disponible
    let public = Router::new()
        .route("/", get(list_available_vehicles))
        .route("/:id", get(get_vehicle));

    // Mutaciones y flota propia: solo agencias autenticadas
    let protected = Router::new()
        .route("/", post(create_vehicle))
        .route("/mine", get(list_agency_vehicles))
        .route("/:id", put(update_vehicle))
        .route("/:id", delete(delete_vehicle))
        .route_layer(middleware::from_fn_with_state(state, auth_middleware));

    public.merge(protected)
}

async fn create_vehicle(
    State(state): State<AppState>,
    Extension(actor): Extension<AuthenticatedActor>,
    Json(request): Json<CreateVehicleRequest>,
) -> Result<Json<ApiResponse<VehicleResponse>>, AppError> {
    let agency_id = actor.require_agency()?;
    let controller = VehicleController::new(state.pool.clone());
    let vehicle = controller.create(agency_id, request).await?;
    Ok(Json(ApiResponse::success_with_message(
        vehicle.into(),
        "Vehículo creado exitosamente".to_string(),
    )))
}

async fn get_vehicle(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<VehicleResponse>, AppError> {
    let controller = VehicleController::new(state.pool.clone());
    let vehicle = controller.get_by_id(id).await?;
    Ok(Json(vehicle.into()))
}

async fn list_available_vehicles(
    State(state): State<AppState>,
) -> Result<Json<Vec<VehicleResponse>>, AppError> {
    let controller = VehicleController::new(state.pool.clone());
    let vehicles = controller.list_available().await?;
    Ok(Json(vehicles.into_iter().map(Into::into).collect()))
}

async fn list_agency_vehicles(
    State(state): State<AppState>,
    Extension(actor): Extension<AuthenticatedActor>,
) -> Result<Json<Vec<VehicleResponse>>, AppError> {
    let agency_id = actor.require_agency()?;
    let controller = VehicleController::new(state.pool.clone());
    let vehicles = controller.list_by_agency(agency_id).await?;
    Ok(Json(vehicles.into_iter().map(Into::into).collect()))
}

async fn update_vehicle(
    State(state): State<AppState>,
    Extension(actor): Extension<AuthenticatedActor>,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateVehicleRequest>,
) -> Result<Json<ApiResponse<VehicleResponse>>, AppError> {
    let agency_id = actor.require_agency()?;
    let controller = VehicleController::new(state.pool.clone());
    let vehicle = controller.update(id, agency_id, request).await?;
    Ok(Json(ApiResponse::success_with_message(
        vehicle.into(),
        "Vehículo actualizado exitosamente".to_string(),
    )))
}

async fn delete_vehicle(
    State(state): State<AppState>,
    Extension(actor): Extension<AuthenticatedActor>,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, AppError> {
    let agency_id = actor.require_agency()?;
    let controller = VehicleController::new(state.pool.clone());
    controller.delete(id, agency_id).await?;
    Ok(Json(serde_json::json!({
        "success": true,
        "message": "Vehículo eliminado exitosamente"
    })))
}
