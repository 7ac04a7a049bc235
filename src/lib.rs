//! Backend de reservas de vehículos de renta
//!
//! El núcleo del sistema es el ciclo de vida de las reservas y la máquina
//! de estados de disponibilidad de cada vehículo: decidir si una solicitud
//! puede proceder, transicionar el vehículo de forma atómica y evitar que
//! dos clientes reserven fechas solapadas del mismo vehículo.

pub mod config;
pub mod controllers;
pub mod dto;
pub mod middleware;
pub mod models;
pub mod repositories;
pub mod routes;
pub mod state;
pub mod utils;

use axum::Router;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use crate::middleware::cors::cors_middleware;
use crate::state::AppState;

/// Construir el router completo de la API
pub fn create_app(state: AppState) -> Router {
    Router::new()
        .nest(
            "/api/vehicle",
            routes::vehicle_routes::create_vehicle_router(state.clone()),
        )
        .nest(
            "/api/booking",
            routes::booking_routes::create_booking_router(state.clone()),
        )
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors_middleware()),
        )
        .with_state(state)
}
