//! DTOs de vehículos
//!
//! Requests y responses de la API de vehículos.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::models::vehicle::{Vehicle, VehicleStatus};

/// Request para registrar un nuevo vehículo
#[derive(Debug, Deserialize, Validate)]
pub struct CreateVehicleRequest {
    #[validate(length(min = 2, max = 100))]
    pub model: String,

    #[validate(length(min = 4, max = 20))]
    pub plate: String,

    #[validate(range(min = 1, max = 60))]
    pub seats: i32,

    pub rate_per_day: Decimal,
}

/// Request para actualizar un vehículo existente
///
/// El estado de disponibilidad no es actualizable por aquí: solo el
/// orquestador de reservas lo escribe.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateVehicleRequest {
    #[validate(length(min = 2, max = 100))]
    pub model: Option<String>,

    #[validate(length(min = 4, max = 20))]
    pub plate: Option<String>,

    #[validate(range(min = 1, max = 60))]
    pub seats: Option<i32>,

    pub rate_per_day: Option<Decimal>,
}

/// Response de vehículo para la API
#[derive(Debug, Serialize)]
pub struct VehicleResponse {
    pub id: Uuid,
    pub agency_id: Uuid,
    pub model: String,
    pub plate: String,
    pub seats: i32,
    pub rate_per_day: Decimal,
    pub status: VehicleStatus,
    pub created_at: DateTime<Utc>,
}

impl From<Vehicle> for VehicleResponse {
    fn from(vehicle: Vehicle) -> Self {
        Self {
            id: vehicle.id,
            agency_id: vehicle.agency_id,
            model: vehicle.model,
            plate: vehicle.plate,
            seats: vehicle.seats,
            rate_per_day: vehicle.rate_per_day,
            status: vehicle.status,
            created_at: vehicle.created_at,
        }
    }
}
