//! Modelo de Vehicle
//!
//! Este módulo contiene el struct Vehicle y su enum de disponibilidad.
//! Mapea exactamente al schema PostgreSQL con primary key 'id'.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use uuid::Uuid;

/// Estado de disponibilidad del vehículo - mapea al ENUM vehicle_status
///
/// Es un flag derivado que cachea "tiene una reserva activa ahora mismo".
/// Solo el orquestador de reservas lo escribe, siempre dentro de la misma
/// transacción que el cambio de estado de la reserva correspondiente.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Type, PartialEq, Eq)]
#[sqlx(type_name = "vehicle_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum VehicleStatus {
    Available,
    Rented,
}

/// Vehicle principal - mapea exactamente a la tabla vehicles
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Vehicle {
    pub id: Uuid,
    pub agency_id: Uuid,
    pub model: String,
    pub plate: String,
    pub seats: i32,
    pub rate_per_day: Decimal,
    pub status: VehicleStatus,
    pub created_at: DateTime<Utc>,
}

impl Vehicle {
    pub fn is_available(&self) -> bool {
        self.status == VehicleStatus::Available
    }
}
