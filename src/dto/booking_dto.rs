//! DTOs de reservas
//!
//! Requests y responses de la API de reservas.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::models::booking::{Booking, BookingStatus};

/// Request para crear una reserva
#[derive(Debug, Deserialize, Validate)]
pub struct ReserveRequest {
    pub vehicle_id: Uuid,

    pub start_date: NaiveDate,

    #[validate(range(min = 1, max = 90))]
    pub rental_days: i32,
}

/// Query de consulta de disponibilidad (preview de solo lectura)
#[derive(Debug, Deserialize, Validate)]
pub struct AvailabilityQuery {
    pub vehicle_id: Uuid,

    pub start_date: NaiveDate,

    #[validate(range(min = 1, max = 90))]
    pub rental_days: i32,
}

/// Response de disponibilidad
#[derive(Debug, Serialize)]
pub struct AvailabilityResponse {
    pub vehicle_id: Uuid,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub available: bool,
}

/// Parámetros de paginación para listados (newest-first)
#[derive(Debug, Deserialize)]
pub struct PaginationQuery {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl PaginationQuery {
    const DEFAULT_LIMIT: i64 = 50;
    const MAX_LIMIT: i64 = 200;

    pub fn limit(&self) -> i64 {
        self.limit
            .unwrap_or(Self::DEFAULT_LIMIT)
            .clamp(1, Self::MAX_LIMIT)
    }

    pub fn offset(&self) -> i64 {
        self.offset.unwrap_or(0).max(0)
    }
}

/// Response de reserva para la API
#[derive(Debug, Serialize)]
pub struct BookingResponse {
    pub id: Uuid,
    pub customer_id: Uuid,
    pub vehicle_id: Uuid,
    pub agency_id: Uuid,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub rental_days: i32,
    pub total_amount: Decimal,
    pub status: BookingStatus,
    pub created_at: DateTime<Utc>,
}

impl From<Booking> for BookingResponse {
    fn from(booking: Booking) -> Self {
        Self {
            id: booking.id,
            customer_id: booking.customer_id,
            vehicle_id: booking.vehicle_id,
            agency_id: booking.agency_id,
            start_date: booking.start_date,
            end_date: booking.end_date,
            rental_days: booking.rental_days,
            total_amount: booking.total_amount,
            status: booking.status,
            created_at: booking.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pagination_defaults() {
        let q = PaginationQuery {
            limit: None,
            offset: None,
        };
        assert_eq!(q.limit(), 50);
        assert_eq!(q.offset(), 0);
    }

    #[test]
    fn test_pagination_is_clamped() {
        let q = PaginationQuery {
            limit: Some(10_000),
            offset: Some(-3),
        };
        assert_eq!(q.limit(), 200);
        assert_eq!(q.offset(), 0);
    }
}
