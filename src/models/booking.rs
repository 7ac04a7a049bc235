//! Modelo de Booking
//!
//! Este módulo contiene el struct Booking, el enum de estados del ciclo
//! de vida de una reserva y la aritmética de rangos de fechas sobre la
//! que se apoya la detección de solapamientos.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use uuid::Uuid;

/// Límite de política: una reserva nunca puede superar los 90 días
pub const MAX_RENTAL_DAYS: i32 = 90;

/// Estado de la reserva - mapea al ENUM booking_status
///
/// Transiciones permitidas: active → completed, active → cancelled.
/// Los estados terminales nunca vuelven a transicionar.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Type, PartialEq, Eq)]
#[sqlx(type_name = "booking_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    Active,
    Completed,
    Cancelled,
}

impl BookingStatus {
    /// Solo las reservas activas bloquean fechas y admiten transiciones
    pub fn is_terminal(&self) -> bool {
        !matches!(self, BookingStatus::Active)
    }
}

/// Booking principal - mapea exactamente a la tabla bookings
///
/// `agency_id` se desnormaliza desde el vehículo al momento de reservar y
/// `total_amount` queda congelado: cambios posteriores de tarifa no lo alteran.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Booking {
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

/// Datos de una reserva nueva, calculados por el orquestador antes del INSERT
#[derive(Debug, Clone)]
pub struct NewBooking {
    pub customer_id: Uuid,
    pub vehicle_id: Uuid,
    pub agency_id: Uuid,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub rental_days: i32,
    pub total_amount: Decimal,
}

/// Predicado clásico de solapamiento de intervalos cerrados:
/// `a_start <= b_end && a_end >= b_start`. Ambos extremos son inclusivos,
/// por lo que cubre simétricamente los cuatro casos (A empieza dentro de B,
/// A termina dentro de B, A contiene a B, B contiene a A).
pub fn dates_overlap(
    a_start: NaiveDate,
    a_end: NaiveDate,
    b_start: NaiveDate,
    b_end: NaiveDate,
) -> bool {
    a_start <= b_end && a_end >= b_start
}

/// Fecha final inclusiva de una renta: start + days - 1
pub fn rental_end_date(start: NaiveDate, days: i32) -> NaiveDate {
    start + Duration::days(i64::from(days) - 1)
}

/// Importe total congelado al momento de reservar: tarifa × días
pub fn rental_amount(rate_per_day: Decimal, days: i32) -> Decimal {
    rate_per_day * Decimal::from(days)
}

/// Fecha calendario "hoy" en UTC, usada para rechazar inicios en el pasado
pub fn today_utc() -> NaiveDate {
    Utc::now().date_naive()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn test_overlap_new_range_starts_inside_existing() {
        assert!(dates_overlap(
            d("2024-06-02"),
            d("2024-06-05"),
            d("2024-06-01"),
            d("2024-06-03"),
        ));
    }

    #[test]
    fn test_overlap_new_range_ends_inside_existing() {
        assert!(dates_overlap(
            d("2024-05-30"),
            d("2024-06-01"),
            d("2024-06-01"),
            d("2024-06-03"),
        ));
    }

    #[test]
    fn test_overlap_new_range_contains_existing() {
        assert!(dates_overlap(
            d("2024-05-30"),
            d("2024-06-10"),
            d("2024-06-01"),
            d("2024-06-03"),
        ));
    }

    #[test]
    fn test_overlap_existing_contains_new_range() {
        assert!(dates_overlap(
            d("2024-06-02"),
            d("2024-06-02"),
            d("2024-06-01"),
            d("2024-06-03"),
        ));
    }

    #[test]
    fn test_overlap_single_shared_boundary_day() {
        // Extremos inclusivos: compartir un solo día ya es conflicto
        assert!(dates_overlap(
            d("2024-06-03"),
            d("2024-06-05"),
            d("2024-06-01"),
            d("2024-06-03"),
        ));
        assert!(dates_overlap(
            d("2024-05-28"),
            d("2024-06-01"),
            d("2024-06-01"),
            d("2024-06-03"),
        ));
    }

    #[test]
    fn test_no_overlap_adjacent_ranges() {
        assert!(!dates_overlap(
            d("2024-06-04"),
            d("2024-06-06"),
            d("2024-06-01"),
            d("2024-06-03"),
        ));
        assert!(!dates_overlap(
            d("2024-05-28"),
            d("2024-05-31"),
            d("2024-06-01"),
            d("2024-06-03"),
        ));
    }

    #[test]
    fn test_overlap_exhaustive_small_grid() {
        // Verifica el predicado contra la definición día a día sobre una
        // cuadrícula pequeña de intervalos
        let base = d("2024-06-01");
        for a_start in 0..8i64 {
            for a_len in 0..5i64 {
                for b_start in 0..8i64 {
                    for b_len in 0..5i64 {
                        let a0 = base + Duration::days(a_start);
                        let a1 = a0 + Duration::days(a_len);
                        let b0 = base + Duration::days(b_start);
                        let b1 = b0 + Duration::days(b_len);

                        let expected = (0..=a_len)
                            .map(|i| a0 + Duration::days(i))
                            .any(|day| day >= b0 && day <= b1);

                        assert_eq!(
                            dates_overlap(a0, a1, b0, b1),
                            expected,
                            "a=[{}, {}] b=[{}, {}]",
                            a0,
                            a1,
                            b0,
                            b1
                        );
                    }
                }
            }
        }
    }

    #[test]
    fn test_rental_end_date_is_inclusive() {
        assert_eq!(rental_end_date(d("2024-06-01"), 3), d("2024-06-03"));
        assert_eq!(rental_end_date(d("2024-06-01"), 1), d("2024-06-01"));
    }

    #[test]
    fn test_rental_end_date_crosses_month_boundary() {
        assert_eq!(rental_end_date(d("2024-06-29"), 5), d("2024-07-03"));
    }

    #[test]
    fn test_rental_amount() {
        assert_eq!(rental_amount(Decimal::new(5000, 2), 3), Decimal::new(15000, 2));
        assert_eq!(rental_amount(Decimal::new(4999, 2), 2), Decimal::new(9998, 2));
    }

    #[test]
    fn test_booking_status_terminality() {
        assert!(!BookingStatus::Active.is_terminal());
        assert!(BookingStatus::Completed.is_terminal());
        assert!(BookingStatus::Cancelled.is_terminal());
    }
}
