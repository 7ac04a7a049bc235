//! Reservation Ledger
//!
//! Este módulo es el dueño de los registros de reservas, de su estado y
//! del algoritmo de detección de solapamientos. `transition_status` es la
//! única vía de mutación de estado de una reserva: no existen escrituras
//! directas en ningún otro lugar.

use chrono::{NaiveDate, Utc};
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::models::booking::{Booking, BookingStatus, NewBooking};
use crate::utils::errors::AppError;

/// Restricción de propiedad para una transición de estado: el cliente
/// cancela sus reservas, la agencia completa las suyas.
#[derive(Debug, Clone, Copy)]
pub enum Party {
    Customer(Uuid),
    Agency(Uuid),
}

pub struct BookingRepository {
    pool: PgPool,
}

impl BookingRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Determinar si el rango [start, end] está libre de reservas activas
    /// para el vehículo. Predicado simétrico de solapamiento de intervalos
    /// cerrados (`start_date <= $end AND end_date >= $start`); las reservas
    /// completadas o canceladas nunca bloquean.
    ///
    /// Debe ejecutarse sobre la conexión de la transacción del orquestador
    /// cuando precede a un INSERT; el preview de solo lectura usa
    /// [`BookingRepository::is_available`].
    pub async fn is_available_on(
        conn: &mut PgConnection,
        vehicle_id: Uuid,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<bool, AppError> {
        let result: (bool,) = sqlx::query_as(
            r#"
            SELECT NOT EXISTS(
                SELECT 1 FROM bookings
                WHERE vehicle_id = $1
                  AND status = 'active'
                  AND start_date <= $3
                  AND end_date >= $2
            )
            "#,
        )
        .bind(vehicle_id)
        .bind(start)
        .bind(end)
        .fetch_one(conn)
        .await?;

        Ok(result.0)
    }

    /// Preview de disponibilidad de solo lectura, fuera de transacción
    pub async fn is_available(
        &self,
        vehicle_id: Uuid,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<bool, AppError> {
        let mut conn = self.pool.acquire().await?;
        Self::is_available_on(&mut conn, vehicle_id, start, end).await
    }

    /// Insertar una reserva con status 'active'. Solo debe llamarse después
    /// de que `is_available_on` haya pasado dentro de la misma transacción.
    pub async fn create(conn: &mut PgConnection, data: NewBooking) -> Result<Booking, AppError> {
        let booking = sqlx::query_as::<_, Booking>(
            r#"
            INSERT INTO bookings
                (id, customer_id, vehicle_id, agency_id, start_date, end_date, rental_days, total_amount, status, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, 'active', $9)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(data.customer_id)
        .bind(data.vehicle_id)
        .bind(data.agency_id)
        .bind(data.start_date)
        .bind(data.end_date)
        .bind(data.rental_days)
        .bind(data.total_amount)
        .bind(Utc::now())
        .fetch_one(conn)
        .await?;

        Ok(booking)
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Booking>, AppError> {
        let booking = sqlx::query_as::<_, Booking>("SELECT * FROM bookings WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(booking)
    }

    /// Cargar la reserva con row lock para cancel/complete
    pub async fn find_by_id_for_update(
        conn: &mut PgConnection,
        id: Uuid,
    ) -> Result<Option<Booking>, AppError> {
        let booking =
            sqlx::query_as::<_, Booking>("SELECT * FROM bookings WHERE id = $1 FOR UPDATE")
                .bind(id)
                .fetch_optional(conn)
                .await?;

        Ok(booking)
    }

    /// Update condicional de estado: no-op (devuelve false) si la reserva
    /// no existe, no pertenece a la parte que restringe o no está en el
    /// estado esperado.
    pub async fn transition_status(
        conn: &mut PgConnection,
        booking_id: Uuid,
        expected: BookingStatus,
        new_status: BookingStatus,
        constraint: Party,
    ) -> Result<bool, AppError> {
        let result = match constraint {
            Party::Customer(customer_id) => {
                sqlx::query(
                    "UPDATE bookings SET status = $2 WHERE id = $1 AND status = $3 AND customer_id = $4",
                )
                .bind(booking_id)
                .bind(new_status)
                .bind(expected)
                .bind(customer_id)
                .execute(conn)
                .await?
            }
            Party::Agency(agency_id) => {
                sqlx::query(
                    "UPDATE bookings SET status = $2 WHERE id = $1 AND status = $3 AND agency_id = $4",
                )
                .bind(booking_id)
                .bind(new_status)
                .bind(expected)
                .bind(agency_id)
                .execute(conn)
                .await?
            }
        };

        Ok(result.rows_affected() == 1)
    }

    pub async fn list_for_customer(
        &self,
        customer_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Booking>, AppError> {
        let bookings = sqlx::query_as::<_, Booking>(
            r#"
            SELECT * FROM bookings
            WHERE customer_id = $1
            ORDER BY created_at DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(customer_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        Ok(bookings)
    }

    pub async fn list_for_agency(
        &self,
        agency_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Booking>, AppError> {
        let bookings = sqlx::query_as::<_, Booking>(
            r#"
            SELECT * FROM bookings
            WHERE agency_id = $1
            ORDER BY created_at DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(agency_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        Ok(bookings)
    }

    /// Cantidad de reservas activas del vehículo (soporte de invariantes)
    pub async fn active_count_for_vehicle(&self, vehicle_id: Uuid) -> Result<i64, AppError> {
        let result: (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM bookings WHERE vehicle_id = $1 AND status = 'active'",
        )
        .bind(vehicle_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(result.0)
    }

    /// Si el vehículo tiene cualquier reserva (activa o histórica); usado
    /// por la política de borrado de vehículos.
    pub async fn exists_for_vehicle(&self, vehicle_id: Uuid) -> Result<bool, AppError> {
        let result: (bool,) =
            sqlx::query_as("SELECT EXISTS(SELECT 1 FROM bookings WHERE vehicle_id = $1)")
                .bind(vehicle_id)
                .fetch_one(&self.pool)
                .await?;

        Ok(result.0)
    }
}
