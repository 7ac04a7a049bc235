//! Vehicle Registry
//!
//! Este módulo es el dueño de los registros de vehículos y de su flag de
//! disponibilidad. Las escrituras de estado (`set_status`) solo pueden
//! ejecutarse dentro de una transacción del orquestador que ya tenga el
//! row lock del vehículo (`find_by_id_for_update`).

use chrono::Utc;
use rust_decimal::Decimal;
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::models::vehicle::{Vehicle, VehicleStatus};
use crate::utils::errors::AppError;

pub struct VehicleRepository {
    pool: PgPool,
}

impl VehicleRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(
        &self,
        agency_id: Uuid,
        model: String,
        plate: String,
        seats: i32,
        rate_per_day: Decimal,
    ) -> Result<Vehicle, AppError> {
        let vehicle = sqlx::query_as::<_, Vehicle>(
            r#"
            INSERT INTO vehicles (id, agency_id, model, plate, seats, rate_per_day, status, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, 'available', $7)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(agency_id)
        .bind(model)
        .bind(plate)
        .bind(seats)
        .bind(rate_per_day)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;

        Ok(vehicle)
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Vehicle>, AppError> {
        let vehicle = sqlx::query_as::<_, Vehicle>("SELECT * FROM vehicles WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(vehicle)
    }

    /// Cargar el vehículo con row lock (`FOR UPDATE`) dentro de la
    /// transacción del orquestador. Este lock es el punto de serialización
    /// de todas las transiciones del mismo vehículo.
    pub async fn find_by_id_for_update(
        conn: &mut PgConnection,
        id: Uuid,
    ) -> Result<Option<Vehicle>, AppError> {
        let vehicle =
            sqlx::query_as::<_, Vehicle>("SELECT * FROM vehicles WHERE id = $1 FOR UPDATE")
                .bind(id)
                .fetch_optional(conn)
                .await?;

        Ok(vehicle)
    }

    /// Escritura incondicional del flag de disponibilidad. Invariante: el
    /// caller ya posee el lock de la fila dentro de la misma transacción.
    pub async fn set_status(
        conn: &mut PgConnection,
        id: Uuid,
        status: VehicleStatus,
    ) -> Result<(), AppError> {
        sqlx::query("UPDATE vehicles SET status = $2 WHERE id = $1")
            .bind(id)
            .bind(status)
            .execute(conn)
            .await?;

        Ok(())
    }

    pub async fn owned_by(&self, id: Uuid, agency_id: Uuid) -> Result<bool, AppError> {
        let result: (bool,) = sqlx::query_as(
            "SELECT EXISTS(SELECT 1 FROM vehicles WHERE id = $1 AND agency_id = $2)",
        )
        .bind(id)
        .bind(agency_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(result.0)
    }

    /// Chequeo de unicidad de matrícula; `excluding` permite excluir el
    /// propio registro en flujos de edición.
    pub async fn plate_exists(
        &self,
        plate: &str,
        excluding: Option<Uuid>,
    ) -> Result<bool, AppError> {
        let result: (bool,) = sqlx::query_as(
            "SELECT EXISTS(SELECT 1 FROM vehicles WHERE plate = $1 AND ($2::uuid IS NULL OR id != $2))",
        )
        .bind(plate)
        .bind(excluding)
        .fetch_one(&self.pool)
        .await?;

        Ok(result.0)
    }

    pub async fn update(
        &self,
        id: Uuid,
        model: Option<String>,
        plate: Option<String>,
        seats: Option<i32>,
        rate_per_day: Option<Decimal>,
    ) -> Result<Vehicle, AppError> {
        let current = self
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Vehicle not found".to_string()))?;

        let vehicle = sqlx::query_as::<_, Vehicle>(
            r#"
            UPDATE vehicles
            SET model = $2, plate = $3, seats = $4, rate_per_day = $5
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(model.unwrap_or(current.model))
        .bind(plate.unwrap_or(current.plate))
        .bind(seats.unwrap_or(current.seats))
        .bind(rate_per_day.unwrap_or(current.rate_per_day))
        .fetch_one(&self.pool)
        .await?;

        Ok(vehicle)
    }

    pub async fn delete(&self, id: Uuid) -> Result<(), AppError> {
        sqlx::query("DELETE FROM vehicles WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    pub async fn list_available(&self) -> Result<Vec<Vehicle>, AppError> {
        let vehicles = sqlx::query_as::<_, Vehicle>(
            "SELECT * FROM vehicles WHERE status = 'available' ORDER BY created_at DESC",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(vehicles)
    }

    pub async fn list_by_agency(&self, agency_id: Uuid) -> Result<Vec<Vehicle>, AppError> {
        let vehicles = sqlx::query_as::<_, Vehicle>(
            "SELECT * FROM vehicles WHERE agency_id = $1 ORDER BY created_at DESC",
        )
        .bind(agency_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(vehicles)
    }
}
