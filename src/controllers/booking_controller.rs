//! Booking Orchestrator
//!
//! Coordina Vehicle Registry + Reservation Ledger dentro de transacciones
//! atómicas para reservar, cancelar y completar. Máquina de estados por
//! reserva: active → completed | cancelled (terminales).
//!
//! Propiedad de corrección central: el chequeo de disponibilidad y el
//! INSERT ocurren dentro de la misma transacción, con el row lock del
//! vehículo (`FOR UPDATE`) tomado primero. Dos `reserve` concurrentes
//! sobre el mismo vehículo se serializan en ese lock: exactamente uno
//! puede pasar el chequeo y commitear. El rollback es estructural:
//! soltar la `Transaction` de sqlx sin commit revierte ambas escrituras.

use chrono::NaiveDate;
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use crate::dto::booking_dto::{AvailabilityQuery, AvailabilityResponse, ReserveRequest};
use crate::middleware::auth::{ActorRole, AuthenticatedActor};
use crate::models::booking::{
    rental_amount, rental_end_date, today_utc, Booking, BookingStatus, NewBooking,
};
use crate::models::vehicle::VehicleStatus;
use crate::repositories::booking_repository::{BookingRepository, Party};
use crate::repositories::vehicle_repository::VehicleRepository;
use crate::utils::errors::{validation_error, AppError};

pub struct BookingController {
    pool: PgPool,
    bookings: BookingRepository,
    vehicles: VehicleRepository,
}

impl BookingController {
    pub fn new(pool: PgPool) -> Self {
        Self {
            bookings: BookingRepository::new(pool.clone()),
            vehicles: VehicleRepository::new(pool.clone()),
            pool,
        }
    }

    /// Crear una reserva para el cliente autenticado.
    ///
    /// Las validaciones de entrada se reportan antes de abrir la
    /// transacción y nunca tocan el storage.
    pub async fn reserve(
        &self,
        customer_id: Uuid,
        request: ReserveRequest,
    ) -> Result<Booking, AppError> {
        request.validate()?;
        validate_start_date(request.start_date)?;

        // Lectura rápida fuera de transacción: NotFound / no disponible
        // se responden sin abrir una transacción. El estado se vuelve a
        // verificar bajo lock.
        let vehicle = self
            .vehicles
            .find_by_id(request.vehicle_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Vehicle not found".to_string()))?;

        if !vehicle.is_available() {
            return Err(AppError::Unavailable(
                "Vehicle is not available for booking".to_string(),
            ));
        }

        let mut tx = self.pool.begin().await?;

        // Punto de serialización por vehículo
        let vehicle = VehicleRepository::find_by_id_for_update(&mut tx, request.vehicle_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Vehicle not found".to_string()))?;

        if vehicle.status != VehicleStatus::Available {
            return Err(AppError::Unavailable(
                "Vehicle is not available for booking".to_string(),
            ));
        }

        let end_date = rental_end_date(request.start_date, request.rental_days);
        let total_amount = rental_amount(vehicle.rate_per_day, request.rental_days);

        if !BookingRepository::is_available_on(
            &mut tx,
            vehicle.id,
            request.start_date,
            end_date,
        )
        .await?
        {
            return Err(AppError::Conflict(
                "Vehicle is already booked for the selected dates".to_string(),
            ));
        }

        let booking = BookingRepository::create(
            &mut tx,
            NewBooking {
                customer_id,
                vehicle_id: vehicle.id,
                agency_id: vehicle.agency_id,
                start_date: request.start_date,
                end_date,
                rental_days: request.rental_days,
                total_amount,
            },
        )
        .await?;

        VehicleRepository::set_status(&mut tx, vehicle.id, VehicleStatus::Rented).await?;

        tx.commit().await?;

        info!(
            booking_id = %booking.id,
            vehicle_id = %booking.vehicle_id,
            "Reserva creada: {} -> {} ({} días)",
            booking.start_date,
            booking.end_date,
            booking.rental_days
        );

        Ok(booking)
    }

    /// Cancelar una reserva activa del cliente. active → cancelled.
    pub async fn cancel(&self, booking_id: Uuid, customer_id: Uuid) -> Result<Booking, AppError> {
        let mut tx = self.pool.begin().await?;

        let booking = BookingRepository::find_by_id_for_update(&mut tx, booking_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Booking not found".to_string()))?;

        if booking.customer_id != customer_id {
            return Err(AppError::Forbidden(
                "Booking does not belong to this customer".to_string(),
            ));
        }

        let changed = BookingRepository::transition_status(
            &mut tx,
            booking_id,
            BookingStatus::Active,
            BookingStatus::Cancelled,
            Party::Customer(customer_id),
        )
        .await?;

        // Propiedad ya verificada: un no-op aquí significa estado terminal
        if !changed {
            return Err(AppError::InvalidState(
                "Booking is not active and cannot be cancelled".to_string(),
            ));
        }

        VehicleRepository::set_status(&mut tx, booking.vehicle_id, VehicleStatus::Available)
            .await?;

        tx.commit().await?;

        info!(booking_id = %booking_id, "Reserva cancelada");

        Ok(Booking {
            status: BookingStatus::Cancelled,
            ..booking
        })
    }

    /// Completar una reserva activa; restringido a la agencia dueña.
    /// active → completed.
    pub async fn complete(&self, booking_id: Uuid, agency_id: Uuid) -> Result<Booking, AppError> {
        let mut tx = self.pool.begin().await?;

        let booking = BookingRepository::find_by_id_for_update(&mut tx, booking_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Booking not found".to_string()))?;

        if booking.agency_id != agency_id {
            return Err(AppError::Forbidden(
                "Booking does not belong to this agency".to_string(),
            ));
        }

        let changed = BookingRepository::transition_status(
            &mut tx,
            booking_id,
            BookingStatus::Active,
            BookingStatus::Completed,
            Party::Agency(agency_id),
        )
        .await?;

        if !changed {
            return Err(AppError::InvalidState(
                "Booking is not active and cannot be completed".to_string(),
            ));
        }

        VehicleRepository::set_status(&mut tx, booking.vehicle_id, VehicleStatus::Available)
            .await?;

        tx.commit().await?;

        info!(booking_id = %booking_id, "Reserva completada");

        Ok(Booking {
            status: BookingStatus::Completed,
            ..booking
        })
    }

    /// Preview de disponibilidad de solo lectura (sin transacción)
    pub async fn check_availability(
        &self,
        query: AvailabilityQuery,
    ) -> Result<AvailabilityResponse, AppError> {
        query.validate()?;

        self.vehicles
            .find_by_id(query.vehicle_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Vehicle not found".to_string()))?;

        let end_date = rental_end_date(query.start_date, query.rental_days);
        let available = self
            .bookings
            .is_available(query.vehicle_id, query.start_date, end_date)
            .await?;

        Ok(AvailabilityResponse {
            vehicle_id: query.vehicle_id,
            start_date: query.start_date,
            end_date,
            available,
        })
    }

    /// Detalle de una reserva; solo las partes involucradas pueden leerla
    pub async fn get_by_id(
        &self,
        booking_id: Uuid,
        actor: &AuthenticatedActor,
    ) -> Result<Booking, AppError> {
        let booking = self
            .bookings
            .find_by_id(booking_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Booking not found".to_string()))?;

        let is_party = match actor.role {
            ActorRole::Customer => booking.customer_id == actor.actor_id,
            ActorRole::Agency => booking.agency_id == actor.actor_id,
        };

        if !is_party {
            return Err(AppError::Forbidden(
                "You are not a party to this booking".to_string(),
            ));
        }

        Ok(booking)
    }

    pub async fn list_for_customer(
        &self,
        customer_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Booking>, AppError> {
        self.bookings
            .list_for_customer(customer_id, limit, offset)
            .await
    }

    pub async fn list_for_agency(
        &self,
        agency_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Booking>, AppError> {
        self.bookings.list_for_agency(agency_id, limit, offset).await
    }
}

/// La fecha de inicio no puede estar en el pasado (día calendario UTC)
fn validate_start_date(start: NaiveDate) -> Result<(), AppError> {
    if start < today_utc() {
        return Err(validation_error("start_date", "Start date cannot be in the past"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_start_date_today_is_valid() {
        assert!(validate_start_date(today_utc()).is_ok());
    }

    #[test]
    fn test_start_date_in_the_past_is_rejected() {
        let yesterday = today_utc() - Duration::days(1);
        assert!(matches!(
            validate_start_date(yesterday),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn test_reserve_request_day_bounds() {
        let base = ReserveRequest {
            vehicle_id: Uuid::new_v4(),
            start_date: today_utc(),
            rental_days: 1,
        };
        assert!(base.validate().is_ok());

        let zero_days = ReserveRequest { rental_days: 0, ..base };
        assert!(zero_days.validate().is_err());

        let too_long = ReserveRequest { rental_days: 91, ..base };
        assert!(too_long.validate().is_err());

        let max_allowed = ReserveRequest { rental_days: 90, ..base };
        assert!(max_allowed.validate().is_ok());
    }
}
