//! Controller de vehículos
//!
//! CRUD de la flota de cada agencia. El estado de disponibilidad nunca se
//! escribe por aquí: pertenece al orquestador de reservas.

use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use crate::dto::vehicle_dto::{CreateVehicleRequest, UpdateVehicleRequest};
use crate::models::vehicle::Vehicle;
use crate::repositories::booking_repository::BookingRepository;
use crate::repositories::vehicle_repository::VehicleRepository;
use crate::utils::errors::{conflict_error, validation_error, AppError};
use crate::utils::validation::{validate_license_plate, validate_positive};

pub struct VehicleController {
    vehicles: VehicleRepository,
    bookings: BookingRepository,
}

impl VehicleController {
    pub fn new(pool: PgPool) -> Self {
        Self {
            vehicles: VehicleRepository::new(pool.clone()),
            bookings: BookingRepository::new(pool),
        }
    }

    pub async fn create(
        &self,
        agency_id: Uuid,
        request: CreateVehicleRequest,
    ) -> Result<Vehicle, AppError> {
        request.validate()?;

        let plate = request.plate.trim().to_uppercase();
        validate_license_plate(&plate)
            .map_err(|_| validation_error("plate", "Invalid license plate format"))?;
        validate_positive(request.rate_per_day)
            .map_err(|_| validation_error("rate_per_day", "Rate per day must be positive"))?;

        if self.vehicles.plate_exists(&plate, None).await? {
            return Err(conflict_error("Vehicle", "plate", &plate));
        }

        let vehicle = self
            .vehicles
            .create(
                agency_id,
                request.model,
                plate,
                request.seats,
                request.rate_per_day,
            )
            .await?;

        info!(vehicle_id = %vehicle.id, "Vehículo registrado: {}", vehicle.plate);

        Ok(vehicle)
    }

    pub async fn get_by_id(&self, id: Uuid) -> Result<Vehicle, AppError> {
        self.vehicles
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Vehicle not found".to_string()))
    }

    pub async fn list_available(&self) -> Result<Vec<Vehicle>, AppError> {
        self.vehicles.list_available().await
    }

    pub async fn list_by_agency(&self, agency_id: Uuid) -> Result<Vec<Vehicle>, AppError> {
        self.vehicles.list_by_agency(agency_id).await
    }

    pub async fn update(
        &self,
        id: Uuid,
        agency_id: Uuid,
        request: UpdateVehicleRequest,
    ) -> Result<Vehicle, AppError> {
        request.validate()?;

        self.require_ownership(id, agency_id).await?;

        let plate = match request.plate {
            Some(p) => {
                let plate = p.trim().to_uppercase();
                validate_license_plate(&plate)
                    .map_err(|_| validation_error("plate", "Invalid license plate format"))?;
                // Unicidad excluyendo el propio registro
                if self.vehicles.plate_exists(&plate, Some(id)).await? {
                    return Err(conflict_error("Vehicle", "plate", &plate));
                }
                Some(plate)
            }
            None => None,
        };

        if let Some(rate) = request.rate_per_day {
            validate_positive(rate)
                .map_err(|_| validation_error("rate_per_day", "Rate per day must be positive"))?;
        }

        self.vehicles
            .update(id, request.model, plate, request.seats, request.rate_per_day)
            .await
    }

    /// Eliminar un vehículo. Rechazado mientras cualquier reserva (activa
    /// o histórica) lo referencie: el historial de reservas nunca queda
    /// huérfano.
    pub async fn delete(&self, id: Uuid, agency_id: Uuid) -> Result<(), AppError> {
        self.require_ownership(id, agency_id).await?;

        if self.bookings.exists_for_vehicle(id).await? {
            return Err(AppError::Conflict(
                "Vehicle has bookings and cannot be deleted".to_string(),
            ));
        }

        self.vehicles.delete(id).await?;

        info!(vehicle_id = %id, "Vehículo eliminado");

        Ok(())
    }

    async fn require_ownership(&self, id: Uuid, agency_id: Uuid) -> Result<(), AppError> {
        self.vehicles
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Vehicle not found".to_string()))?;

        if !self.vehicles.owned_by(id, agency_id).await? {
            return Err(AppError::Forbidden(
                "Vehicle does not belong to this agency".to_string(),
            ));
        }

        Ok(())
    }
}
