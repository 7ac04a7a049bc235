//! Tests de integración del ciclo de vida de reservas contra PostgreSQL.
//!
//! Requieren una base de datos accesible vía DATABASE_URL, por lo que van
//! marcados con #[ignore]:
//!
//! ```text
//! DATABASE_URL=postgres://... cargo test -- --ignored
//! ```

use chrono::{Duration, NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use uuid::Uuid;

use rental_booking::controllers::booking_controller::BookingController;
use rental_booking::controllers::vehicle_controller::VehicleController;
use rental_booking::dto::booking_dto::{AvailabilityQuery, ReserveRequest};
use rental_booking::models::booking::BookingStatus;
use rental_booking::models::vehicle::{Vehicle, VehicleStatus};
use rental_booking::repositories::booking_repository::BookingRepository;
use rental_booking::repositories::vehicle_repository::VehicleRepository;
use rental_booking::utils::errors::AppError;

async fn setup_pool() -> PgPool {
    dotenvy::dotenv().ok();
    let url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set for these tests");
    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(&url)
        .await
        .expect("failed to connect to test database");
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("failed to run migrations");
    pool
}

fn start_in(days: i64) -> NaiveDate {
    Utc::now().date_naive() + Duration::days(days)
}

fn random_plate() -> String {
    let raw = Uuid::new_v4().simple().to_string().to_uppercase();
    format!("T-{}", &raw[..8])
}

async fn create_vehicle(pool: &PgPool, rate: Decimal) -> Vehicle {
    VehicleRepository::new(pool.clone())
        .create(Uuid::new_v4(), "Toyota Corolla".to_string(), random_plate(), 5, rate)
        .await
        .expect("failed to create vehicle")
}

fn reserve_request(vehicle_id: Uuid, start: NaiveDate, days: i32) -> ReserveRequest {
    ReserveRequest {
        vehicle_id,
        start_date: start,
        rental_days: days,
    }
}

#[tokio::test]
#[ignore = "requires PostgreSQL (DATABASE_URL)"]
async fn test_reserve_happy_path_marks_vehicle_rented() {
    let pool = setup_pool().await;
    let controller = BookingController::new(pool.clone());
    let vehicle = create_vehicle(&pool, Decimal::new(5000, 2)).await;
    let customer = Uuid::new_v4();

    let start = start_in(30);
    let booking = controller
        .reserve(customer, reserve_request(vehicle.id, start, 3))
        .await
        .expect("reserve should succeed");

    assert_eq!(booking.customer_id, customer);
    assert_eq!(booking.agency_id, vehicle.agency_id);
    assert_eq!(booking.start_date, start);
    assert_eq!(booking.end_date, start + Duration::days(2));
    assert_eq!(booking.rental_days, 3);
    assert_eq!(booking.total_amount, Decimal::new(15000, 2));
    assert_eq!(booking.status, BookingStatus::Active);

    let vehicle = VehicleRepository::new(pool.clone())
        .find_by_id(vehicle.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(vehicle.status, VehicleStatus::Rented);
}

#[tokio::test]
#[ignore = "requires PostgreSQL (DATABASE_URL)"]
async fn test_overlapping_reserve_is_rejected_without_partial_writes() {
    let pool = setup_pool().await;
    let controller = BookingController::new(pool.clone());
    let vehicle = create_vehicle(&pool, Decimal::new(5000, 2)).await;

    let start = start_in(30);
    controller
        .reserve(Uuid::new_v4(), reserve_request(vehicle.id, start, 3))
        .await
        .expect("first reserve should succeed");

    // Simular la ventana en la que el flag cacheado quedó 'available'
    // pero la reserva activa existe: el predicado de solapamiento es el
    // que debe rechazar
    sqlx::query("UPDATE vehicles SET status = 'available' WHERE id = $1")
        .bind(vehicle.id)
        .execute(&pool)
        .await
        .unwrap();

    let other_customer = Uuid::new_v4();
    let result = controller
        .reserve(other_customer, reserve_request(vehicle.id, start + Duration::days(1), 2))
        .await;
    assert!(matches!(result, Err(AppError::Conflict(_))));

    // Rollback total: el intento fallido no dejó ninguna fila
    let rows = BookingRepository::new(pool.clone())
        .list_for_customer(other_customer, 10, 0)
        .await
        .unwrap();
    assert!(rows.is_empty());
}

#[tokio::test]
#[ignore = "requires PostgreSQL (DATABASE_URL)"]
async fn test_concurrent_reserves_exactly_one_wins() {
    let pool = setup_pool().await;
    let vehicle = create_vehicle(&pool, Decimal::new(5000, 2)).await;
    let start = start_in(30);

    let pool_a = pool.clone();
    let pool_b = pool.clone();
    let vehicle_id = vehicle.id;

    let task_a = tokio::spawn(async move {
        BookingController::new(pool_a)
            .reserve(Uuid::new_v4(), reserve_request(vehicle_id, start, 3))
            .await
    });
    let task_b = tokio::spawn(async move {
        BookingController::new(pool_b)
            .reserve(Uuid::new_v4(), reserve_request(vehicle_id, start + Duration::days(1), 3))
            .await
    });

    let (result_a, result_b) = (task_a.await.unwrap(), task_b.await.unwrap());

    let successes = [&result_a, &result_b].iter().filter(|r| r.is_ok()).count();
    assert_eq!(successes, 1, "exactly one concurrent reserve must win");

    let loser = if result_a.is_ok() { result_b } else { result_a };
    assert!(matches!(
        loser,
        Err(AppError::Conflict(_)) | Err(AppError::Unavailable(_))
    ));

    // Estado final: vehículo rentado con exactamente una reserva activa
    let active = BookingRepository::new(pool.clone())
        .active_count_for_vehicle(vehicle.id)
        .await
        .unwrap();
    assert_eq!(active, 1);

    let vehicle = VehicleRepository::new(pool.clone())
        .find_by_id(vehicle.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(vehicle.status, VehicleStatus::Rented);
}

#[tokio::test]
#[ignore = "requires PostgreSQL (DATABASE_URL)"]
async fn test_aborted_transaction_discards_booking_insert() {
    use rental_booking::models::booking::{rental_amount, rental_end_date, NewBooking};

    let pool = setup_pool().await;
    let vehicle = create_vehicle(&pool, Decimal::new(5000, 2)).await;
    let start = start_in(30);

    // Insertar la reserva y abortar antes de la escritura de estado del
    // vehículo: soltar la transacción sin commit debe revertir el INSERT
    let mut tx = pool.begin().await.unwrap();
    let booking = BookingRepository::create(
        &mut tx,
        NewBooking {
            customer_id: Uuid::new_v4(),
            vehicle_id: vehicle.id,
            agency_id: vehicle.agency_id,
            start_date: start,
            end_date: rental_end_date(start, 3),
            rental_days: 3,
            total_amount: rental_amount(Decimal::new(5000, 2), 3),
        },
    )
    .await
    .unwrap();
    drop(tx);

    let bookings = BookingRepository::new(pool.clone());
    assert!(bookings.find_by_id(booking.id).await.unwrap().is_none());
    assert_eq!(bookings.active_count_for_vehicle(vehicle.id).await.unwrap(), 0);

    // Sin reserva activa, el vehículo sigue disponible: no hay estado parcial
    let reloaded = VehicleRepository::new(pool.clone())
        .find_by_id(vehicle.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(reloaded.status, VehicleStatus::Available);
}

#[tokio::test]
#[ignore = "requires PostgreSQL (DATABASE_URL)"]
async fn test_cancel_twice_second_call_gets_invalid_state() {
    let pool = setup_pool().await;
    let controller = BookingController::new(pool.clone());
    let vehicle = create_vehicle(&pool, Decimal::new(5000, 2)).await;
    let customer = Uuid::new_v4();

    let booking = controller
        .reserve(customer, reserve_request(vehicle.id, start_in(30), 3))
        .await
        .unwrap();

    let cancelled = controller.cancel(booking.id, customer).await.unwrap();
    assert_eq!(cancelled.status, BookingStatus::Cancelled);

    let vehicles = VehicleRepository::new(pool.clone());
    let reloaded = vehicles.find_by_id(vehicle.id).await.unwrap().unwrap();
    assert_eq!(reloaded.status, VehicleStatus::Available);

    // Otro cliente toma el vehículo entre medio
    let rebooked = controller
        .reserve(Uuid::new_v4(), reserve_request(vehicle.id, start_in(30), 3))
        .await
        .unwrap();

    // Segunda cancelación: InvalidState, y NO debe volver a liberar el
    // vehículo que ya fue re-reservado
    let second = controller.cancel(booking.id, customer).await;
    assert!(matches!(second, Err(AppError::InvalidState(_))));

    let reloaded = vehicles.find_by_id(vehicle.id).await.unwrap().unwrap();
    assert_eq!(reloaded.status, VehicleStatus::Rented);
    assert_eq!(rebooked.status, BookingStatus::Active);
}

#[tokio::test]
#[ignore = "requires PostgreSQL (DATABASE_URL)"]
async fn test_total_amount_is_frozen_across_rate_changes() {
    let pool = setup_pool().await;
    let controller = BookingController::new(pool.clone());
    let vehicle = create_vehicle(&pool, Decimal::new(5000, 2)).await;
    let customer = Uuid::new_v4();

    let booking = controller
        .reserve(customer, reserve_request(vehicle.id, start_in(30), 3))
        .await
        .unwrap();
    assert_eq!(booking.total_amount, Decimal::new(15000, 2));

    VehicleRepository::new(pool.clone())
        .update(vehicle.id, None, None, None, Some(Decimal::new(9900, 2)))
        .await
        .unwrap();

    let reloaded = BookingRepository::new(pool.clone())
        .find_by_id(booking.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(reloaded.total_amount, Decimal::new(15000, 2));
}

#[tokio::test]
#[ignore = "requires PostgreSQL (DATABASE_URL)"]
async fn test_full_lifecycle_reserve_conflict_complete_rebook() {
    let pool = setup_pool().await;
    let controller = BookingController::new(pool.clone());
    let vehicle = create_vehicle(&pool, Decimal::new(5000, 2)).await;
    let customer_c = Uuid::new_v4();
    let customer_d = Uuid::new_v4();
    let day1 = start_in(60);

    // C reserva 3 días
    let booking = controller
        .reserve(customer_c, reserve_request(vehicle.id, day1, 3))
        .await
        .unwrap();
    assert_eq!(booking.total_amount, Decimal::new(15000, 2));

    // D intenta día 2, 2 días → solapa en día 2/3
    let attempt = controller
        .reserve(customer_d, reserve_request(vehicle.id, day1 + Duration::days(1), 2))
        .await;
    assert!(matches!(
        attempt,
        Err(AppError::Unavailable(_)) | Err(AppError::Conflict(_))
    ));

    // La agencia completa la reserva de C
    let completed = controller
        .complete(booking.id, vehicle.agency_id)
        .await
        .unwrap();
    assert_eq!(completed.status, BookingStatus::Completed);

    let reloaded = VehicleRepository::new(pool.clone())
        .find_by_id(vehicle.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(reloaded.status, VehicleStatus::Available);

    // Las reservas completadas ya no bloquean: D puede reservar el día 2
    let rebooked = controller
        .reserve(customer_d, reserve_request(vehicle.id, day1 + Duration::days(1), 2))
        .await
        .expect("completed bookings must not block new reservations");
    assert_eq!(rebooked.status, BookingStatus::Active);
}

#[tokio::test]
#[ignore = "requires PostgreSQL (DATABASE_URL)"]
async fn test_validation_failures_never_touch_storage() {
    let pool = setup_pool().await;
    let controller = BookingController::new(pool.clone());
    let vehicle = create_vehicle(&pool, Decimal::new(5000, 2)).await;
    let customer = Uuid::new_v4();

    let past = controller
        .reserve(customer, reserve_request(vehicle.id, start_in(-1), 3))
        .await;
    assert!(matches!(past, Err(AppError::Validation(_))));

    let zero_days = controller
        .reserve(customer, reserve_request(vehicle.id, start_in(30), 0))
        .await;
    assert!(matches!(zero_days, Err(AppError::Validation(_))));

    let too_long = controller
        .reserve(customer, reserve_request(vehicle.id, start_in(30), 91))
        .await;
    assert!(matches!(too_long, Err(AppError::Validation(_))));

    let rows = BookingRepository::new(pool.clone())
        .list_for_customer(customer, 10, 0)
        .await
        .unwrap();
    assert!(rows.is_empty());

    let reloaded = VehicleRepository::new(pool.clone())
        .find_by_id(vehicle.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(reloaded.status, VehicleStatus::Available);
}

#[tokio::test]
#[ignore = "requires PostgreSQL (DATABASE_URL)"]
async fn test_ownership_is_enforced_on_cancel_and_complete() {
    let pool = setup_pool().await;
    let controller = BookingController::new(pool.clone());
    let vehicle = create_vehicle(&pool, Decimal::new(5000, 2)).await;
    let customer = Uuid::new_v4();

    let booking = controller
        .reserve(customer, reserve_request(vehicle.id, start_in(30), 3))
        .await
        .unwrap();

    let wrong_customer = controller.cancel(booking.id, Uuid::new_v4()).await;
    assert!(matches!(wrong_customer, Err(AppError::Forbidden(_))));

    let wrong_agency = controller.complete(booking.id, Uuid::new_v4()).await;
    assert!(matches!(wrong_agency, Err(AppError::Forbidden(_))));

    // La reserva sigue activa y el vehículo rentado
    let reloaded = BookingRepository::new(pool.clone())
        .find_by_id(booking.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(reloaded.status, BookingStatus::Active);
}

#[tokio::test]
#[ignore = "requires PostgreSQL (DATABASE_URL)"]
async fn test_availability_preview_matches_ledger() {
    let pool = setup_pool().await;
    let controller = BookingController::new(pool.clone());
    let vehicle = create_vehicle(&pool, Decimal::new(5000, 2)).await;
    let start = start_in(30);

    let free = controller
        .check_availability(AvailabilityQuery {
            vehicle_id: vehicle.id,
            start_date: start,
            rental_days: 3,
        })
        .await
        .unwrap();
    assert!(free.available);
    assert_eq!(free.end_date, start + Duration::days(2));

    controller
        .reserve(Uuid::new_v4(), reserve_request(vehicle.id, start, 3))
        .await
        .unwrap();

    let taken = controller
        .check_availability(AvailabilityQuery {
            vehicle_id: vehicle.id,
            start_date: start + Duration::days(2),
            rental_days: 5,
        })
        .await
        .unwrap();
    assert!(!taken.available);

    // Rango adyacente sin compartir días: libre
    let adjacent = controller
        .check_availability(AvailabilityQuery {
            vehicle_id: vehicle.id,
            start_date: start + Duration::days(3),
            rental_days: 2,
        })
        .await
        .unwrap();
    assert!(adjacent.available);
}

#[tokio::test]
#[ignore = "requires PostgreSQL (DATABASE_URL)"]
async fn test_vehicle_delete_rejected_while_bookings_reference_it() {
    let pool = setup_pool().await;
    let bookings = BookingController::new(pool.clone());
    let vehicles = VehicleController::new(pool.clone());
    let vehicle = create_vehicle(&pool, Decimal::new(5000, 2)).await;
    let customer = Uuid::new_v4();

    let booking = bookings
        .reserve(customer, reserve_request(vehicle.id, start_in(30), 3))
        .await
        .unwrap();

    let blocked = vehicles.delete(vehicle.id, vehicle.agency_id).await;
    assert!(matches!(blocked, Err(AppError::Conflict(_))));

    // Incluso cancelada, la reserva histórica sigue bloqueando el borrado
    bookings.cancel(booking.id, customer).await.unwrap();
    let still_blocked = vehicles.delete(vehicle.id, vehicle.agency_id).await;
    assert!(matches!(still_blocked, Err(AppError::Conflict(_))));

    // Un vehículo sin reservas sí puede borrarse
    let unbooked = create_vehicle(&pool, Decimal::new(5000, 2)).await;
    vehicles
        .delete(unbooked.id, unbooked.agency_id)
        .await
        .expect("unreferenced vehicle should be deletable");
}
