use anyhow::Result;
use std::net::SocketAddr;
use tokio::signal;
use tracing::{error, info};

use dotenvy::dotenv;
use rental_booking::config::{DatabaseConfig, EnvironmentConfig};
use rental_booking::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Cargar variables de entorno
    dotenv().ok();

    // Configurar logging
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    info!("🚗 Rental Booking - API de reservas de vehículos");
    info!("================================================");

    // Inicializar base de datos
    let db_config = DatabaseConfig::default();
    let pool = match db_config.create_pool().await {
        Ok(pool) => pool,
        Err(e) => {
            error!("❌ Error conectando a la base de datos: {}", e);
            return Err(anyhow::anyhow!("Error de base de datos: {}", e));
        }
    };

    if let Err(e) = rental_booking::config::database::run_migrations(&pool).await {
        error!("❌ Error ejecutando migraciones: {}", e);
        return Err(anyhow::anyhow!("Error de migraciones: {}", e));
    }

    let config = EnvironmentConfig::default();
    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;

    let app_state = AppState::new(pool, config);
    let app = rental_booking::create_app(app_state);

    info!("🌐 Servidor iniciando en http://{}", addr);
    info!("🔍 Endpoints disponibles:");
    info!("🚗 Vehicle:");
    info!("   POST   /api/vehicle - Registrar vehículo (agencia)");
    info!("   GET    /api/vehicle - Listar vehículos disponibles");
    info!("   GET    /api/vehicle/mine - Flota de la agencia");
    info!("   GET    /api/vehicle/:id - Obtener vehículo");
    info!("   PUT    /api/vehicle/:id - Actualizar vehículo (agencia)");
    info!("   DELETE /api/vehicle/:id - Eliminar vehículo (agencia)");
    info!("📅 Booking:");
    info!("   POST   /api/booking - Crear reserva (cliente)");
    info!("   GET    /api/booking/availability - Consultar disponibilidad");
    info!("   GET    /api/booking/my - Reservas del cliente");
    info!("   GET    /api/booking/agency - Reservas de la agencia");
    info!("   GET    /api/booking/:id - Detalle de reserva");
    info!("   POST   /api/booking/:id/cancel - Cancelar reserva (cliente)");
    info!("   POST   /api/booking/:id/complete - Completar reserva (agencia)");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| {
            error!("❌ Error del servidor: {}", e);
            e
        })?;

    info!("👋 Servidor terminado");
    Ok(())
}

/// Señal de apagado graceful
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("🛑 Señal Ctrl+C recibida, apagando servidor...");
        },
        _ = terminate => {
            info!("🛑 Señal de terminación recibida, apagando servidor...");
        },
    }
}
