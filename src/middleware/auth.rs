//! Access Policy Gate
//!
//! Middleware que verifica el JWT emitido por el proveedor de identidad
//! externo y lo convierte en un actor autenticado explícito. El core no
//! guarda sesiones ni credenciales: la identidad viaja como parámetro en
//! cada llamada a los controllers.

use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use jsonwebtoken::{decode, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::state::AppState;
use crate::utils::errors::AppError;

/// Rol del actor según el proveedor de identidad
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActorRole {
    Customer,
    Agency,
}

/// Claims del JWT
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // actor_id
    pub role: ActorRole,
    pub exp: usize,
    pub iat: usize,
}

/// Actor autenticado que se inyecta en las requests
#[derive(Debug, Clone, Copy)]
pub struct AuthenticatedActor {
    pub actor_id: Uuid,
    pub role: ActorRole,
}

impl AuthenticatedActor {
    /// Exigir rol de cliente para operaciones de reserva/cancelación
    pub fn require_customer(&self) -> Result<Uuid, AppError> {
        if self.role != ActorRole::Customer {
            return Err(AppError::Forbidden(
                "This operation requires a customer account".to_string(),
            ));
        }
        Ok(self.actor_id)
    }

    /// Exigir rol de agencia para completar reservas y editar la flota
    pub fn require_agency(&self) -> Result<Uuid, AppError> {
        if self.role != ActorRole::Agency {
            return Err(AppError::Forbidden(
                "This operation requires an agency account".to_string(),
            ));
        }
        Ok(self.actor_id)
    }
}

/// Middleware de autenticación JWT
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    // Extraer token del header Authorization
    let auth_header = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|auth_str| auth_str.to_str().ok())
        .and_then(|auth_str| auth_str.strip_prefix("Bearer "))
        .ok_or_else(|| AppError::Unauthorized("Authorization token required".to_string()))?;

    let actor = decode_actor(auth_header, &state.config.jwt_secret)?;

    // Inyectar actor autenticado en las extensions
    request.extensions_mut().insert(actor);

    Ok(next.run(request).await)
}

/// Decodificar y validar el token en un actor autenticado
pub fn decode_actor(token: &str, jwt_secret: &str) -> Result<AuthenticatedActor, AppError> {
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(jwt_secret.as_ref()),
        &Validation::default(),
    )
    .map_err(|_| AppError::Unauthorized("Invalid token".to_string()))?;

    let claims = token_data.claims;

    let actor_id = Uuid::parse_str(&claims.sub)
        .map_err(|_| AppError::Unauthorized("Invalid actor id in token".to_string()))?;

    Ok(AuthenticatedActor {
        actor_id,
        role: claims.role,
    })
}
