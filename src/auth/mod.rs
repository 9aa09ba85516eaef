use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use jsonwebtoken::{decode, DecodingKey, Validation};
use serde::{Deserialize, Serialize};

use crate::utils::error::AppError;
use crate::AppState;

/// Roles carried in the bearer token. Token issuance happens in the identity
/// service; this server only verifies and gates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Supervisor,
    Staff,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: i32,
    pub role: Role,
    pub exp: usize,
}

/// Authenticated caller, extracted from the `Authorization: Bearer` header.
#[derive(Debug, Clone, Copy)]
pub struct AuthUser {
    pub id: i32,
    pub role: Role,
}

impl AuthUser {
    /// Create/update/delete endpoints: admin or supervisor.
    pub fn require_supervisor(&self) -> Result<(), AppError> {
        match self.role {
            Role::Admin | Role::Supervisor => Ok(()),
            Role::Staff => Err(AppError::Forbidden(
                "Admin or supervisor role required".to_string(),
            )),
        }
    }

    /// Backup/restore: admin only.
    pub fn require_admin(&self) -> Result<(), AppError> {
        match self.role {
            Role::Admin => Ok(()),
            _ => Err(AppError::Forbidden("Admin role required".to_string())),
        }
    }
}

pub fn verify_token(token: &str, secret: &str) -> Result<AuthUser, AppError> {
    let data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|_| AppError::Auth("Invalid or expired token".to_string()))?;

    Ok(AuthUser {
        id: data.claims.sub,
        role: data.claims.role,
    })
}

#[axum::async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| AppError::Auth("Access token required".to_string()))?;

        let token = header
            .strip_prefix("Bearer ")
            .ok_or_else(|| AppError::Auth("Access token required".to_string()))?;

        verify_token(token, &state.jwt_secret)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{encode, EncodingKey, Header};

    fn token_for(role: Role, secret: &str) -> String {
        let claims = Claims {
            sub: 7,
            role,
            exp: (chrono::Utc::now().timestamp() + 3600) as usize,
        };
        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap()
    }

    #[test]
    fn valid_token_yields_user() {
        let token = token_for(Role::Supervisor, "s3cret");
        let user = verify_token(&token, "s3cret").unwrap();
        assert_eq!(user.id, 7);
        assert_eq!(user.role, Role::Supervisor);
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let token = token_for(Role::Admin, "s3cret");
        assert!(matches!(
            verify_token(&token, "other"),
            Err(AppError::Auth(_))
        ));
    }

    #[test]
    fn role_gates_are_set_membership() {
        let admin = AuthUser {
            id: 1,
            role: Role::Admin,
        };
        let supervisor = AuthUser {
            id: 2,
            role: Role::Supervisor,
        };
        let staff = AuthUser {
            id: 3,
            role: Role::Staff,
        };

        assert!(admin.require_supervisor().is_ok());
        assert!(supervisor.require_supervisor().is_ok());
        assert!(staff.require_supervisor().is_err());

        assert!(admin.require_admin().is_ok());
        assert!(supervisor.require_admin().is_err());
    }
}
