use chrono::Utc;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};

use crate::{
    models::{
        auth::Claims,
        user::{LoginResponse, User},
    },
    services::metrics::LOGINS_COUNTER,
    store::SchoolStore,
};

pub const BCRYPT_COST: u32 = 12;

pub struct AuthService;

impl AuthService {
    /// Checks credentials and issues an access token. Unknown email, inactive
    /// account and wrong password all fail with the same message.
    pub async fn login(
        store: &dyn SchoolStore,
        email: &str,
        password: &str,
        jwt_secret: &str,
        access_ttl: u64,
    ) -> anyhow::Result<LoginResponse> {
        let email = email.trim().to_lowercase();
        let user = match store.find_user_by_email(&email).await? {
            Some(u) if u.is_active => u,
            _ => {
                LOGINS_COUNTER.with_label_values(&["rejected"]).inc();
                anyhow::bail!("Invalid credentials");
            }
        };

        let valid = bcrypt::verify(password, &user.password_hash)
            .map_err(|_| anyhow::anyhow!("Invalid credentials"))?;
        if !valid {
            LOGINS_COUNTER.with_label_values(&["rejected"]).inc();
            tracing::info!(user_id = %user.id, "login rejected");
            anyhow::bail!("Invalid credentials");
        }

        let access_token = Self::generate_access_token(&user, jwt_secret, access_ttl)?;
        LOGINS_COUNTER.with_label_values(&["ok"]).inc();
        tracing::info!(user_id = %user.id, role = %user.role, "login");
        Ok(LoginResponse {
            access_token,
            user: user.into(),
        })
    }

    pub fn generate_access_token(user: &User, secret: &str, ttl_seconds: u64) -> anyhow::Result<String> {
        let now = Utc::now().timestamp() as usize;
        let claims = Claims {
            sub: user.id,
            role: user.role,
            iat: now,
            exp: now + ttl_seconds as usize,
        };
        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )?;
        Ok(token)
    }

    pub fn hash_password(password: &str) -> anyhow::Result<String> {
        Ok(bcrypt::hash(password, BCRYPT_COST)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{middleware::auth::decode_access_token, models::user::UserRole};
    use uuid::Uuid;

    fn user() -> User {
        User {
            id: Uuid::new_v4(),
            email: "t@school.test".into(),
            password_hash: String::new(),
            first_name: "T".into(),
            last_name: "One".into(),
            role: UserRole::Teacher,
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn token_carries_identity() {
        let u = user();
        let token = AuthService::generate_access_token(&u, "secret", 900).unwrap();
        let decoded = decode_access_token(&token, "secret").unwrap();
        assert_eq!(decoded.user_id, u.id);
        assert_eq!(decoded.role, UserRole::Teacher);
    }

    #[test]
    fn token_signed_with_another_secret_is_rejected() {
        let token = AuthService::generate_access_token(&user(), "secret", 900).unwrap();
        assert!(decode_access_token(&token, "other").is_err());
    }
}
