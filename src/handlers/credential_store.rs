use crate::errors::{LoginError, StoreError};
use crate::handlers::auth::TokenDecoder;
use crate::models::all_models::{Claims, Credentials};
use actix_session::Session;
use log::{debug, info};
use std::sync::{Arc, RwLock};

pub const TOKEN_KEY: &str = "token";
pub const ROLE_KEY: &str = "role";
pub const EXPIRY_KEY: &str = "token_exp";

/// Session-scoped holder of the current token and role.
///
/// Writes replace the whole record: a reader never sees a new token paired
/// with the previous role.
pub trait CredentialStore {
    fn get(&self) -> Result<Credentials, StoreError>;
    fn set(&self, credentials: Credentials) -> Result<(), StoreError>;
    fn clear(&self) -> Result<(), StoreError>;
}

impl<S: CredentialStore + ?Sized> CredentialStore for &S {
    fn get(&self) -> Result<Credentials, StoreError> {
        (**self).get()
    }

    fn set(&self, credentials: Credentials) -> Result<(), StoreError> {
        (**self).set(credentials)
    }

    fn clear(&self) -> Result<(), StoreError> {
        (**self).clear()
    }
}

impl<S: CredentialStore + ?Sized> CredentialStore for Arc<S> {
    fn get(&self) -> Result<Credentials, StoreError> {
        (**self).get()
    }

    fn set(&self, credentials: Credentials) -> Result<(), StoreError> {
        (**self).set(credentials)
    }

    fn clear(&self) -> Result<(), StoreError> {
        (**self).clear()
    }
}

/// In-process store, shared by cloning.
#[derive(Debug, Clone, Default)]
pub struct MemoryCredentialStore {
    inner: Arc<RwLock<Credentials>>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_credentials(credentials: Credentials) -> Self {
        MemoryCredentialStore {
            inner: Arc::new(RwLock::new(credentials)),
        }
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn get(&self) -> Result<Credentials, StoreError> {
        self.inner
            .read()
            .map(|guard| guard.clone())
            .map_err(|e| StoreError::Unavailable(e.to_string()))
    }

    fn set(&self, credentials: Credentials) -> Result<(), StoreError> {
        let mut guard = self
            .inner
            .write()
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;
        *guard = credentials;
        Ok(())
    }

    fn clear(&self) -> Result<(), StoreError> {
        self.set(Credentials::default())
    }
}

/// Store backed by the browser session cookie.
#[derive(Clone)]
pub struct SessionCredentialStore {
    session: Session,
}

impl SessionCredentialStore {
    pub fn new(session: Session) -> Self {
        SessionCredentialStore { session }
    }

    fn read<T: serde::de::DeserializeOwned>(&self, key: &str) -> Result<Option<T>, StoreError> {
        self.session
            .get::<T>(key)
            .map_err(|e| StoreError::Session(e.to_string()))
    }

    fn write_all(&self, credentials: &Credentials) -> Result<(), StoreError> {
        self.write_opt(TOKEN_KEY, credentials.token.as_ref())?;
        self.write_opt(ROLE_KEY, credentials.role.as_ref())?;
        self.write_opt(EXPIRY_KEY, credentials.expires_at.as_ref())?;
        Ok(())
    }

    fn write_opt<T: serde::Serialize>(&self, key: &str, value: Option<&T>) -> Result<(), StoreError> {
        match value {
            Some(value) => self
                .session
                .insert(key, value)
                .map_err(|e| StoreError::Session(e.to_string())),
            None => {
                self.session.remove(key);
                Ok(())
            }
        }
    }

    // Runs `write` against the session; on failure every key is removed so a
    // token is never left behind without its role.
    fn replace_with<F>(&self, write: F) -> Result<(), StoreError>
    where
        F: FnOnce(&Self) -> Result<(), StoreError>,
    {
        write(self).inspect_err(|_| self.remove_all())
    }

    fn remove_all(&self) {
        self.session.remove(TOKEN_KEY);
        self.session.remove(ROLE_KEY);
        self.session.remove(EXPIRY_KEY);
    }
}

impl CredentialStore for SessionCredentialStore {
    fn get(&self) -> Result<Credentials, StoreError> {
        Ok(Credentials {
            token: self.read::<String>(TOKEN_KEY)?,
            role: self.read::<String>(ROLE_KEY)?,
            expires_at: self.read::<i64>(EXPIRY_KEY)?,
        })
    }

    fn set(&self, credentials: Credentials) -> Result<(), StoreError> {
        self.replace_with(|store| store.write_all(&credentials))
    }

    fn clear(&self) -> Result<(), StoreError> {
        self.remove_all();
        Ok(())
    }
}

/// Decodes `token` once and caches its role and expiry in the store.
/// A token that does not decode is never stored.
pub fn login<S>(store: &S, decoder: &TokenDecoder, token: &str) -> Result<Claims, LoginError>
where
    S: CredentialStore + ?Sized,
{
    let claims = decoder.decode(token)?;
    store.set(Credentials::from_claims(token.trim(), &claims))?;
    info!("Session opened for user {} with role {}", claims.id, claims.role);
    Ok(claims)
}

pub fn logout<S>(store: &S) -> Result<(), StoreError>
where
    S: CredentialStore + ?Sized,
{
    store.clear()?;
    debug!("Session credentials cleared");
    Ok(())
}
