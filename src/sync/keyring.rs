use std::collections::HashMap;

use super::auth::{AuthError, Session};

pub(crate) const SERVICE_NAME: &str = "zapiszto-sync";
const SESSION_KIND: &str = "session";

fn attributes(server: &str) -> HashMap<&str, &str> {
    let mut attrs = HashMap::new();
    attrs.insert("service", SERVICE_NAME);
    attrs.insert("server", server);
    attrs.insert("kind", SESSION_KIND);
    attrs
}

async fn keyring() -> Result<oo7::Keyring, AuthError> {
    oo7::Keyring::new()
        .await
        .map_err(|e| AuthError::Keyring(format!("Failed to connect to keyring: {}", e)))
}

/// Store the session for `server` in the system keyring via Secret Service.
pub async fn store_session(server: &str, session: &Session) -> Result<(), AuthError> {
    let keyring = keyring().await?;
    let secret = serde_json::to_string(session)
        .map_err(|e| AuthError::Keyring(format!("Failed to encode session: {}", e)))?;

    keyring
        .create_item(
            &format!("zapiszto session ({})", server),
            &attributes(server),
            secret.as_bytes(),
            true, // replace existing
        )
        .await
        .map_err(|e| AuthError::Keyring(format!("Failed to store session: {}", e)))?;

    Ok(())
}

/// Load a previously stored session for `server`.
pub async fn load_session(server: &str) -> Result<Option<Session>, AuthError> {
    let keyring = keyring().await?;

    let items = keyring
        .search_items(&attributes(server))
        .await
        .map_err(|e| AuthError::Keyring(format!("Failed to search keyring: {}", e)))?;

    let Some(item) = items.first() else {
        return Ok(None);
    };
    let secret_bytes = item
        .secret()
        .await
        .map_err(|e| AuthError::Keyring(format!("Failed to read secret: {}", e)))?;
    match serde_json::from_slice::<Session>(&secret_bytes.to_vec()) {
        Ok(session) => Ok(Some(session)),
        Err(e) => {
            log::warn!("Ignoring unreadable stored session: {}", e);
            Ok(None)
        }
    }
}

/// Delete stored sessions for `server`.
pub async fn delete_session(server: &str) -> Result<(), AuthError> {
    let keyring = keyring().await?;

    let items = keyring
        .search_items(&attributes(server))
        .await
        .map_err(|e| AuthError::Keyring(format!("Failed to search keyring: {}", e)))?;

    for item in items {
        item.delete()
            .await
            .map_err(|e| AuthError::Keyring(format!("Failed to delete session: {}", e)))?;
    }

    Ok(())
}
