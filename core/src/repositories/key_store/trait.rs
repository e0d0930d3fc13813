//! Key store repository trait defining the interface for key persistence.

use crate::domain::entities::KeyStore;
use crate::errors::PersistenceError;

/// Repository trait for the key store
///
/// `save` replaces the whole persisted store. Implementations must make the
/// replacement atomic: after a failed save the previously persisted store is
/// still the one `load` returns.
pub trait KeyStoreRepository: Send + Sync {
    /// Loads the persisted store
    ///
    /// # Returns
    /// * `Ok(Some(KeyStore))` - A valid store was found
    /// * `Ok(None)` - Nothing has been persisted yet
    /// * `Err(PersistenceError)` - Storage unreadable or store corrupt
    fn load(&self) -> Result<Option<KeyStore>, PersistenceError>;

    /// Persists the full store
    fn save(&self, store: &KeyStore) -> Result<(), PersistenceError>;
}
