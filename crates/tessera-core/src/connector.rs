//! Connector discovery.
//!
//! Hosts register a factory per connector `type` at startup. Profiles from
//! `tessera.toml` name a type; the first connect for a type builds its
//! manager and later connects reuse it.

use crate::ThisError;
use std::{collections::BTreeMap, fmt, sync::Arc};
use tessera_config::{ConfigError, TesseraConfig};

///
/// ConnectorError
///

#[derive(Debug, ThisError)]
pub enum ConnectorError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("connection profile '{profile}' failed to connect: {message}")]
    Connect { profile: String, message: String },

    #[error("no network id given for connection profile '{0}'")]
    MissingNetwork(String),

    #[error("no connector registered for type '{connector_type}' used by connection profile '{profile}'")]
    UnknownType { connector_type: String, profile: String },
}

///
/// Connection
///

pub trait Connection: fmt::Debug + Send {
    fn profile(&self) -> &str;

    fn network_id(&self) -> &str;

    fn disconnect(&mut self) -> Result<(), ConnectorError>;
}

///
/// ConnectionManager
///
/// Opens connections for one connector type.
///

pub trait ConnectionManager: Send + Sync {
    fn connect(
        &self,
        profile: &str,
        network_id: &str,
        options: &BTreeMap<String, String>,
    ) -> Result<Box<dyn Connection>, ConnectorError>;
}

type ManagerFactory = Box<dyn Fn() -> Arc<dyn ConnectionManager> + Send + Sync>;

///
/// ConnectorRegistry
///

#[derive(Default)]
pub struct ConnectorRegistry {
    factories: BTreeMap<String, ManagerFactory>,
    managers: BTreeMap<String, Arc<dyn ConnectionManager>>,
}

impl ConnectorRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register how to build the manager for `connector_type`. A later
    /// registration for the same type replaces the earlier one.
    pub fn register<F>(&mut self, connector_type: impl Into<String>, factory: F)
    where
        F: Fn() -> Arc<dyn ConnectionManager> + Send + Sync + 'static,
    {
        let connector_type = connector_type.into();
        tracing::debug!(%connector_type, "connector registered");

        self.managers.remove(&connector_type);
        self.factories.insert(connector_type, Box::new(factory));
    }

    /// Install a ready-made manager, bypassing any factory.
    pub fn add_connection_manager(
        &mut self,
        connector_type: impl Into<String>,
        manager: Arc<dyn ConnectionManager>,
    ) {
        self.managers.insert(connector_type.into(), manager);
    }

    #[must_use]
    pub fn is_registered(&self, connector_type: &str) -> bool {
        self.managers.contains_key(connector_type) || self.factories.contains_key(connector_type)
    }

    /// The manager for `connector_type`, built on first use. `profile`
    /// only names the caller in the error.
    pub fn connection_manager(
        &mut self,
        profile: &str,
        connector_type: &str,
    ) -> Result<Arc<dyn ConnectionManager>, ConnectorError> {
        if let Some(manager) = self.managers.get(connector_type) {
            return Ok(Arc::clone(manager));
        }

        let factory = self
            .factories
            .get(connector_type)
            .ok_or_else(|| ConnectorError::UnknownType {
                connector_type: connector_type.to_string(),
                profile: profile.to_string(),
            })?;

        let manager = factory();
        self.managers
            .insert(connector_type.to_string(), Arc::clone(&manager));

        Ok(manager)
    }

    /// Connect with the named profile. `network_id` overrides the one in
    /// the profile.
    pub fn connect(
        &mut self,
        config: &TesseraConfig,
        profile_name: &str,
        network_id: Option<&str>,
    ) -> Result<Box<dyn Connection>, ConnectorError> {
        let profile = config.profile(profile_name)?;
        let network_id = network_id.unwrap_or(&profile.network_id);
        if network_id.is_empty() {
            return Err(ConnectorError::MissingNetwork(profile_name.to_string()));
        }

        let manager = self.connection_manager(profile_name, &profile.connector_type)?;
        tracing::info!(profile = profile_name, network_id, connector_type = %profile.connector_type, "connecting");

        manager.connect(profile_name, network_id, &profile.options)
    }
}

impl fmt::Debug for ConnectorRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectorRegistry")
            .field("factories", &self.factories.keys().collect::<Vec<_>>())
            .field("managers", &self.managers.keys().collect::<Vec<_>>())
            .finish()
    }
}

///
/// TESTS
///
