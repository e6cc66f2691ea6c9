//! Version Registry
//!
//! Keyed factories for builders and validators. Factories are registered once at startup; the
//! first `get` for a (version, provider) pair constructs the instance and every later call
//! returns the same `Arc`.

use crate::builder::{BuilderConfig, MessageBuilder, TissMessageBuilder};
use crate::error::{BillingError, BillingResult};
use crate::validator::{MessageValidator, TissValidator};
use crate::version::ProtocolVersion;
use parking_lot::Mutex;
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use tracing::debug;

type Factory<T> = Box<dyn Fn(&BuilderConfig) -> Arc<T> + Send + Sync>;
type CacheKey = (ProtocolVersion, String);

/// Factory registry with a lazily filled instance cache
pub struct Registry<T: ?Sized> {
    kind: &'static str,
    factories: HashMap<ProtocolVersion, Factory<T>>,
    instances: Mutex<HashMap<CacheKey, Arc<T>>>,
}

impl<T: ?Sized> Registry<T> {
    pub fn new(kind: &'static str) -> Self {
        Self {
            kind,
            factories: HashMap::new(),
            instances: Mutex::new(HashMap::new()),
        }
    }

    /// Register (or replace) the factory for one version
    pub fn register<F>(&mut self, version: ProtocolVersion, factory: F)
    where
        F: Fn(&BuilderConfig) -> Arc<T> + Send + Sync + 'static,
    {
        self.factories.insert(version, Box::new(factory));
        debug!(kind = self.kind, version = %version, "factory registered");
    }

    pub fn contains(&self, version: ProtocolVersion) -> bool {
        self.factories.contains_key(&version)
    }

    pub fn versions(&self) -> BTreeSet<ProtocolVersion> {
        self.factories.keys().copied().collect()
    }

    /// Cached instance for `config`, constructing it on first use.
    ///
    /// The cache lock is held across construction so concurrent callers with the same key
    /// never build two instances.
    pub fn get(&self, config: &BuilderConfig) -> BillingResult<Arc<T>> {
        let factory = self
            .factories
            .get(&config.version)
            .ok_or_else(|| BillingError::UnsupportedVersion(config.version.label().to_string()))?;

        let mut instances = self.instances.lock();
        let instance = instances
            .entry(config.cache_key())
            .or_insert_with(|| {
                debug!(
                    kind = self.kind,
                    version = %config.version,
                    provider = config.provider.registration_code(),
                    "instance constructed"
                );
                factory(config)
            })
            .clone();
        Ok(instance)
    }

    /// Number of cached instances
    pub fn cached(&self) -> usize {
        self.instances.lock().len()
    }
}

impl<T: ?Sized> std::fmt::Debug for Registry<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry")
            .field("kind", &self.kind)
            .field("versions", &self.versions())
            .field("cached", &self.cached())
            .finish()
    }
}

/// Builder and validator registries owned by the composition root
#[derive(Debug)]
pub struct Registries {
    pub builders: Registry<dyn MessageBuilder>,
    pub validators: Registry<dyn MessageValidator>,
}

impl Default for Registries {
    fn default() -> Self {
        Self::new()
    }
}

impl Registries {
    /// Empty registries
    pub fn new() -> Self {
        Self {
            builders: Registry::new("builder"),
            validators: Registry::new("validator"),
        }
    }

    /// Registries with the built-in implementation registered for every supported version
    pub fn with_defaults() -> Self {
        let mut registries = Self::new();
        for version in ProtocolVersion::ALL {
            registries.builders.register(version, |config| {
                Arc::new(TissMessageBuilder::new(config.clone())) as Arc<dyn MessageBuilder>
            });
            registries.validators.register(version, |config| {
                Arc::new(TissValidator::new(config.version)) as Arc<dyn MessageValidator>
            });
        }
        registries
    }

    /// Every version must have both a builder and a validator
    pub fn ensure_complete(&self) -> BillingResult<()> {
        for version in self.builders.versions().union(&self.validators.versions()) {
            let (present, missing) = match (
                self.builders.contains(*version),
                self.validators.contains(*version),
            ) {
                (true, false) => ("builder", "validator"),
                (false, true) => ("validator", "builder"),
                _ => continue,
            };
            return Err(BillingError::IncompleteRegistration {
                version: version.label().to_string(),
                present,
                missing,
            });
        }
        Ok(())
    }

    /// Versions usable end to end
    pub fn versions(&self) -> BTreeSet<ProtocolVersion> {
        self.builders
            .versions()
            .intersection(&self.validators.versions())
            .copied()
            .collect()
    }

    pub fn builder(&self, config: &BuilderConfig) -> BillingResult<Arc<dyn MessageBuilder>> {
        self.builders.get(config)
    }

    pub fn validator(&self, config: &BuilderConfig) -> BillingResult<Arc<dyn MessageValidator>> {
        self.validators.get(config)
    }
}
