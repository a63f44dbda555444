//! Supported model names and the process-wide session registry

use crate::error::{RemovalError, Result};
use crate::inference::{SegmentationSession, SessionFactory};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, warn};

/// Closed set of supported segmentation models
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ModelName {
    /// General-purpose ISNet model (the default)
    #[serde(rename = "isnet-general-use")]
    IsnetGeneralUse,
    /// U2Net, used as the fallback when a requested model is unavailable
    #[serde(rename = "u2net")]
    U2net,
    /// Animal-oriented ISNet variant
    #[serde(rename = "isnet-animal")]
    IsnetAnimal,
}

impl ModelName {
    /// All supported models, in registry initialization order
    pub const ALL: [Self; 3] = [Self::IsnetGeneralUse, Self::U2net, Self::IsnetAnimal];

    /// Canonical string form as used in requests and registry keys
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::IsnetGeneralUse => "isnet-general-use",
            Self::U2net => "u2net",
            Self::IsnetAnimal => "isnet-animal",
        }
    }

    /// Parse a request-supplied model selector.
    ///
    /// The set is closed: an unrecognized name is an error, never a silent
    /// reroute to some other model.
    ///
    /// # Errors
    /// Returns `RemovalError::ModelUnavailable` for names outside the set.
    pub fn parse(name: &str) -> Result<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|m| m.as_str() == name)
            .ok_or_else(|| RemovalError::model_unavailable(name))
    }

    /// Contrast and sharpness enhancement factors applied before inference.
    ///
    /// The animal model benefits from a stronger pair than the general ones.
    #[must_use]
    pub fn enhancement_factors(self) -> (f32, f32) {
        match self {
            Self::IsnetAnimal => (1.5, 1.5),
            Self::IsnetGeneralUse | Self::U2net => (1.4, 1.2),
        }
    }
}

impl std::fmt::Display for ModelName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Process-scoped registry of shared model sessions.
///
/// Initialized once at startup, then referenced (not copied) by every request
/// handler, typically behind an `Arc`. A model whose session construction
/// failed stays permanently unavailable for the process lifetime; there is no
/// retry path.
pub struct ModelRegistry {
    sessions: HashMap<ModelName, Option<Arc<dyn SegmentationSession>>>,
}

impl ModelRegistry {
    /// Construct one session per requested model name.
    ///
    /// Per-name failures are caught and logged rather than aborting startup;
    /// the registry remains usable with whatever sessions did come up.
    pub fn initialize(factory: &dyn SessionFactory, names: &[ModelName]) -> Self {
        let mut sessions = HashMap::with_capacity(names.len());
        for &name in names {
            match factory.create_session(name) {
                Ok(session) => {
                    info!(model = %name, "loaded segmentation session");
                    sessions.insert(name, Some(session));
                },
                Err(e) => {
                    warn!(model = %name, error = %e, "failed to load session; model marked unavailable");
                    sessions.insert(name, None);
                },
            }
        }
        Self { sessions }
    }

    /// Look up the session for a model, if one is available
    #[must_use]
    pub fn get(&self, name: ModelName) -> Option<Arc<dyn SegmentationSession>> {
        self.sessions.get(&name).and_then(Clone::clone)
    }

    /// Resolve a session, falling back to `fallback` when the requested
    /// model is unavailable. `None` means neither is usable.
    #[must_use]
    pub fn resolve(
        &self,
        name: ModelName,
        fallback: ModelName,
    ) -> Option<Arc<dyn SegmentationSession>> {
        self.get(name).or_else(|| self.get(fallback))
    }

    /// Models with a usable session
    #[must_use]
    pub fn available_models(&self) -> Vec<ModelName> {
        let mut models: Vec<ModelName> = self
            .sessions
            .iter()
            .filter_map(|(name, session)| session.as_ref().map(|_| *name))
            .collect();
        models.sort_by_key(|m| m.as_str());
        models
    }
}

impl std::fmt::Debug for ModelRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelRegistry")
            .field("available", &self.available_models())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::mock::MockSessionFactory;

    #[test]
    fn test_model_name_round_trip() {
        for model in ModelName::ALL {
            assert_eq!(ModelName::parse(model.as_str()).unwrap(), model);
        }
    }

    #[test]
    fn test_unknown_model_name_is_an_error() {
        let err = ModelName::parse("nonexistent").unwrap_err();
        assert!(matches!(err, RemovalError::ModelUnavailable(name) if name == "nonexistent"));
    }

    #[test]
    fn test_enhancement_factors() {
        assert_eq!(ModelName::IsnetAnimal.enhancement_factors(), (1.5, 1.5));
        assert_eq!(ModelName::IsnetGeneralUse.enhancement_factors(), (1.4, 1.2));
        assert_eq!(ModelName::U2net.enhancement_factors(), (1.4, 1.2));
    }

    #[test]
    fn test_registry_survives_failed_session() {
        let factory = MockSessionFactory::new().failing(ModelName::IsnetAnimal);
        let registry = ModelRegistry::initialize(&factory, &ModelName::ALL);

        assert!(registry.get(ModelName::IsnetAnimal).is_none());
        assert!(registry.get(ModelName::U2net).is_some());
        assert_eq!(registry.available_models().len(), 2);
    }

    #[test]
    fn test_resolve_falls_back() {
        let factory = MockSessionFactory::new().failing(ModelName::IsnetAnimal);
        let registry = ModelRegistry::initialize(&factory, &ModelName::ALL);

        // Requested model is down; fallback session is served instead.
        assert!(registry
            .resolve(ModelName::IsnetAnimal, ModelName::U2net)
            .is_some());
    }

    #[test]
    fn test_resolve_unavailable_when_fallback_also_down() {
        let factory = MockSessionFactory::new()
            .failing(ModelName::IsnetAnimal)
            .failing(ModelName::U2net);
        let registry = ModelRegistry::initialize(&factory, &ModelName::ALL);

        assert!(registry
            .resolve(ModelName::IsnetAnimal, ModelName::U2net)
            .is_none());
    }
}
