use super::annotations::AnnotationProvider;
use super::annotations::clustering::SequenceClusterProvider;
use super::annotations::homology::HomologyProvider;
use super::annotations::properties::ResiduePropertiesProvider;
use super::annotations::secondary_structure::SecondaryStructureProvider;
use super::config::{ConfigurationError, EdgeRule};
use super::edges::EdgeStrategy;
use super::edges::distance::{DistanceThresholdStrategy, KNearestStrategy};
use super::edges::hbond::HydrogenBondStrategy;
use super::edges::interactions::{
    AromaticStrategy, DisulfideStrategy, HydrophobicStrategy, IonicStrategy,
};
use super::edges::sequence::PeptideBondStrategy;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Named annotation providers and custom edge strategies available to an assembler.
///
/// Built-in edge rules carry their own parameters and are instantiated from the
/// [`EdgeRule`] itself; only [`EdgeRule::Custom`] rules are looked up by name.
#[derive(Clone, Default)]
pub struct Registry {
    providers: BTreeMap<String, Arc<dyn AnnotationProvider>>,
    strategies: BTreeMap<String, Arc<dyn EdgeStrategy>>,
}

impl Registry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding every built-in annotation provider.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        let builtins: [Arc<dyn AnnotationProvider>; 4] = [
            Arc::new(SecondaryStructureProvider),
            Arc::new(SequenceClusterProvider),
            Arc::new(HomologyProvider),
            Arc::new(ResiduePropertiesProvider),
        ];
        for provider in builtins {
            registry
                .providers
                .insert(provider.name().to_string(), provider);
        }
        registry
    }

    pub fn register_provider<P>(&mut self, provider: P) -> Result<(), ConfigurationError>
    where
        P: AnnotationProvider + 'static,
    {
        let name = provider.name().to_string();
        if self.providers.contains_key(&name) {
            return Err(ConfigurationError::DuplicateRegistration { name });
        }
        self.providers.insert(name, Arc::new(provider));
        Ok(())
    }

    /// Registers a strategy for [`EdgeRule::Custom`] rules of the same name.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError::DuplicateRegistration`] when the name is taken or is the
    /// name of a built-in rule.
    pub fn register_strategy<S>(&mut self, strategy: S) -> Result<(), ConfigurationError>
    where
        S: EdgeStrategy + 'static,
    {
        let name = strategy.name().to_string();
        if self.strategies.contains_key(&name) || EdgeRule::BUILTIN_NAMES.contains(&name.as_str()) {
            return Err(ConfigurationError::DuplicateRegistration { name });
        }
        self.strategies.insert(name, Arc::new(strategy));
        Ok(())
    }

    pub fn provider(&self, name: &str) -> Option<Arc<dyn AnnotationProvider>> {
        self.providers.get(name).cloned()
    }

    pub fn provider_names(&self) -> impl Iterator<Item = &str> {
        self.providers.keys().map(String::as_str)
    }

    /// The strategy that realises a configured rule.
    pub fn strategy_for(&self, rule: &EdgeRule) -> Result<Arc<dyn EdgeStrategy>, ConfigurationError> {
        let strategy: Arc<dyn EdgeStrategy> = match rule {
            EdgeRule::PeptideBond => Arc::new(PeptideBondStrategy),
            EdgeRule::DistanceThreshold {
                cutoff,
                min_sequence_separation,
            } => Arc::new(DistanceThresholdStrategy {
                cutoff: *cutoff,
                min_sequence_separation: *min_sequence_separation,
            }),
            EdgeRule::KNearest { k } => Arc::new(KNearestStrategy { k: *k }),
            EdgeRule::HydrogenBond {
                max_distance,
                min_angle_degrees,
                min_sequence_separation,
            } => Arc::new(HydrogenBondStrategy {
                max_distance: *max_distance,
                min_angle_degrees: *min_angle_degrees,
                min_sequence_separation: *min_sequence_separation,
            }),
            EdgeRule::Hydrophobic { cutoff } => Arc::new(HydrophobicStrategy { cutoff: *cutoff }),
            EdgeRule::Disulfide { cutoff } => Arc::new(DisulfideStrategy { cutoff: *cutoff }),
            EdgeRule::Ionic { cutoff } => Arc::new(IonicStrategy { cutoff: *cutoff }),
            EdgeRule::Aromatic {
                min_distance,
                max_distance,
            } => Arc::new(AromaticStrategy {
                min_distance: *min_distance,
                max_distance: *max_distance,
            }),
            EdgeRule::Custom { name } => self
                .strategies
                .get(name)
                .cloned()
                .ok_or_else(|| ConfigurationError::UnknownStrategy(name.clone()))?,
        };
        Ok(strategy)
    }
}
