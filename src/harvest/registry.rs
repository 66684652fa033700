use super::collector::Collector;
use crate::Result;
use crate::publish::is_reserved_name;
use core::fmt;
use ohno::bail;
use std::collections::{BTreeMap, HashSet};

/// Assembles a [`Registry`] from explicit registration calls.
#[derive(Default)]
pub struct RegistryBuilder {
    general: Vec<Box<dyn Collector>>,
    families: BTreeMap<String, Vec<Box<dyn Collector>>>,
    names: HashSet<String>,
}

impl RegistryBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a collector to the general list.
    pub fn register(&mut self, collector: Box<dyn Collector>) -> Result<()> {
        self.claim_name(collector.name())?;
        self.general.push(collector);
        Ok(())
    }

    /// Add a collector to the list of one source family.
    ///
    /// Family members are not part of the general list.
    pub fn register_in_family(&mut self, family: &str, collector: Box<dyn Collector>) -> Result<()> {
        if family.trim().is_empty() {
            bail!("collector '{}' has an empty family name", collector.name());
        }

        self.claim_name(collector.name())?;
        self.families.entry(family.to_string()).or_default().push(collector);
        Ok(())
    }

    #[must_use]
    pub fn build(self) -> Registry {
        Registry {
            general: self.general,
            families: self.families,
        }
    }

    fn claim_name(&mut self, name: &str) -> Result<()> {
        if name.is_empty() || name.contains(['/', '\\']) || name.contains("..") {
            bail!("invalid collector name '{name}'");
        }

        if is_reserved_name(name) {
            bail!("collector name '{name}' is reserved for the harvest's own files");
        }

        if !self.names.insert(name.to_string()) {
            bail!("a collector named '{name}' is already registered");
        }

        Ok(())
    }
}

impl fmt::Debug for RegistryBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegistryBuilder").field("names", &self.names).finish_non_exhaustive()
    }
}

/// The fixed set of collectors for one run, in registration order
pub struct Registry {
    general: Vec<Box<dyn Collector>>,
    families: BTreeMap<String, Vec<Box<dyn Collector>>>,
}

impl Registry {
    /// Names of the general list, in registration order
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        self.general.iter().map(|c| c.name()).collect()
    }

    /// Names of all source families
    #[must_use]
    pub fn families(&self) -> Vec<&str> {
        self.families.keys().map(String::as_str).collect()
    }

    /// Whether a collector of this name exists in the general list or any family
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.general.iter().chain(self.families.values().flatten()).any(|c| c.name() == name)
    }

    #[must_use]
    pub fn has_family(&self, family: &str) -> bool {
        self.families.contains_key(family)
    }

    /// Number of collectors in the general list
    #[must_use]
    pub fn len(&self) -> usize {
        self.general.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.general.is_empty()
    }

    /// Consume the registry, yielding the general list
    #[must_use]
    pub fn into_general(self) -> Vec<Box<dyn Collector>> {
        self.general
    }

    /// Consume the registry, yielding the collector named `name` if there is one.
    ///
    /// The general list is searched before the families.
    #[must_use]
    pub fn take_named(self, name: &str) -> Option<Box<dyn Collector>> {
        self.general
            .into_iter()
            .chain(self.families.into_values().flatten())
            .find(|c| c.name() == name)
    }

    /// Consume the registry, yielding the members of one family
    #[must_use]
    pub fn into_family(mut self, family: &str) -> Option<Vec<Box<dyn Collector>>> {
        self.families.remove(family)
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let families: BTreeMap<&str, Vec<&str>> = self
            .families
            .iter()
            .map(|(family, members)| (family.as_str(), members.iter().map(|c| c.name()).collect()))
            .collect();

        f.debug_struct("Registry")
            .field("general", &self.names())
            .field("families", &families)
            .finish()
    }
}
