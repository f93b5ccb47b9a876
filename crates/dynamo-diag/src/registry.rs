//! Name-keyed registry of diagnostic producer factories.
//!
//! Run configuration lists producers by name ([`ProducerSpec`]); the
//! registry turns each spec into a boxed producer. The built-ins are
//! preregistered by [`DiagnosticRegistry::with_builtins`]; solvers add
//! their own with [`DiagnosticRegistry::register`].

use indexmap::IndexMap;
use log::debug;

use crate::builtin::{BoundarySplit, DiffusivitySum, QuantitySum, ShellCount};
use crate::error::RegistryError;
use crate::producer::DiagnosticProducer;

/// One enabled producer in a run configuration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProducerSpec {
    /// Registry name.
    pub name: String,
    /// Quantity argument, for producers that read one.
    pub quantity: Option<String>,
}

impl ProducerSpec {
    /// A producer with no arguments.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            quantity: None,
        }
    }

    /// Attach a quantity argument.
    pub fn with_quantity(mut self, quantity: impl Into<String>) -> Self {
        self.quantity = Some(quantity.into());
        self
    }
}

/// Builds a producer from its spec.
pub type ProducerFactory =
    Box<dyn Fn(&ProducerSpec) -> Result<Box<dyn DiagnosticProducer>, RegistryError> + Send + Sync>;

/// Registry of producer factories, in registration order.
pub struct DiagnosticRegistry {
    factories: IndexMap<String, ProducerFactory>,
}

impl DiagnosticRegistry {
    /// An empty registry, like [`Default`].
    pub fn new() -> Self {
        Self {
            factories: IndexMap::new(),
        }
    }

    /// A registry holding `shell_count`, `quantity_sum`,
    /// `boundary_split` and `diffusivity_sum`.
    pub fn with_builtins() -> Self {
        let mut reg = Self::new();
        reg.insert("shell_count", |_| Ok(Box::new(ShellCount)));
        reg.insert("quantity_sum", |spec| {
            Ok(Box::new(QuantitySum::new(required_quantity(spec)?)))
        });
        reg.insert("boundary_split", |spec| {
            Ok(Box::new(BoundarySplit::new(required_quantity(spec)?)))
        });
        reg.insert("diffusivity_sum", |_| Ok(Box::new(DiffusivitySum)));
        reg
    }

    fn insert<F>(&mut self, name: &str, factory: F)
    where
        F: Fn(&ProducerSpec) -> Result<Box<dyn DiagnosticProducer>, RegistryError>
            + Send
            + Sync
            + 'static,
    {
        self.factories.insert(name.to_string(), Box::new(factory));
    }

    /// Add a factory under `name`. Names must be unique.
    pub fn register<F>(&mut self, name: impl Into<String>, factory: F) -> Result<(), RegistryError>
    where
        F: Fn(&ProducerSpec) -> Result<Box<dyn DiagnosticProducer>, RegistryError>
            + Send
            + Sync
            + 'static,
    {
        let name = name.into();
        if self.factories.contains_key(&name) {
            return Err(RegistryError::DuplicateProducer { name });
        }
        self.factories.insert(name, Box::new(factory));
        Ok(())
    }

    /// Whether `name` is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    /// Registered names, in registration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.factories.keys().map(String::as_str)
    }

    /// Build the producer for one spec.
    pub fn build(&self, spec: &ProducerSpec) -> Result<Box<dyn DiagnosticProducer>, RegistryError> {
        let factory = self
            .factories
            .get(&spec.name)
            .ok_or_else(|| RegistryError::UnknownProducer {
                name: spec.name.clone(),
            })?;
        let producer = factory(spec)?;
        debug!(
            "diagnostic producer {} built with {} slot(s)",
            producer.name(),
            producer.slots().len()
        );
        Ok(producer)
    }

    /// Build every spec, in order.
    pub fn build_all(
        &self,
        specs: &[ProducerSpec],
    ) -> Result<Vec<Box<dyn DiagnosticProducer>>, RegistryError> {
        specs.iter().map(|s| self.build(s)).collect()
    }
}

impl Default for DiagnosticRegistry {
    /// Same as [`new`](Self::new): empty. Use
    /// [`with_builtins`](Self::with_builtins) for the built-ins.
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for DiagnosticRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.factories.keys()).finish()
    }
}

fn required_quantity(spec: &ProducerSpec) -> Result<String, RegistryError> {
    spec.quantity
        .clone()
        .ok_or_else(|| RegistryError::MissingQuantity {
            producer: spec.name.clone(),
        })
}
