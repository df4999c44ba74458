use std::collections::HashMap;
use std::sync::Arc;

use crate::calculator::Calculator;

/// The set of calculator variants enabled for this process.
///
/// Built once at startup; lookups never change afterwards.
#[derive(Default)]
pub struct CalculatorRegistry {
    calculators: HashMap<String, Arc<dyn Calculator>>,
    order: Vec<String>,
}

impl CalculatorRegistry {
    pub fn get(&self, id: &str) -> Option<Arc<dyn Calculator>> {
        self.calculators.get(id).cloned()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.calculators.contains_key(id)
    }

    /// Registered type tags in registration order.
    pub fn ids(&self) -> &[String] {
        &self.order
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

/// Builder for creating registries
#[derive(Default)]
pub struct RegistryBuilder {
    registry: CalculatorRegistry,
}

impl RegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a calculator under its [`Calculator::id`]. A later registration with the same
    /// id replaces the earlier one but keeps its position.
    pub fn add_calculator(mut self, calculator: Arc<dyn Calculator>) -> Self {
        let id = calculator.id().to_string();
        if self.registry.calculators.insert(id.clone(), calculator).is_none() {
            self.registry.order.push(id);
        }
        self
    }

    pub fn build(self) -> CalculatorRegistry {
        self.registry
    }
}
