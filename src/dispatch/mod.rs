pub mod random;
pub mod shortest;

use crate::error::ConfigError;
use crate::queue::BoundedQueue;
use std::collections::HashMap;
use std::fmt;

pub use random::RandomDispatch;
pub use shortest::ShortestQueueDispatch;

/// Picks the queue that receives the next arrival.
///
/// `draw` is a uniform sample from `[0, 1)`. The driver takes exactly one per
/// arrival whatever the policy, so every policy consumes the same random stream.
pub trait Dispatcher: Send + Sync + fmt::Debug {
    fn select(&self, queues: &[BoundedQueue], draw: f64) -> usize;
    fn name(&self) -> &str;
    fn clone_box(&self) -> Box<dyn Dispatcher>;
}

impl Clone for Box<dyn Dispatcher> {
    fn clone(&self) -> Self {
        self.clone_box()
    }
}

/// Maps a uniform draw onto `0..n`.
pub(crate) fn pick(draw: f64, n: usize) -> usize {
    ((draw * n as f64) as usize).min(n.saturating_sub(1))
}

pub struct DispatchRegistry {
    policies: HashMap<String, Box<dyn Fn() -> Box<dyn Dispatcher> + Send + Sync>>,
}

impl DispatchRegistry {
    pub fn new() -> Self {
        let mut registry = Self {
            policies: HashMap::new(),
        };
        registry.register_builtin();
        registry
    }

    fn register_builtin(&mut self) {
        self.register("random", || Box::new(RandomDispatch));
        self.register("rnd", || Box::new(RandomDispatch));
        self.register("shortest-queue", || Box::new(ShortestQueueDispatch));
        self.register("jsq", || Box::new(ShortestQueueDispatch));
        self.register("min", || Box::new(ShortestQueueDispatch));
    }

    pub fn register<F>(&mut self, name: &str, factory: F)
    where
        F: Fn() -> Box<dyn Dispatcher> + Send + Sync + 'static,
    {
        self.policies.insert(name.to_lowercase(), Box::new(factory));
    }

    pub fn create(&self, name: &str) -> Result<Box<dyn Dispatcher>, ConfigError> {
        self.policies
            .get(&name.to_lowercase())
            .map(|factory| factory())
            .ok_or_else(|| ConfigError::UnknownPolicy(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.policies.contains_key(&name.to_lowercase())
    }

    pub fn list(&self) -> Vec<String> {
        let mut names: Vec<String> = self.policies.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn global() -> &'static DispatchRegistry {
        use std::sync::OnceLock;
        static REGISTRY: OnceLock<DispatchRegistry> = OnceLock::new();
        REGISTRY.get_or_init(DispatchRegistry::new)
    }
}

impl Default for DispatchRegistry {
    fn default() -> Self {
        Self::new()
    }
}
