use super::{Dispatcher, pick};
use crate::queue::BoundedQueue;

/// Uniform assignment, blind to queue state.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomDispatch;

impl Dispatcher for RandomDispatch {
    fn select(&self, queues: &[BoundedQueue], draw: f64) -> usize {
        pick(draw, queues.len())
    }

    fn name(&self) -> &str { "random" }

    fn clone_box(&self) -> Box<dyn Dispatcher> {
        Box::new(*self)
    }
}
