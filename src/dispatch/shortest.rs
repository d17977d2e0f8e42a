use super::{Dispatcher, pick};
use crate::queue::BoundedQueue;

/// Join-the-shortest-queue. Ties are broken uniformly with the arrival's draw.
#[derive(Debug, Clone, Copy, Default)]
pub struct ShortestQueueDispatch;

impl Dispatcher for ShortestQueueDispatch {
    fn select(&self, queues: &[BoundedQueue], draw: f64) -> usize {
        let Some(shortest) = queues.iter().map(BoundedQueue::len).min() else {
            return 0;
        };

        let tied: Vec<usize> = queues
            .iter()
            .enumerate()
            .filter(|(_, q)| q.len() == shortest)
            .map(|(i, _)| i)
            .collect();

        tied[pick(draw, tied.len())]
    }

    fn name(&self) -> &str { "shortest-queue" }

    fn clone_box(&self) -> Box<dyn Dispatcher> {
        Box::new(*self)
    }
}
