//! Periodic tick sources that drive the trainer
//!
//! The trainer never reads the clock itself; it waits on a [`TickSource`].

mod interval;

use std::future::Future;

pub use interval::IntervalTicks;

/// A source of periodic ticks
pub trait TickSource: Send {
    /// Wait for the next tick; must be cancel safe
    fn next_tick(&mut self) -> impl Future<Output = ()> + Send;
}
