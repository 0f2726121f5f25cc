// Public API
mod builder;
pub use builder::{Builder, PollStrategy};

mod controller;
pub use controller::{Timer, TimerSnapshot};

mod worker;
pub use worker::live_workers;

// Internals
mod cancel;
use cancel::CancelSignal;

mod shared;
use shared::Shared;

mod ticker;
use ticker::{Ticker, TickerData, TickerEvents};
