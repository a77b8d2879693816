mod sweep;

pub use sweep::{PopupSweep, SweepReport};
