mod crawler;

pub use crawler::{Crawler, RunOutcome};

#[cfg(test)]
mod tests;
