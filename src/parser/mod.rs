mod table;

pub use table::{extract, ExtractedTable};

#[cfg(test)]
mod tests;
