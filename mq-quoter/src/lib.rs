pub mod aggregator;
pub mod builder;
pub mod chain;
pub mod config;
pub mod driver;
pub mod formatter;

#[cfg(test)]
mod testing;
