pub mod arrivals;
pub mod client;
pub mod decoder;
pub mod direction;
pub mod engine;
pub mod feeds;
pub mod stations;

#[cfg(test)]
mod test_support;
