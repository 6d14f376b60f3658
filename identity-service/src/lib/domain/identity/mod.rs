pub mod errors;
pub mod models;
pub mod ports;
pub mod resolver;
pub mod service;

#[cfg(test)]
pub mod test_support;
