//! Entities managed by the record contracts

pub mod car;
pub mod model;
pub mod product;
pub mod stock;

pub use car::Car;
pub use model::Model;
pub use product::Product;
pub use stock::Stock;
