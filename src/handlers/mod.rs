pub mod exchange;
pub mod health;

pub use exchange::exchange_handler;
pub use health::health_handler;
