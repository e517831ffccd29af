pub mod assistant;
pub mod debounce;
pub mod error;
pub mod gemini;
pub mod locations;
pub mod store;
