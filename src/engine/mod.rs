pub mod booking;
pub mod lifecycle;
pub mod pricing;
pub mod ranking;
pub mod ride;
pub mod timers;
pub mod tracking;
