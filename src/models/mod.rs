pub mod booking;
pub mod history;
pub mod insight;
pub mod location;
pub mod offer;
pub mod search;
