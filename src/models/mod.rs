pub mod booking;
pub mod vehicle;
