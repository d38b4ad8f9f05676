pub mod booking;
pub mod cancellation;
pub mod reschedule;
