pub mod batch;
pub mod ticket;
