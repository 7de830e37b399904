pub mod events;
pub mod lifecycle;
pub mod status;
