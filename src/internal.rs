pub mod event;
pub mod gate;
