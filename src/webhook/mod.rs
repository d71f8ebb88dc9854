pub mod events;
pub mod handler;
pub mod response;
pub mod signature;
