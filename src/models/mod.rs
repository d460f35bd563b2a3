pub mod location;
pub mod order;
pub mod package;
pub mod segment;
pub mod user;
pub mod vehicle;
