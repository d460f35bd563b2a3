pub mod completion;
pub mod controller;
pub mod converter;
pub mod validation;
pub mod wizard;
