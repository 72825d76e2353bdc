pub mod project;
pub mod selection;
pub mod ticket;
