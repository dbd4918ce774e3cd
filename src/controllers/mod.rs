pub mod clone;
pub mod health;
