pub mod chat;
pub mod encode;
pub mod health_route;
