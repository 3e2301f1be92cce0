pub mod encode_request;
pub mod encode_route;
