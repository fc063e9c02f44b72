pub mod broadcast_service;
pub mod text_service;
