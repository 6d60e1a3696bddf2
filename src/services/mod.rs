pub mod database;
pub mod pdf;
pub mod producer_service;
pub mod retry;
pub mod storage;
pub mod upload_service;
pub mod webhook;
