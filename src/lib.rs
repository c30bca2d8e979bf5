// src/lib.rs — Library root for leafmarket

pub mod api;
pub mod connect;
pub mod infra;
pub mod model;
pub mod storage;
pub mod upload;
pub mod users;
