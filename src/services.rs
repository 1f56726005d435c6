// src/services.rs

pub mod auth;
pub mod campaign_service;
pub mod csv;
pub mod field_service;
pub mod filter;
pub mod record_service;
pub mod transfer_service;
