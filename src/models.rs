// src/models.rs

pub mod account;
pub mod auth;
pub mod campaign;
pub mod contact;
pub mod entity;
pub mod fields;
pub mod listing;
