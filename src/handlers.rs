// src/handlers.rs

pub mod accounts;
pub mod campaigns;
pub mod contacts;
pub mod field_values;
pub mod fields;
pub mod records;
