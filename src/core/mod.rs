pub mod document_parser;
pub mod errors;
pub mod export;
pub mod field_extractor;
pub mod models;
pub mod ocr;
pub mod pdf;
pub mod result_store;
pub mod routes;
pub mod service;
pub mod settings;
pub mod skills;
