pub mod applicant_repository;
pub mod connection;
pub mod migrations;
pub mod models;
