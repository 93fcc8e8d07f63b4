pub mod remark_dto;
pub mod remark_handlers;
pub mod remark_models;
pub mod remark_repository;
pub mod remark_service;

pub use remark_handlers::{create_remark, delete_remark, get_remarks, respond_to_remark};
pub use remark_models::{Remark, RemarkType};
pub use remark_repository::{PgRemarkRepository, RemarkRepository};
pub use remark_service::RemarkService;
