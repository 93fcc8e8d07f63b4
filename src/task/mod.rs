pub mod task_dto;
pub mod task_effects;
pub mod task_handlers;
pub mod task_models;
pub mod task_repository;
pub mod task_service;

pub use task_effects::TaskEffects;
pub use task_handlers::{
    create_task, delete_task, get_task, get_task_stats, get_tasks, update_task, update_task_status,
};
pub use task_models::{Priority, Task, TaskCategory, TaskStats, TaskStatus};
pub use task_repository::{PgTaskRepository, TaskRepository};
pub use task_service::TaskService;
