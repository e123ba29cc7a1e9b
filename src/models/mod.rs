pub mod task;
pub mod user;

pub use task::{
    completion_time, PaginatedTasks, SortDirection, SortField, Task, TaskInput, TaskQuery, TaskRow,
    TaskStatus, TaskStatusUpdate, COMPLETED_TASK_STATUS_ID, NOT_COMPLETED_TASK_STATUS_ID,
};
pub use user::{User, UserInput};
