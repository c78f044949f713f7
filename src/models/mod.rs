pub mod task;

pub use task::{
    AddTaskRequest, DeleteTaskRequest, ListFilter, Progress, SetPositionRequest, SetTodayRequest,
    ListedTask, Task, TaskDetail, TaskNode, UpdateDescriptionRequest, UpdateTitleRequest,
};
