mod log_viewer;
mod service_select;
mod stack_select;

pub use log_viewer::LogViewerScreen;
pub use service_select::ServiceSelectScreen;
pub use stack_select::StackSelectScreen;
