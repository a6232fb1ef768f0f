pub mod category_list;
pub mod category_row;
pub mod cover_loader;
pub mod cover_waiters;
pub mod window;

pub use window::MainWindow;
