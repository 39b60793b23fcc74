pub mod detector;
pub mod frame;
pub mod frame_dir;
pub mod report;
