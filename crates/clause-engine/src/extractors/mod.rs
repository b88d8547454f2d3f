pub mod deadlines;

pub use deadlines::extract_deadlines;
