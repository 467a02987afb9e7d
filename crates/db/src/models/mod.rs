mod debate;

pub use debate::DebateRow;
