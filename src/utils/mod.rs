pub mod point2d;
pub mod time;
