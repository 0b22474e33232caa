pub mod dispatch;
mod quiz;
mod render;
