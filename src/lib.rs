pub mod camera;
pub mod config;
pub mod garment;
pub mod pose;
pub mod render;
pub mod replay;
pub mod session;
pub mod tracker;
