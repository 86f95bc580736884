pub mod api;
pub mod duration;
pub mod models;
pub mod url;
