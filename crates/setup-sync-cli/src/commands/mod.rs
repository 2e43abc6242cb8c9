pub mod models;
pub mod modules;
pub mod run;
pub mod status;
