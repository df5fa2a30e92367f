mod config;
mod lifecycle;
mod operations;
