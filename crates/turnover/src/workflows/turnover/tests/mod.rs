mod common;
mod service;
mod session;
