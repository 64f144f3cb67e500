// imgdesc - Image description gateway backed by Vertex AI Gemini
// Author: kelexine (https://github.com/kelexine)

pub mod auth;
pub mod cli;
pub mod config;
pub mod describe;
pub mod error;
pub mod metrics;
pub mod models;
pub mod server;
pub mod utils;
pub mod vertex;
pub mod vision;
