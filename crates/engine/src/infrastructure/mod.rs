//! Infrastructure - ports and their concrete adapters.

pub mod config;
pub mod gateway;
pub mod grok;
pub mod memory;
pub mod ollama;
pub mod openai;
pub mod ports;
pub mod resilient_llm;
