//! # Domain Q&A Agent
//!
//! A specialized Q&A service that answers questions by searching a curated
//! set of documentation websites, grouped by domain.
//!
//! This library provides:
//! - An HTTP API for chatting with the agent and managing sessions
//! - A think/act/observe reasoning loop around an LLM
//! - Domain-restricted web search and headless-browser scraping tools
//!
//! ## Architecture
//!
//! Each session owns an agent controller bound to an immutable snapshot of
//! the domain catalogue. Per turn the controller asks the LLM for one
//! structured action at a time - a tool call or the final answer - executes
//! it, feeds the observation back, and repeats up to a fixed iteration
//! ceiling. Tool failures never escape the loop; they come back as text for
//! the model to reason over.

pub mod agent;
pub mod api;
pub mod catalogue;
pub mod config;
pub mod llm;
pub mod session;
pub mod tools;

pub use config::Config;
