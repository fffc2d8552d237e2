// AquaPi chat assistant: session state, generative dispatch and the
// structured flows (suggestions, water analysis, automation scripts).

pub mod assistant;
pub mod handlers;
pub mod models;
pub mod prompts;
pub mod session;
