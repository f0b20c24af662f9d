pub mod annotator;
pub mod assembler;
pub mod handlers;
pub mod prompts;
pub mod sanitizer;
pub mod stream;
