mod client;
mod core;
mod enrichment;
mod priority;
mod types;

pub use self::core::SentryProvider;
