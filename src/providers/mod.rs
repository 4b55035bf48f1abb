pub mod sentry;
pub mod together;
