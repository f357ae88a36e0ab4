/// Redis integration
///
/// Redis backs the export job status cache (see `crate::jobs`). This module
/// only owns the connection: configuration, connect with a timeout, and a
/// PING health check.

pub mod client;

pub use client::{RedisClient, RedisClientError, RedisConfig};
