pub mod classify;
pub mod crew;
pub mod engine;
pub mod fetch;
pub mod geo;
pub mod output;
pub mod parser;
pub mod record;
pub mod report;
pub mod signals;
