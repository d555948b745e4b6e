pub mod cache;
pub mod extract;
pub mod fetch;
pub mod worker;

pub use cache::PriceCache;
pub use fetch::{FfxiahSource, PriceSource};
pub use worker::{BatchOutcome, FetchEvent, InteractiveFetch};
