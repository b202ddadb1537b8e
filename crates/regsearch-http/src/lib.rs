//! regsearch-http
//!
//! Transport and decoding: plans a `FetchRequest` for a backend, sends it with
//! `reqwest`, and turns the `{ results, meta }` envelope into a `ResultPage`.

pub mod decoder;
pub mod fetcher;
pub mod request;

pub use decoder::ResponseDecoder;
pub use fetcher::HttpFetcher;
pub use request::plan_request;
