pub mod batch;
pub mod error;
pub mod quote;
pub mod request;

pub use batch::BatchResult;
pub use batch::BlockReference;
pub use batch::RawValue;
pub use error::AggregateError;
pub use error::BuildError;
pub use error::FormatError;
pub use error::RequestError;
pub use quote::PairQuote;
pub use quote::QuoteMeta;
pub use request::BatchEnvelope;
pub use request::ReadRequest;
