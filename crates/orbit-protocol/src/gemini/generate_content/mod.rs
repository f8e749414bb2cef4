pub mod request;
pub mod response;

pub use request::{GenerateContentPath, GenerateContentRequest, GenerateContentRequestBody};
pub use response::{Candidate, GenerateContentResponse, NO_CONTENT_REPLY};
