//! Roast API Client
//!
//! Hand-written client for the RoastMyStartup HTTP API, split into the wire
//! types, the transport seam and the client itself.

mod roast;
mod transport;
mod types;

pub use roast::{
    DEFAULT_BASE_URL, ErrorKind, RoastClient, RoastError, RoastResult, decode_response,
    generate_roast,
};
pub use transport::{HttpResponse, HttpTransport, Transport, TransportError};
pub use types::*;
