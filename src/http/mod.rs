//! Request construction and the HTTP transport seam.
mod client;
mod request;
mod transport;

pub use client::{ClientSettings, build_client, build_transport};
pub use request::{
    BuiltRequest, CREDENTIAL_QUERY_PARAM, JSON_CONTENT_TYPE, PayloadInputs, RequestPayload,
    append_query, build_request, measurement_id,
};
pub use transport::{
    OutboundRequest, ReqwestTransport, ResponseBody, Transport, TransportError,
    TransportErrorKind, TransportResponse,
};

pub(crate) use request::non_blank;
