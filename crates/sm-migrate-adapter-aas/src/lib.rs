//! # AAS Adapter
//!
//! Encoding rules, registry descriptors, and the HTTP client used to move
//! submodels between AAS endpoints.
//!
//! ## Encoding Rules
//!
//! - **Source submodel URNs**: percent-encoded into a single path segment
//! - **Registry submodel ids**: base64url-encoded WITHOUT padding
//!
//! Certificates are verified by default; disabling verification is an
//! explicit, logged opt-out on [`TwinClientConfig`].

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod auth;
pub mod client;
pub mod descriptor;
pub mod encoding;

pub use auth::{AuthError, BearerToken, ClientCredentials};
pub use client::{ClientError, PostResponse, TwinClient, TwinClientConfig};
pub use descriptor::{DescriptorBuilder, ShellDescriptor, SubmodelDescriptor, ValidationError};
pub use encoding::{
    decode_id_base64url, decode_submodel_id, encode_id_base64url, encode_submodel_id,
    submodel_urn, EncodingError,
};
