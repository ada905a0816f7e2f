//! Digital twin registry descriptors.
//!
//! A shell descriptor is registered once per asset and lists a submodel
//! descriptor for every submodel present at the destination. Each submodel
//! endpoint points at the data plane and carries the DSP subprotocol body a
//! connector needs to negotiate access.

use crate::encoding::encode_id_base64url;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

const INTERFACE: &str = "SUBMODEL-3.0";
const ENDPOINT_PROTOCOL: &str = "HTTP";
const ENDPOINT_PROTOCOL_VERSION: &str = "1.1";
const SUBPROTOCOL: &str = "DSP";
const SUBPROTOCOL_BODY_ENCODING: &str = "plain";
const NO_SECURITY: &str = "NONE";

/// Shell descriptor posted to the registry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShellDescriptor {
    /// Random `urn:uuid:` identifier
    pub id: String,
    /// Asset name
    pub id_short: String,
    /// Asset name
    pub global_asset_id: String,
    /// One entry per present submodel
    pub submodel_descriptors: Vec<SubmodelDescriptor>,
}

/// Submodel descriptor nested in a [`ShellDescriptor`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmodelDescriptor {
    /// Submodel id as reported by the source
    pub id: String,
    /// Always serialized as `null`
    pub semantic_id: Option<serde_json::Value>,
    /// Data-plane endpoints
    pub endpoints: Vec<Endpoint>,
}

/// Endpoint of a submodel descriptor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Endpoint {
    /// AAS interface name
    pub interface: String,
    /// How to reach the submodel
    pub protocol_information: ProtocolInformation,
}

/// Protocol information of an [`Endpoint`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProtocolInformation {
    /// Data-plane URL ending in the base64url-encoded submodel id
    pub href: String,
    /// Transport protocol
    pub endpoint_protocol: String,
    /// Transport protocol versions
    pub endpoint_protocol_version: Vec<String>,
    /// Connector subprotocol
    pub subprotocol: String,
    /// Connector connection string
    pub subprotocol_body: String,
    /// Encoding of `subprotocol_body`
    pub subprotocol_body_encoding: String,
    /// Security attributes
    pub security_attributes: Vec<SecurityAttribute>,
}

/// A security attribute entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecurityAttribute {
    /// Attribute type
    #[serde(rename = "type")]
    pub kind: String,
    /// Attribute key
    pub key: String,
    /// Attribute value
    pub value: String,
}

impl SecurityAttribute {
    fn none() -> Self {
        Self {
            kind: NO_SECURITY.to_string(),
            key: NO_SECURITY.to_string(),
            value: NO_SECURITY.to_string(),
        }
    }
}

/// Builds registry descriptors for one data plane.
#[derive(Debug, Clone)]
pub struct DescriptorBuilder {
    data_plane_url: String,
    subprotocol_body: String,
}

impl DescriptorBuilder {
    /// Create a builder.
    ///
    /// `asset_id` and `dsp_endpoint` form the subprotocol body
    /// `id={asset_id};dspEndpoint={dsp_endpoint}`.
    #[must_use]
    pub fn new(data_plane_url: &str, asset_id: &str, dsp_endpoint: &str) -> Self {
        Self {
            data_plane_url: data_plane_url.trim_end_matches('/').to_string(),
            subprotocol_body: format!("id={asset_id};dspEndpoint={dsp_endpoint}"),
        }
    }

    /// Data-plane URL for a submodel id.
    #[must_use]
    pub fn submodel_href(&self, submodel_id: &str) -> String {
        format!("{}/{}", self.data_plane_url, encode_id_base64url(submodel_id))
    }

    /// Build the descriptor of one submodel.
    #[must_use]
    pub fn submodel_descriptor(&self, submodel_id: &str) -> SubmodelDescriptor {
        SubmodelDescriptor {
            id: submodel_id.to_string(),
            semantic_id: None,
            endpoints: vec![Endpoint {
                interface: INTERFACE.to_string(),
                protocol_information: ProtocolInformation {
                    href: self.submodel_href(submodel_id),
                    endpoint_protocol: ENDPOINT_PROTOCOL.to_string(),
                    endpoint_protocol_version: vec![ENDPOINT_PROTOCOL_VERSION.to_string()],
                    subprotocol: SUBPROTOCOL.to_string(),
                    subprotocol_body: self.subprotocol_body.clone(),
                    subprotocol_body_encoding: SUBPROTOCOL_BODY_ENCODING.to_string(),
                    security_attributes: vec![SecurityAttribute::none()],
                },
            }],
        }
    }

    /// Build the shell descriptor of an asset with all of its present submodels.
    ///
    /// # Errors
    ///
    /// Returns error if the asset name is blank, the id list is empty, or
    /// any id is blank.
    pub fn shell_descriptor(
        &self,
        asset: &str,
        submodel_ids: &[String],
    ) -> Result<ShellDescriptor, ValidationError> {
        if asset.trim().is_empty() {
            return Err(ValidationError::EmptyAsset);
        }
        if submodel_ids.is_empty() {
            return Err(ValidationError::NoSubmodels(asset.to_string()));
        }
        if submodel_ids.iter().any(|id| id.trim().is_empty()) {
            return Err(ValidationError::EmptySubmodelId(asset.to_string()));
        }

        Ok(ShellDescriptor {
            id: format!("urn:uuid:{}", Uuid::new_v4()),
            id_short: asset.to_string(),
            global_asset_id: asset.to_string(),
            submodel_descriptors: submodel_ids
                .iter()
                .map(|id| self.submodel_descriptor(id))
                .collect(),
        })
    }
}

/// Errors raised for malformed descriptor input.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    /// Asset name is empty
    #[error("asset name must not be empty")]
    EmptyAsset,
    /// No submodel ids were supplied
    #[error("no submodel ids for asset '{0}'")]
    NoSubmodels(String),
    /// A submodel id is empty
    #[error("empty submodel id for asset '{0}'")]
    EmptySubmodelId(String),
}
