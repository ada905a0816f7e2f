//! Fetch and publish steps.
//!
//! Every step classifies its own result. Per-item failures are returned as
//! outcomes, never as errors, so one bad submodel cannot stop the batch.

use crate::config::PublishMode;
use serde_json::Value;
use sm_migrate_adapter_aas::{
    encode_submodel_id, BearerToken, ClientError, ShellDescriptor, TwinClient,
};
use sm_migrate_core::{label_of, DocumentError, Outcome, OutcomeKind, SubmodelDocument};

/// Reads submodels from the source API.
pub struct SubmodelFetcher<'a> {
    client: &'a TwinClient,
    source_url: &'a str,
}

impl<'a> SubmodelFetcher<'a> {
    /// Create a fetcher for a source submodel collection.
    #[must_use]
    pub fn new(client: &'a TwinClient, source_url: &'a str) -> Self {
        Self { client, source_url }
    }

    /// Source URL of a submodel.
    #[must_use]
    pub fn submodel_url(&self, submodel_id: &str) -> String {
        format!(
            "{}/{}",
            self.source_url.trim_end_matches('/'),
            encode_submodel_id(submodel_id)
        )
    }

    /// Fetch one submodel.
    ///
    /// # Errors
    ///
    /// Returns a [`FetchFailure`] on any non-200 response, transport error,
    /// or a body that is not a JSON object.
    pub async fn fetch(&self, submodel_id: &str) -> Result<SubmodelDocument, FetchFailure> {
        let url = self.submodel_url(submodel_id);
        tracing::debug!(submodel_id, url, "Fetching submodel");

        let value = self
            .client
            .get_json(&url)
            .await
            .map_err(|source| FetchFailure::Http {
                submodel_id: submodel_id.to_string(),
                source,
            })?;

        SubmodelDocument::from_value(value).map_err(|source| FetchFailure::Document {
            submodel_id: submodel_id.to_string(),
            source,
        })
    }
}

/// A submodel that could not be fetched.
#[derive(Debug, Clone, thiserror::Error)]
pub enum FetchFailure {
    /// Transport failure or non-200 status
    #[error("failed to fetch {submodel_id}: {source}")]
    Http {
        /// Requested submodel URN
        submodel_id: String,
        /// Underlying client error
        source: ClientError,
    },
    /// Body was not a JSON object
    #[error("unusable body for {submodel_id}: {source}")]
    Document {
        /// Requested submodel URN
        submodel_id: String,
        /// Underlying document error
        source: DocumentError,
    },
}

impl FetchFailure {
    /// The submodel URN that failed.
    #[must_use]
    pub fn submodel_id(&self) -> &str {
        match self {
            Self::Http { submodel_id, .. } | Self::Document { submodel_id, .. } => submodel_id,
        }
    }

    /// Record this failure as a `failed` outcome labelled by the URN.
    #[must_use]
    pub fn into_outcome(self) -> Outcome {
        match self {
            Self::Http { submodel_id, .. } | Self::Document { submodel_id, .. } => {
                Outcome::failed(submodel_id)
            }
        }
    }
}

/// Writes fetched submodels to the destination API.
pub struct SubmodelPublisher<'a> {
    client: &'a TwinClient,
    dest_url: &'a str,
    token: Option<&'a BearerToken>,
    dry_run: bool,
}

impl<'a> SubmodelPublisher<'a> {
    /// Create a publisher. With `dry_run` set, nothing is ever sent.
    #[must_use]
    pub fn new(
        client: &'a TwinClient,
        dest_url: &'a str,
        token: Option<&'a BearerToken>,
        dry_run: bool,
    ) -> Self {
        Self {
            client,
            dest_url,
            token,
            dry_run,
        }
    }

    /// Publish a fetched document according to `mode`.
    ///
    /// Returns one outcome per POST (or would-be POST in dry-run).
    pub async fn publish_document(
        &self,
        document: &SubmodelDocument,
        mode: PublishMode,
    ) -> Vec<Outcome> {
        match mode {
            PublishMode::Submodel => vec![self.publish(&document.to_value()).await],
            PublishMode::DataSourceItems => {
                let units = document.publish_units();
                tracing::debug!(
                    submodel = document.label(),
                    items = units.len(),
                    "Publishing data-source items"
                );

                let mut outcomes = Vec::with_capacity(units.len());
                for unit in &units {
                    outcomes.push(self.publish(unit).await);
                }
                outcomes
            }
        }
    }

    /// POST one payload and classify the response.
    pub async fn publish(&self, payload: &Value) -> Outcome {
        let label = label_of(payload);

        if self.dry_run {
            tracing::info!(label, "[DRY-RUN] Would POST");
            return Outcome::dry_run(label);
        }

        let token = self.token.map(BearerToken::secret);
        let response = match self.client.post_json(self.dest_url, payload, token).await {
            Ok(response) => response,
            Err(err) => {
                tracing::warn!(label, error = %err, "POST failed");
                return Outcome::failed(label);
            }
        };

        let kind = OutcomeKind::from_post_status(response.status);
        log_post(PostTarget::Destination, kind, label, response.status, &response.body);
        Outcome::new(kind, label)
    }
}

/// Registers shell descriptors in the digital twin registry.
pub struct DescriptorPublisher<'a> {
    client: &'a TwinClient,
    registry_url: &'a str,
    token: Option<&'a BearerToken>,
    dry_run: bool,
}

impl<'a> DescriptorPublisher<'a> {
    /// Create a descriptor publisher. With `dry_run` set, nothing is ever sent.
    #[must_use]
    pub fn new(
        client: &'a TwinClient,
        registry_url: &'a str,
        token: Option<&'a BearerToken>,
        dry_run: bool,
    ) -> Self {
        Self {
            client,
            registry_url,
            token,
            dry_run,
        }
    }

    /// POST a shell descriptor. The outcome is labelled by the asset name.
    pub async fn publish(&self, descriptor: &ShellDescriptor) -> Outcome {
        let label = descriptor.id_short.as_str();

        if self.dry_run {
            tracing::info!(
                asset = label,
                shell_id = %descriptor.id,
                submodels = descriptor.submodel_descriptors.len(),
                "[DRY-RUN] Would register shell descriptor"
            );
            match serde_json::to_string_pretty(descriptor) {
                Ok(json) => tracing::debug!(asset = label, descriptor = %json, "Descriptor payload"),
                Err(err) => tracing::debug!(
                    asset = label,
                    error = %err,
                    "Failed to serialize descriptor for logging"
                ),
            }
            return Outcome::dry_run(label);
        }

        let token = self.token.map(BearerToken::secret);
        let response = match self
            .client
            .post_json(self.registry_url, descriptor, token)
            .await
        {
            Ok(response) => response,
            Err(err) => {
                tracing::warn!(asset = label, error = %err, "Descriptor POST failed");
                return Outcome::failed(label);
            }
        };

        let kind = OutcomeKind::from_post_status(response.status);
        log_post(PostTarget::Registry, kind, label, response.status, &response.body);
        Outcome::new(kind, label)
    }
}

/// Receiver of a classified POST.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PostTarget {
    Destination,
    Registry,
}

impl PostTarget {
    fn rejection(self) -> &'static str {
        match self {
            Self::Destination => "Destination rejected POST",
            Self::Registry => "Registry rejected descriptor",
        }
    }
}

fn log_post(target: PostTarget, kind: OutcomeKind, label: &str, status: u16, body: &str) {
    match kind {
        OutcomeKind::Posted => tracing::info!(label, status, "[OK] Posted"),
        OutcomeKind::Skipped => tracing::info!(label, "[SKIP] Already exists (409)"),
        OutcomeKind::Failed | OutcomeKind::DryRun => {
            tracing::warn!(label, status, body, "[FAIL] {}", target.rejection());
        }
    }
}
