//! Migration orchestration.

use crate::config::MigrateConfig;
use crate::error::MigrateError;
use crate::pipeline::{DescriptorPublisher, SubmodelFetcher, SubmodelPublisher};
use sm_migrate_adapter_aas::{submodel_urn, BearerToken, DescriptorBuilder, TwinClient};
use sm_migrate_core::{MigrationSummary, Outcome, OutcomeKind};

/// Result of a completed run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MigrationReport {
    /// Submodel counters
    pub summary: MigrationSummary,
    /// One outcome per shell descriptor, labelled by asset
    pub descriptors: Vec<Outcome>,
}

/// Submodel ids of one asset that are present at the destination.
#[derive(Debug, Clone, PartialEq, Eq)]
struct PresentSubmodels {
    asset: String,
    submodel_ids: Vec<String>,
}

/// Drives one migration run.
pub struct Migrator {
    config: MigrateConfig,
    client: TwinClient,
}

impl Migrator {
    /// Create a migrator.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client cannot be created.
    pub fn new(config: MigrateConfig) -> Result<Self, MigrateError> {
        let client = TwinClient::new(config.http.clone())?;
        Ok(Self { config, client })
    }

    /// Run the migration.
    ///
    /// Submodels are processed strictly in order: assets outer, suffixes
    /// inner. Descriptors are built and registered only after every
    /// submodel has been handled.
    ///
    /// # Errors
    ///
    /// Returns error if the token cannot be obtained. Per-submodel and
    /// per-descriptor failures are counted, not returned.
    pub async fn run(&self) -> Result<MigrationReport, MigrateError> {
        let plan = &self.config.plan;
        tracing::info!(
            assets = plan.assets.len(),
            suffixes = plan.submodel_suffixes.len(),
            mode = %plan.publish_mode,
            dry_run = plan.dry_run,
            "Starting migration"
        );

        let token = self.acquire_token().await?;

        let fetcher = SubmodelFetcher::new(&self.client, &self.config.endpoints.source_url);
        let publisher = SubmodelPublisher::new(
            &self.client,
            &self.config.endpoints.dest_url,
            token.as_ref(),
            plan.dry_run,
        );

        let mut summary = MigrationSummary::default();
        let mut present = Vec::with_capacity(plan.assets.len());

        for asset in &plan.assets {
            tracing::info!(asset, "Migrating asset");
            let mut submodel_ids = Vec::new();

            for suffix in &plan.submodel_suffixes {
                let urn = submodel_urn(&plan.urn_prefix, asset, suffix);

                let document = match fetcher.fetch(&urn).await {
                    Ok(document) => document,
                    Err(failure) => {
                        tracing::warn!(
                            asset,
                            submodel_id = failure.submodel_id(),
                            error = %failure,
                            "[WARN] Fetch failed"
                        );
                        summary.record(&failure.into_outcome());
                        continue;
                    }
                };

                let outcomes = publisher
                    .publish_document(&document, plan.publish_mode)
                    .await;
                for outcome in &outcomes {
                    summary.record(outcome);
                }

                if !counts_as_present(&outcomes, plan.dry_run) {
                    continue;
                }
                match document.id().filter(|id| !id.trim().is_empty()) {
                    Some(id) => submodel_ids.push(id.to_string()),
                    None => tracing::warn!(
                        asset,
                        urn,
                        "Submodel has no usable id; leaving it out of the descriptor"
                    ),
                }
            }

            present.push(PresentSubmodels {
                asset: asset.clone(),
                submodel_ids,
            });
        }

        let descriptors = self.register_descriptors(&present, token.as_ref()).await;

        tracing::info!(
            total = summary.total,
            posted = summary.posted,
            skipped = summary.skipped,
            failed = summary.failed,
            "Migration finished"
        );

        Ok(MigrationReport {
            summary,
            descriptors,
        })
    }

    async fn acquire_token(&self) -> Result<Option<BearerToken>, MigrateError> {
        if self.config.plan.dry_run {
            tracing::info!("[DRY-RUN] Skipping token request");
            return Ok(None);
        }

        tracing::info!("Requesting OAuth2 token");
        let token = self
            .client
            .request_token(&self.config.credentials)
            .await?;
        tracing::info!("Token acquired");
        Ok(Some(token))
    }

    async fn register_descriptors(
        &self,
        present: &[PresentSubmodels],
        token: Option<&BearerToken>,
    ) -> Vec<Outcome> {
        let settings = &self.config.descriptor;
        if !settings.register {
            tracing::info!("Descriptor registration disabled");
            return Vec::new();
        }

        let builder = DescriptorBuilder::new(
            &settings.data_plane_url,
            &settings.subprotocol_body_id,
            &settings.dsp_endpoint,
        );
        let publisher = DescriptorPublisher::new(
            &self.client,
            &self.config.endpoints.shell_descriptor_url,
            token,
            self.config.plan.dry_run,
        );

        let mut outcomes = Vec::new();
        for entry in present {
            if entry.submodel_ids.is_empty() {
                tracing::info!(
                    asset = %entry.asset,
                    "No submodels present; skipping shell descriptor"
                );
                continue;
            }

            let descriptor = match builder.shell_descriptor(&entry.asset, &entry.submodel_ids) {
                Ok(descriptor) => descriptor,
                Err(err) => {
                    tracing::warn!(
                        asset = %entry.asset,
                        error = %err,
                        "[FAIL] Invalid shell descriptor"
                    );
                    outcomes.push(Outcome::failed(&entry.asset));
                    continue;
                }
            };
            tracing::info!(
                asset = %entry.asset,
                shell_id = %descriptor.id,
                submodels = descriptor.submodel_descriptors.len(),
                "Registering shell descriptor"
            );
            outcomes.push(publisher.publish(&descriptor).await);
        }

        outcomes
    }
}

/// A submodel is present when every publish of it was posted or skipped.
///
/// In dry-run, dry-run outcomes stand in for posts so descriptors can
/// still be previewed.
fn counts_as_present(outcomes: &[Outcome], dry_run: bool) -> bool {
    !outcomes.is_empty()
        && outcomes.iter().all(|outcome| {
            outcome.kind.is_present() || (dry_run && outcome.kind == OutcomeKind::DryRun)
        })
}
