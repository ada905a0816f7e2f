//! Migration configuration.
//!
//! Settings are merged once at startup from three sources, highest
//! precedence first: the env file, the process environment, built-in
//! defaults. The process environment itself is never modified.

use sm_migrate_adapter_aas::{decode_submodel_id, ClientCredentials, TwinClientConfig};
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;
use url::Url;

/// Env file read when no path is given on the command line.
pub const DEFAULT_ENV_FILE: &str = "env.txt";

/// `KEY=VALUE` pairs read from an env file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvFile {
    vars: BTreeMap<String, String>,
}

impl EnvFile {
    /// Read and parse an env file.
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be read or contains a malformed line.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::Load {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        let file = Self::parse(&contents)?;
        tracing::debug!(path = %path.display(), vars = file.len(), "Loaded env file");
        Ok(file)
    }

    /// Parse env file contents.
    ///
    /// Blank lines and lines starting with `#` are ignored. Each remaining
    /// line is split on its first `=`; the key is trimmed, the value kept
    /// as written. Later lines win over earlier ones.
    ///
    /// # Errors
    ///
    /// Returns error if a line has no `=` or an empty key.
    pub fn parse(contents: &str) -> Result<Self, ConfigError> {
        let mut vars = BTreeMap::new();

        for (index, raw) in contents.lines().enumerate() {
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let Some((key, value)) = line.split_once('=') else {
                return Err(ConfigError::Malformed { line: index + 1 });
            };
            let key = key.trim();
            if key.is_empty() {
                return Err(ConfigError::Malformed { line: index + 1 });
            }

            vars.insert(key.to_string(), value.to_string());
        }

        Ok(Self { vars })
    }

    /// Look up a key.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.vars.get(key).map(String::as_str)
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.vars.len()
    }

    /// Whether the file had no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }
}

/// How a fetched submodel is written to the destination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PublishMode {
    /// POST the whole resource once
    #[default]
    Submodel,
    /// POST each entry of `dataSourceItems`, or the resource when there are none
    DataSourceItems,
}

impl FromStr for PublishMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "submodel" => Ok(Self::Submodel),
            "data-source-items" | "items" => Ok(Self::DataSourceItems),
            other => Err(format!("unknown publish mode '{other}'")),
        }
    }
}

impl fmt::Display for PublishMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Submodel => write!(f, "submodel"),
            Self::DataSourceItems => write!(f, "data-source-items"),
        }
    }
}

/// Full migration configuration.
#[derive(Debug, Clone)]
pub struct MigrateConfig {
    /// Source and destination endpoints
    pub endpoints: EndpointConfig,

    /// OAuth2 client-credentials
    pub credentials: ClientCredentials,

    /// Registry descriptor settings
    pub descriptor: DescriptorConfig,

    /// HTTP client settings
    pub http: TwinClientConfig,

    /// What to migrate and how
    pub plan: MigrationPlan,
}

/// Source and destination endpoints.
#[derive(Debug, Clone)]
pub struct EndpointConfig {
    /// Source submodel collection; submodels are read from `{source_url}/{encoded-urn}`
    pub source_url: String,

    /// Destination submodel collection
    pub dest_url: String,

    /// Registry shell-descriptor collection
    pub shell_descriptor_url: String,
}

/// Registry descriptor settings.
#[derive(Debug, Clone)]
pub struct DescriptorConfig {
    /// Register shell descriptors after migration
    pub register: bool,

    /// Data-plane base URL used in submodel endpoint hrefs
    pub data_plane_url: String,

    /// `id` part of the subprotocol body
    pub subprotocol_body_id: String,

    /// `dspEndpoint` part of the subprotocol body
    pub dsp_endpoint: String,
}

/// What to migrate.
#[derive(Debug, Clone)]
pub struct MigrationPlan {
    /// Asset names, in processing order
    pub assets: Vec<String>,

    /// Decoded submodel-type suffixes, in processing order
    pub submodel_suffixes: Vec<String>,

    /// Decoded URN prefix
    pub urn_prefix: String,

    /// Publish granularity
    pub publish_mode: PublishMode,

    /// Read everything, write nothing
    pub dry_run: bool,
}

impl Default for MigrateConfig {
    fn default() -> Self {
        Self {
            endpoints: EndpointConfig {
                source_url: "https://source.example.com/api/submodels".to_string(),
                dest_url: "https://dest.example.com/api/submodels".to_string(),
                shell_descriptor_url: "https://dtr.example.com/api/v3/shell-descriptors"
                    .to_string(),
            },
            credentials: ClientCredentials {
                token_url: "https://auth.example.com/realms/myrealm/protocol/openid-connect/token"
                    .to_string(),
                client_id: "my-client-id".to_string(),
                client_secret: "my-secret".to_string(),
            },
            descriptor: DescriptorConfig {
                register: true,
                data_plane_url: "https://dataplane.example.com/api/public".to_string(),
                subprotocol_body_id: "BPNL000000000000".to_string(),
                dsp_endpoint: "https://controlplane.example.com/api/v1/dsp".to_string(),
            },
            http: TwinClientConfig::default(),
            plan: MigrationPlan {
                assets: [
                    "train.1",
                    "measuring_wagon",
                    "locomotive.cargo",
                    "cargo_wagon.1",
                ]
                .map(String::from)
                .to_vec(),
                submodel_suffixes: [":pcf:1.0.0", ":handling:1.0.0", ":nameplate:1.0.0"]
                    .map(String::from)
                    .to_vec(),
                urn_prefix: "urn:ag.em:sm:".to_string(),
                publish_mode: PublishMode::Submodel,
                dry_run: false,
            },
        }
    }
}

impl MigrateConfig {
    /// Load the env file at `path` and merge it with the process environment.
    ///
    /// # Environment Variables
    ///
    /// - `MX_THINK_SOURCE_URL`, `MX_THINK_DEST_URL`: submodel collections
    /// - `MX_THINK_TOKEN_URL`, `MX_THINK_CLIENT_ID`, `MX_THINK_CLIENT_SECRET`: OAuth2
    /// - `MX_THINK_DTR_SHELL_DESCR_URL`: registry shell-descriptor collection
    /// - `DATA_PLANE_URL`, `SUBPROTOCOL_BODY_ID`, `SUBPROTOCOL_BODY_DSP_ENDPOINT`: descriptors
    /// - `DRY_RUN`: `true` (any case) enables dry-run
    /// - `MX_THINK_ASSETS`, `MX_THINK_SUBMODEL_SUFFIXES`: comma-separated lists;
    ///   suffixes and `MX_THINK_URN_PREFIX` may be percent-encoded
    /// - `MX_THINK_URN_PREFIX`, `MX_THINK_PUBLISH_MODE`, `MX_THINK_REGISTER_DESCRIPTORS`
    /// - `MX_THINK_TIMEOUT_SECS`, `MX_THINK_CA_CERT`, `MX_THINK_INSECURE_TLS`
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be loaded or a value is invalid.
    pub fn from_env_file(path: &Path) -> Result<Self, ConfigError> {
        let file = EnvFile::load(path)?;
        Self::from_sources(&file, |key| std::env::var(key).ok())
    }

    /// Merge an env file, an environment lookup, and defaults.
    ///
    /// # Errors
    ///
    /// Returns error if a URL does not parse, a number is invalid, a list
    /// is empty, or the publish mode is unknown.
    pub fn from_sources<F>(file: &EnvFile, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| file.get(key).map(str::to_string).or_else(|| lookup(key));
        let mut config = Self::default();

        if let Some(url) = var("MX_THINK_SOURCE_URL") {
            config.endpoints.source_url = url;
        }
        if let Some(url) = var("MX_THINK_DEST_URL") {
            config.endpoints.dest_url = url;
        }
        if let Some(url) = var("MX_THINK_DTR_SHELL_DESCR_URL") {
            config.endpoints.shell_descriptor_url = url;
        }

        if let Some(url) = var("MX_THINK_TOKEN_URL") {
            config.credentials.token_url = url;
        }
        if let Some(id) = var("MX_THINK_CLIENT_ID") {
            config.credentials.client_id = id;
        }
        if let Some(secret) = var("MX_THINK_CLIENT_SECRET") {
            config.credentials.client_secret = secret;
        }

        if let Some(url) = var("DATA_PLANE_URL") {
            config.descriptor.data_plane_url = url;
        }
        if let Some(id) = var("SUBPROTOCOL_BODY_ID") {
            config.descriptor.subprotocol_body_id = id;
        }
        if let Some(endpoint) = var("SUBPROTOCOL_BODY_DSP_ENDPOINT") {
            config.descriptor.dsp_endpoint = endpoint;
        }
        if let Some(flag) = var("MX_THINK_REGISTER_DESCRIPTORS") {
            config.descriptor.register = is_true(&flag);
        }

        if let Some(flag) = var("DRY_RUN") {
            config.plan.dry_run = is_true(&flag);
        }
        if let Some(assets) = var("MX_THINK_ASSETS") {
            config.plan.assets = parse_list("MX_THINK_ASSETS", &assets)?;
        }
        if let Some(suffixes) = var("MX_THINK_SUBMODEL_SUFFIXES") {
            config.plan.submodel_suffixes = parse_list("MX_THINK_SUBMODEL_SUFFIXES", &suffixes)?
                .iter()
                .map(|suffix| decode_urn_part("MX_THINK_SUBMODEL_SUFFIXES", suffix))
                .collect::<Result<_, _>>()?;
        }
        if let Some(prefix) = var("MX_THINK_URN_PREFIX") {
            config.plan.urn_prefix = decode_urn_part("MX_THINK_URN_PREFIX", &prefix)?;
        }
        if let Some(mode) = var("MX_THINK_PUBLISH_MODE") {
            config.plan.publish_mode = mode.parse().map_err(|message| ConfigError::Invalid {
                key: "MX_THINK_PUBLISH_MODE".to_string(),
                message,
            })?;
        }

        if let Some(secs) = var("MX_THINK_TIMEOUT_SECS") {
            let secs: u64 = secs.trim().parse().map_err(|_| ConfigError::Invalid {
                key: "MX_THINK_TIMEOUT_SECS".to_string(),
                message: format!("'{secs}' is not a whole number of seconds"),
            })?;
            config.http.timeout = Duration::from_secs(secs);
        }
        if let Some(path) = var("MX_THINK_CA_CERT") {
            config.http.ca_cert_path = Some(PathBuf::from(path));
        }
        if let Some(flag) = var("MX_THINK_INSECURE_TLS") {
            config.http.accept_invalid_certs = is_true(&flag);
        }

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        for (key, value) in [
            ("MX_THINK_SOURCE_URL", &self.endpoints.source_url),
            ("MX_THINK_DEST_URL", &self.endpoints.dest_url),
            (
                "MX_THINK_DTR_SHELL_DESCR_URL",
                &self.endpoints.shell_descriptor_url,
            ),
            ("MX_THINK_TOKEN_URL", &self.credentials.token_url),
            ("DATA_PLANE_URL", &self.descriptor.data_plane_url),
        ] {
            Url::parse(value).map_err(|e| ConfigError::InvalidUrl {
                key: key.to_string(),
                message: format!("{value}: {e}"),
            })?;
        }

        if self.http.timeout.is_zero() {
            return Err(ConfigError::Invalid {
                key: "MX_THINK_TIMEOUT_SECS".to_string(),
                message: "timeout must be positive".to_string(),
            });
        }

        Ok(())
    }
}

fn is_true(value: &str) -> bool {
    value.trim().eq_ignore_ascii_case("true")
}

/// URN parts may be given percent-encoded (`%3Apcf%3A1.0.0`) or decoded
/// (`:pcf:1.0.0`); both are stored decoded.
fn decode_urn_part(key: &str, value: &str) -> Result<String, ConfigError> {
    decode_submodel_id(value).map_err(|e| ConfigError::Invalid {
        key: key.to_string(),
        message: format!("'{value}': {e}"),
    })
}

fn parse_list(key: &str, value: &str) -> Result<Vec<String>, ConfigError> {
    let items: Vec<String> = value
        .split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect();

    if items.is_empty() {
        return Err(ConfigError::Invalid {
            key: key.to_string(),
            message: "list must not be empty".to_string(),
        });
    }

    Ok(items)
}

/// Errors raised while loading configuration.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ConfigError {
    /// Env file could not be read
    #[error("cannot load env file {}: {message}", .path.display())]
    Load {
        /// File path
        path: PathBuf,
        /// I/O error text
        message: String,
    },
    /// Env file line is not `KEY=VALUE`
    #[error("malformed env file line {line}: expected KEY=VALUE")]
    Malformed {
        /// 1-based line number
        line: usize,
    },
    /// A URL setting does not parse
    #[error("invalid URL in {key}: {message}")]
    InvalidUrl {
        /// Variable name
        key: String,
        /// Parse error
        message: String,
    },
    /// Any other invalid value
    #[error("invalid value for {key}: {message}")]
    Invalid {
        /// Variable name
        key: String,
        /// What is wrong
        message: String,
    },
}
