//! Resolution of named contracts to deployed addresses on a given network

use std::{
    collections::HashMap,
    fs,
    path::PathBuf,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use admin_common::types::ContractName;
use alloy::{json_abi::JsonAbi, primitives::Address};
use serde::Deserialize;
use tracing::debug;

use crate::{
    constants::ARTIFACT_EXTENSION,
    errors::ScriptError,
    types::{ContractRef, NetworkId},
};

/// A deployment record of a contract on one network
#[derive(Clone, Debug, Deserialize)]
pub struct NetworkDeployment {
    /// The deployed address
    pub address: Address,
}

/// A contract build artifact: its interface and per-network deployments
#[derive(Clone, Debug, Deserialize)]
pub struct ContractArtifact {
    /// The contract's method and event signatures
    pub abi: JsonAbi,
    /// Deployments keyed by network identity
    #[serde(default)]
    pub networks: HashMap<String, NetworkDeployment>,
}

impl ContractArtifact {
    /// Parse an artifact from its JSON representation
    pub fn from_json(json: &str) -> Result<Self, ScriptError> {
        serde_json::from_str(json).map_err(|e| ScriptError::ArtifactParsing(e.to_string()))
    }
}

/// A source of contract build artifacts
pub trait ArtifactSource: Send + Sync {
    /// Load the artifact of the contract with the given name
    fn load(&self, name: &str) -> Result<ContractArtifact, ScriptError>;
}

/// Artifacts stored as `<name>.json` files in a directory
pub struct ArtifactDir {
    /// The directory containing the artifacts
    root: PathBuf,
}

impl ArtifactDir {
    /// Read artifacts from the given directory
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl ArtifactSource for ArtifactDir {
    fn load(&self, name: &str) -> Result<ContractArtifact, ScriptError> {
        let path = self.root.join(name).with_extension(ARTIFACT_EXTENSION);
        let contents = fs::read_to_string(&path)
            .map_err(|e| ScriptError::ReadArtifact(format!("{}: {}", path.display(), e)))?;

        ContractArtifact::from_json(&contents)
    }
}

/// Artifacts held in memory, for embedding the dispatcher in another process
#[derive(Default)]
pub struct StaticArtifacts {
    /// The artifacts, keyed by contract name
    artifacts: HashMap<String, ContractArtifact>,
}

impl StaticArtifacts {
    /// Add an artifact under the given contract name
    pub fn with_artifact(mut self, name: ContractName, artifact: ContractArtifact) -> Self {
        self.artifacts.insert(name.artifact_name().to_string(), artifact);
        self
    }
}

impl ArtifactSource for StaticArtifacts {
    fn load(&self, name: &str) -> Result<ContractArtifact, ScriptError> {
        self.artifacts
            .get(name)
            .cloned()
            .ok_or_else(|| ScriptError::ReadArtifact(format!("no artifact for {name}")))
    }
}

/// An artifact after loading, with its interface shared between contract refs
struct LoadedArtifact {
    /// The contract's interface
    abi: Arc<JsonAbi>,
    /// Deployments keyed by network identity
    networks: HashMap<String, NetworkDeployment>,
}

/// Resolves contract names to [`ContractRef`]s
///
/// Artifacts are loaded at most once, and a contract resolved for a network
/// keeps the same address for the lifetime of the resolver.
pub struct NetworkResolver {
    /// Where artifacts are loaded from
    source: Box<dyn ArtifactSource>,
    /// Artifacts loaded so far
    artifacts: Mutex<HashMap<ContractName, Arc<LoadedArtifact>>>,
    /// Contracts resolved so far
    resolved: Mutex<HashMap<(ContractName, NetworkId), Arc<ContractRef>>>,
}

impl NetworkResolver {
    /// Create a resolver reading from the given artifact source
    pub fn new(source: Box<dyn ArtifactSource>) -> Self {
        Self {
            source,
            artifacts: Mutex::new(HashMap::new()),
            resolved: Mutex::new(HashMap::new()),
        }
    }

    /// Resolve the deployed address of a contract on a network
    pub fn resolve(
        &self,
        name: ContractName,
        network: NetworkId,
    ) -> Result<Arc<ContractRef>, ScriptError> {
        if let Some(contract) = lock(&self.resolved).get(&(name, network)) {
            return Ok(contract.clone());
        }

        let artifact = self.artifact(name)?;
        let address = artifact
            .networks
            .get(&network.to_string())
            .map(|deployment| deployment.address)
            .filter(|address| !address.is_zero())
            .ok_or_else(|| ScriptError::UnknownNetwork {
                contract: name.to_string(),
                network: network.0,
            })?;

        debug!(contract = %name, network = %network, address = %address, "resolved contract");
        let contract = Arc::new(ContractRef::new(name, artifact.abi.clone(), address));
        Ok(lock(&self.resolved)
            .entry((name, network))
            .or_insert(contract)
            .clone())
    }

    /// Bind a contract's interface to an address learned at runtime
    pub fn interface_at(
        &self,
        name: ContractName,
        address: Address,
    ) -> Result<Arc<ContractRef>, ScriptError> {
        if address.is_zero() {
            return Err(ScriptError::Usage(format!("{name} cannot be bound to the zero address")));
        }

        let artifact = self.artifact(name)?;
        Ok(Arc::new(ContractRef::new(name, artifact.abi.clone(), address)))
    }

    /// The interface of a contract, without resolving any deployment
    pub fn abi(&self, name: ContractName) -> Result<Arc<JsonAbi>, ScriptError> {
        Ok(self.artifact(name)?.abi.clone())
    }

    /// Load an artifact, memoising the result
    fn artifact(&self, name: ContractName) -> Result<Arc<LoadedArtifact>, ScriptError> {
        let mut artifacts = lock(&self.artifacts);
        if let Some(artifact) = artifacts.get(&name) {
            return Ok(artifact.clone());
        }

        let ContractArtifact { abi, networks } = self.source.load(name.artifact_name())?;
        let artifact = Arc::new(LoadedArtifact {
            abi: Arc::new(abi),
            networks,
        });
        artifacts.insert(name, artifact.clone());

        Ok(artifact)
    }
}

/// Lock a memo table; the tables are only ever inserted into, so a poisoned
/// lock still holds consistent data
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
