//! Resolution context shared by every entry during a resolve or convert call.
//!
//! The context owns the registry, the collaborators and two execution
//! resources:
//!
//! - a single-flight gate serializing calls into the [`DependencyResolver`],
//!   which may hold non-reentrant state;
//! - a worker pool for download and decode work, sized by `with_jobs`.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, OnceLock, PoisonError};

use rayon::{ThreadPool, ThreadPoolBuilder};

use crate::artifact::{
    ArtifactError, ArtifactNamer, CacheDirNamer, Dependency, DependencyResolver, Downloader,
    LocalDownloader, LocalRepositoryResolver, Platform, VersionMetadata,
};
use crate::error::MappingError;
use crate::registry::EntryRegistry;
use crate::remap::RemapRequest;

/// Default number of parallel jobs (uses available parallelism).
fn default_jobs() -> usize {
    std::thread::available_parallelism().map(|n| n.get()).unwrap_or(1)
}

/// Everything an entry needs to resolve itself.
pub struct ResolveContext {
    registry: Arc<EntryRegistry>,
    project_root: PathBuf,
    platform: Platform,
    resolver: Arc<dyn DependencyResolver>,
    downloader: Arc<dyn Downloader>,
    version: Option<Arc<dyn VersionMetadata>>,
    namer: Arc<dyn ArtifactNamer>,
    jobs: usize,
    gate: Mutex<()>,
    pool: OnceLock<Option<ThreadPool>>,
}

impl ResolveContext {
    /// Create a context with local collaborators rooted at `project_root`.
    ///
    /// Defaults: joined platform, no repositories, no version metadata, and
    /// artifacts cached under `<project_root>/.mapchain`.
    pub fn new(registry: EntryRegistry, project_root: PathBuf) -> Self {
        Self {
            registry: Arc::new(registry),
            resolver: Arc::new(LocalRepositoryResolver::new(&project_root)),
            downloader: Arc::new(LocalDownloader::new(&project_root)),
            namer: Arc::new(CacheDirNamer::new(project_root.join(".mapchain"))),
            project_root,
            platform: Platform::default(),
            version: None,
            jobs: default_jobs(),
            gate: Mutex::new(()),
            pool: OnceLock::new(),
        }
    }

    pub fn with_platform(mut self, platform: Platform) -> Self {
        self.platform = platform;
        self
    }

    pub fn with_resolver(mut self, resolver: impl DependencyResolver + 'static) -> Self {
        self.resolver = Arc::new(resolver);
        self
    }

    pub fn with_downloader(mut self, downloader: impl Downloader + 'static) -> Self {
        self.downloader = Arc::new(downloader);
        self
    }

    pub fn with_version(mut self, version: impl VersionMetadata + 'static) -> Self {
        self.version = Some(Arc::new(version));
        self
    }

    pub fn with_namer(mut self, namer: impl ArtifactNamer + 'static) -> Self {
        self.namer = Arc::new(namer);
        self
    }

    /// Set the number of parallel jobs.
    pub fn with_jobs(mut self, jobs: usize) -> Self {
        self.jobs = jobs.max(1);
        self.pool = OnceLock::new();
        self
    }

    pub fn registry(&self) -> &EntryRegistry {
        &self.registry
    }

    pub fn project_root(&self) -> &Path {
        &self.project_root
    }

    pub fn platform(&self) -> Platform {
        self.platform
    }

    pub fn jobs(&self) -> usize {
        self.jobs
    }

    pub fn downloader(&self) -> &dyn Downloader {
        self.downloader.as_ref()
    }

    pub fn version(&self) -> Option<&dyn VersionMetadata> {
        self.version.as_deref()
    }

    pub fn namer(&self) -> &dyn ArtifactNamer {
        self.namer.as_ref()
    }

    /// Resolve a dependency through the single-flight gate.
    pub fn resolve_dependency(&self, dependency: &Dependency) -> Result<Vec<PathBuf>, ArtifactError> {
        let _guard = self.gate.lock().unwrap_or_else(PoisonError::into_inner);
        self.resolver.resolve(dependency)
    }

    fn pool(&self) -> Option<&ThreadPool> {
        self.pool
            .get_or_init(|| {
                ThreadPoolBuilder::new()
                    .num_threads(self.jobs)
                    .thread_name(|i| format!("mapchain-{i}"))
                    .build()
                    .map_err(|e| log::warn!("could not start worker pool, using the global one: {e}"))
                    .ok()
            })
            .as_ref()
    }

    /// Run `op` on the worker pool.
    pub fn install<OP, R>(&self, op: OP) -> R
    where
        OP: FnOnce() -> R + Send,
        R: Send,
    {
        match self.pool() {
            Some(pool) => pool.install(op),
            None => op(),
        }
    }

    /// Run two closures in parallel on the worker pool.
    pub fn join<A, B, RA, RB>(&self, a: A, b: B) -> (RA, RB)
    where
        A: FnOnce() -> RA + Send,
        B: FnOnce() -> RB + Send,
        RA: Send,
        RB: Send,
    {
        self.install(|| rayon::join(a, b))
    }

    /// Pairwise state key of the `from -> to` conversion.
    pub fn conversion_key(&self, from: &str, to: &str) -> Result<String, MappingError> {
        RemapRequest::new(from, to).state_key(self)
    }
}
