//! Resolution of dependency declarations against the local filesystem.

use std::path::{Path, PathBuf};

use glob::glob;

use super::{ArtifactError, Coordinate, Dependency, DependencyResolver};

/// Expand file dependency entries (literal paths or glob patterns) relative
/// to `base_dir`.
///
/// Results are sorted and deduplicated so that hashing their contents is
/// deterministic.
pub fn expand_files(base_dir: &Path, patterns: &[PathBuf]) -> Result<Vec<PathBuf>, ArtifactError> {
    let mut files = Vec::new();
    for pattern in patterns {
        let full_pattern = base_dir.join(pattern);
        let pattern_str = full_pattern.to_string_lossy();

        for entry in glob(&pattern_str)? {
            match entry {
                Ok(path) if path.is_file() => files.push(path),
                Ok(_) => {}
                Err(e) => log::warn!("error reading path: {}", e),
            }
        }
    }

    files.sort();
    files.dedup();
    Ok(files)
}

/// Resolves coordinates in Maven-layout directories and file dependencies
/// relative to a project directory.
#[derive(Debug, Clone)]
pub struct LocalRepositoryResolver {
    base_dir: PathBuf,
    repositories: Vec<PathBuf>,
}

impl LocalRepositoryResolver {
    /// Create a resolver rooted at `base_dir` with no repositories.
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self { base_dir: base_dir.into(), repositories: Vec::new() }
    }

    /// Add a repository; relative paths resolve against the base directory.
    pub fn with_repository(mut self, repository: impl AsRef<Path>) -> Self {
        self.repositories.push(self.base_dir.join(repository));
        self
    }

    pub fn repositories(&self) -> &[PathBuf] {
        &self.repositories
    }

    /// `<group as dirs>/<name>/<version>/<name>-<version>[-<classifier>].<ext>`
    fn layout_path(coordinate: &Coordinate) -> PathBuf {
        let mut path: PathBuf = coordinate.group.split('.').collect();
        path.push(&coordinate.name);
        path.push(&coordinate.version);

        let mut file_name = format!("{}-{}", coordinate.name, coordinate.version);
        if let Some(classifier) = &coordinate.classifier {
            file_name.push('-');
            file_name.push_str(classifier);
        }
        file_name.push('.');
        file_name.push_str(coordinate.extension.as_deref().unwrap_or("jar"));
        path.push(file_name);
        path
    }
}

impl DependencyResolver for LocalRepositoryResolver {
    fn resolve(&self, dependency: &Dependency) -> Result<Vec<PathBuf>, ArtifactError> {
        match dependency {
            Dependency::Coordinate(coordinate) => {
                let relative = Self::layout_path(coordinate);
                // First repository wins, as in any ordered repository list.
                let found = self
                    .repositories
                    .iter()
                    .map(|repository| repository.join(&relative))
                    .find(|candidate| candidate.is_file());
                log::debug!("{} -> {:?}", coordinate, found);
                Ok(found.into_iter().collect())
            }
            Dependency::Files(patterns) => expand_files(&self.base_dir, patterns),
            Dependency::Other { kind, notation } => Err(ArtifactError::UnsupportedDependency {
                kind: kind.clone(),
                notation: notation.clone(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::{self, File};
    use std::io::Write;
    use tempfile::TempDir;

    fn create_test_file(dir: &Path, name: &str) -> PathBuf {
        let path = dir.join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        File::create(&path).unwrap().write_all(b"CL: a b\n").unwrap();
        path
    }

    #[test]
    fn test_resolve_coordinate_in_repository() {
        let temp = TempDir::new().unwrap();
        let expected =
            create_test_file(temp.path(), "repo/net/fabricmc/yarn/1.0/yarn-1.0-v2.jar");
        let resolver = LocalRepositoryResolver::new(temp.path()).with_repository("repo");

        let dependency = Dependency::parse("net.fabricmc:yarn:1.0:v2").unwrap();
        assert_eq!(resolver.resolve(&dependency).unwrap(), vec![expected]);
    }

    #[test]
    fn test_first_repository_wins() {
        let temp = TempDir::new().unwrap();
        let first = create_test_file(temp.path(), "one/g/n/1/n-1.txt");
        create_test_file(temp.path(), "two/g/n/1/n-1.txt");
        let resolver =
            LocalRepositoryResolver::new(temp.path()).with_repository("one").with_repository("two");

        let dependency = Dependency::parse("g:n:1@txt").unwrap();
        assert_eq!(resolver.resolve(&dependency).unwrap(), vec![first]);
    }

    #[test]
    fn test_missing_coordinate_resolves_to_nothing() {
        let temp = TempDir::new().unwrap();
        let resolver = LocalRepositoryResolver::new(temp.path()).with_repository("repo");
        let dependency = Dependency::parse("g:n:1").unwrap();
        assert!(resolver.resolve(&dependency).unwrap().is_empty());
    }

    #[test]
    fn test_resolve_file_globs() {
        let temp = TempDir::new().unwrap();
        create_test_file(temp.path(), "mappings/a.srg");
        create_test_file(temp.path(), "mappings/b.srg");
        create_test_file(temp.path(), "mappings/readme.md");
        let resolver = LocalRepositoryResolver::new(temp.path());

        let files = resolver
            .resolve(&Dependency::Files(vec![PathBuf::from("mappings/*.srg")]))
            .unwrap();
        assert_eq!(files.len(), 2);
        assert!(files[0].ends_with("a.srg"));
    }

    #[test]
    fn test_other_dependency_is_unsupported() {
        let temp = TempDir::new().unwrap();
        let resolver = LocalRepositoryResolver::new(temp.path());
        let dependency = Dependency::parse("project::mappings").unwrap();
        assert!(matches!(
            resolver.resolve(&dependency),
            Err(ArtifactError::UnsupportedDependency { .. })
        ));
    }
}
