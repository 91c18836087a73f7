use crate::error::{DescriptionError, require_non_empty};
use indexmap::IndexMap;
use indexmap::map::Values;

/// A dependency of a package on another package.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PackageDependencySpec {
    name: String,
    optional: bool,
}

impl PackageDependencySpec {
    pub fn required(name: impl Into<String>) -> Self {
        Self { name: name.into(), optional: false }
    }

    /// A dependency skipped when the target package is excluded.
    pub fn optional(name: impl Into<String>) -> Self {
        Self { name: name.into(), optional: true }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub const fn is_optional(&self) -> bool {
        self.optional
    }
}

/// A package parameter with an optional default value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageParameter {
    name: String,
    default: Option<String>,
}

impl PackageParameter {
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn default_value(&self) -> Option<&str> {
        self.default.as_deref()
    }
}

/// A content bundle of a feature-pack and its dependencies.
///
/// External dependencies are grouped by the dependency alias (origin) of the feature-pack
/// that provides them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageSpec {
    name: String,
    local_deps: IndexMap<String, PackageDependencySpec>,
    external_deps: IndexMap<String, IndexMap<String, PackageDependencySpec>>,
    params: IndexMap<String, PackageParameter>,
}

impl PackageSpec {
    pub fn builder(name: impl Into<String>) -> PackageSpecBuilder {
        PackageSpecBuilder {
            name: name.into(),
            local_deps: Vec::new(),
            external_deps: Vec::new(),
            params: Vec::new(),
        }
    }

    /// A package without dependencies or parameters.
    ///
    /// # Errors
    /// Returns [`DescriptionError`] for an empty name.
    pub fn new(name: impl Into<String>) -> Result<Self, DescriptionError> {
        Self::builder(name).build()
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn local_dependencies(&self) -> impl Iterator<Item = &PackageDependencySpec> {
        self.local_deps.values()
    }

    /// External dependency groups as `(origin, dependencies)`.
    pub fn external_dependencies(
        &self,
    ) -> impl Iterator<Item = (&str, Values<'_, String, PackageDependencySpec>)> {
        self.external_deps.iter().map(|(origin, deps)| (origin.as_str(), deps.values()))
    }

    pub fn external_origins(&self) -> impl Iterator<Item = &str> {
        self.external_deps.keys().map(String::as_str)
    }

    pub fn params(&self) -> impl Iterator<Item = &PackageParameter> {
        self.params.values()
    }

    #[must_use]
    pub fn has_dependencies(&self) -> bool {
        !self.local_deps.is_empty() || !self.external_deps.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct PackageSpecBuilder {
    name: String,
    local_deps: Vec<PackageDependencySpec>,
    external_deps: Vec<(String, PackageDependencySpec)>,
    params: Vec<PackageParameter>,
}

impl PackageSpecBuilder {
    #[must_use = "The builder must be built to produce a package spec."]
    pub fn dependency(mut self, dependency: PackageDependencySpec) -> Self {
        self.local_deps.push(dependency);
        self
    }

    /// Adds a dependency on a package of the feature-pack known as `origin`.
    #[must_use = "The builder must be built to produce a package spec."]
    pub fn external_dependency(
        mut self,
        origin: impl Into<String>,
        dependency: PackageDependencySpec,
    ) -> Self {
        self.external_deps.push((origin.into(), dependency));
        self
    }

    #[must_use = "The builder must be built to produce a package spec."]
    pub fn param(mut self, name: impl Into<String>, default: Option<String>) -> Self {
        self.params.push(PackageParameter { name: name.into(), default });
        self
    }

    /// # Errors
    /// Returns [`DescriptionError`] for empty names or duplicate dependencies/parameters.
    pub fn build(self) -> Result<PackageSpec, DescriptionError> {
        require_non_empty(&self.name, "Package name")?;
        let package = self.name;

        let mut local_deps = IndexMap::with_capacity(self.local_deps.len());
        for dep in self.local_deps {
            require_non_empty(dep.name(), "Package dependency name")?;
            if local_deps.insert(dep.name.clone(), dep).is_some() {
                return Err(duplicate_dependency(&package, None));
            }
        }

        let mut external_deps: IndexMap<String, IndexMap<String, PackageDependencySpec>> =
            IndexMap::new();
        for (origin, dep) in self.external_deps {
            require_non_empty(&origin, "Package dependency origin")?;
            require_non_empty(dep.name(), "Package dependency name")?;
            let group = external_deps.entry(origin.clone()).or_default();
            if group.insert(dep.name.clone(), dep).is_some() {
                return Err(duplicate_dependency(&package, Some(&origin)));
            }
        }

        let mut params = IndexMap::with_capacity(self.params.len());
        for param in self.params {
            require_non_empty(&param.name, "Package parameter name")?;
            let name = param.name.clone();
            if params.insert(name.clone(), param).is_some() {
                return Err(DescriptionError::duplicate(format!(
                    "Duplicate parameter {name} for package {package}"
                )));
            }
        }

        Ok(PackageSpec { name: package, local_deps, external_deps, params })
    }
}

fn duplicate_dependency(package: &str, origin: Option<&str>) -> DescriptionError {
    let scope = origin.map_or_else(String::new, |o| format!(" on {o}"));
    DescriptionError::duplicate(format!("Package {package} declares a dependency{scope} twice"))
}
