//! Second pass over a config's features: defaults, required parameters, references,
//! capabilities and the final feature order.

use crate::accumulator::FeatureEntry;
use crate::capability::{CapabilityIndex, expand_capability};
use crate::error::ProvisioningError;
use crate::layout::{Layout, Scope};
use fpm_domain::spec::{FeatureParameterSpec, FeatureReferenceSpec};
use fpm_domain::{IdParams, ProvisionedFeature, ResolvedFeatureId, ResolvedSpecId};
use fxhash::FxHashMap;
use tracing::trace;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mark {
    New,
    Visiting,
    Done,
}

/// Resolves the collected features of one config and orders them so that every feature
/// comes after the features it depends on.
///
/// Dependencies are non-nillable references and required capabilities. Features without
/// dependencies between them keep their collection order.
///
/// # Errors
/// [`ProvisioningError::UnsetRequiredParameter`], [`ProvisioningError::NonNillableReferenceUnset`],
/// [`ProvisioningError::UnsatisfiedReference`] or
/// [`ProvisioningError::CapabilityProviderNotFound`].
pub(crate) fn resolve_features(
    layout: &Layout<'_>,
    mut entries: Vec<FeatureEntry<'_>>,
) -> Result<Vec<ProvisionedFeature>, ProvisioningError> {
    for entry in &mut entries {
        for param in entry.spec.params() {
            if let Some(default) = param.default_value() {
                entry.params.entry(param.name().to_owned()).or_insert_with(|| default.to_owned());
            }
        }
    }

    let index: FxHashMap<&ResolvedFeatureId, usize> =
        entries.iter().enumerate().map(|(i, entry)| (&entry.id, i)).collect();

    let mut deps: Vec<Vec<usize>> = vec![Vec::new(); entries.len()];
    for (i, entry) in entries.iter().enumerate() {
        for reference in entry.spec.references() {
            if let Some(target) = resolve_reference(layout, entry, reference, &index)?
                && !reference.is_nillable()
                && target != i
            {
                deps[i].push(target);
            }
        }
        if let Some(param) =
            entry.spec.params().find(|p| !p.is_nillable() && !entry.params.contains_key(p.name()))
        {
            return Err(ProvisioningError::UnsetRequiredParameter {
                feature: entry.id.to_string(),
                param: param.name().to_owned(),
            });
        }
    }

    let mut capabilities = CapabilityIndex::new();
    for (i, entry) in entries.iter().enumerate() {
        for capability in entry.spec.provides() {
            for provided in expand_capability(capability, entry.spec, &entry.params)? {
                capabilities.provide(provided, i);
            }
        }
    }
    for (i, entry) in entries.iter().enumerate() {
        for capability in entry.spec.requires().iter().filter(|c| !c.is_optional()) {
            for required in expand_capability(capability, entry.spec, &entry.params)? {
                let providers = capabilities.providers(&required);
                if providers.is_empty() {
                    return Err(ProvisioningError::CapabilityProviderNotFound {
                        capability: required,
                        required_by: entry.id.clone(),
                        pattern: capability.pattern().to_owned(),
                    });
                }
                deps[i].extend(providers.iter().copied().filter(|&p| p != i));
            }
        }
    }

    let order = dependency_order(&deps);
    let mut slots: Vec<Option<FeatureEntry<'_>>> = entries.into_iter().map(Some).collect();
    Ok(order
        .into_iter()
        .filter_map(|i| slots[i].take())
        .map(|entry| {
            let declared = entry.spec.params().map(FeatureParameterSpec::name);
            entry
                .params
                .into_iter()
                .fold(ProvisionedFeature::builder(entry.id), |builder, (name, value)| {
                    builder.param(name, value)
                })
                .order_params(declared)
                .build()
        })
        .collect())
}

/// Layout index of the referenced feature; `None` for an unset or unmatched nillable reference.
fn resolve_reference(
    layout: &Layout<'_>,
    entry: &FeatureEntry<'_>,
    reference: &FeatureReferenceSpec,
    index: &FxHashMap<&ResolvedFeatureId, usize>,
) -> Result<Option<usize>, ProvisioningError> {
    let (target_fp, target_spec) =
        layout.find_spec(Scope::Pack(entry.fp), reference.origin(), reference.feature())?;

    let mapping: Vec<(&str, &str)> = if reference.mappings().is_empty() {
        target_spec.id_params().map(|p| (p.name(), p.name())).collect()
    } else {
        reference.mappings().iter().map(|(local, target)| (local.as_str(), target.as_str())).collect()
    };

    let mut params = IdParams::new();
    for (local, target) in mapping {
        match entry.params.get(local) {
            Some(value) => {
                params.insert(target.to_owned(), value.clone());
            },
            None if reference.is_nillable() => return Ok(None),
            None => {
                return Err(ProvisioningError::NonNillableReferenceUnset {
                    feature: entry.id.clone(),
                    reference: reference.name().to_owned(),
                    param: local.to_owned(),
                });
            },
        }
    }

    let spec_id = ResolvedSpecId::new(layout.entry(target_fp).gav().clone(), target_spec.name());
    let target = ResolvedFeatureId::new(spec_id, params)?;
    match index.get(&target) {
        Some(&i) => Ok(Some(i)),
        None if reference.is_nillable() => {
            trace!(feature = %entry.id, %target, "Nillable reference left unresolved");
            Ok(None)
        },
        None => Err(ProvisioningError::UnsatisfiedReference {
            feature: entry.id.clone(),
            reference: reference.name().to_owned(),
            target,
        }),
    }
}

/// Stable depth-first post-order; dependency cycles are broken at the first revisit.
fn dependency_order(deps: &[Vec<usize>]) -> Vec<usize> {
    let mut marks = vec![Mark::New; deps.len()];
    let mut order = Vec::with_capacity(deps.len());
    let mut stack: Vec<(usize, usize)> = Vec::new();

    for root in 0..deps.len() {
        if marks[root] != Mark::New {
            continue;
        }
        marks[root] = Mark::Visiting;
        stack.push((root, 0));

        while let Some(top) = stack.last_mut() {
            let (node, next) = *top;
            if let Some(&dep) = deps[node].get(next) {
                top.1 += 1;
                if marks[dep] == Mark::New {
                    marks[dep] = Mark::Visiting;
                    stack.push((dep, 0));
                }
            } else {
                marks[node] = Mark::Done;
                order.push(node);
                stack.pop();
            }
        }
    }
    order
}

#[cfg(test)]
mod tests {
    use super::dependency_order;

    #[test]
    fn dependencies_come_first_and_order_is_stable() {
        let deps = vec![vec![2], vec![], vec![1]];
        assert_eq!(dependency_order(&deps), vec![1, 2, 0]);
        assert_eq!(dependency_order(&[vec![], vec![], vec![]]), vec![0, 1, 2]);
    }

    #[test]
    fn cycles_do_not_loop() {
        let deps = vec![vec![1], vec![0]];
        assert_eq!(dependency_order(&deps), vec![1, 0]);
    }

    #[test]
    fn long_chains_are_ordered() {
        const LEN: usize = 200_000;
        let deps: Vec<Vec<usize>> = (0..LEN).map(|i| if i + 1 < LEN { vec![i + 1] } else { vec![] }).collect();
        let order = dependency_order(&deps);
        assert_eq!(order.len(), LEN);
        assert!(order.iter().copied().eq((0..LEN).rev()));
    }
}
