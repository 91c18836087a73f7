//! Selection and merging of the configs contributed across the layout.

use crate::expand::FilterLevel;
use crate::layout::{Layout, Scope};
use fpm_domain::spec::ConfigSpec;
use fpm_domain::{ConfigCustomizations, ConfigDecision, ConfigId};
use fxhash::{FxHashMap, FxHashSet};
use indexmap::IndexMap;
use std::iter;
use tracing::{debug, trace};

/// One contribution to a config: a config spec, where its names resolve and the filter
/// from the customization that included it.
#[derive(Debug, Clone, Copy)]
pub(crate) struct ConfigPart<'a> {
    pub(crate) spec: &'a ConfigSpec,
    pub(crate) scope: Scope,
    pub(crate) filter: Option<FilterLevel<'a>>,
}

/// Every contribution to one provisioned config, in expansion order.
#[derive(Debug, Clone)]
pub(crate) struct ConfigAssembly<'a> {
    pub(crate) id: ConfigId,
    pub(crate) props: IndexMap<String, String>,
    pub(crate) parts: Vec<ConfigPart<'a>>,
}

impl<'a> ConfigAssembly<'a> {
    fn new(id: ConfigId) -> Self {
        Self { id, props: IndexMap::new(), parts: Vec::new() }
    }

    fn add(&mut self, part: ConfigPart<'a>) {
        for (name, value) in part.spec.properties() {
            self.props.entry(name.clone()).or_insert_with(|| value.clone());
        }
        self.parts.push(part);
    }
}

/// A customization level and the scope its names were written in.
type Level<'a> = (&'a ConfigCustomizations, Scope);

enum Selection<'a> {
    Excluded,
    Included(Option<FilterLevel<'a>>),
}

/// Collects the configs to provision, dependencies' configs first, then the configs defined
/// at installation level.
pub(crate) fn assemble_configs<'a>(layout: &Layout<'a>) -> Vec<ConfigAssembly<'a>> {
    let installation = layout.request().customizations();
    let mut collector = Collector::default();

    for &index in layout.post_order() {
        let entry = layout.entry(index);
        let levels = levels(layout, index);

        for config in entry.spec.configs() {
            match select(&levels, config.id()) {
                Selection::Excluded => {
                    trace!(gav = %entry.gav(), config = %config.id(), "Config excluded");
                },
                Selection::Included(filter) => {
                    collector.add(ConfigPart { spec: config, scope: Scope::Pack(index), filter });
                },
            }
        }

        let Some((&(defining, _), outer)) = levels.split_last() else {
            continue;
        };
        let inherited_scope = entry.parent.map_or(Scope::Installation, Scope::Pack);
        for config in defining.defined_configs() {
            if outer.iter().any(|(level, _)| level.is_config_excluded(config.id())) {
                trace!(gav = %entry.gav(), config = %config.id(), "Defined config excluded");
                continue;
            }
            let scope = if config.resets_origin() { Scope::Pack(index) } else { inherited_scope };
            collector.add(ConfigPart { spec: config, scope, filter: None });
        }
    }

    for config in installation.defined_configs() {
        collector.add(ConfigPart { spec: config, scope: Scope::Installation, filter: None });
    }

    let configs = collector.finish();
    debug!(configs = configs.len(), "Configs assembled");
    configs
}

/// Customization levels reaching a feature-pack, outermost first: the installation, the
/// requested configuration, then each dependency declaration in the scope of the
/// feature-pack declaring it.
fn levels<'a>(layout: &Layout<'a>, index: usize) -> Vec<Level<'a>> {
    let entry = layout.entry(index);
    let mut declared_in: Vec<Scope> =
        iter::successors(entry.parent, |&i| layout.entry(i).parent).map(Scope::Pack).collect();
    declared_in.push(Scope::Installation);
    declared_in.reverse();

    let mut levels = Vec::with_capacity(entry.chain.len() + 1);
    levels.push((layout.request().customizations(), Scope::Installation));
    levels.extend(entry.chain.iter().map(|config| config.customizations()).zip(declared_in));
    levels
}

/// The outermost explicit decision wins. Without one, a level whose inheritance flag
/// rejects the config excludes it.
fn select<'a>(levels: &[Level<'a>], id: &ConfigId) -> Selection<'a> {
    let mut inherited = true;
    for &(level, scope) in levels {
        match level.decide(id) {
            ConfigDecision::Excluded => return Selection::Excluded,
            ConfigDecision::Included(included) => {
                return Selection::Included(
                    included.map(|config| FilterLevel { filter: config.filter(), scope }),
                );
            },
            ConfigDecision::Inherited(flag) => inherited &= flag,
        }
    }
    if inherited { Selection::Included(None) } else { Selection::Excluded }
}

#[derive(Debug, Default)]
struct Collector<'a> {
    assemblies: Vec<ConfigAssembly<'a>>,
    by_id: FxHashMap<ConfigId, usize>,
}

impl<'a> Collector<'a> {
    fn add(&mut self, part: ConfigPart<'a>) {
        let id = part.spec.id();
        if id.is_anonymous() {
            let mut assembly = ConfigAssembly::new(id.clone());
            assembly.add(part);
            self.assemblies.push(assembly);
            return;
        }
        let index = *self.by_id.entry(id.clone()).or_insert_with(|| {
            self.assemblies.push(ConfigAssembly::new(id.clone()));
            self.assemblies.len() - 1
        });
        self.assemblies[index].add(part);
    }

    /// Folds model-only configs into the named configs of their model.
    fn finish(self) -> Vec<ConfigAssembly<'a>> {
        let mut defaults: FxHashMap<String, ConfigAssembly<'a>> = FxHashMap::default();
        let mut named_models = FxHashSet::default();
        for assembly in &self.assemblies {
            if let (Some(model), Some(_)) = (assembly.id.model(), assembly.id.name()) {
                named_models.insert(model.to_owned());
            }
        }

        let mut result = Vec::with_capacity(self.assemblies.len());
        let mut pending = Vec::new();
        for assembly in self.assemblies {
            match assembly.id.model() {
                Some(model) if assembly.id.is_model_only() && named_models.contains(model) => {
                    defaults.insert(model.to_owned(), assembly);
                },
                _ => pending.push(assembly),
            }
        }

        for mut assembly in pending {
            if let Some(model) = assembly.id.model().filter(|_| assembly.id.name().is_some())
                && let Some(model_defaults) = defaults.get(model)
            {
                for (name, value) in &model_defaults.props {
                    assembly.props.entry(name.clone()).or_insert_with(|| value.clone());
                }
                let mut parts = model_defaults.parts.clone();
                parts.append(&mut assembly.parts);
                assembly.parts = parts;
            }
            result.push(assembly);
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fpm_domain::IncludedConfig;

    fn customizations(builder: fpm_domain::customize::ConfigCustomizationsBuilder) -> ConfigCustomizations {
        builder.build().unwrap()
    }

    #[test]
    fn outer_explicit_decision_wins() {
        let outer = customizations(
            ConfigCustomizations::builder().include_config(IncludedConfig::new(ConfigId::of("m", "c"))),
        );
        let inner = customizations(ConfigCustomizations::builder().exclude_model("m", false));
        let id = ConfigId::of("m", "c");
        let selected = select(&[(&outer, Scope::Installation), (&inner, Scope::Pack(0))], &id);
        assert!(matches!(selected, Selection::Included(Some(FilterLevel { scope: Scope::Installation, .. }))));
        let selected = select(&[(&inner, Scope::Installation), (&outer, Scope::Pack(0))], &id);
        assert!(matches!(selected, Selection::Excluded));
    }

    #[test]
    fn inheritance_rejection_excludes() {
        let outer = ConfigCustomizations::default();
        let inner = customizations(ConfigCustomizations::builder().inherit_configs(false));
        let id = ConfigId::named("c");
        let selected = select(&[(&outer, Scope::Installation), (&inner, Scope::Installation)], &id);
        assert!(matches!(selected, Selection::Excluded));
        assert!(matches!(select(&[(&outer, Scope::Installation)], &id), Selection::Included(None)));
    }

    #[test]
    fn inner_inclusion_beats_outer_inheritance_rejection() {
        let outer = customizations(ConfigCustomizations::builder().inherit_configs(false));
        let inner = customizations(
            ConfigCustomizations::builder().include_config(IncludedConfig::new(ConfigId::named("c"))),
        );
        let levels = [(&outer, Scope::Installation), (&inner, Scope::Pack(1))];
        assert!(matches!(
            select(&levels, &ConfigId::named("c")),
            Selection::Included(Some(FilterLevel { scope: Scope::Pack(1), .. }))
        ));
        assert!(matches!(select(&levels, &ConfigId::named("other")), Selection::Excluded));
    }

    #[test]
    fn model_only_config_is_prepended_to_named_configs() {
        let defaults = ConfigSpec::builder().model("m").property("a", "model").property("b", "model").build().unwrap();
        let named = ConfigSpec::builder().model("m").name("c").property("a", "named").build().unwrap();
        let lonely = ConfigSpec::builder().model("other").build().unwrap();

        let mut collector = Collector::default();
        for spec in [&defaults, &named, &lonely] {
            collector.add(ConfigPart { spec, scope: Scope::Installation, filter: None });
        }
        let configs = collector.finish();

        let ids: Vec<&ConfigId> = configs.iter().map(|c| &c.id).collect();
        assert_eq!(ids, vec![&ConfigId::of("m", "c"), &ConfigId::model_only("other")]);
        let merged = &configs[0];
        assert_eq!(merged.parts.len(), 2);
        assert!(merged.parts[0].spec.id().is_model_only());
        assert_eq!(merged.props.get("a").map(String::as_str), Some("named"));
        assert_eq!(merged.props.get("b").map(String::as_str), Some("model"));
    }

    #[test]
    fn same_ids_merge_and_anonymous_configs_stay_apart() {
        let first = ConfigSpec::builder().name("c").property("a", "1").build().unwrap();
        let second = ConfigSpec::builder().name("c").property("a", "2").build().unwrap();
        let anonymous = ConfigSpec::builder().build().unwrap();

        let mut collector = Collector::default();
        for spec in [&first, &anonymous, &second, &anonymous] {
            collector.add(ConfigPart { spec, scope: Scope::Installation, filter: None });
        }
        let configs = collector.finish();
        assert_eq!(configs.len(), 3);
        assert_eq!(configs[0].parts.len(), 2);
        assert_eq!(configs[0].props.get("a").map(String::as_str), Some("1"));
    }
}
