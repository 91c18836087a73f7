//! Callback walk over provisioned configs.

use crate::error::ProvisioningError;
use fpm_domain::{Gav, ProvisionedConfig, ProvisionedFeature, ProvisionedState, ResolvedSpecId};

/// Receives the features of a provisioned config in resolution order.
///
/// Every method defaults to a no-op. Returning an error stops the walk.
pub trait ProvisionedConfigHandler {
    fn prepare(&mut self, _config: &ProvisionedConfig) -> Result<(), ProvisioningError> {
        Ok(())
    }

    /// Called before the first feature of a feature-pack different from the previous one.
    fn next_feature_pack(&mut self, _gav: &Gav) -> Result<(), ProvisioningError> {
        Ok(())
    }

    /// Called before the first feature of a spec different from the previous one.
    fn next_spec(&mut self, _spec: &ResolvedSpecId) -> Result<(), ProvisioningError> {
        Ok(())
    }

    fn next_feature(&mut self, _feature: &ProvisionedFeature) -> Result<(), ProvisioningError> {
        Ok(())
    }

    fn done(&mut self) -> Result<(), ProvisioningError> {
        Ok(())
    }
}

/// Drives `handler` through one config.
///
/// # Errors
/// The first error returned by the handler.
pub fn walk_config<H>(config: &ProvisionedConfig, handler: &mut H) -> Result<(), ProvisioningError>
where
    H: ProvisionedConfigHandler + ?Sized,
{
    handler.prepare(config)?;
    let mut current: Option<&ResolvedSpecId> = None;
    for feature in config.features() {
        let spec = feature.spec_id();
        if current.is_none_or(|previous| previous.gav() != spec.gav()) {
            handler.next_feature_pack(spec.gav())?;
        }
        if current != Some(spec) {
            handler.next_spec(spec)?;
        }
        current = Some(spec);
        handler.next_feature(feature)?;
    }
    handler.done()
}

/// Walks every config of the state in order.
///
/// # Errors
/// The first error returned by the handler.
pub fn walk_state<H>(state: &ProvisionedState, handler: &mut H) -> Result<(), ProvisioningError>
where
    H: ProvisionedConfigHandler + ?Sized,
{
    state.configs().iter().try_for_each(|config| walk_config(config, handler))
}

#[cfg(test)]
mod tests {
    use super::*;
    use fpm_domain::{ConfigId, ResolvedFeatureId};

    #[derive(Default)]
    struct Recorder(Vec<String>);

    impl ProvisionedConfigHandler for Recorder {
        fn prepare(&mut self, config: &ProvisionedConfig) -> Result<(), ProvisioningError> {
            self.0.push(format!("prepare {}", config.id()));
            Ok(())
        }

        fn next_feature_pack(&mut self, gav: &Gav) -> Result<(), ProvisioningError> {
            self.0.push(format!("fp {}", gav.artifact_id()));
            Ok(())
        }

        fn next_spec(&mut self, spec: &ResolvedSpecId) -> Result<(), ProvisioningError> {
            self.0.push(format!("spec {}", spec.name()));
            Ok(())
        }

        fn next_feature(&mut self, feature: &ProvisionedFeature) -> Result<(), ProvisioningError> {
            self.0.push(feature.id().to_feature_id().to_string());
            Ok(())
        }

        fn done(&mut self) -> Result<(), ProvisioningError> {
            self.0.push("done".to_owned());
            Ok(())
        }
    }

    fn feature(artifact: &str, spec: &str, name: &str) -> ProvisionedFeature {
        let gav = Gav::new("org.example", artifact, "1").unwrap();
        let id = ResolvedFeatureId::create(ResolvedSpecId::new(gav, spec), "name", name).unwrap();
        ProvisionedFeature::builder(id).build()
    }

    #[test]
    fn fires_transitions_in_resolution_order() {
        let config = ProvisionedConfig::builder(ConfigId::named("c"))
            .feature(feature("fp1", "specA", "a1"))
            .feature(feature("fp1", "specA", "a2"))
            .feature(feature("fp1", "specB", "b1"))
            .feature(feature("fp2", "specB", "b2"))
            .build()
            .unwrap();

        let mut recorder = Recorder::default();
        walk_config(&config, &mut recorder).unwrap();

        assert_eq!(recorder.0, vec![
            "prepare named c",
            "fp fp1",
            "spec specA",
            "specA:name=a1",
            "specA:name=a2",
            "spec specB",
            "specB:name=b1",
            "fp fp2",
            "spec specB",
            "specB:name=b2",
            "done",
        ]);
    }

    #[test]
    fn handler_errors_stop_the_walk() {
        struct Failing;
        impl ProvisionedConfigHandler for Failing {
            fn next_feature(&mut self, _feature: &ProvisionedFeature) -> Result<(), ProvisioningError> {
                Err("stop".into())
            }
        }

        let config = ProvisionedConfig::builder(ConfigId::named("c"))
            .feature(feature("fp1", "specA", "a1"))
            .build()
            .unwrap();
        let err = walk_config(&config, &mut Failing).unwrap_err();
        assert!(matches!(err, ProvisioningError::Internal { .. }));
    }
}
