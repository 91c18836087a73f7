use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use fpm_domain::spec::{
    ConfigSpec, FeatureConfig, FeatureGroupConfig, FeatureGroupSpec, FeatureParameterSpec,
    FeaturePackSpec, FeatureReferenceSpec, FeatureSpec,
};
use fpm_domain::{FeaturePackConfig, Gav, ProvisioningConfig};
use fpm_resolver::{InMemoryRepository, Provisioner};
use std::hint::black_box;

/// A chain of feature-packs, each with a group of `features` items referencing the previous one.
fn layout(depth: usize, features: usize) -> (InMemoryRepository, ProvisioningConfig) {
    let gav = |i: usize| Gav::new("org.bench", format!("fp{i}"), "1").unwrap();
    let mut repo = InMemoryRepository::new();
    for i in 0..depth {
        let item = FeatureSpec::builder("Item")
            .param(FeatureParameterSpec::id("name"))
            .param(FeatureParameterSpec::nillable("prev"))
            .reference(
                FeatureReferenceSpec::builder("Item")
                    .name("prev")
                    .nillable(true)
                    .map_param("prev", "name")
                    .build()
                    .unwrap(),
            )
            .provides("item.$name")
            .build()
            .unwrap();
        let group = (0..features)
            .fold(FeatureGroupSpec::builder("items"), |b, n| {
                let mut feature = FeatureConfig::new("Item").param("name", format!("{i}-{n}"));
                if n > 0 {
                    feature = feature.param("prev", format!("{i}-{}", n - 1));
                }
                b.feature(feature)
            })
            .build()
            .unwrap();
        let mut fp = FeaturePackSpec::builder(gav(i))
            .feature_spec(item)
            .feature_group(group)
            .config(ConfigSpec::builder().name("main").group(FeatureGroupConfig::new("items")).build().unwrap());
        if i + 1 < depth {
            fp = fp.dependency(FeaturePackConfig::for_gav(gav(i + 1)));
        }
        repo.insert(fp.build().unwrap());
    }
    let request = ProvisioningConfig::builder()
        .feature_pack(FeaturePackConfig::for_gav(gav(0)))
        .build()
        .unwrap();
    (repo, request)
}

fn bench_provision(c: &mut Criterion) {
    let mut group = c.benchmark_group("provision");

    for (depth, features) in [(1usize, 100usize), (5, 100), (10, 500)] {
        let (repo, request) = layout(depth, features);
        let provisioner = Provisioner::new(&repo);
        group.throughput(Throughput::Elements((depth * features) as u64));
        group.bench_with_input(
            BenchmarkId::new("chain", format!("{depth}x{features}")),
            &request,
            |b, r| {
                b.iter(|| black_box(provisioner.provision(r).unwrap()));
            },
        );
    }

    group.finish();
}

criterion_group!(benches, bench_provision);
criterion_main!(benches);
