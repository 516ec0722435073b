//! Unit tests for lookup helpers, tag pruning, and desired-state builders.

use kube::api::ObjectMeta;

use apiplatform_operator::controller::helpers::{find_exactly_one, FindOneError};
use apiplatform_operator::controller::tags::prune_obsolete_tags;
use apiplatform_operator::controller::upgrade::ensure_image_change_trigger;
use apiplatform_operator::crd::api_platform::{ApiPlatform, ApiPlatformSpec};
use apiplatform_operator::crd::image_stream::{ImageStream, ImageStreamSpec, TagReference};
use apiplatform_operator::error::Error;
use apiplatform_operator::helpers::OperatorConfig;
use apiplatform_operator::templates;

fn test_platform(version: &str) -> ApiPlatform {
    ApiPlatform {
        metadata: ObjectMeta {
            name: Some("platform".to_string()),
            namespace: Some("default".to_string()),
            ..Default::default()
        },
        spec: ApiPlatformSpec {
            version: version.to_string(),
            image_registry: None,
            high_availability: None,
            system: None,
        },
        status: None,
    }
}

fn stream_with_tags(names: &[&str]) -> ImageStream {
    ImageStream {
        metadata: ObjectMeta {
            name: Some("gateway".to_string()),
            ..Default::default()
        },
        spec: ImageStreamSpec {
            tags: names
                .iter()
                .map(|n| TagReference::docker(*n, format!("registry/img:{n}")))
                .collect(),
        },
    }
}

// ── find_exactly_one ────────────────────────────────────────────────────────

#[test]
fn find_exactly_one_returns_the_single_match() {
    let items = [1, 4, 9];
    assert_eq!(find_exactly_one(&items, |n| *n == 4), Ok(1));
}

#[test]
fn find_exactly_one_reports_missing() {
    let items = [1, 4, 9];
    let err = find_exactly_one(&items, |n| *n > 100).unwrap_err();
    assert_eq!(err, FindOneError::Missing);
    assert_eq!(err.count(), 0);
}

#[test]
fn find_exactly_one_reports_every_duplicate() {
    let items = [2, 4, 6, 7];
    let err = find_exactly_one(&items, |n| *n % 2 == 0).unwrap_err();
    assert_eq!(err, FindOneError::Ambiguous { count: 3 });
    assert_eq!(err.count(), 3);
}

// ── Tag pruning ─────────────────────────────────────────────────────────────

#[test]
fn pruning_removes_obsolete_tags_and_keeps_order() {
    let mut stream = stream_with_tags(&["1.2", "latest", "1.3", "1.4"]);
    let obsolete = OperatorConfig::default().obsolete_tags;

    assert!(prune_obsolete_tags(&mut stream, &obsolete));
    let names: Vec<_> = stream.spec.tags.iter().map(|t| t.name.as_str()).collect();
    assert_eq!(names, vec!["1.2", "1.4"]);
}

#[test]
fn pruning_is_a_noop_once_tags_are_gone() {
    let mut stream = stream_with_tags(&["1.2", "latest", "1.4"]);
    let obsolete = OperatorConfig::default().obsolete_tags;

    assert!(prune_obsolete_tags(&mut stream, &obsolete));
    assert!(!prune_obsolete_tags(&mut stream, &obsolete));
    let names: Vec<_> = stream.spec.tags.iter().map(|t| t.name.as_str()).collect();
    assert_eq!(names, vec!["1.2", "1.4"]);
}

#[test]
fn pruning_empty_obsolete_set_changes_nothing() {
    let mut stream = stream_with_tags(&["latest", "1.4"]);
    assert!(!prune_obsolete_tags(&mut stream, &[]));
    assert_eq!(stream.spec.tags.len(), 2);
}

// ── Desired-state builders ──────────────────────────────────────────────────

#[test]
fn application_streams_carry_the_release_tag_from_the_default_registry() {
    let platform = test_platform("1.4");
    let gateway = templates::gateway_image_stream(&platform).unwrap();

    assert_eq!(gateway.metadata.name.as_deref(), Some("gateway"));
    assert_eq!(gateway.metadata.namespace.as_deref(), Some("default"));
    assert_eq!(gateway.spec.tags.len(), 1);
    assert_eq!(gateway.spec.tags[0].name, "1.4");
    let from = gateway.spec.tags[0].from.as_ref().unwrap();
    assert_eq!(from.kind.as_deref(), Some("DockerImage"));
    assert_eq!(from.name.as_deref(), Some("quay.io/apiplatform/gateway:1.4"));
}

#[test]
fn registry_override_rewrites_application_image_references() {
    let mut platform = test_platform("1.4");
    platform.spec.image_registry = Some("registry.example.com/apf".to_string());

    let backend = templates::backend_image_stream(&platform).unwrap();
    let from = backend.spec.tags[0].from.as_ref().unwrap();
    assert_eq!(
        from.name.as_deref(),
        Some("registry.example.com/apf/backend:1.4")
    );
}

#[test]
fn empty_version_fails_builder_with_config_error() {
    let platform = test_platform("  ");
    let err = templates::gateway_image_stream(&platform).unwrap_err();
    assert!(matches!(err, Error::Config(_)), "{err}");
    assert!(err.to_string().contains("spec.version is empty"));
}

#[test]
fn gateway_deployment_configs_reference_the_release_image_stream_tag() {
    let platform = test_platform("1.4");
    for (builder, name) in [
        (
            templates::gateway_staging_deployment_config
                as fn(&ApiPlatform) -> apiplatform_operator::error::Result<_>,
            templates::GATEWAY_STAGING_DC,
        ),
        (
            templates::gateway_production_deployment_config,
            templates::GATEWAY_PRODUCTION_DC,
        ),
    ] {
        let dc = builder(&platform).unwrap();
        assert_eq!(dc.metadata.name.as_deref(), Some(name));

        let image_change: Vec<_> = dc
            .spec
            .triggers
            .iter()
            .filter(|t| t.is_image_change())
            .collect();
        assert_eq!(image_change.len(), 1);
        let params = image_change[0].image_change_params.as_ref().unwrap();
        assert!(params.automatic);
        assert_eq!(params.container_names, vec!["gateway".to_string()]);
        assert_eq!(params.from.kind.as_deref(), Some("ImageStreamTag"));
        assert_eq!(params.from.name.as_deref(), Some("gateway:1.4"));
    }
}

// ── Trigger alignment ───────────────────────────────────────────────────────

#[test]
fn aligned_trigger_is_not_rewritten() {
    let platform = test_platform("1.4");
    let desired = templates::gateway_staging_deployment_config(&platform).unwrap();
    let mut existing = desired.clone();

    assert!(!ensure_image_change_trigger(&desired, &mut existing).unwrap());
    assert_eq!(existing, desired);
}

#[test]
fn drifted_trigger_is_rewritten_to_the_desired_tag() {
    let platform = test_platform("1.4");
    let desired = templates::gateway_staging_deployment_config(&platform).unwrap();
    let mut existing = templates::gateway_staging_deployment_config(&test_platform("1.3")).unwrap();

    assert!(ensure_image_change_trigger(&desired, &mut existing).unwrap());
    let params = existing.spec.triggers[1].image_change_params.as_ref().unwrap();
    assert_eq!(params.from.name.as_deref(), Some("gateway:1.4"));
    // The pod template keeps its old image; only the trigger moves.
    let container = &existing.spec.template.as_ref().unwrap().spec.as_ref().unwrap().containers[0];
    assert_eq!(container.image.as_deref(), Some("gateway:1.3"));
}

#[test]
fn desired_trigger_without_target_tag_is_rejected_unchanged() {
    let platform = test_platform("1.4");
    let mut desired = templates::gateway_staging_deployment_config(&platform).unwrap();
    desired.spec.triggers[1]
        .image_change_params
        .as_mut()
        .unwrap()
        .from
        .name = None;
    let mut existing = templates::gateway_staging_deployment_config(&platform).unwrap();

    let err = ensure_image_change_trigger(&desired, &mut existing).unwrap_err();
    assert!(matches!(err, Error::Config(_)), "{err}");
    // The existing reference survives; nothing was erased.
    let params = existing.spec.triggers[1].image_change_params.as_ref().unwrap();
    assert_eq!(params.from.name.as_deref(), Some("gateway:1.4"));
}

#[test]
fn trigger_without_params_counts_as_missing() {
    let platform = test_platform("1.4");
    let desired = templates::gateway_staging_deployment_config(&platform).unwrap();
    let mut existing = desired.clone();
    existing.spec.triggers[1].image_change_params = None;

    let err = ensure_image_change_trigger(&desired, &mut existing).unwrap_err();
    assert!(matches!(err, Error::TriggerShape { count: 0, .. }), "{err}");
}
