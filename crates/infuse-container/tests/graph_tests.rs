//! Graph validation tests
//!
//! Every check the builder runs at container build: duplicates,
//! resolvability, cycles, scope inference and scope compatibility.

use std::sync::Arc;

use infuse_container::{Container, ContextualizedProvider};
use infuse_core::{Error, Key, Provider, Scope};

struct Config;
struct Pool {
    #[allow(dead_code)]
    config: Arc<Config>,
}
struct Session;
struct Service;
struct Token;

fn config_provider() -> Provider {
    Provider::bind::<Config>().from(|_| Ok(Config))
}

fn pool_provider() -> Provider {
    Provider::bind::<Pool>()
        .needs::<Config>("config")
        .from(|deps| {
            Ok(Pool {
                config: deps.get("config")?,
            })
        })
}

#[test]
fn duplicate_interface_is_rejected() {
    let err = Container::builder()
        .provider(ContextualizedProvider::application(config_provider()))
        .provider(ContextualizedProvider::application(config_provider()))
        .build()
        .unwrap_err();

    assert!(matches!(err, Error::DuplicateProvider { .. }));
    assert!(err.to_string().starts_with("multiple providers found"));
    assert!(err.is_build_error());
}

#[test]
fn missing_mandatory_dependency_is_rejected() {
    let err = Container::builder()
        .provider(ContextualizedProvider::application(pool_provider()))
        .build()
        .unwrap_err();

    assert!(matches!(
        err,
        Error::UnresolvedDependency { interface, .. } if interface.contains("Config")
    ));
    assert!(err.to_string().starts_with("no provider found"));
}

#[test]
fn absent_optional_dependency_is_allowed() {
    let provider = Provider::bind::<Pool>()
        .wants::<Config>("config")
        .from(|deps| {
            assert!(deps.opt::<Config>("config").is_none());
            Ok(Pool {
                config: Arc::new(Config),
            })
        });

    let container = Container::builder()
        .provider(ContextualizedProvider::application(provider))
        .build()
        .unwrap();
    assert_eq!(container.graph().len(), 1);
    assert!(!container.graph().contains(&Key::of::<Config>()));
}

#[test]
fn cycle_is_reported_with_its_path() {
    struct Left;
    struct Right;

    let err = Container::builder()
        .provider(ContextualizedProvider::application(
            Provider::bind::<Left>().needs::<Right>("right").from(|_| Ok(Left)),
        ))
        .provider(ContextualizedProvider::application(
            Provider::bind::<Right>().needs::<Left>("left").from(|_| Ok(Right)),
        ))
        .build()
        .unwrap_err();

    let text = err.to_string();
    assert!(matches!(err, Error::CircularDependency { .. }));
    assert!(text.starts_with("circular dependency found"));
    assert!(text.contains("Left -> "));
    assert!(text.contains("Right"));
}

#[test]
fn self_dependency_is_a_cycle() {
    struct Recursive;

    let err = Container::builder()
        .provider(ContextualizedProvider::application(
            Provider::bind::<Recursive>()
                .needs::<Recursive>("inner")
                .from(|_| Ok(Recursive)),
        ))
        .build()
        .unwrap_err();

    assert!(matches!(err, Error::CircularDependency { .. }));
}

#[test]
fn inferred_scope_takes_the_narrowest_dependency() {
    let container = Container::builder()
        .provider(ContextualizedProvider::task(
            Provider::bind::<Session>().from(|_| Ok(Session)),
        ))
        .provider(ContextualizedProvider::auto(
            Provider::bind::<Service>()
                .needs::<Session>("session")
                .from(|_| Ok(Service)),
        ))
        .build()
        .unwrap();

    assert_eq!(
        container.graph().scope_of(&Key::of::<Service>()),
        Some(Scope::Task)
    );
}

#[test]
fn inference_defaults_to_application_without_dependencies() {
    let container = Container::builder()
        .provider(ContextualizedProvider::auto(config_provider()))
        .build()
        .unwrap();

    assert_eq!(
        container.graph().scope_of(&Key::of::<Config>()),
        Some(Scope::Application)
    );
}

#[test]
fn inference_chains_through_intermediate_providers() {
    // Session is thread-scoped; Pool infers thread; Service infers thread
    // through Pool even though Service never names Session.
    let container = Container::builder()
        .provider(ContextualizedProvider::thread(
            Provider::bind::<Config>().from(|_| Ok(Config)),
        ))
        .provider(ContextualizedProvider::auto(pool_provider()))
        .provider(ContextualizedProvider::auto(
            Provider::bind::<Service>().needs::<Pool>("pool").from(|_| Ok(Service)),
        ))
        .build()
        .unwrap();

    assert_eq!(
        container.graph().scope_of(&Key::of::<Pool>()),
        Some(Scope::Thread)
    );
    assert_eq!(
        container.graph().scope_of(&Key::of::<Service>()),
        Some(Scope::Thread)
    );
}

#[test]
fn broader_provider_may_not_depend_on_narrower() {
    let err = Container::builder()
        .provider(ContextualizedProvider::task(
            Provider::bind::<Session>().from(|_| Ok(Session)),
        ))
        .provider(ContextualizedProvider::application(
            Provider::bind::<Service>()
                .needs::<Session>("session")
                .from(|_| Ok(Service)),
        ))
        .build()
        .unwrap_err();

    assert!(matches!(
        err,
        Error::ContextMismatch {
            provider_scope: Scope::Application,
            dependency_scope: Scope::Task,
            ..
        }
    ));
    assert!(err.to_string().starts_with("context error"));
}

#[test]
fn registered_optional_edges_are_scope_checked() {
    let err = Container::builder()
        .provider(ContextualizedProvider::task(
            Provider::bind::<Session>().from(|_| Ok(Session)),
        ))
        .provider(ContextualizedProvider::application(
            Provider::bind::<Service>()
                .wants::<Session>("session")
                .from(|_| Ok(Service)),
        ))
        .build()
        .unwrap_err();

    assert!(matches!(err, Error::ContextMismatch { .. }));
}

#[test]
fn only_factory_providers_reach_factory_dependencies() {
    let token = || Provider::bind::<Token>().from(|_| Ok(Token));
    let service = || {
        Provider::bind::<Service>()
            .needs::<Token>("token")
            .from(|_| Ok(Service))
    };

    let err = Container::builder()
        .provider(ContextualizedProvider::factory(token()))
        .provider(ContextualizedProvider::application(service()))
        .build()
        .unwrap_err();
    assert!(matches!(
        err,
        Error::ContextMismatch {
            dependency_scope: Scope::Factory,
            ..
        }
    ));

    // A factory provider may depend on any tier, factory included.
    Container::builder()
        .provider(ContextualizedProvider::factory(token()))
        .provider(ContextualizedProvider::factory(service()))
        .build()
        .unwrap();
}

#[test]
fn factory_providers_may_depend_on_broad_tiers() {
    let container = Container::builder()
        .provider(ContextualizedProvider::application(config_provider()))
        .provider(ContextualizedProvider::factory(pool_provider()))
        .build()
        .unwrap();

    assert_eq!(
        container.graph().scope_of(&Key::of::<Pool>()),
        Some(Scope::Factory)
    );
}

#[test]
fn graph_preserves_declaration_order() {
    let container = Container::builder()
        .provider(ContextualizedProvider::application(config_provider()))
        .provider(ContextualizedProvider::application(pool_provider()))
        .build()
        .unwrap();

    let keys: Vec<Key> = container
        .graph()
        .iter()
        .map(|bound| bound.provider().interface())
        .collect();
    assert_eq!(keys, vec![Key::of::<Config>(), Key::of::<Pool>()]);
}
