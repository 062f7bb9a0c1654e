//! Graph construction and validation
//!
//! Five passes, run once at container build, all-or-nothing:
//!
//! 1. Collect providers into one interface-keyed mapping (duplicates fail).
//! 2. Resolvability: every mandatory edge must have a provider.
//! 3. Cycle detection over the effective edge set.
//! 4. Scope inference, dependencies before dependents.
//! 5. Scope compatibility: a provider may only depend on same-or-broader
//!    scoped providers.
//!
//! The effective edge set is every mandatory edge plus every optional
//! edge whose target has a registered provider; an optional edge with no
//! provider never materializes at runtime and is excluded everywhere.

use std::collections::HashMap;
use std::sync::Arc;

use infuse_core::{Error, Key, Provider, Result, Scope, ScopeHint};
use tracing::debug;

use super::{BoundProvider, Graph};
use crate::package::ContextualizedProvider;

struct Entry {
    provider: Arc<Provider>,
    hint: ScopeHint,
    eager: bool,
}

/// Build and validate the graph from collected registrations.
pub(crate) fn build(registrations: Vec<ContextualizedProvider>) -> Result<Graph> {
    let (entries, order) = collect(registrations)?;
    debug!(providers = order.len(), "collected providers");

    check_resolvable(&entries)?;
    let postorder = check_acyclic(&entries, &order)?;
    let scopes = infer_scopes(&entries, &postorder);
    check_compatible(&entries, &order, &scopes)?;

    let providers = entries
        .into_iter()
        .map(|(key, entry)| {
            let scope = scopes[&key];
            (key, BoundProvider::new(entry.provider, scope, entry.eager))
        })
        .collect();
    Ok(Graph { providers, order })
}

fn collect(
    registrations: Vec<ContextualizedProvider>,
) -> Result<(HashMap<Key, Entry>, Vec<Key>)> {
    let mut entries = HashMap::with_capacity(registrations.len());
    let mut order = Vec::with_capacity(registrations.len());
    for registration in registrations {
        let key = registration.provider().interface();
        if entries.contains_key(&key) {
            return Err(Error::DuplicateProvider {
                interface: key.name(),
            });
        }
        entries.insert(
            key,
            Entry {
                provider: Arc::clone(registration.provider()),
                hint: registration.scope(),
                eager: registration.is_eager(),
            },
        );
        order.push(key);
    }
    Ok((entries, order))
}

fn check_resolvable(entries: &HashMap<Key, Entry>) -> Result<()> {
    for (key, entry) in entries {
        for dep in entry.provider.sub_dependencies() {
            if dep.mandatory && !entries.contains_key(&dep.key) {
                return Err(Error::UnresolvedDependency {
                    interface: dep.key.name(),
                    required_by: key.name(),
                });
            }
        }
    }
    Ok(())
}

/// Edges that materialize at runtime: mandatory ones, and optional ones
/// whose target is registered.
fn edges<'a>(
    entries: &'a HashMap<Key, Entry>,
    key: &Key,
) -> impl Iterator<Item = Key> + 'a {
    let deps = entries
        .get(key)
        .map(|entry| entry.provider.sub_dependencies())
        .unwrap_or_default();
    deps.iter()
        .filter(|dep| dep.mandatory || entries.contains_key(&dep.key))
        .map(|dep| dep.key)
}

#[derive(Clone, Copy, PartialEq)]
enum Mark {
    Visiting,
    Done,
}

/// Depth-first traversal from every node. Returns keys in postorder, so
/// each provider follows everything it depends on.
fn check_acyclic(entries: &HashMap<Key, Entry>, order: &[Key]) -> Result<Vec<Key>> {
    let mut marks: HashMap<Key, Mark> = HashMap::with_capacity(entries.len());
    let mut postorder = Vec::with_capacity(entries.len());
    let mut path = Vec::new();
    for key in order {
        visit(entries, *key, &mut marks, &mut path, &mut postorder)?;
    }
    Ok(postorder)
}

fn visit(
    entries: &HashMap<Key, Entry>,
    key: Key,
    marks: &mut HashMap<Key, Mark>,
    path: &mut Vec<Key>,
    postorder: &mut Vec<Key>,
) -> Result<()> {
    match marks.get(&key) {
        Some(Mark::Done) => return Ok(()),
        Some(Mark::Visiting) => {
            let start = path.iter().position(|k| *k == key).unwrap_or(0);
            let mut cycle: Vec<&str> = path[start..].iter().map(|k| k.name()).collect();
            cycle.push(key.name());
            return Err(Error::CircularDependency {
                cycle: cycle.join(" -> "),
            });
        }
        None => {}
    }
    marks.insert(key, Mark::Visiting);
    path.push(key);
    for dep in edges(entries, &key).collect::<Vec<_>>() {
        visit(entries, dep, marks, path, postorder)?;
    }
    path.pop();
    marks.insert(key, Mark::Done);
    postorder.push(key);
    Ok(())
}

/// Resolve inferred scopes, dependencies before dependents.
///
/// An inferred provider takes the narrowest scope among its mandatory
/// sub-dependencies; with none, it defaults to the broadest tier. Factory
/// deps never take part in inference; the compatibility pass rejects the
/// resulting edge instead.
fn infer_scopes(entries: &HashMap<Key, Entry>, postorder: &[Key]) -> HashMap<Key, Scope> {
    let mut scopes = HashMap::with_capacity(entries.len());
    for key in postorder {
        let entry = &entries[key];
        let scope = match entry.hint {
            ScopeHint::Explicit(scope) => scope,
            ScopeHint::Inferred => entry
                .provider
                .sub_dependencies()
                .iter()
                .filter(|dep| dep.mandatory)
                .filter_map(|dep| scopes.get(&dep.key).copied())
                .fold(Scope::Application, Scope::narrowest),
        };
        if matches!(entry.hint, ScopeHint::Inferred) {
            debug!(interface = %key, %scope, "inferred provider scope");
        }
        scopes.insert(*key, scope);
    }
    scopes
}

fn check_compatible(
    entries: &HashMap<Key, Entry>,
    order: &[Key],
    scopes: &HashMap<Key, Scope>,
) -> Result<()> {
    for key in order {
        let scope = scopes[key];
        for dep in edges(entries, key).collect::<Vec<_>>() {
            let dep_scope = scopes[&dep];
            if !dep_scope.outlives(scope) {
                return Err(Error::ContextMismatch {
                    provider: key.name(),
                    provider_scope: scope,
                    dependency: dep.name(),
                    dependency_scope: dep_scope,
                });
            }
        }
    }
    Ok(())
}
