//! Linked requests across several named sources.
//!
//! A linked request names the sources to query and what each one depends on:
//!
//! ```text
//! assoc
//! catalog
//! join(assoc, catalog)
//! ```
//!
//! Every source runs once, after all of its dependencies have resolved, and receives
//! their results in the order it listed them. Sources that do not depend on each other
//! run concurrently. Each source gets its own copy of the shared options with
//! `_provider_name` set to the name it was declared under, so one adapter can serve
//! several aliases in the same request.
//!
//! The whole graph is validated before any source runs: a malformed declaration, a
//! cycle (including `a(a)`) or a name with no registered source fails without issuing
//! a single request.
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use serde_json::json;
//! use undercomplicate::adapter::{FnSource, StaticSource};
//! use undercomplicate::models::RequestOptions;
//! use undercomplicate::resolver::{SourceMap, get_linked_data};
//!
//! # async fn example() -> undercomplicate::core::Result<()> {
//! let mut sources = SourceMap::new();
//! sources.insert("base".into(), Arc::new(StaticSource::new(json!(20))));
//! sources.insert(
//!     "total".into(),
//!     Arc::new(FnSource::new(|_, deps| Ok(json!(deps[0].as_i64().unwrap_or(0) + 1)))),
//! );
//!
//! let result = get_linked_data(&RequestOptions::new(), &sources, &["base", "total(base)"], true).await?;
//! assert_eq!(result, json!(21));
//! # Ok(())
//! # }
//! ```

pub mod declaration;
pub mod dependency_graph;

pub use declaration::Declaration;
pub use dependency_graph::DependencyGraph;

use std::collections::HashMap;
use std::sync::Arc;

use futures::FutureExt;
use futures::future::{BoxFuture, Shared, try_join_all};
use serde_json::Value;
use tracing::{debug, trace, warn};

use crate::adapter::DataSource;
use crate::constants::PROVIDER_NAME_KEY;
use crate::core::{PipelineError, Result};
use crate::models::{RequestOptions, deep_clone};

/// Sources available to a linked request, by name.
pub type SourceMap = HashMap<String, Arc<dyn DataSource>>;

type NodeFuture = Shared<BoxFuture<'static, Result<Arc<Value>>>>;

/// A validated linked request, ready to run.
pub struct LinkedRequest {
    order: Vec<String>,
    dependencies: HashMap<String, Vec<String>>,
    providers: HashMap<String, Arc<dyn DataSource>>,
    final_source: Option<String>,
    unreachable: Vec<String>,
}

impl LinkedRequest {
    /// Parses and validates `declarations` against `entities`.
    ///
    /// Names used only as dependencies become sources without dependencies of their
    /// own. When a name is declared twice, the last declaration wins.
    ///
    /// # Errors
    ///
    /// - [`PipelineError::InvalidDeclaration`] for a declaration that does not parse
    /// - [`PipelineError::CircularDependency`] for a cycle
    /// - [`PipelineError::UnknownSource`] for a name missing from `entities`
    pub fn new<S: AsRef<str>>(entities: &SourceMap, declarations: &[S]) -> Result<Self> {
        let mut names = Vec::with_capacity(declarations.len());
        let mut dependencies: HashMap<String, Vec<String>> = HashMap::new();
        let mut final_source = None;

        for raw in declarations {
            let declaration = Declaration::parse(raw.as_ref())?;
            if !dependencies.contains_key(&declaration.name) {
                names.push(declaration.name.clone());
            }
            final_source = Some(declaration.name.clone());
            dependencies.insert(declaration.name, declaration.dependencies);
        }

        // Built only from the surviving declarations, in first-declared order
        let mut graph = DependencyGraph::new();
        for name in &names {
            graph.add_node(name);
            for dep in dependencies.get(name).into_iter().flatten() {
                graph.add_dependency(name, dep);
            }
        }

        let order = graph.topological_order()?;

        let providers = order
            .iter()
            .map(|name| {
                entities
                    .get(name)
                    .map(|provider| (name.clone(), Arc::clone(provider)))
                    .ok_or_else(|| PipelineError::UnknownSource { name: name.clone() })
            })
            .collect::<Result<HashMap<_, _>>>()?;

        let unreachable = match &final_source {
            Some(last) => {
                let feeding = graph.transitive_deps(last);
                order
                    .iter()
                    .filter(|name| *name != last && !feeding.contains(*name))
                    .cloned()
                    .collect()
            }
            None => Vec::new(),
        };

        debug!(order = ?order, "Planned linked request");

        Ok(Self {
            order,
            dependencies,
            providers,
            final_source,
            unreachable,
        })
    }

    /// Source names in the order their results are reported.
    pub fn execution_order(&self) -> &[String] {
        &self.order
    }

    /// The last declared source, whose result a consolidated request returns.
    pub fn final_source(&self) -> Option<&str> {
        self.final_source.as_deref()
    }

    /// Sources whose results never reach the final source.
    pub fn unreachable_sources(&self) -> &[String] {
        &self.unreachable
    }

    /// Runs every source and returns either the final source's result
    /// (`consolidate`) or all results as an array in execution order.
    ///
    /// The first failing source fails the whole request.
    pub async fn execute(&self, shared_options: &RequestOptions, consolidate: bool) -> Result<Value> {
        if self.order.is_empty() {
            return Ok(Value::Array(Vec::new()));
        }

        if consolidate && !self.unreachable.is_empty() {
            warn!(
                final_source = ?self.final_source,
                unused = ?self.unreachable,
                "Linked request declares sources that do not feed the final source"
            );
        }

        let mut nodes: HashMap<&str, NodeFuture> = HashMap::with_capacity(self.order.len());
        let mut ordered = Vec::with_capacity(self.order.len());

        for name in &self.order {
            let provider = self
                .providers
                .get(name)
                .map(Arc::clone)
                .ok_or_else(|| PipelineError::UnknownSource { name: name.clone() })?;

            let upstream = self
                .dependencies
                .get(name)
                .map(Vec::as_slice)
                .unwrap_or_default()
                .iter()
                .map(|dep| {
                    nodes.get(dep.as_str()).cloned().ok_or_else(|| {
                        PipelineError::CircularDependency {
                            chain: format!("{name} → {dep}"),
                        }
                    })
                })
                .collect::<Result<Vec<_>>>()?;

            let options = shared_options.clone().with(PROVIDER_NAME_KEY, name.as_str());
            let source = name.clone();

            let node: NodeFuture = async move {
                let inputs = try_join_all(upstream).await?;
                let dependent_data = inputs.iter().map(|value| deep_clone(value)).collect();
                trace!(source = %source, "Requesting linked data");
                let result = provider.get_data(options, dependent_data).await?;
                Ok::<_, PipelineError>(Arc::new(result))
            }
            .boxed()
            .shared();

            nodes.insert(name.as_str(), node.clone());
            ordered.push(node);
        }

        let results = try_join_all(ordered).await?;

        if consolidate {
            let last = self.final_source.as_deref().unwrap_or_default();
            let index = self.order.iter().position(|name| name == last).unwrap_or(results.len() - 1);
            Ok(deep_clone(&results[index]))
        } else {
            Ok(Value::Array(results.iter().map(|value| deep_clone(value)).collect()))
        }
    }
}

impl std::fmt::Debug for LinkedRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LinkedRequest")
            .field("order", &self.order)
            .field("dependencies", &self.dependencies)
            .field("final_source", &self.final_source)
            .finish_non_exhaustive()
    }
}

/// Validates and runs a linked request in one call.
///
/// An empty declaration list resolves to an empty array.
///
/// # Errors
///
/// Any error from [`LinkedRequest::new`], or the first error a source returns.
pub async fn get_linked_data<S: AsRef<str>>(
    shared_options: &RequestOptions,
    entities: &SourceMap,
    declarations: &[S],
    consolidate: bool,
) -> Result<Value> {
    let request = LinkedRequest::new(entities, declarations)?;
    request.execute(shared_options, consolidate).await
}
