use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::domain::node::NodeKey;
use crate::domain::root_input::RootInput;
use crate::types::{kind_name, Value};
use crate::CoreError;

/// Declaration of a vectorized sub-graph
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VectorGroupDeclaration {
    /// Group name; ordinary nodes aggregate the group by naming a parameter after it
    pub name: String,

    /// Sequence-valued root input the group replicates over
    pub source: String,

    /// Parameter name template nodes use to read their replica's element
    pub element: String,

    /// Template node whose replica values form the aggregate
    pub output: String,

    /// Further sources walked in lockstep with `source`
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub zipped: Vec<ZippedSource>,
}

/// A sequence-valued root input zipped into a vector group
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZippedSource {
    /// Root input name
    pub source: String,

    /// Parameter name template nodes use to read this source's element
    pub element: String,
}

impl VectorGroupDeclaration {
    /// Create a group declaration
    pub fn new(
        name: impl Into<String>,
        source: impl Into<String>,
        element: impl Into<String>,
        output: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            source: source.into(),
            element: element.into(),
            output: output.into(),
            zipped: Vec::new(),
        }
    }

    /// Zip another source into the group, read through `element`
    pub fn zip_with(mut self, source: impl Into<String>, element: impl Into<String>) -> Self {
        self.zipped.push(ZippedSource {
            source: source.into(),
            element: element.into(),
        });
        self
    }

    /// `(source, element)` pairs, the primary source first
    pub fn sources(&self) -> impl Iterator<Item = (&str, &str)> {
        std::iter::once((self.source.as_str(), self.element.as_str()))
            .chain(self.zipped.iter().map(|z| (z.source.as_str(), z.element.as_str())))
    }

    /// Element parameter names, the primary one first
    pub fn elements(&self) -> impl Iterator<Item = &str> {
        self.sources().map(|(_, element)| element)
    }

    /// Whether the root input `input` is one of the group's sources
    pub fn is_fed_by(&self, input: &str) -> bool {
        self.sources().any(|(source, _)| source == input)
    }
}

/// One replica of a vector group
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Replica {
    /// Index in the source vectors
    pub index: usize,

    /// Element bound to each element parameter
    pub elements: BTreeMap<String, Value>,
}

/// What changed in a vector group after one of its sources was updated
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VectorChange {
    /// Same elements
    Unchanged,
    /// Same length; each `(index, element)` pair holds a new value
    Elements(Vec<(usize, String)>),
    /// Length or alignment changed; every replica was rebuilt
    Resized {
        /// Previous replica count
        from: usize,
        /// New replica count
        to: usize,
    },
}

/// The replicas produced for a group's sequence-valued root inputs
#[derive(Debug, Clone, Serialize)]
pub struct VectorGroup {
    /// The group's declaration
    pub declaration: VectorGroupDeclaration,

    /// Template node names, in registration order
    pub template: Vec<String>,

    replicas: Vec<Replica>,

    /// Source lengths when they disagree; the group then has no replicas
    mismatch: Option<Vec<(String, usize)>>,
}

impl VectorGroup {
    /// Produce one replica per position of the source inputs
    pub fn materialize(
        declaration: VectorGroupDeclaration,
        roots: &BTreeMap<String, RootInput>,
    ) -> Result<Self, CoreError> {
        let mut group = Self {
            declaration,
            template: Vec::new(),
            replicas: Vec::new(),
            mismatch: None,
        };
        group.refresh(roots)?;
        Ok(group)
    }

    /// Group name
    pub fn name(&self) -> &str {
        &self.declaration.name
    }

    /// Number of replicas; the common length of the sources
    pub fn len(&self) -> usize {
        self.replicas.len()
    }

    /// Whether the group has no replicas
    pub fn is_empty(&self) -> bool {
        self.replicas.is_empty()
    }

    /// Replicas in index order
    pub fn replicas(&self) -> &[Replica] {
        &self.replicas
    }

    /// Whether every source has the same length
    pub fn is_aligned(&self) -> bool {
        self.mismatch.is_none()
    }

    /// Fails when the sources disagree in length
    pub fn check_aligned(&self) -> Result<(), CoreError> {
        match &self.mismatch {
            None => Ok(()),
            Some(lengths) => Err(CoreError::VectorLengthMismatch {
                group: self.name().to_string(),
                lengths: lengths
                    .iter()
                    .map(|(source, len)| format!("{}={}", source, len))
                    .collect::<Vec<_>>()
                    .join(", "),
            }),
        }
    }

    /// Element bound to the primary element parameter in replica `index`
    pub fn element(&self, index: usize) -> Option<&Value> {
        self.element_named(index, &self.declaration.element)
    }

    /// Element bound to `element` in replica `index`
    pub fn element_named(&self, index: usize, element: &str) -> Option<&Value> {
        self.replicas.get(index).and_then(|r| r.elements.get(element))
    }

    /// Whether `node` is one of this group's template nodes
    pub fn is_template(&self, node: &str) -> bool {
        self.template.iter().any(|t| t == node)
    }

    /// Cache keys of every template node in replica `index`
    pub fn replica_keys(&self, index: usize) -> Vec<NodeKey> {
        self.template
            .iter()
            .map(|node| NodeKey::replica(self.name(), index, node.clone()))
            .collect()
    }

    /// Cache keys of every node in every replica
    pub fn keys(&self) -> Vec<NodeKey> {
        (0..self.len()).flat_map(|i| self.replica_keys(i)).collect()
    }

    /// Cache keys of the output node in each replica, in index order
    pub fn output_keys(&self) -> Vec<NodeKey> {
        (0..self.len())
            .map(|i| NodeKey::replica(self.name(), i, self.declaration.output.clone()))
            .collect()
    }

    pub(crate) fn add_template(&mut self, node: impl Into<String>) {
        let node = node.into();
        if !self.is_template(&node) {
            self.template.push(node);
        }
    }

    /// Re-bind replicas to the current source values
    ///
    /// A length or alignment change rebuilds the whole group; otherwise
    /// only the elements that changed are reported.
    pub(crate) fn refresh(
        &mut self,
        roots: &BTreeMap<String, RootInput>,
    ) -> Result<VectorChange, CoreError> {
        let mut columns = Vec::new();
        for (source, element) in self.declaration.sources() {
            let root = roots
                .get(source)
                .ok_or_else(|| CoreError::UnknownRootInput(source.to_string()))?;
            columns.push((source, element, source_items(source, &root.value)?));
        }

        let lengths: Vec<(String, usize)> = columns
            .iter()
            .map(|(source, _, items)| (source.to_string(), items.len()))
            .collect();
        let aligned = lengths.windows(2).all(|pair| pair[0].1 == pair[1].1);
        let len = if aligned { lengths.first().map(|(_, n)| *n).unwrap_or(0) } else { 0 };

        if len != self.replicas.len() || aligned != self.is_aligned() {
            let replicas = (0..len)
                .map(|index| Replica {
                    index,
                    elements: columns
                        .iter()
                        .map(|(_, element, items)| (element.to_string(), items[index].clone()))
                        .collect(),
                })
                .collect();
            let from = self.replicas.len();
            self.replicas = replicas;
            self.mismatch = if aligned { None } else { Some(lengths) };
            return Ok(VectorChange::Resized { from, to: len });
        }
        if !aligned {
            self.mismatch = Some(lengths);
            return Ok(VectorChange::Unchanged);
        }

        let mut changed = Vec::new();
        for replica in self.replicas.iter_mut() {
            for (_, element, items) in &columns {
                let item = &items[replica.index];
                if replica.elements.get(*element) != Some(item) {
                    replica.elements.insert(element.to_string(), item.clone());
                    changed.push((replica.index, element.to_string()));
                }
            }
        }

        if changed.is_empty() {
            Ok(VectorChange::Unchanged)
        } else {
            Ok(VectorChange::Elements(changed))
        }
    }
}

/// Elements of a vector source, or a type error naming the source
pub(crate) fn source_items<'a>(
    source: &str,
    value: &'a Value,
) -> Result<&'a Vec<Value>, CoreError> {
    value.as_array().ok_or_else(|| CoreError::TypeMismatch {
        name: source.to_string(),
        expected: "list".to_string(),
        found: kind_name(value).to_string(),
    })
}
