//! Behaviour selection
//!
//! A candidate behaviour applies to a role set when every role it implements
//! is in the set's closure. Applicable behaviours are ranked by specificity
//! (size of the closure of their own roles), then by priority, then by name.
//! `precedes`/`after` constraints reorder the ranking into the weave order.
//!
//! For each role method the winning implementer is the most specific one,
//! priority breaking ties. Equal candidates are only acceptable when their
//! ordering constraints rank one ahead of all the others.

use crate::behaviour::{BehaviourDef, MethodRef};
use crate::ordering::OrderGraph;
use indexmap::IndexSet;
use persona_core::{ConfigurationError, RoleCatalog, RoleName};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::debug;

struct Ranked {
    def: Arc<BehaviourDef>,
    specificity: usize,
}

impl Ranked {
    /// An undeclared priority counts as zero
    fn strength(&self) -> (usize, i32) {
        (self.specificity, self.def.priority.unwrap_or(0))
    }
}

/// Behaviours chosen for one role set, in weave order
pub struct Selection {
    ranked: Vec<Ranked>,
    graph: OrderGraph,
    /// Ranked indices in weave order
    weave: Vec<usize>,
}

impl Selection {
    /// Select among `candidates` for the role set whose closure is `closure`
    pub fn select(
        catalog: &RoleCatalog,
        closure: &IndexSet<RoleName>,
        candidates: &[Arc<BehaviourDef>],
    ) -> Result<Self, ConfigurationError> {
        let mut seen = HashSet::new();
        let mut ranked = Vec::new();
        for def in candidates {
            if !seen.insert(def.name.clone()) {
                continue;
            }
            if !def.roles.iter().all(|role| closure.contains(role)) {
                continue;
            }
            ranked.push(Ranked {
                def: def.clone(),
                specificity: catalog.closure(&def.roles)?.len(),
            });
        }
        ranked.sort_by(|a, b| {
            b.strength()
                .cmp(&a.strength())
                .then_with(|| a.def.name.cmp(&b.def.name))
        });

        let mut graph = OrderGraph::new(ranked.len());
        for (i, candidate) in ranked.iter().enumerate() {
            for (j, other) in ranked.iter().enumerate() {
                if candidate.def.precedes.contains(&other.def.name) {
                    graph.edge(i, j);
                }
                if candidate.def.after.contains(&other.def.name) {
                    graph.edge(j, i);
                }
            }
        }
        let weave = graph
            .order()
            .map_err(|node| ConfigurationError::CyclicBehaviours {
                behaviour: ranked[node].def.name.clone(),
            })?;

        let selection = Self {
            ranked,
            graph,
            weave,
        };
        debug!(
            behaviours = ?selection.behaviours().map(|b| b.name.as_str()).collect::<Vec<_>>(),
            "Selected behaviours"
        );
        Ok(selection)
    }

    /// Selected behaviours in weave order
    pub fn behaviours(&self) -> impl Iterator<Item = &Arc<BehaviourDef>> + '_ {
        self.weave.iter().map(|&index| &self.ranked[index].def)
    }

    /// Number of selected behaviours
    pub fn len(&self) -> usize {
        self.weave.len()
    }

    /// Whether nothing was selected
    pub fn is_empty(&self) -> bool {
        self.weave.is_empty()
    }

    /// Weave position of the behaviour implementing `method`, if any
    pub fn implementer(&self, method: &MethodRef) -> Result<Option<usize>, ConfigurationError> {
        let implementers: Vec<(usize, usize)> = self
            .weave
            .iter()
            .enumerate()
            .filter(|(_, &index)| self.ranked[index].def.implements_method(method))
            .map(|(slot, &index)| (slot, index))
            .collect();

        let Some(best) = implementers
            .iter()
            .map(|&(_, index)| self.ranked[index].strength())
            .max()
        else {
            return Ok(None);
        };
        let top: Vec<(usize, usize)> = implementers
            .into_iter()
            .filter(|&(_, index)| self.ranked[index].strength() == best)
            .collect();
        if let [(slot, _)] = top.as_slice() {
            return Ok(Some(*slot));
        }

        let dominant = top.iter().find(|&&(_, a)| {
            top.iter()
                .all(|&(_, b)| a == b || self.graph.reaches(a, b))
        });
        if let Some(&(slot, _)) = dominant {
            return Ok(Some(slot));
        }

        let (first, second) = self.unordered_pair(&top);
        Err(ConfigurationError::AmbiguousBehaviour {
            role: method.role.clone(),
            method: method.method.clone(),
            first: self.ranked[first].def.name.clone(),
            second: self.ranked[second].def.name.clone(),
        })
    }

    /// Two ranked indices with no ordering constraint between them
    fn unordered_pair(&self, top: &[(usize, usize)]) -> (usize, usize) {
        for (i, &(_, a)) in top.iter().enumerate() {
            for &(_, b) in &top[i + 1..] {
                if !self.graph.reaches(a, b) && !self.graph.reaches(b, a) {
                    return (a, b);
                }
            }
        }
        (top[0].1, top[1].1)
    }
}

impl std::fmt::Debug for Selection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.behaviours().map(|b| &b.name))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::payload::Payload;
    use persona_core::{MethodSig, RoleDef, ValueType};

    fn catalog() -> RoleCatalog {
        let catalog = RoleCatalog::new();
        catalog
            .register(RoleDef::new("Agent").method(MethodSig::method("greet", vec![], ValueType::Text)))
            .unwrap();
        catalog
            .register(RoleDef::new("Person").extends("Agent"))
            .unwrap();
        catalog.register(RoleDef::new("Robot")).unwrap();
        catalog
    }

    fn greeter(name: &str) -> BehaviourDef {
        BehaviourDef::new(name).method("Agent", "greet", |_| Ok(Payload::Unit))
    }

    fn select(defs: Vec<BehaviourDef>, roles: &[&str]) -> Result<Selection, ConfigurationError> {
        let catalog = catalog();
        let roles: Vec<RoleName> = roles.iter().map(|r| RoleName::new(r)).collect();
        let closure = catalog.closure(&roles)?;
        let defs: Vec<_> = defs.into_iter().map(Arc::new).collect();
        Selection::select(&catalog, &closure, &defs)
    }

    fn names(selection: &Selection) -> Vec<&str> {
        selection.behaviours().map(|b| b.name.as_str()).collect()
    }

    fn greet() -> MethodRef {
        MethodRef::new("Agent", "greet")
    }

    #[test]
    fn test_inapplicable_behaviours_are_skipped() {
        let selection = select(
            vec![
                greeter("AgentSupport").implements("Agent"),
                BehaviourDef::new("RobotSupport").implements("Robot"),
            ],
            &["Person"],
        )
        .unwrap();
        assert_eq!(names(&selection), vec!["AgentSupport"]);
    }

    #[test]
    fn test_most_specific_behaviour_wins() {
        let selection = select(
            vec![
                greeter("AgentSupport").implements("Agent"),
                greeter("PersonSupport").implements("Person"),
            ],
            &["Person"],
        )
        .unwrap();
        assert_eq!(names(&selection), vec!["PersonSupport", "AgentSupport"]);
        assert_eq!(selection.implementer(&greet()).unwrap(), Some(0));
    }

    #[test]
    fn test_priority_breaks_ties() {
        let selection = select(
            vec![
                greeter("A").implements("Agent"),
                greeter("B").implements("Agent").priority(1),
            ],
            &["Agent"],
        )
        .unwrap();
        assert_eq!(names(&selection), vec!["B", "A"]);
        assert_eq!(selection.implementer(&greet()).unwrap(), Some(0));
    }

    #[test]
    fn test_negative_priority_ranks_below_undeclared() {
        let selection = select(
            vec![
                greeter("A").implements("Agent").priority(-5),
                greeter("B").implements("Agent"),
            ],
            &["Agent"],
        )
        .unwrap();
        assert_eq!(names(&selection), vec!["B", "A"]);
        assert_eq!(selection.implementer(&greet()).unwrap(), Some(0));
    }

    #[test]
    fn test_equal_candidates_are_ambiguous() {
        let selection = select(
            vec![
                greeter("A").implements("Agent"),
                greeter("B").implements("Agent"),
            ],
            &["Agent"],
        )
        .unwrap();
        let err = selection.implementer(&greet()).unwrap_err();
        assert_eq!(
            err,
            ConfigurationError::AmbiguousBehaviour {
                role: "Agent".into(),
                method: "greet".into(),
                first: "A".into(),
                second: "B".into(),
            }
        );
    }

    #[test]
    fn test_precedence_resolves_equal_candidates() {
        let selection = select(
            vec![
                greeter("A").implements("Agent"),
                greeter("B").implements("Agent").precedes("A"),
            ],
            &["Agent"],
        )
        .unwrap();
        assert_eq!(names(&selection), vec!["B", "A"]);
        assert_eq!(selection.implementer(&greet()).unwrap(), Some(0));
    }

    #[test]
    fn test_after_constraint_reorders() {
        let selection = select(
            vec![
                BehaviourDef::new("A").implements("Agent").after("B"),
                BehaviourDef::new("B").implements("Agent"),
            ],
            &["Agent"],
        )
        .unwrap();
        assert_eq!(names(&selection), vec!["B", "A"]);
    }

    #[test]
    fn test_cyclic_precedence_is_rejected() {
        let err = select(
            vec![
                BehaviourDef::new("A").implements("Agent").precedes("B"),
                BehaviourDef::new("B").implements("Agent").precedes("A"),
            ],
            &["Agent"],
        )
        .unwrap_err();
        assert!(matches!(err, ConfigurationError::CyclicBehaviours { .. }));
    }
}
