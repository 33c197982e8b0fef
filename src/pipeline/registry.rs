//! Stage registry and dependency resolution.

use std::collections::{BTreeSet, HashMap, HashSet};

use super::Stage;
use crate::error::PipelineError;

/// Static catalogue of stages, resolved into a run order on demand.
#[derive(Debug, Clone, Default)]
pub struct StageRegistry {
    stages: Vec<Stage>,
    by_name: HashMap<String, usize>,
}

impl StageRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a stage. Declaration order is the tie-break when resolving.
    pub fn register(&mut self, stage: Stage) -> Result<(), PipelineError> {
        if self.by_name.contains_key(stage.name()) {
            return Err(PipelineError::DuplicateStage {
                name: stage.name().to_string(),
            });
        }
        self.by_name.insert(stage.name().to_string(), self.stages.len());
        self.stages.push(stage);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&Stage> {
        self.by_name.get(name).map(|&i| &self.stages[i])
    }

    /// Stages in declaration order.
    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// Every stage, dependencies first.
    ///
    /// Among stages that are ready at the same time, the one declared first
    /// runs first, so the order is the same on every call.
    pub fn resolve(&self) -> Result<Vec<&Stage>, PipelineError> {
        let all: Vec<usize> = (0..self.stages.len()).collect();
        self.order(&all)
    }

    /// `target` and everything it transitively depends on, dependencies first.
    pub fn resolve_for(&self, target: &str) -> Result<Vec<&Stage>, PipelineError> {
        let mut required = HashSet::new();
        self.add_with_dependencies(target, None, &mut required)?;
        let mut subset: Vec<usize> = required.into_iter().collect();
        subset.sort_unstable();
        self.order(&subset)
    }

    fn add_with_dependencies(
        &self,
        name: &str,
        dependent: Option<&str>,
        required: &mut HashSet<usize>,
    ) -> Result<(), PipelineError> {
        let index = self.lookup(name, dependent)?;
        if required.insert(index) {
            for dep in self.stages[index].dependencies() {
                self.add_with_dependencies(dep, Some(name), required)?;
            }
        }
        Ok(())
    }

    fn lookup(&self, name: &str, dependent: Option<&str>) -> Result<usize, PipelineError> {
        self.by_name.get(name).copied().ok_or_else(|| match dependent {
            Some(stage) => PipelineError::UnknownDependency {
                stage: stage.to_string(),
                dependency: name.to_string(),
            },
            None => PipelineError::UnknownStage {
                name: name.to_string(),
            },
        })
    }

    /// Kahn's algorithm over `subset` (declaration indices, ascending).
    fn order(&self, subset: &[usize]) -> Result<Vec<&Stage>, PipelineError> {
        let mut in_degree: HashMap<usize, usize> = subset.iter().map(|&i| (i, 0)).collect();
        let mut dependents: HashMap<usize, Vec<usize>> = HashMap::new();

        for &i in subset {
            let stage = &self.stages[i];
            for dep in stage.dependencies() {
                let d = self.lookup(dep, Some(stage.name()))?;
                if !in_degree.contains_key(&d) {
                    continue;
                }
                dependents.entry(d).or_default().push(i);
                *in_degree.entry(i).or_default() += 1;
            }
        }

        let mut ready: BTreeSet<usize> = in_degree
            .iter()
            .filter(|(_, &deg)| deg == 0)
            .map(|(&i, _)| i)
            .collect();
        let mut order = Vec::with_capacity(subset.len());

        while let Some(i) = ready.pop_first() {
            order.push(&self.stages[i]);
            for &next in dependents.get(&i).map(Vec::as_slice).unwrap_or_default() {
                if let Some(deg) = in_degree.get_mut(&next) {
                    *deg -= 1;
                    if *deg == 0 {
                        ready.insert(next);
                    }
                }
            }
        }

        if order.len() < subset.len() {
            let mut stuck: Vec<usize> = in_degree
                .into_iter()
                .filter(|&(_, deg)| deg > 0)
                .map(|(i, _)| i)
                .collect();
            stuck.sort_unstable();
            return Err(PipelineError::Cycle {
                stages: stuck.into_iter().map(|i| self.stages[i].name().to_string()).collect(),
            });
        }

        Ok(order)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::ToolSpec;
    use crate::tool::ToolKind;

    fn stage(name: &str, deps: &[&str]) -> Stage {
        deps.iter().fold(
            Stage::tool(name, ToolSpec::new(ToolKind::Decoder)),
            |s, d| s.depends_on(*d),
        )
    }

    fn names(stages: Vec<&Stage>) -> Vec<&str> {
        stages.into_iter().map(Stage::name).collect()
    }

    fn registry(stages: Vec<Stage>) -> StageRegistry {
        let mut registry = StageRegistry::new();
        for s in stages {
            registry.register(s).unwrap();
        }
        registry
    }

    #[test]
    fn test_declaration_order_without_dependencies() {
        let r = registry(vec![stage("c", &[]), stage("a", &[]), stage("b", &[])]);
        assert_eq!(names(r.resolve().unwrap()), vec!["c", "a", "b"]);
    }

    #[test]
    fn test_dependencies_come_first() {
        let r = registry(vec![
            stage("values", &["dump"]),
            stage("summary", &[]),
            stage("dump", &["filter"]),
            stage("filter", &[]),
        ]);
        assert_eq!(
            names(r.resolve().unwrap()),
            vec!["summary", "filter", "dump", "values"]
        );
    }

    #[test]
    fn test_resolve_is_stable() {
        let r = registry(vec![
            stage("a", &[]),
            stage("b", &["a"]),
            stage("c", &["a"]),
            stage("d", &[]),
        ]);
        let first = names(r.resolve().unwrap());
        assert_eq!(first, vec!["a", "b", "c", "d"]);
        for _ in 0..10 {
            assert_eq!(names(r.resolve().unwrap()), first);
        }
    }

    #[test]
    fn test_duplicate_rejected() {
        let mut r = registry(vec![stage("a", &[])]);
        assert!(matches!(
            r.register(stage("a", &[])),
            Err(PipelineError::DuplicateStage { name }) if name == "a"
        ));
        assert_eq!(r.len(), 1);
    }

    #[test]
    fn test_unknown_dependency() {
        let r = registry(vec![stage("a", &["ghost"])]);
        assert!(matches!(
            r.resolve(),
            Err(PipelineError::UnknownDependency { stage, dependency })
                if stage == "a" && dependency == "ghost"
        ));
    }

    #[test]
    fn test_cycle_names_stuck_stages() {
        let r = registry(vec![
            stage("ok", &[]),
            stage("x", &["z"]),
            stage("y", &["x"]),
            stage("z", &["y"]),
            stage("after", &["z"]),
        ]);
        match r.resolve() {
            Err(PipelineError::Cycle { stages }) => {
                assert_eq!(stages, vec!["x", "y", "z", "after"]);
            }
            other => panic!("expected cycle, got {other:?}"),
        }
    }

    #[test]
    fn test_resolve_for_takes_closure_only() {
        let r = registry(vec![
            stage("summary", &[]),
            stage("filter", &[]),
            stage("dump", &["filter"]),
            stage("values", &["dump"]),
        ]);
        assert_eq!(
            names(r.resolve_for("values").unwrap()),
            vec!["filter", "dump", "values"]
        );
        assert_eq!(names(r.resolve_for("summary").unwrap()), vec!["summary"]);
        assert!(matches!(
            r.resolve_for("nope"),
            Err(PipelineError::UnknownStage { .. })
        ));
    }
}
