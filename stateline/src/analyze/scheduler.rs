//! Dependency-aware ordering of analyzers.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use crate::analyze::Analyzer;

/// Topologically order analyzers so that every analyzer runs after the
/// analyzers it depends on (Kahn's algorithm).
///
/// Dependencies naming analyzers outside the selected set are ignored. The
/// output always has the same cardinality and membership as the input. On a
/// dependency cycle no total order exists; the fallback is the original,
/// unsorted order, logged as a warning.
pub fn sort_by_dependencies(analyzers: &[Arc<dyn Analyzer>]) -> Vec<Arc<dyn Analyzer>> {
    let index_by_name: HashMap<&str, usize> = analyzers
        .iter()
        .enumerate()
        .map(|(index, analyzer)| (analyzer.name(), index))
        .collect();

    // In-degree counts only dependencies present in the selected set.
    let mut in_degree = vec![0usize; analyzers.len()];
    let mut dependents: Vec<Vec<usize>> = vec![Vec::new(); analyzers.len()];
    for (index, analyzer) in analyzers.iter().enumerate() {
        for dependency in analyzer.depends_on() {
            if let Some(&dep_index) = index_by_name.get(dependency) {
                in_degree[index] += 1;
                dependents[dep_index].push(index);
            }
        }
    }

    let mut queue: VecDeque<usize> = (0..analyzers.len()).filter(|&i| in_degree[i] == 0).collect();
    let mut ordered = Vec::with_capacity(analyzers.len());
    while let Some(index) = queue.pop_front() {
        ordered.push(Arc::clone(&analyzers[index]));
        for &dependent in &dependents[index] {
            in_degree[dependent] -= 1;
            if in_degree[dependent] == 0 {
                queue.push_back(dependent);
            }
        }
    }

    if ordered.len() != analyzers.len() {
        log::warn!("analyzer dependency cycle detected; falling back to unsorted order");
        return analyzers.to_vec();
    }
    ordered
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyze::AnalysisContext;
    use crate::errors::EngineResult;
    use crate::types::{AnalysisResult, Timeline};
    use std::collections::HashSet;

    struct Stub {
        name: &'static str,
        depends_on: Vec<&'static str>,
    }

    impl Analyzer for Stub {
        fn name(&self) -> &'static str {
            self.name
        }

        fn depends_on(&self) -> Vec<&'static str> {
            self.depends_on.clone()
        }

        fn analyze(
            &self,
            _timeline: &Timeline,
            _ctx: &AnalysisContext<'_>,
        ) -> EngineResult<AnalysisResult> {
            Ok(AnalysisResult::empty())
        }
    }

    fn make_set(specs: &[(&'static str, &[&'static str])]) -> Vec<Arc<dyn Analyzer>> {
        specs
            .iter()
            .map(|(name, deps)| {
                Arc::new(Stub {
                    name,
                    depends_on: deps.to_vec(),
                }) as Arc<dyn Analyzer>
            })
            .collect()
    }

    fn names(analyzers: &[Arc<dyn Analyzer>]) -> Vec<&str> {
        analyzers.iter().map(|a| a.name()).collect()
    }

    #[test]
    fn dependency_runs_first() {
        let set = make_set(&[("b", &["a"]), ("a", &[])]);
        assert_eq!(names(&sort_by_dependencies(&set)), vec!["a", "b"]);
    }

    #[test]
    fn output_is_a_permutation_of_input() {
        let set = make_set(&[
            ("d", &["b", "c"]),
            ("b", &["a"]),
            ("c", &["a"]),
            ("a", &[]),
            ("lone", &[]),
        ]);
        let ordered = sort_by_dependencies(&set);
        assert_eq!(ordered.len(), set.len());
        let expected: HashSet<&str> = names(&set).into_iter().collect();
        let actual: HashSet<&str> = names(&ordered).into_iter().collect();
        assert_eq!(actual, expected);

        let position: Vec<&str> = names(&ordered);
        let index_of = |n: &str| position.iter().position(|x| *x == n).unwrap();
        assert!(index_of("a") < index_of("b"));
        assert!(index_of("a") < index_of("c"));
        assert!(index_of("b") < index_of("d"));
        assert!(index_of("c") < index_of("d"));
    }

    #[test]
    fn absent_dependencies_are_ignored() {
        let set = make_set(&[("x", &["not_selected"])]);
        assert_eq!(names(&sort_by_dependencies(&set)), vec!["x"]);
    }

    #[test]
    fn cycle_falls_back_to_original_order() {
        let set = make_set(&[("a", &["b"]), ("b", &["a"]), ("c", &[])]);
        assert_eq!(names(&sort_by_dependencies(&set)), vec!["a", "b", "c"]);
    }
}
