use indexmap::IndexSet;

use crate::solver::ProblemSet;

/// Names implicated by a conflict: the first package of every requirement
/// chain in every problem, deduplicated in encounter order.
pub fn root_causes(problems: &ProblemSet) -> IndexSet<String> {
    problems
        .problems()
        .flat_map(|problem| problem.trees.iter())
        .filter_map(|tree| tree.first_name())
        .map(str::to_string)
        .collect()
}
