//! Evaluation order of a variable set.
use crate::error::EvaluationError;
use crate::variable::VariableSet;
use std::collections::HashSet;
use tracing::trace;
use xformula_model::QName;

/// Orders variables so every variable follows the variables it depends on.
///
/// Declaration order breaks ties, and dependencies on names outside the set
/// (parameters of other rules, instance-level names) are ignored. Each pass
/// schedules every variable whose dependencies are already scheduled; a pass
/// that schedules nothing means the remaining variables form a cycle.
pub fn plan_order(set: &VariableSet) -> Result<Vec<QName>, EvaluationError> {
    let known: HashSet<&QName> = set.iter().map(|v| &v.name).collect();
    let mut scheduled: HashSet<&QName> = HashSet::with_capacity(set.len());
    let mut order = Vec::with_capacity(set.len());
    let mut pending: Vec<_> = set.iter().collect();
    let mut deferred = Vec::new();

    while !pending.is_empty() {
        let mut progress = false;
        for variable in pending.drain(..) {
            let ready = variable
                .depends_on
                .iter()
                .filter(|d| known.contains(d))
                .all(|d| scheduled.contains(d) && d != &variable.name);
            if ready {
                scheduled.insert(&variable.name);
                order.push(variable.name.clone());
                progress = true;
            } else {
                deferred.push(variable);
            }
        }
        std::mem::swap(&mut pending, &mut deferred);
        if !progress {
            let blocked = pending.first().map(|v| v.name.clone());
            return Err(EvaluationError::CyclicDependency(blocked.unwrap_or_else(|| set.name.clone())));
        }
    }
    trace!(rule = %set.name, order = ?order, "planned variable order");
    Ok(order)
}
