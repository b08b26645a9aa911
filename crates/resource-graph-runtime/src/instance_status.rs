//! The instance-status evaluator (§4.5). The instance's own variables represent status
//! fields written back onto the instance body as information becomes available.

use crate::resolver::PathResolver;
use crate::resource::SharedBody;
use crate::variable::RuntimeVariable;

/// For each instance variable, writes its resolved value onto `instance_body` at the
/// variable's field path via a blind set, if the variable's first (and, per the decision in
/// DESIGN.md, only meaningful) cell is resolved. Unresolved instance variables are silently
/// skipped — instance status is best-effort, never a reason to fail `Synchronize`.
pub fn evaluate_instance_statuses(
    instance_body: &SharedBody,
    instance_variables: &[RuntimeVariable],
    resolver: &dyn PathResolver,
) {
    let mut body = instance_body.borrow_mut();

    for variable in instance_variables {
        let Some(cell) = variable.cells.first() else {
            continue;
        };
        let cell = cell.borrow();
        let Some(value) = cell.value() else {
            continue;
        };

        resolver.blind_set_value_at_path(&mut body, &variable.field_path, value.clone());
    }
}
