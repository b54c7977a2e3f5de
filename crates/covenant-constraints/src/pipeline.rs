//! Two-phase constraint enforcement
//!
//! `with_constraints` wraps an operation body:
//!
//! 1. every pre entry is checked in collection order; the first rejection
//!    aborts before the body runs
//! 2. the body runs
//! 3. every post entry is checked in collection order; the first rejection
//!    aborts the call
//!
//! The pipeline does not undo the body itself. Callers run it inside a
//! transaction that discards the body's effects when an error comes back.
//!
//! Each phase iterates over a snapshot of its collection taken when the phase
//! starts, so the loop bound is fixed even if the body re-enters the registry.

use crate::constraint::{ConstraintCall, ConstraintDirectory, ConstraintVerdict};
use crate::registry::{ConstraintEntry, ConstraintRegistry};
use covenant_core::{Address, CovenantError, CovenantResult, Invocation, Phase};
use tracing::{trace, warn};

/// State that owns a constraint registry and can resolve constraint modules
pub trait ConstraintHost {
    /// Registry consulted by the pipeline
    fn constraint_registry(&self) -> &ConstraintRegistry;

    /// Directory used to resolve registered addresses
    fn constraint_directory(&self) -> &ConstraintDirectory;
}

/// Check every entry of `entries` for `phase`, stopping at the first rejection
///
/// Returns the number of checks that passed.
pub fn check_entries(
    directory: &ConstraintDirectory,
    entries: &[ConstraintEntry],
    phase: Phase,
    sender: Address,
    invocation: &Invocation,
) -> CovenantResult<usize> {
    for entry in entries {
        let call = ConstraintCall {
            sender,
            params: entry.params,
            invocation,
        };
        let verdict = match directory.resolve(&entry.constraint) {
            Some(module) => match phase {
                Phase::Pre => module.pre(&call),
                Phase::Post => module.post(&call),
            },
            None => ConstraintVerdict::reject("no constraint module deployed at address"),
        };

        trace!(
            constraint = %entry.constraint,
            %phase,
            method = invocation.tag(),
            allowed = verdict.is_allowed(),
            "constraint checked"
        );

        if let ConstraintVerdict::Reject { reason } = verdict {
            warn!(
                constraint = %entry.constraint,
                %phase,
                method = invocation.tag(),
                %sender,
                reason = %reason,
                "constraint rejected operation"
            );
            return Err(CovenantError::constraint_rejected(
                entry.constraint,
                phase.as_str(),
                invocation.tag(),
                reason,
            ));
        }
    }
    Ok(entries.len())
}

/// Run `body` between the pre and post constraint checks
pub fn with_constraints<H, O, F>(
    host: &mut H,
    sender: Address,
    invocation: &Invocation,
    body: F,
) -> CovenantResult<O>
where
    H: ConstraintHost,
    F: FnOnce(&mut H) -> CovenantResult<O>,
{
    let pre = host.constraint_registry().collection(Phase::Pre).snapshot();
    check_entries(
        host.constraint_directory(),
        &pre,
        Phase::Pre,
        sender,
        invocation,
    )?;

    let output = body(host)?;

    let post = host
        .constraint_registry()
        .collection(Phase::Post)
        .snapshot();
    check_entries(
        host.constraint_directory(),
        &post,
        Phase::Post,
        sender,
        invocation,
    )?;

    Ok(output)
}
