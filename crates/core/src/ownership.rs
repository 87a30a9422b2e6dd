//! Ownership guard (C10): the permission check every entry point consults
//! before reading, writing, executing, or debugging a workflow-owned
//! resource (workflow, its versions, its schedules, its webhooks, its debug
//! sessions).
//!
//! Legacy resources with `owner_id = None` are treated as shared — anyone
//! may read/execute them, matching the backward-compatibility note in the
//! data model. Negative decisions on read/debug return the same shape as
//! "not found" so a caller cannot distinguish "doesn't exist" from "exists
//! but isn't yours" (enumeration resistance); create/modify paths get a
//! distinct access-denied decision since the resource is already named by
//! the caller.

use crate::id::UserId;

/// The operation being attempted against a workflow-owned resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    /// Read the resource's definition or state.
    Read,
    /// Create or mutate the resource.
    Write,
    /// Trigger execution of the resource.
    Execute,
    /// Attach a debug session to the resource.
    Debug,
}

/// The caller's role. `Admin` bypasses ownership for every operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Role {
    /// An ordinary user, scoped to resources they own.
    #[default]
    Member,
    /// A privileged role that may act on any resource.
    Admin,
}

/// The outcome of an ownership check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// The caller may proceed.
    Permit,
    /// Deny shaped as "not found" — used for `Read`/`Debug` so a denial is
    /// indistinguishable from a missing resource.
    DenyNotFound,
    /// Deny shaped as "access denied" — used for `Write`/`Execute`, where
    /// the resource is already named by the caller so there is nothing to
    /// hide.
    DenyAccessDenied,
}

impl Decision {
    /// `true` if the caller may proceed.
    #[must_use]
    pub fn is_permitted(self) -> bool {
        matches!(self, Self::Permit)
    }
}

/// Decide whether `caller` may perform `operation` on a resource owned by
/// `owner` (`None` meaning a legacy, shared resource).
#[must_use]
pub fn check(caller: UserId, role: Role, owner: Option<UserId>, operation: Operation) -> Decision {
    if role == Role::Admin {
        return Decision::Permit;
    }
    match owner {
        None => Decision::Permit,
        Some(owner_id) if owner_id == caller => Decision::Permit,
        Some(_) => match operation {
            Operation::Read | Operation::Debug => Decision::DenyNotFound,
            Operation::Write | Operation::Execute => Decision::DenyAccessDenied,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn owner_may_do_anything() {
        let owner = UserId::v4();
        for op in [Operation::Read, Operation::Write, Operation::Execute, Operation::Debug] {
            assert_eq!(check(owner, Role::Member, Some(owner), op), Decision::Permit);
        }
    }

    #[test]
    fn admin_bypasses_ownership() {
        let admin = UserId::v4();
        let owner = UserId::v4();
        assert_eq!(
            check(admin, Role::Admin, Some(owner), Operation::Write),
            Decision::Permit
        );
    }

    #[test]
    fn legacy_resource_is_shared() {
        let caller = UserId::v4();
        assert_eq!(check(caller, Role::Member, None, Operation::Execute), Decision::Permit);
    }

    #[test]
    fn stranger_read_denied_as_not_found() {
        let caller = UserId::v4();
        let owner = UserId::v4();
        assert_eq!(
            check(caller, Role::Member, Some(owner), Operation::Read),
            Decision::DenyNotFound
        );
        assert_eq!(
            check(caller, Role::Member, Some(owner), Operation::Debug),
            Decision::DenyNotFound
        );
    }

    #[test]
    fn stranger_write_denied_as_access_denied() {
        let caller = UserId::v4();
        let owner = UserId::v4();
        assert_eq!(
            check(caller, Role::Member, Some(owner), Operation::Write),
            Decision::DenyAccessDenied
        );
        assert_eq!(
            check(caller, Role::Member, Some(owner), Operation::Execute),
            Decision::DenyAccessDenied
        );
    }
}
