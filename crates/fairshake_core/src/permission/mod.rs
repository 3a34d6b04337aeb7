//! Permission evaluator for catalog and assessment resources.
//!
//! # Responsibility
//! - Decide collection-level access from method safety and authentication.
//! - Decide object-level access from method safety and ownership.
//!
//! # Invariants
//! - Evaluation is a pure predicate; the only side effect is debug logging
//!   of denials.
//! - An anonymous actor never satisfies an ownership check.
//! - An empty `authors` set denies every ownership-gated action.
//!
//! Assessment and assessment-request rules exist in two forms, selected with
//! [`RuleSet`]. `Legacy` keeps the historic conditions (which let any actor
//! `modify`/`delete` an assessment and let non-owners run unsafe
//! non-mutating actions on a request). `OwnerGated` applies the base rule
//! with the assessor/requestor in place of the authors set.

use log::debug;
use serde::Deserialize;

use crate::model::assessment::{Assessment, AssessmentRequest};
use crate::model::author::AuthorId;
use crate::model::catalog::Identifiable;

mod request;

pub use request::{AccessRequest, Action, Method};

/// Which form of the assessment-specific rules to apply.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleSet {
    /// Base rule with the designated assessor/requestor as sole owner.
    #[default]
    OwnerGated,
    /// Historic conditions, kept selectable until product owners confirm intent.
    Legacy,
}

/// Stable reason attached to every decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecisionReason {
    SafeMethod,
    UnsafeMethod,
    Authenticated,
    Unauthenticated,
    PlainRead,
    Owner,
    NotOwner,
    LegacyBypass,
}

impl DecisionReason {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::SafeMethod => "safe_method",
            Self::UnsafeMethod => "unsafe_method",
            Self::Authenticated => "authenticated",
            Self::Unauthenticated => "unauthenticated",
            Self::PlainRead => "plain_read",
            Self::Owner => "owner",
            Self::NotOwner => "not_owner",
            Self::LegacyBypass => "legacy_bypass",
        }
    }
}

/// Allow/deny outcome of one permission check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Decision {
    pub allow: bool,
    pub reason: DecisionReason,
}

impl Decision {
    fn allow(reason: DecisionReason) -> Self {
        Self {
            allow: true,
            reason,
        }
    }

    fn deny(reason: DecisionReason) -> Self {
        Self {
            allow: false,
            reason,
        }
    }

    fn owner(is_owner: bool) -> Self {
        if is_owner {
            Self::allow(DecisionReason::Owner)
        } else {
            Self::deny(DecisionReason::NotOwner)
        }
    }

    pub fn is_allowed(self) -> bool {
        self.allow
    }
}

/// Permission contract for one resource type.
pub trait ResourcePermission<T: ?Sized> {
    /// Collection-level check, shared by every resource type.
    fn has_permission(&self, request: &AccessRequest) -> Decision {
        self::has_permission(request)
    }

    /// Object-level check against one target.
    fn has_object_permission(&self, request: &AccessRequest, object: &T) -> Decision;
}

/// Collection-level check: `add` needs an authenticated actor, every other
/// action needs a safe method.
pub fn has_permission(request: &AccessRequest) -> Decision {
    let decision = if request.action == Action::Add {
        if request.actor.is_authenticated() {
            Decision::allow(DecisionReason::Authenticated)
        } else {
            Decision::deny(DecisionReason::Unauthenticated)
        }
    } else if request.method.is_safe() {
        Decision::allow(DecisionReason::SafeMethod)
    } else {
        Decision::deny(DecisionReason::UnsafeMethod)
    };
    log_denial("collection", request, decision);
    decision
}

/// Base rule for any resource carrying an authors set.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentifiablePermissions;

impl<T: Identifiable + ?Sized> ResourcePermission<T> for IdentifiablePermissions {
    fn has_object_permission(&self, request: &AccessRequest, object: &T) -> Decision {
        let decision = if request.is_plain_read() {
            Decision::allow(DecisionReason::PlainRead)
        } else {
            Decision::owner(
                request
                    .actor
                    .author_id()
                    .is_some_and(|id| object.is_authored_by(id)),
            )
        };
        log_denial("identifiable", request, decision);
        decision
    }
}

/// Rule for assessments, gated on the assessor.
#[derive(Debug, Clone, Copy, Default)]
pub struct AssessmentPermissions {
    pub rules: RuleSet,
}

impl AssessmentPermissions {
    pub fn new(rules: RuleSet) -> Self {
        Self { rules }
    }
}

impl ResourcePermission<Assessment> for AssessmentPermissions {
    fn has_object_permission(&self, request: &AccessRequest, object: &Assessment) -> Decision {
        let decision = match self.rules {
            RuleSet::OwnerGated => owner_gated(request, object.assessor),
            RuleSet::Legacy => {
                if request.method.is_safe() {
                    Decision::allow(DecisionReason::SafeMethod)
                } else if request.action.is_mutation() {
                    Decision::allow(DecisionReason::LegacyBypass)
                } else {
                    Decision::owner(request.actor.is(object.assessor))
                }
            }
        };
        log_denial("assessment", request, decision);
        decision
    }
}

/// Rule for assessment requests, gated on the requestor.
#[derive(Debug, Clone, Copy, Default)]
pub struct AssessmentRequestPermissions {
    pub rules: RuleSet,
}

impl AssessmentRequestPermissions {
    pub fn new(rules: RuleSet) -> Self {
        Self { rules }
    }
}

impl ResourcePermission<AssessmentRequest> for AssessmentRequestPermissions {
    fn has_object_permission(
        &self,
        request: &AccessRequest,
        object: &AssessmentRequest,
    ) -> Decision {
        let decision = match self.rules {
            RuleSet::OwnerGated => owner_gated(request, object.requestor),
            RuleSet::Legacy => {
                if request.method.is_safe() {
                    Decision::allow(DecisionReason::SafeMethod)
                } else if !request.action.is_mutation() {
                    Decision::allow(DecisionReason::LegacyBypass)
                } else {
                    Decision::owner(request.actor.is(object.requestor))
                }
            }
        };
        log_denial("assessment_request", request, decision);
        decision
    }
}

/// Runs the collection check, then the object check when a target is given.
pub fn authorize<T, P>(permission: &P, request: &AccessRequest, object: Option<&T>) -> Decision
where
    T: ?Sized,
    P: ResourcePermission<T>,
{
    let collection = permission.has_permission(request);
    if !collection.allow {
        return collection;
    }
    match object {
        Some(object) => permission.has_object_permission(request, object),
        None => collection,
    }
}

fn owner_gated(request: &AccessRequest, owner: AuthorId) -> Decision {
    if request.is_plain_read() {
        return Decision::allow(DecisionReason::PlainRead);
    }
    Decision::owner(request.actor.is(owner))
}

fn log_denial(rule: &str, request: &AccessRequest, decision: Decision) {
    if !decision.allow {
        debug!(
            "event=permission_denied module=permission rule={} method={} action={} authenticated={} reason={}",
            rule,
            request.method.as_str(),
            request.action.as_str(),
            request.actor.is_authenticated(),
            decision.reason.as_str()
        );
    }
}
