//! Access control over key objects
//!
//! Each key object carries an [`AccessRule`] fixed at provisioning time. An
//! [`AccessEvaluator`] turns (object, permission) into a [`Verdict`]; a denial
//! carries a [`DenialReason`] that maps one to one onto the status word the
//! caller sees.

use std::fmt;

use cardcrypt_apdu::StatusWord;
use cardcrypt_apdu::prelude::status;
use derive_more::Display;

use crate::key_store::{KeyObject, ObjectKind};

/// Operation requested on an object
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq)]
pub enum Permission {
    /// Use the object in a cryptographic operation
    #[display("EXECUTE")]
    Execute,
}

/// Condition under which a permission is granted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Condition {
    /// Granted without further checks
    #[default]
    Always,
    /// Never granted
    Never,
}

/// Access rule attached to a key object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AccessRule {
    /// Condition for [`Permission::Execute`]; `None` when the object has no execute rule
    pub execute: Option<Condition>,
}

impl AccessRule {
    /// Rule granting EXECUTE under the given condition
    pub const fn execute(condition: Condition) -> Self {
        Self {
            execute: Some(condition),
        }
    }

    /// Rule without any execute condition
    pub const fn none() -> Self {
        Self { execute: None }
    }

    /// Condition attached to a permission
    pub const fn condition(&self, permission: Permission) -> Option<Condition> {
        match permission {
            Permission::Execute => self.execute,
        }
    }
}

/// Why an evaluator refused a permission
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq)]
pub enum DenialReason {
    /// The rule forbids the operation
    #[display("security status not satisfied")]
    SecurityStatusNotSatisfied,
    /// The object carries no rule for the permission
    #[display("conditions of use not satisfied")]
    ConditionsNotSatisfied,
    /// The permission has no meaning for this kind of object
    #[display("command incompatible with object")]
    CommandIncompatible,
}

impl DenialReason {
    /// Status word reported for this reason
    pub const fn status(&self) -> StatusWord {
        match self {
            Self::SecurityStatusNotSatisfied => status::SECURITY_STATUS_NOT_SATISFIED,
            Self::ConditionsNotSatisfied => status::CONDITIONS_NOT_SATISFIED,
            Self::CommandIncompatible => status::COMMAND_INCOMPATIBLE,
        }
    }
}

/// Authorization decision
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// Permission granted
    Cleared,
    /// Permission refused
    Denied(DenialReason),
}

impl Verdict {
    /// Convert into a result, with the denial as an applet error
    pub fn into_result(self) -> crate::Result<()> {
        match self {
            Self::Cleared => Ok(()),
            Self::Denied(reason) => Err(crate::Error::AccessDenied(reason)),
        }
    }
}

/// Decides whether a permission is granted on a selected object
pub trait AccessEvaluator: Send + fmt::Debug {
    /// Evaluate `permission` on `object`
    fn check(&self, object: &KeyObject, permission: Permission) -> Verdict;
}

/// Evaluator that enforces the rule stored on each object
#[derive(Debug, Clone, Copy, Default)]
pub struct RuleEvaluator;

impl AccessEvaluator for RuleEvaluator {
    fn check(&self, object: &KeyObject, permission: Permission) -> Verdict {
        if permission == Permission::Execute && object.kind() != ObjectKind::PrivateKey {
            return Verdict::Denied(DenialReason::CommandIncompatible);
        }

        match object.rule().condition(permission) {
            Some(Condition::Always) => Verdict::Cleared,
            Some(Condition::Never) => Verdict::Denied(DenialReason::SecurityStatusNotSatisfied),
            None => Verdict::Denied(DenialReason::ConditionsNotSatisfied),
        }
    }
}
