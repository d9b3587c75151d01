//! Guard driver for sites protected by one or more resources.
//!
//! Every key is evaluated against the same argument snapshot before anything
//! is acquired. Resources are then acquired in declaration order, the call is
//! invoked, and whatever was acquired is released in reverse order exactly
//! once, also when acquisition fails part-way or the call panics.
//!
//! ```text
//! Idle -> KeysEvaluated -> Acquiring(0) -> .. -> Acquiring(n-1) -> Invoking
//!      -> Releasing(n-1) -> .. -> Releasing(0) -> Done
//! ```
//!
//! A failure at `Acquiring(i)` goes straight to `Releasing(i-1)` and the
//! acquisition error is what the caller sees. Release failures are logged.

use std::fmt;
use std::time::Instant;

use keyforge_core_types::{InvocationId, SiteLabel};
use thiserror::Error;

use crate::errors::{KeyForgeError, KfError};
use crate::evaluator::CompiledEvaluator;
use crate::meta::MethodSignature;
use crate::resource::{Resource, ResourceError};
use crate::value::Value;
use crate::{log_op_end, log_op_error, log_op_start};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardPhase {
    Idle,
    KeysEvaluated,
    Acquiring(usize),
    Invoking,
    Releasing(usize),
    Done,
}

impl fmt::Display for GuardPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GuardPhase::Idle => f.write_str("IDLE"),
            GuardPhase::KeysEvaluated => f.write_str("KEYS_EVALUATED"),
            GuardPhase::Acquiring(i) => write!(f, "ACQUIRING({})", i),
            GuardPhase::Invoking => f.write_str("INVOKING"),
            GuardPhase::Releasing(i) => write!(f, "RELEASING({})", i),
            GuardPhase::Done => f.write_str("DONE"),
        }
    }
}

/// Failure of a guarded run
#[derive(Error, Debug)]
pub enum GuardError<E> {
    /// Key evaluation or evaluator configuration failed; nothing was acquired
    #[error(transparent)]
    Engine(#[from] KfError),

    /// Resource `index` could not be built or acquired
    #[error("acquire of resource {index} ({key}) failed: {source}")]
    Acquire {
        index: usize,
        key: String,
        #[source]
        source: ResourceError,
    },

    /// The guarded call itself failed
    #[error("guarded call failed: {0}")]
    Call(E),
}

impl<E> GuardError<E> {
    /// The wrapped call error, if that is what failed
    pub fn into_call(self) -> Option<E> {
        match self {
            GuardError::Call(e) => Some(e),
            _ => None,
        }
    }
}

struct PhaseTracker<'a> {
    invocation: &'a InvocationId,
    site: &'a SiteLabel,
    phase: GuardPhase,
}

impl PhaseTracker<'_> {
    fn enter(&mut self, next: GuardPhase) {
        tracing::debug!(
            invocation_id = %self.invocation,
            site = %self.site,
            from = %self.phase,
            phase = %next,
            "guard phase"
        );
        self.phase = next;
    }
}

/// Acquired resources; released in reverse on [`Held::release_all`] or drop
struct Held<'a> {
    resources: Vec<(usize, Box<dyn Resource>)>,
    tracker: PhaseTracker<'a>,
}

impl Held<'_> {
    fn release_all(&mut self) {
        while let Some((index, mut resource)) = self.resources.pop() {
            self.tracker.enter(GuardPhase::Releasing(index));
            if let Err(e) = resource.release() {
                let err: KfError = KeyForgeError::ResourceRelease {
                    key: resource.key().to_string(),
                    reason: e.to_string(),
                }
                .into();
                tracing::warn!(
                    op = "guard",
                    invocation_id = %self.tracker.invocation,
                    site = %self.tracker.site,
                    resource_index = index,
                    err_code = err.code(),
                    "{}",
                    err.message()
                );
            }
        }
    }
}

impl Drop for Held<'_> {
    fn drop(&mut self) {
        self.release_all();
    }
}

/// Run `call` guarded by the resources of `evaluator`.
///
/// Works for aggregate evaluators (one resource per member) and for single
/// evaluators alike. Members marked `skip_blank_key` whose key evaluates blank
/// are left out.
///
/// # Errors
///
/// - `GuardError::Engine` when a member has no resource builder or a key
///   cannot be evaluated; nothing has been acquired
/// - `GuardError::Acquire` when building or acquiring a resource fails;
///   everything acquired before it has been released
/// - `GuardError::Call` when `call` fails; every resource has been released
pub fn run<T, E, F>(
    evaluator: &CompiledEvaluator,
    method: &MethodSignature,
    args: &[Value],
    target: Option<&Value>,
    call: F,
) -> Result<T, GuardError<E>>
where
    F: FnOnce() -> Result<T, E>,
{
    let started = Instant::now();
    let invocation = InvocationId::new();
    let site = evaluator.site().clone();
    let members = evaluator.members();
    log_op_start!(
        "guard",
        invocation_id = %invocation,
        site = %site,
        resource_count = members.len() as u64
    );

    let keys = match prepare(evaluator, &members, method, args, target) {
        Ok(keys) => keys,
        Err(err) => {
            log_op_error!(
                "guard",
                err.clone(),
                duration_ms = started.elapsed().as_millis() as u64,
                invocation_id = %invocation,
                site = %site,
            );
            return Err(GuardError::Engine(err));
        }
    };

    let mut held = Held {
        resources: Vec::with_capacity(members.len()),
        tracker: PhaseTracker {
            invocation: &invocation,
            site: &site,
            phase: GuardPhase::Idle,
        },
    };
    held.tracker.enter(GuardPhase::KeysEvaluated);

    for (index, (member, key)) in members.iter().zip(keys).enumerate() {
        if member.skip_blank_key() && key.trim().is_empty() {
            tracing::debug!(
                invocation_id = %invocation,
                resource_index = index,
                "blank key, resource skipped"
            );
            continue;
        }
        held.tracker.enter(GuardPhase::Acquiring(index));
        match acquire(member, &key) {
            Ok(resource) => held.resources.push((index, resource)),
            Err(source) => {
                let logged: KfError = KeyForgeError::ResourceAcquire {
                    index,
                    key: key.clone(),
                    reason: source.to_string(),
                }
                .into();
                held.release_all();
                held.tracker.enter(GuardPhase::Done);
                log_op_error!(
                    "guard",
                    logged,
                    duration_ms = started.elapsed().as_millis() as u64,
                    invocation_id = %invocation,
                    site = %site,
                    resource_index = index,
                );
                return Err(GuardError::Acquire { index, key, source });
            }
        }
    }

    held.tracker.enter(GuardPhase::Invoking);
    let outcome = call();
    held.release_all();
    held.tracker.enter(GuardPhase::Done);

    log_op_end!(
        "guard",
        duration_ms = started.elapsed().as_millis() as u64,
        invocation_id = %invocation,
        site = %site,
        call_failed = outcome.is_err(),
    );
    outcome.map_err(GuardError::Call)
}

/// Check builders and evaluate every key before anything is acquired
fn prepare(
    evaluator: &CompiledEvaluator,
    members: &[&CompiledEvaluator],
    method: &MethodSignature,
    args: &[Value],
    target: Option<&Value>,
) -> Result<Vec<String>, KfError> {
    if let Some(member) = members.iter().find(|m| !m.has_builder()) {
        return Err(KfError::from(KeyForgeError::MissingBuilder {
            site: member.site().to_string(),
        })
        .with_op("guard")
        .with_site(member.site().clone())
        .with_template(member.template()));
    }
    evaluator.evaluate_all(method, args, target)
}

fn acquire(member: &CompiledEvaluator, key: &str) -> Result<Box<dyn Resource>, ResourceError> {
    let mut resource = match member.builder() {
        Some(build) => build(key)?,
        None => {
            return Err(KfError::from(KeyForgeError::MissingBuilder {
                site: member.site().to_string(),
            })
            .into())
        }
    };
    resource.acquire()?;
    Ok(resource)
}
