//! Function values
//!
//! A [`Func`] is a callable handle: either a verified module function
//! (holding its instance alive, like the teacher's loaded-module
//! handles) or a host callback. Host callbacks bypass verification and
//! are therefore capped at untrusted when defined.

use std::fmt;
use std::sync::Arc;

use module::FuncType;
use verifier::trust;

use crate::error::{LinkError, Trap};
use crate::execute;
use crate::instance::InstanceInner;
use crate::value::Value;

pub(crate) type HostClosure = dyn Fn(&[Value]) -> Result<Vec<Value>, Trap> + Send + Sync;

/// A callable function value with its full declared contract.
#[derive(Clone)]
pub struct Func {
    ty: FuncType,
    kind: FuncKind,
}

#[derive(Clone)]
pub(crate) enum FuncKind {
    /// An opaque host callback.
    Host(Arc<HostClosure>),
    /// A function of a verified, linked instance. The `Arc` keeps the
    /// provider instance alive for as long as the handle exists.
    Module {
        instance: Arc<InstanceInner>,
        index: u32,
    },
}

impl fmt::Debug for Func {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Func")
            .field("ty", &self.ty)
            .field("host", &self.is_host())
            .finish_non_exhaustive()
    }
}

impl Func {
    /// Wrap a host callback with its declared signature.
    ///
    /// Trust can only be established by code that passed verification;
    /// a signature claiming trusted status is rejected here, before
    /// the callback can be offered to any linker.
    pub fn wrap_host<F>(ty: FuncType, f: F) -> Result<Self, LinkError>
    where
        F: Fn(&[Value]) -> Result<Vec<Value>, Trap> + Send + Sync + 'static,
    {
        if !trust::host_may_claim(ty.trust) {
            return Err(LinkError::HostTrust);
        }
        Ok(Self {
            ty,
            kind: FuncKind::Host(Arc::new(f)),
        })
    }

    pub(crate) fn from_instance(instance: Arc<InstanceInner>, index: u32, ty: FuncType) -> Self {
        Self {
            ty,
            kind: FuncKind::Module { instance, index },
        }
    }

    pub fn ty(&self) -> &FuncType {
        &self.ty
    }

    pub(crate) fn is_host(&self) -> bool {
        matches!(self.kind, FuncKind::Host(_))
    }

    /// Call from the host. Arguments are checked by numeric kind only:
    /// secrecy is a static property and is erased at the host boundary.
    pub fn call(&self, args: &[Value]) -> Result<Vec<Value>, Trap> {
        if args.len() != self.ty.params.len() {
            return Err(Trap::ArgumentCount {
                expected: self.ty.params.len(),
                found: args.len(),
            });
        }
        for (index, (arg, param)) in args.iter().zip(&self.ty.params).enumerate() {
            if arg.kind() != param.kind {
                return Err(Trap::ArgumentKind {
                    index,
                    expected: param.kind,
                    found: arg.kind(),
                });
            }
        }
        self.call_unchecked(args.to_vec(), 0)
    }

    /// Dispatch without argument re-checking; callers are either
    /// [`Func::call`] (which checked) or verified module code.
    pub(crate) fn call_unchecked(&self, args: Vec<Value>, depth: usize) -> Result<Vec<Value>, Trap> {
        match &self.kind {
            FuncKind::Host(f) => {
                let results = f(&args)?;
                // The host is not verified; hold its results to the
                // declared contract before verified code consumes them.
                if results.len() != self.ty.results.len() {
                    return Err(Trap::HostResultCount {
                        expected: self.ty.results.len(),
                        found: results.len(),
                    });
                }
                for (index, (value, result)) in results.iter().zip(&self.ty.results).enumerate() {
                    if value.kind() != result.kind {
                        return Err(Trap::HostResultKind {
                            index,
                            expected: result.kind,
                            found: value.kind(),
                        });
                    }
                }
                Ok(results)
            }
            FuncKind::Module { instance, index } => execute::invoke(instance, *index, args, depth),
        }
    }
}
