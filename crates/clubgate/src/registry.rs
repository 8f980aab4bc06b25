//! Method registry: operation names to typed collaborator calls.
//!
//! Every operation a client may call is registered here by name, with its
//! argument types spelled out as a tuple. A name that isn't registered is
//! simply not found; there is no fallback lookup on the collaborator.
//!
//! ```rust
//! use clubgate::{CallError, Collaborator, Credentials, Headers, MethodRegistry};
//!
//! struct Club { headers: Headers }
//!
//! impl Collaborator for Club {
//!     fn with_credentials(credentials: &Credentials) -> Self {
//!         Club { headers: Headers::from_credentials(credentials) }
//!     }
//!     fn headers(&self) -> &Headers { &self.headers }
//! }
//!
//! impl Club {
//!     fn shout(&self, text: &str, times: Option<usize>) -> Result<String, CallError> {
//!         Ok(text.to_uppercase().repeat(times.unwrap_or(1)))
//!     }
//! }
//!
//! let mut registry = MethodRegistry::<Club>::new();
//! registry.register("shout", |club: &Club, (text, times): (String, Option<usize>)| {
//!     club.shout(&text, times)
//! });
//! assert!(registry.has_method("shout"));
//! ```

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use clubgate_session::{CallError, Collaborator};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

// ---------------------------------------------------------------------------
// Positional argument binding
// ---------------------------------------------------------------------------

/// Converts positional JSON params into typed arguments.
///
/// Implemented for tuples of up to six elements. Missing trailing params
/// are read as `null`, so trailing `Option<T>` arguments are optional.
/// Extra params are always an error.
pub trait FromParams: Sized {
    /// Binds `params` to `Self`.
    ///
    /// # Errors
    /// [`CallError::BadArguments`] on too many params, a missing required
    /// param, or a param of the wrong type.
    fn from_params(params: Vec<Value>) -> Result<Self, CallError>;
}

fn check_arity(given: usize, accepted: usize) -> Result<(), CallError> {
    if given > accepted {
        return Err(CallError::BadArguments(format!(
            "expected at most {accepted} arguments but {given} were given"
        )));
    }
    Ok(())
}

fn bind<T: DeserializeOwned>(
    value: Option<Value>,
    position: usize,
) -> Result<T, CallError> {
    let supplied = value.is_some();
    serde_json::from_value(value.unwrap_or(Value::Null)).map_err(|e| {
        if supplied {
            CallError::BadArguments(format!("argument {position}: {e}"))
        } else {
            CallError::BadArguments(format!(
                "missing required argument {position}"
            ))
        }
    })
}

macro_rules! impl_from_params {
    ($count:expr; $($name:ident => $position:expr),*) => {
        impl<$($name: DeserializeOwned),*> FromParams for ($($name,)*) {
            #[allow(unused_mut, unused_variables)]
            fn from_params(params: Vec<Value>) -> Result<Self, CallError> {
                check_arity(params.len(), $count)?;
                let mut params = params.into_iter();
                Ok(($(bind::<$name>(params.next(), $position)?,)*))
            }
        }
    };
}

impl_from_params!(0;);
impl_from_params!(1; T1 => 1);
impl_from_params!(2; T1 => 1, T2 => 2);
impl_from_params!(3; T1 => 1, T2 => 2, T3 => 3);
impl_from_params!(4; T1 => 1, T2 => 2, T3 => 3, T4 => 4);
impl_from_params!(5; T1 => 1, T2 => 2, T3 => 3, T4 => 4, T5 => 5);
impl_from_params!(6; T1 => 1, T2 => 2, T3 => 3, T4 => 4, T5 => 5, T6 => 6);

// ---------------------------------------------------------------------------
// Operation
// ---------------------------------------------------------------------------

type OperationFn<C> =
    dyn Fn(&C, Vec<Value>) -> Result<Value, CallError> + Send + Sync;

/// A registered operation, type-erased to "collaborator + JSON params in,
/// JSON value out".
///
/// Cloning is cheap; the call is shared.
pub struct Operation<C> {
    call: Arc<OperationFn<C>>,
}

impl<C> Operation<C> {
    /// Runs the operation. This blocks for as long as the collaborator
    /// talks to the remote service.
    pub fn call(
        &self,
        collaborator: &C,
        params: Vec<Value>,
    ) -> Result<Value, CallError> {
        (self.call)(collaborator, params)
    }
}

impl<C> Clone for Operation<C> {
    fn clone(&self) -> Self {
        Self {
            call: Arc::clone(&self.call),
        }
    }
}

impl<C> fmt::Debug for Operation<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Operation(..)")
    }
}

// ---------------------------------------------------------------------------
// MethodRegistry
// ---------------------------------------------------------------------------

/// Registry mapping method names to operations on a collaborator `C`.
///
/// `authenticate` is handled by the dispatcher before the registry is
/// consulted, so registering that name has no effect.
pub struct MethodRegistry<C> {
    operations: HashMap<String, Operation<C>>,
}

impl<C: Collaborator> MethodRegistry<C> {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self {
            operations: HashMap::new(),
        }
    }

    /// Registers `operation` under `name`, replacing any earlier entry.
    ///
    /// `A` is the tuple of positional argument types; `R` is anything
    /// serializable.
    pub fn register<A, R, F>(&mut self, name: &str, operation: F) -> &mut Self
    where
        A: FromParams + 'static,
        R: Serialize + 'static,
        F: Fn(&C, A) -> Result<R, CallError> + Send + Sync + 'static,
    {
        let call = move |collaborator: &C,
                         params: Vec<Value>|
              -> Result<Value, CallError> {
            let args = A::from_params(params)?;
            let result = operation(collaborator, args)?;
            serde_json::to_value(result).map_err(|e| {
                CallError::Remote(format!("result is not serializable: {e}"))
            })
        };
        self.operations.insert(
            name.to_string(),
            Operation {
                call: Arc::new(call),
            },
        );
        self
    }

    /// Builder-style [`register`](Self::register).
    pub fn with<A, R, F>(mut self, name: &str, operation: F) -> Self
    where
        A: FromParams + 'static,
        R: Serialize + 'static,
        F: Fn(&C, A) -> Result<R, CallError> + Send + Sync + 'static,
    {
        self.register(name, operation);
        self
    }

    /// Looks up an operation by name.
    pub fn resolve(&self, name: &str) -> Option<Operation<C>> {
        self.operations.get(name).cloned()
    }

    /// Check whether a method is registered.
    pub fn has_method(&self, name: &str) -> bool {
        self.operations.contains_key(name)
    }

    /// List all registered method names (sorted).
    pub fn methods(&self) -> Vec<String> {
        let mut names: Vec<String> = self.operations.keys().cloned().collect();
        names.sort();
        names
    }

    /// Number of registered methods.
    pub fn len(&self) -> usize {
        self.operations.len()
    }

    /// Returns `true` if nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }
}

impl<C: Collaborator> Default for MethodRegistry<C> {
    fn default() -> Self {
        Self::new()
    }
}
