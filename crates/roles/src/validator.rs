//! Role validators.
//!
//! A validator is the caller-supplied predicate behind a role. It receives
//! the positional params of the current evaluation and either resolves with
//! a payload or rejects. The literal `false` is reserved: resolving or
//! rejecting with it means "role denied".

use crate::BoxError;
use futures_util::future::{BoxFuture, FutureExt};
use serde_json::Value;
use std::fmt;
use std::future::Future;

/// Result produced by a validator.
pub type Outcome = std::result::Result<Value, Rejection>;

/// Why a validator did not resolve with a payload.
#[derive(Debug)]
pub enum Rejection {
    /// Rejected with a plain value. Always treated as a denial; the value
    /// itself is discarded.
    Value(Value),
    /// Rejected with a real error, which is propagated unchanged.
    Error(BoxError),
}

impl Rejection {
    /// Explicit denial, equivalent to rejecting with `false`.
    pub fn deny() -> Self {
        Rejection::Value(Value::Bool(false))
    }

    /// Reject with an arbitrary error.
    pub fn error(err: impl Into<BoxError>) -> Self {
        Rejection::Error(err.into())
    }
}

impl<E> From<E> for Rejection
where
    E: std::error::Error + Send + Sync + 'static,
{
    fn from(err: E) -> Self {
        Rejection::Error(Box::new(err))
    }
}

/// Trait for role validators.
///
/// Validators are invoked sequentially; the returned future is awaited to
/// completion before the next role is checked.
pub trait Validator: Send + Sync {
    /// Validate the role for the given params.
    fn validate<'a>(&'a self, params: &'a [Value]) -> BoxFuture<'a, Outcome>;
}

/// A validator backed by a synchronous closure.
///
/// The closure runs when the future is first polled, so a panic inside it
/// is caught by the same scope as a panic in an async validator.
pub struct FnValidator<F>(F);

impl<F> Validator for FnValidator<F>
where
    F: Fn(&[Value]) -> Outcome + Send + Sync,
{
    fn validate<'a>(&'a self, params: &'a [Value]) -> BoxFuture<'a, Outcome> {
        async move { (self.0)(params) }.boxed()
    }
}

impl<F> fmt::Debug for FnValidator<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("FnValidator")
    }
}

/// A validator backed by a closure returning a future.
///
/// Params are cloned into the closure so the future can own them.
pub struct AsyncFnValidator<F>(F);

impl<F, Fut> Validator for AsyncFnValidator<F>
where
    F: Fn(Vec<Value>) -> Fut + Send + Sync,
    Fut: Future<Output = Outcome> + Send + 'static,
{
    fn validate<'a>(&'a self, params: &'a [Value]) -> BoxFuture<'a, Outcome> {
        async move { (self.0)(params.to_vec()).await }.boxed()
    }
}

impl<F> fmt::Debug for AsyncFnValidator<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AsyncFnValidator")
    }
}

/// A validator that ignores params and always resolves with the same value.
///
/// `Constant(Value::Bool(false))` always denies.
#[derive(Debug, Clone, PartialEq)]
pub struct Constant(pub Value);

impl Validator for Constant {
    fn validate<'a>(&'a self, _params: &'a [Value]) -> BoxFuture<'a, Outcome> {
        futures_util::future::ready(Ok(self.0.clone())).boxed()
    }
}

/// Wrap a synchronous closure as a validator.
pub fn from_fn<F>(f: F) -> FnValidator<F>
where
    F: Fn(&[Value]) -> Outcome + Send + Sync,
{
    FnValidator(f)
}

/// Wrap an async closure as a validator.
pub fn from_async<F, Fut>(f: F) -> AsyncFnValidator<F>
where
    F: Fn(Vec<Value>) -> Fut + Send + Sync,
    Fut: Future<Output = Outcome> + Send + 'static,
{
    AsyncFnValidator(f)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, Ordering};

    #[tokio::test]
    async fn test_constant_ignores_params() {
        let v = Constant(json!({"level": 3}));
        let out = v.validate(&[json!(1)]).await.unwrap();
        assert_eq!(out, json!({"level": 3}));
    }

    #[tokio::test]
    async fn test_sync_closure_runs_on_poll() {
        let ran = Arc::new(AtomicBool::new(false));
        let flag = ran.clone();
        let v = from_fn(move |_| {
            flag.store(true, Ordering::SeqCst);
            Ok(json!(true))
        });

        let fut = v.validate(&[]);
        assert!(!ran.load(Ordering::SeqCst));
        fut.await.unwrap();
        assert!(ran.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_async_closure_receives_params() {
        let v = from_async(|params: Vec<Value>| async move { Ok(Value::Array(params)) });
        let out = v.validate(&[json!(1), json!("two")]).await.unwrap();
        assert_eq!(out, json!([1, "two"]));
    }

    #[tokio::test]
    async fn test_errors_convert_with_question_mark() {
        fn parse(params: &[Value]) -> Outcome {
            let n: u32 = params[0].as_str().unwrap_or_default().parse()?;
            Ok(json!(n))
        }

        let v = from_fn(parse);
        assert_eq!(v.validate(&[json!("7")]).await.unwrap(), json!(7));
        assert!(matches!(
            v.validate(&[json!("seven")]).await,
            Err(Rejection::Error(_))
        ));
    }

    #[test]
    fn test_deny_is_false() {
        assert!(matches!(Rejection::deny(), Rejection::Value(Value::Bool(false))));
    }
}
