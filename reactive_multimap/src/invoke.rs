//! The boundary every call into caller-supplied code goes through.
//!
//! A selector or factory may fail by returning an error or, with the `catch-panic` feature, by
//! panicking. Either way the failure comes back as an [`Error`] tagged with the [`Stage`] that
//! failed, and never unwinds into the producer that delivered the notification.

use crate::error::{BoxError, Error, Stage};

/// Runs `func` for `stage`, translating its failure into an [`Error`].
pub(crate) fn invoke<Func, Out>(stage: Stage, func: Func) -> Result<Out, Error>
where
    Func: FnOnce() -> Result<Out, BoxError>,
{
    catch(func)
        .and_then(|result| result)
        .map_err(|source| stage.error(source))
}

#[cfg(feature = "catch-panic")]
fn catch<Func, Out>(func: Func) -> Result<Out, BoxError>
where
    Func: FnOnce() -> Out,
{
    use std::panic::{AssertUnwindSafe, catch_unwind};

    // The accumulator touched by `func` is discarded on failure.
    catch_unwind(AssertUnwindSafe(func)).map_err(|payload| {
        let message = if let Some(s) = payload.downcast_ref::<&'static str>() {
            (*s).to_owned()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "Box<dyn Any>".to_owned()
        };
        Box::new(crate::error::Panicked { message }) as BoxError
    })
}

#[cfg(not(feature = "catch-panic"))]
fn catch<Func, Out>(func: Func) -> Result<Out, BoxError>
where
    Func: FnOnce() -> Out,
{
    Ok(func())
}
