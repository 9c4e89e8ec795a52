//! Wrap futures and streams so their lifetime is reported as signals
//!
//! The wrapper emits [`Signal::Start`] on its first poll and guarantees exactly
//! one [`Signal::Stop`] afterwards, whether the inner operation completes,
//! returns an error, panics, or is dropped before finishing.
//!
//! ```rust,ignore
//! use busylight::IndicateExt;
//!
//! let rows = fetch_rows(&pool).indicate(Some(indicator.clone())).await?;
//! ```

use core::future::Future;
use core::pin::Pin;
use core::task::{Context, Poll};

use futures::{Stream, ready};
use pin_project_lite::pin_project;
use tracing::debug;

use crate::signal::{Signal, SignalSink};

/// Scoped acquisition of one "in flight" slot
///
/// Emits `Start` when created and `Stop` when dropped.
#[derive(Debug)]
#[must_use = "the indicator stops as soon as the guard is dropped"]
pub struct IndicateGuard<S: SignalSink> {
    sink: Option<S>,
}

impl<S: SignalSink> IndicateGuard<S> {
    pub fn new(sink: S) -> Self {
        sink.next(Signal::Start);
        Self { sink: Some(sink) }
    }

    /// Emit `Stop` now instead of at the end of the scope
    pub fn finish(mut self) {
        self.release();
    }

    fn release(&mut self) {
        if let Some(sink) = self.sink.take() {
            sink.next(Signal::Stop);
        }
    }
}

impl<S: SignalSink> Drop for IndicateGuard<S> {
    fn drop(&mut self) {
        self.release();
    }
}

pin_project! {
    /// Future or stream adapter returned by [`indicate`], [`IndicateExt`] and [`IndicateStreamExt`]
    #[must_use = "futures and streams do nothing unless polled"]
    #[derive(Debug)]
    pub struct Indicated<T, S: SignalSink> {
        #[pin]
        inner: T,
        // Taken on first poll
        sink: Option<S>,
        guard: Option<IndicateGuard<S>>,
    }
}

impl<T, S: SignalSink> Indicated<T, S> {
    /// Wrap `inner`; with no sink the adapter is a plain pass-through
    pub fn new(inner: T, sink: Option<S>) -> Self {
        Self {
            inner,
            sink,
            guard: None,
        }
    }

    /// Whether `Start` has been emitted and `Stop` has not
    pub fn is_active(&self) -> bool {
        self.guard.is_some()
    }
}

fn begin<S: SignalSink>(sink: &mut Option<S>, guard: &mut Option<IndicateGuard<S>>) {
    if let Some(sink) = sink.take() {
        debug!("Indicated: first poll, emitting start");
        *guard = Some(IndicateGuard::new(sink));
    }
}

impl<T: Future, S: SignalSink> Future for Indicated<T, S> {
    type Output = T::Output;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.project();
        begin(this.sink, this.guard);

        let output = ready!(this.inner.poll(cx));
        drop(this.guard.take());
        Poll::Ready(output)
    }
}

impl<T: Stream, S: SignalSink> Stream for Indicated<T, S> {
    type Item = T::Item;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.project();
        begin(this.sink, this.guard);

        let item = ready!(this.inner.poll_next(cx));
        if item.is_none() {
            drop(this.guard.take());
        }
        Poll::Ready(item)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

/// Report the lifetime of `inner` (a future or a stream) to `sink`
pub fn indicate<T, S: SignalSink>(sink: Option<S>, inner: T) -> Indicated<T, S> {
    Indicated::new(inner, sink)
}

/// Method form of [`indicate`] for futures
pub trait IndicateExt: Future + Sized {
    fn indicate<S: SignalSink>(self, sink: Option<S>) -> Indicated<Self, S> {
        Indicated::new(self, sink)
    }
}

impl<T: Future> IndicateExt for T {}

/// Method form of [`indicate`] for streams
pub trait IndicateStreamExt: Stream + Sized {
    fn indicate<S: SignalSink>(self, sink: Option<S>) -> Indicated<Self, S> {
        Indicated::new(self, sink)
    }
}

impl<T: Stream> IndicateStreamExt for T {}
