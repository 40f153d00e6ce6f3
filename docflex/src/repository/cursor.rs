use crate::client::DocumentStream;
use crate::errors::DocFlexResult;
use crate::model::{Model, ModelDescriptor};
use crate::repository::record::{from_document, Record};
use futures::{Stream, StreamExt, TryStreamExt};
use std::marker::PhantomData;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

/// A stream of records read from a query.
///
/// Each raw document is mapped as it arrives. A document that fails to map
/// yields an error item; the cursor keeps going after it.
pub struct RecordCursor<T> {
    stream: DocumentStream,
    descriptor: Arc<ModelDescriptor>,
    _phantom: PhantomData<fn() -> T>,
}

impl<T: Model> RecordCursor<T> {
    pub(crate) fn new(stream: DocumentStream, descriptor: Arc<ModelDescriptor>) -> Self {
        RecordCursor {
            stream,
            descriptor,
            _phantom: PhantomData,
        }
    }

    /// Drains the cursor, stopping at the first error.
    pub async fn collect_all(self) -> DocFlexResult<Vec<Record<T>>> {
        self.try_collect().await
    }

    /// Reads the next record, or `None` once the cursor is exhausted.
    pub async fn next_record(&mut self) -> Option<DocFlexResult<Record<T>>> {
        self.next().await
    }
}

impl<T: Model> Stream for RecordCursor<T> {
    type Item = DocFlexResult<Record<T>>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        match this.stream.poll_next_unpin(cx) {
            Poll::Ready(Some(Ok(document))) => {
                Poll::Ready(Some(from_document(&this.descriptor, document)))
            }
            Poll::Ready(Some(Err(err))) => Poll::Ready(Some(Err(err))),
            Poll::Ready(None) => Poll::Ready(None),
            Poll::Pending => Poll::Pending,
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.stream.size_hint()
    }
}
