use std::any::Any;
use std::fmt;
use std::sync::Arc;

use crate::error::BoxError;
use crate::handler::BoxedHandler;

use super::{LayerType, Middleware};

type Construct = dyn Fn(BoxedHandler) -> Result<BoxedHandler, BoxError> + Send + Sync;

/// One registered middleware: its type plus the arguments it will be
/// constructed with.
///
/// Entries are immutable. Cloning one shares the same arguments and block.
#[derive(Clone)]
pub struct LayerEntry {
    layer: LayerType,
    args: Arc<dyn Any + Send + Sync>,
    has_block: bool,
    construct: Arc<Construct>,
}

impl LayerEntry {
    pub fn new<M: Middleware>(args: M::Args) -> Self {
        Self::from_parts::<M>(args, None)
    }

    /// Like [`new`](Self::new), with the deferred block the layer receives at
    /// construction.
    pub fn with_block<M: Middleware>(args: M::Args, block: Arc<M::Block>) -> Self {
        Self::from_parts::<M>(args, Some(block))
    }

    fn from_parts<M: Middleware>(args: M::Args, block: Option<Arc<M::Block>>) -> Self {
        let args = Arc::new(args);
        let captured = Arc::clone(&args);
        let has_block = block.is_some();
        let construct =
            move |next: BoxedHandler| M::construct(next, (*captured).clone(), block.clone());

        Self { layer: LayerType::of::<M>(), args, has_block, construct: Arc::new(construct) }
    }

    /// Constructs this layer around `next`.
    ///
    /// Errors come straight from the layer's constructor.
    pub fn build(&self, next: BoxedHandler) -> Result<BoxedHandler, BoxError> {
        (self.construct)(next)
    }

    pub fn layer(&self) -> LayerType {
        self.layer
    }

    pub fn name(&self) -> &'static str {
        self.layer.name()
    }

    /// The construction arguments, if they are a `T`.
    pub fn args<T: 'static>(&self) -> Option<&T> {
        self.args.downcast_ref::<T>()
    }

    pub fn has_block(&self) -> bool {
        self.has_block
    }
}

impl fmt::Debug for LayerEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
