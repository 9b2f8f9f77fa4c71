use thiserror::Error;

/// Errors originating from the rendering pipeline.
#[derive(Debug, Error, PartialEq)]
pub enum RenderError {
    #[error("render cancelled")]
    Cancelled,

    #[error("a render is already in progress")]
    Busy,

    #[error("no view has been rendered yet")]
    NoView,

    #[error(transparent)]
    Core(#[from] mandelgrid_core::CoreError),
}
