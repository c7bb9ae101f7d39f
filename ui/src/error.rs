use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Backend(#[from] turret_backend::error::Error),
    #[error(transparent)]
    Eframe(#[from] eframe::Error),
    #[error("failed to install ctrl-c handler: {0}")]
    Signal(#[from] ctrlc::Error),
}
