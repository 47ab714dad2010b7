use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScreenError {
    #[error("screen type `{0}` is not registered")]
    NotRegistered(&'static str),
}
