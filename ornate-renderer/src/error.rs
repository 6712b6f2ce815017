use ornate_template::LoadError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MountError {
    #[error("no container with id `{0}`")]
    ContainerNotFound(String),
    #[error("template `{0}` has not been loaded")]
    NotLoaded(String),
    #[error(transparent)]
    Load(#[from] LoadError),
}
