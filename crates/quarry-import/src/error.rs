use thiserror::Error;

#[derive(Debug, Error)]
pub enum ImportError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("classfile error: {0}")]
    ClassFile(#[from] quarry_classfile::Error),
}

pub type Result<T> = std::result::Result<T, ImportError>;
