use thiserror::Error;

pub type Result<T> = std::result::Result<T, GraphError>;

#[derive(Error, Debug)]
pub enum GraphError {
    #[error("Cannot read source {path}: {source}")]
    Source {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{path} is not in the project index")]
    NotIndexed { path: String },

    #[error("Method {method} not found in {path}")]
    MethodNotFound { path: String, method: String },
}

impl GraphError {
    pub fn source(path: impl Into<String>, source: std::io::Error) -> Self {
        Self::Source {
            path: path.into(),
            source,
        }
    }
}
