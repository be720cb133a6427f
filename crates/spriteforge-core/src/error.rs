use thiserror::Error;

#[derive(Debug, Error)]
pub enum SpriteForgeError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Invalid atlas dimensions: {width}x{height}")]
    InvalidDimensions { width: u32, height: u32 },
    #[error("Invalid config: {0}")]
    InvalidConfig(String),
    #[error(
        "Sprite '{id}' ({width}x{height}) does not fit in a {max_width}x{max_height} bin in any orientation"
    )]
    UnpackableSprite {
        id: String,
        width: u32,
        height: u32,
        max_width: u32,
        max_height: u32,
    },
    #[error("Sprite '{id}' has zero area")]
    ZeroSizeSprite { id: String },
    #[error("Unknown export format: {0}")]
    UnknownFormat(String),
    #[error("Sprite '{0}' referenced by a packed rect is missing")]
    MissingSprite(String),
    #[error("Packer worker failed: {0}")]
    WorkerFailure(String),
    #[error("Packing run was cancelled")]
    Cancelled,
    #[error("Nothing to export")]
    Empty,
    #[error("Template error: {0}")]
    Template(String),
    #[error("Archive error: {0}")]
    Archive(String),
}

pub type Result<T> = std::result::Result<T, SpriteForgeError>;

impl From<handlebars::RenderError> for SpriteForgeError {
    fn from(e: handlebars::RenderError) -> Self {
        SpriteForgeError::Template(e.to_string())
    }
}

impl From<handlebars::TemplateError> for SpriteForgeError {
    fn from(e: handlebars::TemplateError) -> Self {
        SpriteForgeError::Template(e.to_string())
    }
}

impl From<zip::result::ZipError> for SpriteForgeError {
    fn from(e: zip::result::ZipError) -> Self {
        SpriteForgeError::Archive(e.to_string())
    }
}
