// Typed errors with thiserror. Surface meaningful messages to JS.

use thiserror::Error;

use crate::types::PlaneId;

/// Effect error types.
#[derive(Error, Debug)]
pub enum EffectError {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// The render surface or its WebGL2 context could not be created.
    #[error("Renderer initialization failed: {0}")]
    RendererInit(String),

    #[error("Shader compilation failed ({stage}): {message}")]
    ShaderCompile { stage: &'static str, message: String },

    #[error("Could not create plane: {0}")]
    PlaneCreation(String),

    #[error("Texture load failed for plane {plane:?}: {message}")]
    TextureLoad { plane: PlaneId, message: String },

    #[error("Unknown plane {0:?}")]
    UnknownPlane(PlaneId),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for EffectError {
    fn from(err: serde_json::Error) -> Self {
        EffectError::Serialization(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn texture_error_names_plane() {
        let err = EffectError::TextureLoad {
            plane: PlaneId::new(7),
            message: "could not load cat.jpg".to_string(),
        };
        let text = err.to_string();
        assert!(text.contains("PlaneId(7)"));
        assert!(text.ends_with("could not load cat.jpg"));
    }

    #[test]
    fn bad_json_becomes_serialization_error() {
        let err: EffectError = serde_json::from_str::<u32>("x").unwrap_err().into();
        assert!(matches!(err, EffectError::Serialization(_)));
    }

    #[test]
    fn shader_error_names_stage() {
        let err = EffectError::ShaderCompile {
            stage: "fragment",
            message: "syntax error".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Shader compilation failed (fragment): syntax error"
        );
    }
}
