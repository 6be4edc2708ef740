// GLSL sources for each effect variant (GLSL ES 1.00, accepted by WebGL2).
// Attribute and matrix names are shared by every variant so one draw path serves all of them.

use crate::types::ShaderVariant;

pub const POSITION_ATTRIBUTE: &str = "aVertexPosition";
pub const TEX_COORD_ATTRIBUTE: &str = "aTextureCoord";
pub const MODEL_VIEW_MATRIX: &str = "uMVMatrix";
pub const PROJECTION_MATRIX: &str = "uPMatrix";
pub const TEXTURE_MATRIX: &str = "uTextureMatrix0";
pub const SAMPLER: &str = "uSampler0";

/// Vertex and fragment source for one variant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShaderPair {
    pub vertex: String,
    pub fragment: String,
}

impl ShaderPair {
    pub fn for_variant(variant: ShaderVariant) -> Self {
        match variant {
            ShaderVariant::Flip => ShaderPair {
                vertex: PASS_THROUGH_VERTEX.to_string(),
                fragment: FLIP_FRAGMENT.to_string(),
            },
            ShaderVariant::Mosaic => ShaderPair {
                vertex: PASS_THROUGH_VERTEX.to_string(),
                fragment: with_define(FLIP_FRAGMENT, "EUCLIDEAN_DELAY"),
            },
            ShaderVariant::Wave => ShaderPair {
                vertex: WAVE_VERTEX.to_string(),
                fragment: WAVE_FRAGMENT.to_string(),
            },
        }
    }
}

fn with_define(source: &str, name: &str) -> String {
    format!("#define {name}\n{source}")
}

const PASS_THROUGH_VERTEX: &str = r#"
precision mediump float;

attribute vec3 aVertexPosition;
attribute vec2 aTextureCoord;

uniform mat4 uMVMatrix;
uniform mat4 uPMatrix;
uniform mat4 uTextureMatrix0;

varying vec2 vTextureCoord;

void main() {
    gl_Position = uPMatrix * uMVMatrix * vec4(aVertexPosition, 1.0);
    vTextureCoord = (uTextureMatrix0 * vec4(aTextureCoord, 0.0, 1.0)).xy;
}
"#;

const FLIP_FRAGMENT: &str = r#"
precision mediump float;

varying vec2 vTextureCoord;

uniform vec2 uImageSize;
uniform float uGridSize;
uniform float uAnimationProgress;
uniform float uTime;
uniform sampler2D uSampler0;

const float PI = 3.14159265359;
const float MAX_DELAY = 0.75;

const vec3 GREEN_LIGHT = vec3(0.0, 0.91, 0.522);
const vec3 GREEN_MED = vec3(0.0, 0.741, 0.42);
const vec3 GREEN_DARK = vec3(0.0, 0.447, 0.255);

float random(vec2 st) {
    return fract(sin(dot(st.xy, vec2(12.9898, 78.233))) * 43758.5453123);
}

vec3 interpolatePalette(float t) {
    t = t * 3.0;
    if (t < 1.0) {
        return mix(GREEN_LIGHT, GREEN_MED, t);
    } else if (t < 2.0) {
        return mix(GREEN_MED, GREEN_DARK, t - 1.0);
    }
    return mix(GREEN_DARK, GREEN_LIGHT, t - 2.0);
}

vec3 paletteColor(vec2 cell) {
    float r = random(cell);
    float oscillation = (sin(uTime * PI + r * PI * 2.0) + 1.0) * 0.1;
    return interpolatePalette(oscillation);
}

float cellDelay(vec2 cell, vec2 totalGrid) {
    vec2 normalizedPos = cell / max(totalGrid, vec2(1.0));
#ifdef EUCLIDEAN_DELAY
    float dist = length(normalizedPos) / sqrt(2.0);
#else
    float dist = (normalizedPos.x + normalizedPos.y) * 0.5;
#endif
    float noise = random(cell * 0.1) * 0.15;
    return clamp(dist * 0.8 + noise, 0.0, MAX_DELAY);
}

void main() {
    vec2 topLeftCoord = vec2(vTextureCoord.x, 1.0 - vTextureCoord.y);
    vec2 gridCoord = floor(topLeftCoord * uImageSize / uGridSize);
    vec2 cellPosition = fract(vTextureCoord * uImageSize / uGridSize);
    vec2 totalGrid = floor(uImageSize / uGridSize);

    float delay = cellDelay(gridCoord, totalGrid);
    float localProgress = clamp(uAnimationProgress * (1.0 + MAX_DELAY) - delay, 0.0, 1.0);
    float angle = localProgress * PI;

    vec2 fromCenter = cellPosition - vec2(0.5);
    fromCenter.x = -fromCenter.x;
    float scale = cos(angle);

    vec2 rotatedPos = vec2(0.5) + vec2(fromCenter.x * scale, fromCenter.y);
    vec2 cellUV = rotatedPos * uGridSize / uImageSize
        + floor(vTextureCoord * uImageSize / uGridSize) * uGridSize / uImageSize;
    vec4 textureColor = texture2D(uSampler0, cellUV);

    float isFront = step(0.0, scale);
    vec4 frontColor = vec4(paletteColor(gridCoord), 1.0);
    vec4 backColor = vec4(textureColor.rgb, 1.0);
    vec4 finalColor = mix(backColor, frontColor, isFront);

    float edgeVisibility = step(abs(fromCenter.x), 0.5 * abs(scale));
    gl_FragColor = vec4(finalColor.rgb, edgeVisibility);
}
"#;

const WAVE_VERTEX: &str = r#"
precision mediump float;

attribute vec3 aVertexPosition;
attribute vec2 aTextureCoord;

uniform mat4 uMVMatrix;
uniform mat4 uPMatrix;
uniform mat4 uTextureMatrix0;

uniform float uTime;
uniform float uAnimationProgress;
uniform float uDirection;
uniform vec2 uPointer;

varying vec2 vTextureCoord;
varying float vProgress;
varying float vDirection;

const float PI = 3.14159265359;

void main() {
    vec3 position = aVertexPosition;

    float distanceFromPointer = length(aTextureCoord - uPointer);
    float envelope = sin(clamp(uAnimationProgress, 0.0, 1.0) * PI);
    float wave = sin(distanceFromPointer * 10.0 - uTime * 2.0) * 0.05 * envelope;

    position.xy *= 1.0 + envelope * 0.1;
    position.y += wave;

    float flipProgress = clamp(uAnimationProgress * 2.0 - distanceFromPointer, 0.0, 1.0);
    float flip = sin(flipProgress * PI) * PI;
    position.z += sign(uDirection) * sin(flip) * 0.1;

    gl_Position = uPMatrix * uMVMatrix * vec4(position, 1.0);

    vTextureCoord = (uTextureMatrix0 * vec4(aTextureCoord, 0.0, 1.0)).xy;
    vProgress = flipProgress;
    vDirection = uDirection;
}
"#;

const WAVE_FRAGMENT: &str = r#"
precision mediump float;

varying vec2 vTextureCoord;
varying float vProgress;
varying float vDirection;

uniform sampler2D uSampler0;

const float PIXEL_GRID = 160.0;

void main() {
    vec2 gridUV = floor(vTextureCoord * PIXEL_GRID) / PIXEL_GRID;

    vec4 textureColor = texture2D(uSampler0, vTextureCoord);

    float random = fract(sin(dot(gridUV, vec2(12.9898, 78.233))) * 43758.5453);
    vec4 greenColor = vec4(0.0, 0.2 + random * 0.5, 0.0, 1.0);

    float mixRatio = smoothstep(0.0, 1.0, vProgress);

    if (vDirection > 0.0) {
        gl_FragColor = mix(greenColor, textureColor, mixRatio);
    } else {
        gl_FragColor = mix(textureColor, greenColor, mixRatio);
    }
}
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::uniforms;

    const VARIANTS: [ShaderVariant; 3] =
        [ShaderVariant::Flip, ShaderVariant::Mosaic, ShaderVariant::Wave];

    #[test]
    fn every_variant_uses_shared_names() {
        let shared = [
            POSITION_ATTRIBUTE,
            TEX_COORD_ATTRIBUTE,
            MODEL_VIEW_MATRIX,
            PROJECTION_MATRIX,
        ];
        for variant in VARIANTS {
            let pair = ShaderPair::for_variant(variant);
            for name in shared {
                assert!(pair.vertex.contains(name), "{variant:?} vertex lacks {name}");
            }
            assert!(pair.fragment.contains(SAMPLER));
        }
    }

    #[test]
    fn flip_grid_follows_uniforms() {
        for variant in [ShaderVariant::Flip, ShaderVariant::Mosaic] {
            let pair = ShaderPair::for_variant(variant);
            assert!(pair.fragment.contains(uniforms::IMAGE_SIZE));
            assert!(pair.fragment.contains(uniforms::GRID_SIZE));
        }
    }

    #[test]
    fn wave_uses_fixed_pixel_grid() {
        let wave = ShaderPair::for_variant(ShaderVariant::Wave);
        assert!(wave.fragment.contains("floor(vTextureCoord * PIXEL_GRID) / PIXEL_GRID"));
        assert!(!wave.fragment.contains(uniforms::GRID_SIZE));
    }

    #[test]
    fn mosaic_enables_euclidean_branch() {
        let mosaic = ShaderPair::for_variant(ShaderVariant::Mosaic);
        assert!(mosaic.fragment.starts_with("#define EUCLIDEAN_DELAY\n"));
        let flip = ShaderPair::for_variant(ShaderVariant::Flip);
        assert!(!flip.fragment.starts_with("#define"));
    }

    #[test]
    fn flip_fragment_has_single_final_assignment() {
        let flip = ShaderPair::for_variant(ShaderVariant::Flip);
        assert_eq!(flip.fragment.matches("gl_FragColor =").count(), 1);
    }
}
