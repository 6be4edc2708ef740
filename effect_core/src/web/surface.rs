// WebGL2 render surface: one fixed full-viewport canvas drawing every plane.

use std::collections::HashMap;

use js_sys::{Float32Array, Uint32Array};
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{
    Document, HtmlCanvasElement, HtmlElement, HtmlImageElement, WebGl2RenderingContext as GL,
    WebGlBuffer, WebGlProgram, WebGlShader, WebGlTexture, WebGlUniformLocation,
    WebGlVertexArrayObject,
};

use crate::error::EffectError;
use crate::geometry::{self, PlaneMesh};
use crate::plane::PlaneRecord;
use crate::shaders::{self, ShaderPair};
use crate::types::{MinFilter, ShaderVariant, TextureOptions};
use crate::uniforms::UniformValue;

const CONTAINER_ID: &str = "entry-effects-canvas";
const POSITION_LOCATION: u32 = 0;
const TEX_COORD_LOCATION: u32 = 1;
const TEXTURE_MAX_ANISOTROPY_EXT: u32 = 0x84FE;

fn init_err(message: impl Into<String>) -> EffectError {
    EffectError::RendererInit(message.into())
}

fn plane_err(message: impl Into<String>) -> EffectError {
    EffectError::PlaneCreation(message.into())
}

/// GPU resources of one plane.
pub struct GpuPlane {
    vao: WebGlVertexArrayObject,
    positions: WebGlBuffer,
    tex_coords: WebGlBuffer,
    indices: WebGlBuffer,
    index_count: i32,
    texture: WebGlTexture,
    segments: (u32, u32),
}

impl GpuPlane {
    pub fn segments(&self) -> (u32, u32) {
        self.segments
    }
}

pub struct RenderSurface {
    container: HtmlElement,
    canvas: HtmlCanvasElement,
    gl: GL,
    program: WebGlProgram,
    locations: HashMap<String, Option<WebGlUniformLocation>>,
    texture_options: TextureOptions,
    max_pixel_ratio: f64,
    size: (u32, u32),
}

impl RenderSurface {
    /// Create the canvas, its WebGL2 context and the program for `variant`.
    pub fn new(
        document: &Document,
        variant: ShaderVariant,
        texture_options: TextureOptions,
        max_pixel_ratio: f64,
    ) -> Result<Self, EffectError> {
        let body = document.body().ok_or_else(|| init_err("document has no body"))?;

        let container: HtmlElement = document
            .create_element("div")
            .map_err(|e| init_err(format!("{e:?}")))?
            .dyn_into()
            .map_err(|_| init_err("div is not an HtmlElement"))?;
        container.set_id(CONTAINER_ID);
        let style = container.style();
        for (property, value) in [
            ("position", "fixed"),
            ("top", "0"),
            ("left", "0"),
            ("width", "100vw"),
            ("height", "100vh"),
            ("pointer-events", "none"),
            ("z-index", "1"),
        ] {
            style
                .set_property(property, value)
                .map_err(|e| init_err(format!("{e:?}")))?;
        }

        let canvas: HtmlCanvasElement = document
            .create_element("canvas")
            .map_err(|e| init_err(format!("{e:?}")))?
            .dyn_into()
            .map_err(|_| init_err("canvas is not an HtmlCanvasElement"))?;
        for (property, value) in [("width", "100%"), ("height", "100%"), ("display", "block")] {
            canvas
                .style()
                .set_property(property, value)
                .map_err(|e| init_err(format!("{e:?}")))?;
        }
        container
            .append_child(&canvas)
            .map_err(|e| init_err(format!("{e:?}")))?;
        body.append_child(&container)
            .map_err(|e| init_err(format!("{e:?}")))?;

        let gl = match canvas.get_context("webgl2") {
            Ok(Some(ctx)) => ctx
                .dyn_into::<GL>()
                .map_err(|_| init_err("context is not WebGL2")),
            Ok(None) => Err(init_err("WebGL2 not supported")),
            Err(e) => Err(init_err(format!("{e:?}"))),
        };
        let gl = match gl {
            Ok(gl) => gl,
            Err(err) => {
                container.remove();
                return Err(err);
            }
        };

        let program = match link_program(&gl, &ShaderPair::for_variant(variant)) {
            Ok(program) => program,
            Err(err) => {
                container.remove();
                return Err(err);
            }
        };

        gl.enable(GL::BLEND);
        gl.blend_func(GL::SRC_ALPHA, GL::ONE_MINUS_SRC_ALPHA);
        gl.clear_color(0.0, 0.0, 0.0, 0.0);

        log::info!("render surface ready ({:?})", variant);
        Ok(RenderSurface {
            container,
            canvas,
            gl,
            program,
            locations: HashMap::new(),
            texture_options,
            max_pixel_ratio,
            size: (0, 0),
        })
    }

    /// CSS viewport to drawing-buffer scale, capped at the configured ratio.
    pub fn pixel_ratio(&self, device_pixel_ratio: f64) -> f64 {
        device_pixel_ratio.min(self.max_pixel_ratio).max(0.0)
    }

    /// Match the drawing buffer to the viewport.
    pub fn resize(&mut self, css_width: f64, css_height: f64, device_pixel_ratio: f64) {
        let ratio = self.pixel_ratio(device_pixel_ratio);
        let size = (
            (css_width * ratio).round() as u32,
            (css_height * ratio).round() as u32,
        );
        if size != self.size {
            self.canvas.set_width(size.0);
            self.canvas.set_height(size.1);
            self.size = size;
        }
    }

    pub fn create_plane(&self, segments: (u32, u32)) -> Result<GpuPlane, EffectError> {
        let gl = &self.gl;
        let vao = gl
            .create_vertex_array()
            .ok_or_else(|| plane_err("create_vertex_array failed"))?;
        let positions = gl
            .create_buffer()
            .ok_or_else(|| plane_err("create_buffer failed"))?;
        let tex_coords = gl
            .create_buffer()
            .ok_or_else(|| plane_err("create_buffer failed"))?;
        let indices = gl
            .create_buffer()
            .ok_or_else(|| plane_err("create_buffer failed"))?;
        let texture = gl
            .create_texture()
            .ok_or_else(|| plane_err("create_texture failed"))?;

        let mut plane = GpuPlane {
            vao,
            positions,
            tex_coords,
            indices,
            index_count: 0,
            texture,
            segments,
        };
        self.upload_mesh(&mut plane, segments);
        Ok(plane)
    }

    /// Rebuild the subdivided mesh after the grid changed.
    pub fn upload_mesh(&self, plane: &mut GpuPlane, segments: (u32, u32)) {
        let gl = &self.gl;
        let mesh = PlaneMesh::subdivided(segments.0, segments.1);

        gl.bind_vertex_array(Some(&plane.vao));

        gl.bind_buffer(GL::ARRAY_BUFFER, Some(&plane.positions));
        gl.buffer_data_with_array_buffer_view(
            GL::ARRAY_BUFFER,
            &Float32Array::from(mesh.positions.as_slice()),
            GL::STATIC_DRAW,
        );
        gl.enable_vertex_attrib_array(POSITION_LOCATION);
        gl.vertex_attrib_pointer_with_i32(POSITION_LOCATION, 3, GL::FLOAT, false, 0, 0);

        gl.bind_buffer(GL::ARRAY_BUFFER, Some(&plane.tex_coords));
        gl.buffer_data_with_array_buffer_view(
            GL::ARRAY_BUFFER,
            &Float32Array::from(mesh.tex_coords.as_slice()),
            GL::STATIC_DRAW,
        );
        gl.enable_vertex_attrib_array(TEX_COORD_LOCATION);
        gl.vertex_attrib_pointer_with_i32(TEX_COORD_LOCATION, 2, GL::FLOAT, false, 0, 0);

        gl.bind_buffer(GL::ELEMENT_ARRAY_BUFFER, Some(&plane.indices));
        gl.buffer_data_with_array_buffer_view(
            GL::ELEMENT_ARRAY_BUFFER,
            &Uint32Array::from(mesh.indices.as_slice()),
            GL::STATIC_DRAW,
        );

        gl.bind_vertex_array(None);
        plane.index_count = mesh.indices.len() as i32;
        plane.segments = segments;
    }

    /// Upload a loaded image into the plane's texture.
    pub fn upload_texture(
        &self,
        plane: &GpuPlane,
        image: &HtmlImageElement,
    ) -> Result<(), JsValue> {
        let gl = &self.gl;
        let options = &self.texture_options;

        gl.bind_texture(GL::TEXTURE_2D, Some(&plane.texture));
        gl.pixel_store_i(GL::UNPACK_FLIP_Y_WEBGL, options.flip_y as i32);
        gl.pixel_store_i(
            GL::UNPACK_PREMULTIPLY_ALPHA_WEBGL,
            options.premultiply_alpha as i32,
        );
        gl.tex_image_2d_with_u32_and_u32_and_html_image_element(
            GL::TEXTURE_2D,
            0,
            GL::RGBA as i32,
            GL::RGBA,
            GL::UNSIGNED_BYTE,
            image,
        )?;

        let min_filter = match options.min_filter {
            MinFilter::Linear => GL::LINEAR,
            MinFilter::Nearest => GL::NEAREST,
            MinFilter::LinearMipmapNearest => GL::LINEAR_MIPMAP_NEAREST,
            MinFilter::LinearMipmapLinear => GL::LINEAR_MIPMAP_LINEAR,
        };
        if options.min_filter.uses_mipmaps() {
            gl.generate_mipmap(GL::TEXTURE_2D);
        }
        gl.tex_parameteri(GL::TEXTURE_2D, GL::TEXTURE_MIN_FILTER, min_filter as i32);
        gl.tex_parameteri(GL::TEXTURE_2D, GL::TEXTURE_MAG_FILTER, GL::LINEAR as i32);
        gl.tex_parameteri(GL::TEXTURE_2D, GL::TEXTURE_WRAP_S, GL::CLAMP_TO_EDGE as i32);
        gl.tex_parameteri(GL::TEXTURE_2D, GL::TEXTURE_WRAP_T, GL::CLAMP_TO_EDGE as i32);

        if options.anisotropy > 1.0 {
            if let Ok(Some(_)) = gl.get_extension("EXT_texture_filter_anisotropic") {
                gl.tex_parameterf(
                    GL::TEXTURE_2D,
                    TEXTURE_MAX_ANISOTROPY_EXT,
                    options.anisotropy,
                );
            }
        }

        gl.bind_texture(GL::TEXTURE_2D, None);
        Ok(())
    }

    pub fn delete_plane(&self, plane: GpuPlane) {
        let gl = &self.gl;
        gl.delete_vertex_array(Some(&plane.vao));
        gl.delete_buffer(Some(&plane.positions));
        gl.delete_buffer(Some(&plane.tex_coords));
        gl.delete_buffer(Some(&plane.indices));
        gl.delete_texture(Some(&plane.texture));
    }

    pub fn begin_frame(&self) {
        let gl = &self.gl;
        gl.viewport(0, 0, self.size.0 as i32, self.size.1 as i32);
        gl.clear(GL::COLOR_BUFFER_BIT);
        gl.use_program(Some(&self.program));
    }

    /// Draw one plane over its element. Planes outside the viewport are skipped.
    pub fn draw(&mut self, record: &PlaneRecord, plane: &GpuPlane, viewport: (f32, f32)) {
        let bounds = record.bounds();
        if !bounds.intersects_viewport(viewport.0, viewport.1) {
            return;
        }

        let model_view = geometry::clip_transform(&bounds, viewport.0, viewport.1);
        self.set_matrix(shaders::MODEL_VIEW_MATRIX, &model_view);
        self.set_matrix(shaders::PROJECTION_MATRIX, &geometry::IDENTITY);
        self.set_matrix(shaders::TEXTURE_MATRIX, &geometry::IDENTITY);

        for (name, value) in record.uniforms.iter() {
            let location = self.location(name);
            match value {
                UniformValue::Float(v) => self.gl.uniform1f(location.as_ref(), v),
                UniformValue::Vec2([x, y]) => self.gl.uniform2f(location.as_ref(), x, y),
            }
        }

        let sampler = self.location(shaders::SAMPLER);
        self.gl.active_texture(GL::TEXTURE0);
        self.gl.bind_texture(GL::TEXTURE_2D, Some(&plane.texture));
        self.gl.uniform1i(sampler.as_ref(), 0);

        self.gl.bind_vertex_array(Some(&plane.vao));
        self.gl
            .draw_elements_with_i32(GL::TRIANGLES, plane.index_count, GL::UNSIGNED_INT, 0);
        self.gl.bind_vertex_array(None);
    }

    fn set_matrix(&mut self, name: &str, matrix: &[f32; 16]) {
        let location = self.location(name);
        self.gl
            .uniform_matrix4fv_with_f32_array(location.as_ref(), false, matrix);
    }

    // Locations are looked up once per name; a missing uniform caches as None.
    fn location(&mut self, name: &str) -> Option<WebGlUniformLocation> {
        if let Some(cached) = self.locations.get(name) {
            return cached.clone();
        }
        let location = self.gl.get_uniform_location(&self.program, name);
        self.locations.insert(name.to_string(), location.clone());
        location
    }

    /// Remove the canvas and free the program.
    pub fn dispose(&self) {
        self.gl.delete_program(Some(&self.program));
        self.container.remove();
    }
}

fn compile_shader(gl: &GL, kind: u32, source: &str) -> Result<WebGlShader, EffectError> {
    let stage = if kind == GL::VERTEX_SHADER {
        "vertex"
    } else {
        "fragment"
    };
    let shader = gl.create_shader(kind).ok_or(EffectError::ShaderCompile {
        stage,
        message: "create_shader failed".to_string(),
    })?;
    gl.shader_source(&shader, source);
    gl.compile_shader(&shader);

    let compiled = gl
        .get_shader_parameter(&shader, GL::COMPILE_STATUS)
        .as_bool()
        .unwrap_or(false);
    if compiled {
        Ok(shader)
    } else {
        let message = gl
            .get_shader_info_log(&shader)
            .unwrap_or_else(|| "unknown error".to_string());
        gl.delete_shader(Some(&shader));
        Err(EffectError::ShaderCompile { stage, message })
    }
}

fn link_program(gl: &GL, pair: &ShaderPair) -> Result<WebGlProgram, EffectError> {
    let vertex = compile_shader(gl, GL::VERTEX_SHADER, &pair.vertex)?;
    let fragment = compile_shader(gl, GL::FRAGMENT_SHADER, &pair.fragment)?;
    let program = gl
        .create_program()
        .ok_or_else(|| init_err("create_program failed"))?;

    gl.attach_shader(&program, &vertex);
    gl.attach_shader(&program, &fragment);
    gl.bind_attrib_location(&program, POSITION_LOCATION, shaders::POSITION_ATTRIBUTE);
    gl.bind_attrib_location(&program, TEX_COORD_LOCATION, shaders::TEX_COORD_ATTRIBUTE);
    gl.link_program(&program);

    let linked = gl
        .get_program_parameter(&program, GL::LINK_STATUS)
        .as_bool()
        .unwrap_or(false);
    gl.detach_shader(&program, &vertex);
    gl.detach_shader(&program, &fragment);
    gl.delete_shader(Some(&vertex));
    gl.delete_shader(Some(&fragment));

    if linked {
        Ok(program)
    } else {
        let message = gl
            .get_program_info_log(&program)
            .unwrap_or_else(|| "unknown error".to_string());
        gl.delete_program(Some(&program));
        Err(init_err(format!("program link failed: {message}")))
    }
}
